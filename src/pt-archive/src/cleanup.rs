// Copyright Materialize, Inc. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository, or online at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Removes one namespace's logs, or the entire logs root.

use std::path::Path;

use crate::error::ArchiveError;

/// Soft cleanup: removes `<logs_path>/<namespace>`.
pub fn cleanup_namespace(logs_path: &Path, namespace: &str) -> Result<(), ArchiveError> {
    let dir = logs_path.join(namespace);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
        tracing::info!("removed logs for namespace {namespace}");
    } else {
        tracing::warn!("nothing to clean up for namespace {namespace}");
    }
    Ok(())
}

/// Hard cleanup: removes the entire logs root.
pub fn cleanup_all(logs_path: &Path) -> Result<(), ArchiveError> {
    if logs_path.exists() {
        std::fs::remove_dir_all(logs_path)?;
        tracing::info!("removed the entire logs root at {}", logs_path.display());
    } else {
        tracing::warn!("logs root {} does not exist, nothing to clean up", logs_path.display());
    }
    Ok(())
}
