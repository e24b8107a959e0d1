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

//! `logs export`/`logs import`: gzip+tar archive of the logs directory
//! tree, with path-traversal rejection on import.

use std::fs::File;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::ArchiveError;

/// Writes a gzip-compressed tar of `logs_path`'s whole tree to `dest`.
pub fn export(logs_path: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::create(dest)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(".", logs_path)?;
    builder.into_inner()?.finish()?;
    tracing::info!("exported {} to {}", logs_path.display(), dest.display());
    Ok(())
}

/// Extracts a gzip-compressed tar produced by [`export`] into `dest_root`,
/// which must already exist. Rejects any entry whose path, once joined to
/// `dest_root` and resolved, would escape it.
pub fn import(source: &Path, dest_root: &Path) -> Result<(), ArchiveError> {
    let file = File::open(source)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        if !is_contained(&entry_path) {
            tracing::error!("rejecting archive entry outside the destination root: {}", entry_path.display());
            return Err(ArchiveError::PathTraversal(entry_path.display().to_string()));
        }
        entry.unpack_in(dest_root)?;
    }
    tracing::info!("imported {} into {}", source.display(), dest_root.display());
    Ok(())
}

/// Rejects any relative path containing a `..` component or an absolute
/// root, the same check `tar`'s own `unpack_in` performs internally, made
/// explicit here so the rejection is a named, tested error variant rather
/// than a silent skip.
fn is_contained(path: &Path) -> bool {
    use std::path::Component;
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
