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

//! Per-replica log tailing: copies a follow-mode log stream into the
//! replica's own append-only log file until the stream closes.

use std::path::Path;
use std::sync::Arc;

use pt_client::{ClusterClient, Replica};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Opens (create-or-append) `<replica-name>.log` under `dir`, opens a
/// follow-mode log stream for `replica`, and copies bytes until the stream
/// closes. Failures are isolated to this one tailer; they never propagate
/// to other tailers or to the event dispatcher.
pub async fn tail(client: Arc<dyn ClusterClient>, dir: &Path, replica: Replica) {
    let log_path = dir.join(format!("{}.log", replica.name));
    let mut file = match OpenOptions::new().create(true).append(true).open(&log_path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("failed to open log file for {}: {e}", replica.name);
            return;
        }
    };

    let mut stream = match client.open_log_stream(&replica, true).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("failed to open log stream for {}: {e}", replica.name);
            return;
        }
    };

    if let Err(e) = tokio::io::copy(&mut stream, &mut file).await {
        tracing::warn!("log stream copy failed for {}: {e}", replica.name);
    }
    let _ = file.flush().await;
}
