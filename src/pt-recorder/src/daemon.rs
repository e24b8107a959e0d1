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

//! The recorder's startup sequence and event-dispatch loop (C3).

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use pt_client::{ClusterClient, Replica, ReplicaEvent};
use tokio::sync::Mutex;

use crate::checkpoint::Checkpoint;
use crate::config::RecorderConfig;
use crate::error::RecorderError;
use crate::{metadata, tailer};

/// How long a per-replica pipeline waits before touching the replica at all.
/// A placeholder for awaiting the replica's readiness condition or first log
/// byte; see the acknowledged warts in the design notes.
const READINESS_DELAY: Duration = Duration::from_secs(5);

/// Runs the recorder until `shutdown` resolves. Implements the startup
/// sequence in full: checkpoint read, connect, list, sort, synchronous
/// snapshot dispatch, then a watch-driven concurrent dispatch loop.
pub async fn run(
    config: RecorderConfig,
    client: Arc<dyn ClusterClient>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), RecorderError> {
    tokio::fs::create_dir_all(config.namespace_dir()).await?;

    let checkpoint_path = config.checkpoint_path();
    let on_disk = Checkpoint::read(&checkpoint_path).await.unwrap_or_default();
    tracing::info!("resuming from resource version {:?}", on_disk.last_resource_version);

    let resume_from = if on_disk.last_resource_version.is_empty() {
        None
    } else {
        Some(on_disk.last_resource_version.clone())
    };
    let (mut replicas, list_resource_version) = client.list(resume_from.as_deref()).await?;

    // Server ordering is not temporal; re-sort by creation-instant, ties by
    // name, so the metadata index preserves birth order.
    replicas.sort_by(|a, b| {
        a.creation_instant
            .cmp(&b.creation_instant)
            .then_with(|| a.name.cmp(&b.name))
    });

    let checkpoint = Arc::new(Mutex::new(Checkpoint {
        last_resource_version: list_resource_version.clone(),
        file_offsets: on_disk.file_offsets,
    }));

    for replica in &replicas {
        if let Err(e) = process_replica(&config, Arc::clone(&client), replica.clone(), &checkpoint).await {
            tracing::warn!("failed to process snapshot replica {}: {e}", replica.name);
        }
    }

    let mut watch = client.watch(list_resource_version);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("received interrupt, shutting down");
                break;
            }
            event = watch.next() => {
                match event {
                    Some(Ok(ReplicaEvent::Added(replica))) => {
                        let config = config.clone();
                        let client = Arc::clone(&client);
                        let checkpoint = Arc::clone(&checkpoint);
                        tokio::spawn(async move {
                            if let Err(e) = process_replica(&config, client, replica, &checkpoint).await {
                                tracing::warn!("failed to process watch replica: {e}");
                            }
                        });
                    }
                    Some(Ok(ReplicaEvent::Modified(_) | ReplicaEvent::Deleted(_))) => {
                        // The recorder only reacts to arrivals; departures
                        // are the forwarder's concern.
                    }
                    Some(Err(e)) => {
                        tracing::error!("watch error, ending recorder: {e}");
                        break;
                    }
                    None => {
                        tracing::error!("watch closed, ending recorder");
                        break;
                    }
                }
            }
        }
    }

    flush_checkpoint(&checkpoint, &checkpoint_path).await;
    Ok(())
}

async fn flush_checkpoint(checkpoint: &Mutex<Checkpoint>, path: &Path) {
    let snapshot = checkpoint.lock().await.clone();
    if let Err(e) = snapshot.write(path).await {
        tracing::error!("failed to flush checkpoint: {e}");
    }
}

/// The per-replica processing pipeline (steps 1-6 of the startup sequence).
async fn process_replica(
    config: &RecorderConfig,
    client: Arc<dyn ClusterClient>,
    replica: Replica,
    checkpoint: &Mutex<Checkpoint>,
) -> Result<(), RecorderError> {
    tokio::time::sleep(READINESS_DELAY).await;

    let dir = config.namespace_dir();
    tokio::fs::create_dir_all(&dir).await?;

    let identity = pt_client::resolve_workload(client.as_ref(), &replica).await;
    let index_path = dir.join(metadata::index_file_name(
        identity.kind.as_file_token(),
        &identity.name,
    ));

    let creation_instant = replica.creation_instant;
    let replica_name = replica.name.clone();
    tokio::task::spawn_blocking(move || metadata::append_line(&index_path, creation_instant, &replica_name))
        .await
        .map_err(|e| RecorderError::LocalIo(anyhow::anyhow!("metadata writer task panicked: {e}")))??;

    {
        let mut guard = checkpoint.lock().await;
        guard.last_resource_version = replica.resource_version.clone();
    }

    let tailer_dir = dir;
    tokio::spawn(async move {
        tailer::tail(client, &tailer_dir, replica).await;
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use futures::stream::BoxStream;
    use pt_client::{ClientError, LogStream, OwnerChainNode, PortForward};

    struct FakeClusterClient {
        replicas: Vec<Replica>,
        replica_sets: std::collections::HashMap<String, OwnerChainNode>,
    }

    #[async_trait]
    impl ClusterClient for FakeClusterClient {
        async fn list(&self, _resource_version: Option<&str>) -> Result<(Vec<Replica>, String), ClientError> {
            Ok((self.replicas.clone(), "100".to_string()))
        }

        fn watch(&self, _resource_version: String) -> BoxStream<'static, Result<ReplicaEvent, ClientError>> {
            Box::pin(futures::stream::pending::<Result<ReplicaEvent, ClientError>>())
        }

        async fn fetch_replica_set(&self, _namespace: &str, name: &str) -> Result<OwnerChainNode, ClientError> {
            match self.replica_sets.get(name).cloned() {
                Some(node) => Ok(node),
                None => unreachable!("fixtures in this test have no owner {name}"),
            }
        }

        async fn fetch_deployment(&self, _namespace: &str, _name: &str) -> Result<OwnerChainNode, ClientError> {
            unreachable!("fixtures in this test have no deployment owners")
        }

        async fn open_log_stream(&self, _replica: &Replica, _follow: bool) -> Result<LogStream, ClientError> {
            Ok(Box::pin(tokio::io::empty()))
        }

        async fn open_port_forward(
            &self,
            _replica: &Replica,
            _host_port: u16,
            _container_port: u16,
        ) -> Result<PortForward, ClientError> {
            unreachable!()
        }
    }

    fn replica(name: &str, hour: u32, minute: u32, second: u32) -> Replica {
        Replica {
            namespace: "default".into(),
            name: name.into(),
            uid: format!("uid-{name}"),
            creation_instant: chrono::Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, second).unwrap(),
            resource_version: name.into(),
            owner: None,
        }
    }

    fn replica_owned_by_replica_set(
        name: &str,
        hour: u32,
        minute: u32,
        second: u32,
        replica_set: &str,
    ) -> Replica {
        Replica {
            owner: Some(pt_client::OwnerRef {
                kind: "ReplicaSet".into(),
                name: replica_set.into(),
            }),
            ..replica(name, hour, minute, second)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_is_sorted_by_creation_instant_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecorderConfig {
            namespace: "default".into(),
            logs_path: dir.path().to_path_buf(),
            target_kind: crate::config::TargetKind::Pod,
            label_selector: None,
        };

        let client: Arc<dyn ClusterClient> = Arc::new(FakeClusterClient {
            replicas: vec![
                replica("r1", 10, 0, 0),
                replica("r2", 9, 59, 0),
                replica("r3", 10, 0, 30),
            ],
            replica_sets: std::collections::HashMap::new(),
        });

        let shutdown = async {
            tokio::time::sleep(Duration::from_secs(6)).await;
        };

        run(config.clone(), client, shutdown).await.unwrap();

        let index_path = config.namespace_dir().join("pod.r1.metadata");
        // Standalone pods with no owner each get their own metadata file
        // named after themselves; r1's file has exactly one line.
        let contents = std::fs::read_to_string(&index_path).unwrap();
        assert_eq!(contents, "2024-01-01 10:00:00 ; r1\n");
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_groups_replicas_sharing_a_replica_set_owner_into_one_sorted_index() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecorderConfig {
            namespace: "default".into(),
            logs_path: dir.path().to_path_buf(),
            target_kind: crate::config::TargetKind::ReplicaSet,
            label_selector: None,
        };

        let mut replica_sets = std::collections::HashMap::new();
        replica_sets.insert(
            "rs1".to_string(),
            OwnerChainNode {
                identity: pt_client::WorkloadIdentity {
                    kind: pt_client::WorkloadKind::ReplicaSet,
                    name: "rs1".into(),
                },
                next: None,
            },
        );

        let client: Arc<dyn ClusterClient> = Arc::new(FakeClusterClient {
            // Server order deliberately does not match creation order.
            replicas: vec![
                replica_owned_by_replica_set("r1", 10, 0, 0, "rs1"),
                replica_owned_by_replica_set("r2", 9, 59, 0, "rs1"),
                replica_owned_by_replica_set("r3", 10, 0, 30, "rs1"),
            ],
            replica_sets,
        });

        let shutdown = async {
            tokio::time::sleep(Duration::from_secs(6)).await;
        };

        run(config.clone(), client, shutdown).await.unwrap();

        let index_path = config.namespace_dir().join("replicaset.rs1.metadata");
        let contents = std::fs::read_to_string(&index_path).unwrap();
        assert_eq!(
            contents,
            "2024-01-01 09:59:00 ; r2\n2024-01-01 10:00:00 ; r1\n2024-01-01 10:00:30 ; r3\n"
        );
    }
}
