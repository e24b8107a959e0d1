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

//! Wires the cluster client's watch into the pool, and runs the pool and
//! the proxy listener side by side until shutdown.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use pt_client::{ClusterClient, ReplicaEvent};

use crate::error::ForwarderError;
use crate::pool::Pool;
use crate::{policy, proxy};

pub struct ForwarderConfig {
    pub host_port: u16,
    pub container_port: u16,
    pub policy_name: String,
}

/// Runs the forwarder: an initial snapshot of tunnels pinned to slots
/// `0..N`, a watch loop that adds/removes tunnels as replicas come and go,
/// and the proxy listener, all torn down together when `shutdown` resolves.
pub async fn run(
    config: ForwarderConfig,
    client: Arc<dyn ClusterClient>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ForwarderError> {
    let pool = Arc::new(Pool::new());
    let selector = policy::build(&config.policy_name, Arc::clone(&pool))?;

    let (replicas, resource_version) = client.list(None).await?;
    for (index, replica) in replicas.iter().enumerate() {
        if let Err(e) = pool
            .start_tunnel(client.as_ref(), replica, config.container_port, Some(index))
            .await
        {
            tracing::warn!("failed to start initial tunnel for {}: {e}", replica.name);
        }
    }
    tracing::info!("forwarder listening across {} replicas", replicas.len());

    let watch_client = Arc::clone(&client);
    let watch_pool = Arc::clone(&pool);
    let container_port = config.container_port;
    let (watch_stop_tx, mut watch_stop_rx) = tokio::sync::oneshot::channel::<()>();
    let watch_task = tokio::spawn(async move {
        let mut watch = watch_client.watch(resource_version);
        loop {
            tokio::select! {
                _ = &mut watch_stop_rx => break,
                event = watch.next() => {
                    match event {
                        Some(Ok(ReplicaEvent::Added(replica))) => {
                            if let Err(e) = watch_pool
                                .start_tunnel(watch_client.as_ref(), &replica, container_port, None)
                                .await
                            {
                                tracing::warn!("failed to start tunnel for {}: {e}", replica.name);
                            }
                        }
                        Some(Ok(ReplicaEvent::Deleted(replica))) => {
                            watch_pool.teardown_tunnel(&replica.name).await;
                        }
                        Some(Ok(ReplicaEvent::Modified(_))) => {}
                        Some(Err(e)) => {
                            tracing::error!("forwarder watch error: {e}");
                            break;
                        }
                        None => {
                            tracing::error!("forwarder watch closed");
                            break;
                        }
                    }
                }
            }
        }
    });

    let proxy_result = proxy::serve(config.host_port, selector, shutdown).await;
    let _ = watch_stop_tx.send(());
    let _ = watch_task.await;
    proxy_result
}
