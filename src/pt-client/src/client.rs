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

//! The cluster client facade (C1): replica listing/watching, ownership
//! lookups, log streaming, and port-forwarding.

use std::net::SocketAddr;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ListParams, LogParams, WatchEvent};
use kube::{Api, Client};
use tokio::io::AsyncRead;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::io::StreamReader;

use crate::error::ClientError;
use crate::types::{first_owner, OwnerChainNode, Replica, ReplicaEvent, WorkloadIdentity, WorkloadKind};

/// A byte stream of log output, already adapted to [`AsyncRead`].
pub type LogStream = std::pin::Pin<Box<dyn AsyncRead + Send>>;

/// A running port-forward tunnel: the local address it is bound to, plus a
/// handle that, once dropped or explicitly stopped, tears the tunnel down.
pub struct PortForward {
    pub local_addr: SocketAddr,
    stop: Option<tokio::sync::oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl PortForward {
    /// Stops accepting new connections and waits for the accept loop to
    /// exit. Connections already in flight are allowed to drain.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// The facade every consumer of the cluster API (recorder, forwarder) talks
/// to, so that both can be driven by a fake in tests.
///
/// The list/watch pair is deliberately built on the low-level [`Api::list`]
/// and [`Api::watch`] calls rather than `kube::runtime::watcher`: callers
/// need the exact resource-version token the list returned, so they can
/// resume the watch from precisely that point after a restart. The
/// higher-level helper manages relist/watch internally and does not expose
/// that token.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Lists every replica currently in the namespace, along with the
    /// resource version of the list itself (the point a subsequent
    /// [`ClusterClient::watch`] should resume from).
    async fn list(&self, resource_version: Option<&str>) -> Result<(Vec<Replica>, String), ClientError>;

    /// Watches for replica lifecycle events starting just after
    /// `resource_version`. The stream ends when the underlying watch
    /// connection closes; it is not automatically reopened.
    fn watch(&self, resource_version: String) -> BoxStream<'static, Result<ReplicaEvent, ClientError>>;

    /// Fetches the replica set named `name`, returning the ownership-chain
    /// node it corresponds to.
    async fn fetch_replica_set(&self, namespace: &str, name: &str) -> Result<OwnerChainNode, ClientError>;

    /// Fetches the deployment named `name`, returning the ownership-chain
    /// node it corresponds to.
    async fn fetch_deployment(&self, namespace: &str, name: &str) -> Result<OwnerChainNode, ClientError>;

    /// Opens a byte stream of the replica's container logs.
    async fn open_log_stream(&self, replica: &Replica, follow: bool) -> Result<LogStream, ClientError>;

    /// Opens a port-forward tunnel to `replica`, binding a local TCP
    /// listener on `host_port` and forwarding each accepted connection
    /// through a freshly dialed port-forward stream to `container_port`.
    async fn open_port_forward(
        &self,
        replica: &Replica,
        host_port: u16,
        container_port: u16,
    ) -> Result<PortForward, ClientError>;
}

/// A [`ClusterClient`] backed by a real cluster connection.
pub struct KubeClusterClient {
    namespace: String,
    pod_api: Api<Pod>,
    replica_set_api: Api<ReplicaSet>,
    deployment_api: Api<Deployment>,
    label_selector: Option<String>,
}

impl KubeClusterClient {
    pub fn new(client: Client, namespace: String, label_selector: Option<String>) -> KubeClusterClient {
        KubeClusterClient {
            pod_api: Api::namespaced(client.clone(), &namespace),
            replica_set_api: Api::namespaced(client.clone(), &namespace),
            deployment_api: Api::namespaced(client, &namespace),
            namespace,
            label_selector,
        }
    }

    fn list_params(&self) -> ListParams {
        let mut params = ListParams::default();
        if let Some(selector) = &self.label_selector {
            params = params.labels(selector);
        }
        params
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list(&self, _resource_version: Option<&str>) -> Result<(Vec<Replica>, String), ClientError> {
        let list = self.pod_api.list(&self.list_params()).await?;
        let resource_version = list.metadata.resource_version.clone().unwrap_or_default();
        let replicas = list.items.iter().filter_map(Replica::from_pod).collect();
        Ok((replicas, resource_version))
    }

    fn watch(&self, resource_version: String) -> BoxStream<'static, Result<ReplicaEvent, ClientError>> {
        let api = self.pod_api.clone();
        let params = self.list_params();
        let stream = async_stream::try_stream! {
            let mut stream = api.watch(&params, &resource_version).await?.boxed();
            while let Some(event) = stream.try_next().await? {
                match event {
                    WatchEvent::Added(pod) => {
                        if let Some(replica) = Replica::from_pod(&pod) {
                            yield ReplicaEvent::Added(replica);
                        }
                    }
                    WatchEvent::Modified(pod) => {
                        if let Some(replica) = Replica::from_pod(&pod) {
                            yield ReplicaEvent::Modified(replica);
                        }
                    }
                    WatchEvent::Deleted(pod) => {
                        if let Some(replica) = Replica::from_pod(&pod) {
                            yield ReplicaEvent::Deleted(replica);
                        }
                    }
                    WatchEvent::Bookmark(_) => {}
                    WatchEvent::Error(e) => {
                        tracing::warn!("replica watch error: {e}");
                    }
                }
            }
        };
        Box::pin(stream.map_err(ClientError::from))
    }

    async fn fetch_replica_set(&self, _namespace: &str, name: &str) -> Result<OwnerChainNode, ClientError> {
        let replica_set = self.replica_set_api.get(name).await?;
        let next = first_owner(replica_set.metadata.owner_references.as_deref());
        Ok(OwnerChainNode {
            identity: WorkloadIdentity {
                kind: WorkloadKind::ReplicaSet,
                name: name.to_string(),
            },
            next,
        })
    }

    async fn fetch_deployment(&self, _namespace: &str, name: &str) -> Result<OwnerChainNode, ClientError> {
        let deployment = self.deployment_api.get(name).await?;
        let next = first_owner(deployment.metadata.owner_references.as_deref());
        Ok(OwnerChainNode {
            identity: WorkloadIdentity {
                kind: WorkloadKind::Deployment,
                name: name.to_string(),
            },
            next,
        })
    }

    async fn open_log_stream(&self, replica: &Replica, follow: bool) -> Result<LogStream, ClientError> {
        let params = LogParams {
            follow,
            ..LogParams::default()
        };
        let stream = self
            .pod_api
            .log_stream(&replica.name, &params)
            .await?
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        Ok(Box::pin(StreamReader::new(stream)))
    }

    async fn open_port_forward(
        &self,
        replica: &Replica,
        host_port: u16,
        container_port: u16,
    ) -> Result<PortForward, ClientError> {
        let bind_addr: SocketAddr = ([127, 0, 0, 1], host_port).into();
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| ClientError::TransientRemote(e.into()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ClientError::TransientRemote(e.into()))?;

        let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel();
        let pod_api = self.pod_api.clone();
        let pod_name = replica.name.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    accepted = listener.accept() => {
                        let Ok((conn, _)) = accepted else { continue };
                        let pod_api = pod_api.clone();
                        let pod_name = pod_name.clone();
                        tokio::spawn(async move {
                            if let Err(e) =
                                relay_one_connection(&pod_api, &pod_name, container_port, conn).await
                            {
                                tracing::warn!("port-forward connection failed: {e}");
                            }
                        });
                    }
                }
            }
        });

        Ok(PortForward {
            local_addr,
            stop: Some(stop_tx),
            task: Some(task),
        })
    }
}

/// Dials a fresh port-forward stream for one accepted local connection and
/// copies bytes bidirectionally until either side closes, mirroring
/// `portforward.New(...).ForwardPorts()` from client-go: every local
/// connection gets its own upgraded stream rather than sharing one.
async fn relay_one_connection(
    pod_api: &Api<Pod>,
    pod_name: &str,
    container_port: u16,
    mut local: TcpStream,
) -> anyhow::Result<()> {
    let mut forwarder = pod_api.portforward(pod_name, &[container_port]).await?;
    let mut upstream = forwarder
        .take_stream(container_port)
        .ok_or_else(|| anyhow::anyhow!("no upstream stream for port {container_port}"))?;

    let (mut local_read, mut local_write) = local.split();
    let (mut upstream_read, mut upstream_write) = tokio::io::split(&mut upstream);

    let client_to_upstream = tokio::io::copy(&mut local_read, &mut upstream_write);
    let upstream_to_client = tokio::io::copy(&mut upstream_read, &mut local_write);

    tokio::select! {
        r = client_to_upstream => { r?; }
        r = upstream_to_client => { r?; }
    }

    let _ = forwarder.join().await;
    Ok(())
}
