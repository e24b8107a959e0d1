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

//! Ownership chain traversal (C2).
//!
//! Walks `replica -> first owner of kind "ReplicaSet" -> first owner of
//! kind "Deployment"`, returning the outermost node reached. The chain is
//! short by construction (at most two hops), so this is a plain loop over
//! a small tagged node rather than an open-ended trait hierarchy.

use crate::types::{OwnerChainNode, OwnerRef, Replica, WorkloadIdentity, WorkloadKind};
use crate::ClusterClient;

/// Resolves the outermost workload identity owning `replica`.
///
/// Fetch errors are non-fatal: the walk simply stops and returns the last
/// node it successfully reached.
pub async fn resolve_workload(
    client: &dyn ClusterClient,
    replica: &Replica,
) -> WorkloadIdentity {
    let mut current = OwnerChainNode {
        identity: WorkloadIdentity {
            kind: WorkloadKind::Replica,
            name: replica.name.clone(),
        },
        next: replica.owner.clone(),
    };

    loop {
        let Some(owner) = current.next.clone() else {
            break;
        };
        let node = match next_node(client, &replica.namespace, &owner).await {
            Some(node) => node,
            None => break,
        };
        current = node;
    }

    current.identity
}

async fn next_node(
    client: &dyn ClusterClient,
    namespace: &str,
    owner: &OwnerRef,
) -> Option<OwnerChainNode> {
    match owner.kind.as_str() {
        "ReplicaSet" => client
            .fetch_replica_set(namespace, &owner.name)
            .await
            .ok(),
        "Deployment" => client
            .fetch_deployment(namespace, &owner.name)
            .await
            .ok(),
        // Not a recognized kind: short-circuit here.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::{LogStream, PortForward};
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::collections::HashMap;

    struct MockClient {
        replica_sets: HashMap<String, OwnerChainNode>,
        deployments: HashMap<String, OwnerChainNode>,
    }

    #[async_trait]
    impl ClusterClient for MockClient {
        async fn list(
            &self,
            _resource_version: Option<&str>,
        ) -> Result<(Vec<Replica>, String), ClientError> {
            unimplemented!()
        }

        fn watch(
            &self,
            _resource_version: String,
        ) -> BoxStream<'static, Result<crate::types::ReplicaEvent, ClientError>> {
            unimplemented!()
        }

        async fn fetch_replica_set(
            &self,
            _namespace: &str,
            name: &str,
        ) -> Result<OwnerChainNode, ClientError> {
            self.replica_sets
                .get(name)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(name.to_string()))
        }

        async fn fetch_deployment(
            &self,
            _namespace: &str,
            name: &str,
        ) -> Result<OwnerChainNode, ClientError> {
            self.deployments
                .get(name)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(name.to_string()))
        }

        async fn open_log_stream(
            &self,
            _replica: &Replica,
            _follow: bool,
        ) -> Result<LogStream, ClientError> {
            unimplemented!()
        }

        async fn open_port_forward(
            &self,
            _replica: &Replica,
            _host_port: u16,
            _container_port: u16,
        ) -> Result<PortForward, ClientError> {
            unimplemented!()
        }
    }

    fn replica_with_owner(owner: Option<OwnerRef>) -> Replica {
        Replica {
            namespace: "ns".into(),
            name: "r1".into(),
            uid: "uid-1".into(),
            creation_instant: chrono::Utc::now(),
            resource_version: "1".into(),
            owner,
        }
    }

    #[tokio::test]
    async fn standalone_replica_has_no_owner() {
        let client = MockClient {
            replica_sets: HashMap::new(),
            deployments: HashMap::new(),
        };
        let replica = replica_with_owner(None);
        let identity = resolve_workload(&client, &replica).await;
        assert_eq!(identity.kind, WorkloadKind::Replica);
        assert_eq!(identity.name, "r1");
    }

    #[tokio::test]
    async fn standalone_replica_set_stops_at_replica_set() {
        let mut replica_sets = HashMap::new();
        replica_sets.insert(
            "rs1".to_string(),
            OwnerChainNode {
                identity: WorkloadIdentity {
                    kind: WorkloadKind::ReplicaSet,
                    name: "rs1".into(),
                },
                next: None,
            },
        );
        let client = MockClient {
            replica_sets,
            deployments: HashMap::new(),
        };
        let replica = replica_with_owner(Some(OwnerRef {
            kind: "ReplicaSet".into(),
            name: "rs1".into(),
        }));
        let identity = resolve_workload(&client, &replica).await;
        assert_eq!(identity.kind, WorkloadKind::ReplicaSet);
        assert_eq!(identity.name, "rs1");
    }

    #[tokio::test]
    async fn full_chain_resolves_to_deployment() {
        let mut replica_sets = HashMap::new();
        replica_sets.insert(
            "rs1".to_string(),
            OwnerChainNode {
                identity: WorkloadIdentity {
                    kind: WorkloadKind::ReplicaSet,
                    name: "rs1".into(),
                },
                next: Some(OwnerRef {
                    kind: "Deployment".into(),
                    name: "dep1".into(),
                }),
            },
        );
        let mut deployments = HashMap::new();
        deployments.insert(
            "dep1".to_string(),
            OwnerChainNode {
                identity: WorkloadIdentity {
                    kind: WorkloadKind::Deployment,
                    name: "dep1".into(),
                },
                next: None,
            },
        );
        let client = MockClient {
            replica_sets,
            deployments,
        };
        let replica = replica_with_owner(Some(OwnerRef {
            kind: "ReplicaSet".into(),
            name: "rs1".into(),
        }));
        let identity = resolve_workload(&client, &replica).await;
        assert_eq!(identity.kind, WorkloadKind::Deployment);
        assert_eq!(identity.name, "dep1");
    }

    #[tokio::test]
    async fn fetch_error_degrades_to_last_successful_node() {
        let client = MockClient {
            replica_sets: HashMap::new(),
            deployments: HashMap::new(),
        };
        let replica = replica_with_owner(Some(OwnerRef {
            kind: "ReplicaSet".into(),
            name: "missing-rs".into(),
        }));
        let identity = resolve_workload(&client, &replica).await;
        assert_eq!(identity.kind, WorkloadKind::Replica);
        assert_eq!(identity.name, "r1");
    }

    #[tokio::test]
    async fn unrecognized_owner_kind_short_circuits() {
        let client = MockClient {
            replica_sets: HashMap::new(),
            deployments: HashMap::new(),
        };
        let replica = replica_with_owner(Some(OwnerRef {
            kind: "StatefulSet".into(),
            name: "ss1".into(),
        }));
        let identity = resolve_workload(&client, &replica).await;
        assert_eq!(identity.kind, WorkloadKind::Replica);
    }
}
