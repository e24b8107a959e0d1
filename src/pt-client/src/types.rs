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

//! Data types shared by the cluster client and its callers.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference as K8sOwnerReference;

/// The immediate owner of a replica or replica-set, as recorded in its
/// `ownerReferences`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
}

/// One running instance of a workload (a pod).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replica {
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub creation_instant: DateTime<Utc>,
    pub resource_version: String,
    pub owner: Option<OwnerRef>,
}

impl Replica {
    /// Builds a [`Replica`] from a raw [`Pod`], discarding anything the
    /// recorder and forwarder never need.
    pub fn from_pod(pod: &Pod) -> Option<Replica> {
        let meta = &pod.metadata;
        let namespace = meta.namespace.clone()?;
        let name = meta.name.clone()?;
        let uid = meta.uid.clone().unwrap_or_default();
        let resource_version = meta.resource_version.clone().unwrap_or_default();
        let creation_instant = meta
            .creation_timestamp
            .as_ref()
            .map(|t| t.0)
            .unwrap_or_else(Utc::now);
        let owner = first_owner(meta.owner_references.as_deref());
        Some(Replica {
            namespace,
            name,
            uid,
            creation_instant,
            resource_version,
            owner,
        })
    }
}

pub(crate) fn first_owner(refs: Option<&[K8sOwnerReference]>) -> Option<OwnerRef> {
    refs.and_then(|refs| refs.first()).map(|r| OwnerRef {
        kind: r.kind.clone(),
        name: r.name.clone(),
    })
}

/// A lifecycle event observed on the replica watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaEvent {
    Added(Replica),
    Modified(Replica),
    Deleted(Replica),
}

/// The kind of node in the ownership chain (see [`crate::ownership`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Replica,
    ReplicaSet,
    Deployment,
}

impl WorkloadKind {
    /// The lowercase token used in metadata-index file names
    /// (`<kind>.<name>.metadata`).
    pub fn as_file_token(self) -> &'static str {
        match self {
            WorkloadKind::Replica => "pod",
            WorkloadKind::ReplicaSet => "replicaset",
            WorkloadKind::Deployment => "deployment",
        }
    }
}

/// The outermost owner discovered by walking a replica's owner chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadIdentity {
    pub kind: WorkloadKind,
    pub name: String,
}

/// One node visited while walking the ownership chain: its own identity
/// plus (if any) the owner reference that should be followed next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerChainNode {
    pub identity: WorkloadIdentity,
    pub next: Option<OwnerRef>,
}
