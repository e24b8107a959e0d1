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

//! Typed facade over the cluster API used by the recorder and forwarder:
//! replica listing/watching, ownership resolution, log streaming, and
//! port-forwarding.

pub mod client;
pub mod error;
pub mod ownership;
pub mod types;

pub use client::{ClusterClient, KubeClusterClient, LogStream, PortForward};
pub use error::ClientError;
pub use ownership::resolve_workload;
pub use types::{OwnerChainNode, OwnerRef, Replica, ReplicaEvent, WorkloadIdentity, WorkloadKind};
