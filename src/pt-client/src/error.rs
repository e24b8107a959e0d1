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

//! The error taxonomy used across the cluster client facade.

use thiserror::Error;

/// Errors surfaced by [`crate::ClusterClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// A network or connection failure against the cluster API. Callers may
    /// retry at their discretion.
    #[error("transient error talking to the cluster: {0}")]
    TransientRemote(#[source] anyhow::Error),

    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The cluster API rejected the request as unauthorized.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl From<kube::Error> for ClientError {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(resp) if resp.code == 404 => ClientError::NotFound(resp.message.clone()),
            kube::Error::Api(resp) if resp.code == 401 || resp.code == 403 => {
                ClientError::Unauthorized(resp.message.clone())
            }
            _ => ClientError::TransientRemote(err.into()),
        }
    }
}
