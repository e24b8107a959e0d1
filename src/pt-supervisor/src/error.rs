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

//! The supervisor's error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("recorder already running with PID {0}")]
    AlreadyRunning(u32),

    #[error("recorder is not running")]
    NotRunning,

    #[error("local I/O error: {0}")]
    LocalIo(#[source] anyhow::Error),
}

impl From<std::io::Error> for SupervisorError {
    fn from(err: std::io::Error) -> Self {
        SupervisorError::LocalIo(err.into())
    }
}

impl From<anyhow::Error> for SupervisorError {
    fn from(err: anyhow::Error) -> Self {
        SupervisorError::LocalIo(err)
    }
}
