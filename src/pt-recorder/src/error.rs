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

//! The recorder's error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("local filesystem error: {0}")]
    LocalIo(#[source] anyhow::Error),

    #[error(transparent)]
    Client(#[from] pt_client::ClientError),
}

impl From<std::io::Error> for RecorderError {
    fn from(err: std::io::Error) -> Self {
        RecorderError::LocalIo(err.into())
    }
}
