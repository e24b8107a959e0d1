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

//! Multi-pod TCP port-forwarder: dynamic tunnel pool (C4), pluggable
//! upstream policy (C5), and the single-listener proxy (C6).

pub mod error;
pub mod forwarder;
pub mod policy;
pub mod pool;
pub mod proxy;

pub use error::ForwarderError;
pub use forwarder::{run, ForwarderConfig};
pub use policy::PolicySelector;
pub use pool::{Pool, BASE_HOST_PORT};
