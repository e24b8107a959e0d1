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

//! Small internal utilities shared across the podtail crates.
//!
//! Kept intentionally thin, in the style of an internal "extends the
//! stdlib" crate: every non-trivial dependency is feature-gated so
//! downstream crates only pay for what they use.

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "tracing_")]
pub mod error;
#[cfg(feature = "tracing_")]
pub mod tracing;
