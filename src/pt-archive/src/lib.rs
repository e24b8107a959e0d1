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

//! Peripheral file-tree commands layered on top of the recorder's logs
//! directory: cleanup, archive import/export, log diffing, and log display.
//! None of these touch C1-C7's invariants; they only read or remove files
//! the recorder already wrote.

pub mod archive;
pub mod cleanup;
pub mod diff;
pub mod error;
pub mod index;
pub mod show;

pub use error::ArchiveError;
pub use index::IndexKind;
