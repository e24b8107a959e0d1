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

//! The recorder reads its configuration entirely from the environment the
//! supervisor passes to the detached child process (see `NAMESPACE`,
//! `LOGS_PATH`, `TYPE`, `LABELS` in the external-interfaces section).

use std::env;
use std::path::PathBuf;

/// The workload kind the supervisor was asked to record, as passed through
/// `TYPE`. Only used for logging; the recorder itself always starts from a
/// replica (pod) and walks upward via the ownership walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Pod,
    Deployment,
    ReplicaSet,
}

impl TargetKind {
    fn parse(raw: &str) -> TargetKind {
        match raw {
            "deployment" => TargetKind::Deployment,
            "replicaset" => TargetKind::ReplicaSet,
            _ => TargetKind::Pod,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub namespace: String,
    pub logs_path: PathBuf,
    pub target_kind: TargetKind,
    pub label_selector: Option<String>,
}

impl RecorderConfig {
    /// Reads the configuration from the process environment. Panics are
    /// avoided in favor of permissive defaults: a missing `NAMESPACE`
    /// defaults to `"default"`, matching the command-line frame's own
    /// default.
    pub fn from_env() -> RecorderConfig {
        let namespace = env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());
        let logs_path = env::var("LOGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".k8sdebug-logs"));
        let target_kind = env::var("TYPE")
            .map(|raw| TargetKind::parse(&raw))
            .unwrap_or(TargetKind::Pod);
        let label_selector = env::var("LABELS").ok().filter(|s| !s.is_empty());
        RecorderConfig {
            namespace,
            logs_path,
            target_kind,
            label_selector,
        }
    }

    pub fn namespace_dir(&self) -> PathBuf {
        self.logs_path.join(&self.namespace)
    }

    pub fn debug_file_path(&self) -> PathBuf {
        self.namespace_dir().join(".k8s.debug")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.logs_path.join("checkpoint.json")
    }
}
