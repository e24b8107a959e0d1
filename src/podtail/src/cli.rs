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

//! The command-line surface (§6): `logs record`, `logs show`, `logs diff`,
//! `logs cleanup`, `logs import`/`logs export`, and `port-forward`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "podtail", version, about = "Observe and forward traffic to replicated Kubernetes workloads.")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Operations on the recorded logs directory.
    Logs {
        #[clap(subcommand)]
        action: LogsAction,
    },
    /// Runs the multi-pod TCP port-forwarder.
    PortForward(PortForwardArgs),
}

#[derive(Subcommand, Debug)]
pub enum LogsAction {
    /// Starts, stops, restarts, or reports on the recorder daemon.
    Record {
        #[clap(subcommand)]
        action: RecordAction,
        #[clap(long, env = "LABELS")]
        labels: Option<String>,
        #[clap(long, env = "NAMESPACE", default_value = "default")]
        namespace: String,
        #[clap(long = "type", default_value = "pod")]
        target_kind: String,
    },
    /// Prints a replica's log, or every replica's log for a workload.
    Show {
        name: String,
        #[clap(long, default_value_t = usize::MAX)]
        max_pods: usize,
        #[clap(long)]
        latest: bool,
        #[clap(long)]
        max_lines: Option<usize>,
        #[clap(long)]
        end_of_file: bool,
        #[clap(long)]
        only_names: bool,
        #[clap(long, default_value = "default")]
        namespace: String,
        #[clap(long = "type", default_value = "pod")]
        target_kind: String,
    },
    /// Pairwise unified diff between consecutive replicas of a workload.
    Diff {
        name: String,
        #[clap(long, default_value = "default")]
        namespace: String,
        #[clap(long = "type", default_value = "deployment")]
        target_kind: String,
    },
    /// Removes one namespace's logs, or the entire logs root with `--hard`.
    Cleanup {
        #[clap(long)]
        hard: bool,
        #[clap(long, default_value = "default")]
        namespace: String,
    },
    /// Imports a gzip+tar archive previously produced by `export`.
    Import {
        #[clap(long)]
        source: PathBuf,
    },
    /// Exports the logs directory tree as a gzip+tar archive.
    Export {
        #[clap(long)]
        dest: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecordAction {
    Run,
    Stop,
    Restart,
    Status,
}

#[derive(clap::Args, Debug)]
pub struct PortForwardArgs {
    #[clap(long, default_value = "round-robin")]
    pub policy: String,
    #[clap(long)]
    pub hostport: u16,
    #[clap(long)]
    pub containerport: u16,
    #[clap(long, env = "LABELS")]
    pub labels: Option<String>,
    #[clap(long, env = "NAMESPACE", default_value = "default")]
    pub namespace: String,
}
