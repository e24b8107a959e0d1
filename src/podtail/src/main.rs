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

//! The `podtail` command-line frame: wires argument parsing to the
//! recorder supervisor, the forwarder, and the peripheral log commands.

mod cli;

use std::process;
use std::sync::Arc;

use pt_archive::IndexKind;
use pt_config::Config;
use pt_ore::error::ErrorExt;
use pt_supervisor::{RecordSelectors, Supervisor};

use cli::{Cli, Command, LogsAction, RecordAction};

#[tokio::main]
async fn main() {
    pt_ore::tracing::init_stderr_tracing();
    let cli: Cli = pt_ore::cli::parse_args();
    if let Err(err) = run(cli).await {
        eprintln!("podtail: fatal: {}", err.display_with_causes());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Logs { action } => run_logs(action).await,
        Command::PortForward(args) => run_port_forward(args).await,
    }
}

async fn run_logs(action: LogsAction) -> anyhow::Result<()> {
    match action {
        LogsAction::Record {
            action,
            labels,
            namespace,
            target_kind,
        } => run_record(action, labels, namespace, target_kind),
        LogsAction::Show {
            name,
            max_pods,
            latest,
            max_lines,
            end_of_file,
            only_names,
            namespace,
            target_kind,
        } => run_show(
            name,
            max_pods,
            latest,
            max_lines,
            end_of_file,
            only_names,
            namespace,
            target_kind,
        ),
        LogsAction::Diff {
            name,
            namespace,
            target_kind,
        } => run_diff(name, namespace, target_kind),
        LogsAction::Cleanup { hard, namespace } => run_cleanup(hard, namespace),
        LogsAction::Import { source } => run_import(source),
        LogsAction::Export { dest } => run_export(dest),
    }
}

fn run_record(
    action: RecordAction,
    labels: Option<String>,
    namespace: String,
    target_kind: String,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let mut supervisor = Supervisor::new(config);
    let selectors = RecordSelectors {
        namespace,
        target_kind,
        label_selector: labels,
    };
    match action {
        RecordAction::Run => {
            let pid = supervisor.start(selectors)?;
            println!(
                "{}",
                pt_config::color_line(&format!("recorder started with pid {pid}"), pt_config::COLOR_GREEN)
            );
        }
        RecordAction::Stop => {
            supervisor.stop()?;
            println!("{}", pt_config::color_line("recorder stopped", pt_config::COLOR_GREEN));
        }
        RecordAction::Restart => {
            let pid = supervisor.restart(selectors)?;
            println!(
                "{}",
                pt_config::color_line(&format!("recorder restarted with pid {pid}"), pt_config::COLOR_GREEN)
            );
        }
        RecordAction::Status => match supervisor.status() {
            Some(pid) => println!("recorder running with pid {pid}"),
            None => println!("recorder not running"),
        },
    }
    supervisor.config().save()?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_show(
    name: String,
    max_pods: usize,
    latest: bool,
    max_lines: Option<usize>,
    end_of_file: bool,
    only_names: bool,
    namespace: String,
    target_kind: String,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let namespace_dir = config.logs_path.join(&namespace);

    if target_kind == "pod" {
        let shown = pt_archive::show::show_pod(&namespace_dir, &name)?;
        println!("-------------------------------------------");
        println!("Logs from pod {}:\n{}", shown.replica_name, shown.contents.unwrap_or_default());
        config.save()?;
        return Ok(());
    }

    let kind = parse_index_kind(&target_kind)?;
    let options = pt_archive::show::ShowOptions {
        max_pods,
        latest_first: latest,
        max_lines,
        end_of_file,
        only_names,
    };
    let shown = pt_archive::show::show_workload(&namespace_dir, kind, &name, &options)?;
    for log in &shown {
        println!("-------------------------------------------");
        match &log.contents {
            Some(contents) => println!("Logs from pod {}:\n{}", log.replica_name, contents),
            None => println!("{}", log.replica_name),
        }
    }
    println!("Total correlated pods found for {name} = {}", shown.len());
    config.save()?;
    Ok(())
}

fn run_diff(name: String, namespace: String, target_kind: String) -> anyhow::Result<()> {
    let config = Config::load()?;
    if target_kind == "pod" {
        println!("Diff are not available for pod: {name}");
        config.save()?;
        return Ok(());
    }
    let namespace_dir = config.logs_path.join(&namespace);
    let kind = parse_index_kind(&target_kind)?;
    let diffs = pt_archive::diff::diff_workload(&namespace_dir, kind, &name)?;
    if diffs.is_empty() {
        println!("No diff available for single pod: {name}");
        config.save()?;
        return Ok(());
    }
    for diff in &diffs {
        println!(
            "{}",
            pt_config::color_line(&format!("Diff between {} and {}:", diff.from_pod, diff.to_pod), pt_config::COLOR_YELLOW)
        );
        println!("{}", pt_archive::diff::render_colored(diff));
        println!("--------------------------------------------------");
    }
    println!("End of diff logs");
    println!("Total pods: {}", diffs.len() + 1);
    config.save()?;
    Ok(())
}

fn run_cleanup(hard: bool, namespace: String) -> anyhow::Result<()> {
    let config = Config::load()?;
    println!("Cleaning up logs...");
    if hard {
        pt_archive::cleanup::cleanup_all(&config.logs_path)?;
    } else {
        pt_archive::cleanup::cleanup_namespace(&config.logs_path, &namespace)?;
    }
    println!("{}", pt_config::color_line("Logs cleaned up successfully.", pt_config::COLOR_GREEN));
    config.save()?;
    Ok(())
}

fn run_import(source: std::path::PathBuf) -> anyhow::Result<()> {
    let config = Config::load()?;
    pt_archive::archive::import(&source, &config.logs_path)?;
    println!("{}", pt_config::color_line("import complete", pt_config::COLOR_GREEN));
    config.save()?;
    Ok(())
}

fn run_export(dest: std::path::PathBuf) -> anyhow::Result<()> {
    let config = Config::load()?;
    pt_archive::archive::export(&config.logs_path, &dest)?;
    println!("{}", pt_config::color_line("export complete", pt_config::COLOR_GREEN));
    config.save()?;
    Ok(())
}

async fn run_port_forward(args: cli::PortForwardArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let kube_client = kube::Client::try_default().await?;
    let cluster_client: Arc<dyn pt_client::ClusterClient> = Arc::new(pt_client::KubeClusterClient::new(
        kube_client,
        args.namespace,
        args.labels,
    ));

    let forwarder_config = pt_forwarder::ForwarderConfig {
        host_port: args.hostport,
        container_port: args.containerport,
        policy_name: args.policy,
    };
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    pt_forwarder::run(forwarder_config, cluster_client, shutdown).await?;
    config.save()?;
    Ok(())
}

fn parse_index_kind(raw: &str) -> anyhow::Result<IndexKind> {
    match raw {
        "deployment" => Ok(IndexKind::Deployment),
        "replicaset" => Ok(IndexKind::ReplicaSet),
        other => anyhow::bail!("unsupported --type {other:?} for this command"),
    }
}
