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

//! Entry point for the detached recorder process the supervisor spawns.
//! Configuration comes entirely from the environment (`NAMESPACE`,
//! `LOGS_PATH`, `TYPE`, `LABELS`); there is no command-line surface here.

use std::sync::Arc;

use pt_client::KubeClusterClient;
use pt_recorder::RecorderConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RecorderConfig::from_env();
    std::fs::create_dir_all(config.namespace_dir())?;
    pt_ore::tracing::init_file_tracing(&config.debug_file_path())?;

    tracing::info!("starting recorder in namespace {}", config.namespace);

    let kube_client = kube::Client::try_default().await?;
    let cluster_client: Arc<dyn pt_client::ClusterClient> = Arc::new(KubeClusterClient::new(
        kube_client,
        config.namespace.clone(),
        config.label_selector.clone(),
    ));

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    if let Err(e) = pt_recorder::run(config, cluster_client, shutdown).await {
        tracing::error!("{}", pt_ore::error::ErrorExt::display_with_causes(&e));
        std::process::exit(1);
    }

    Ok(())
}
