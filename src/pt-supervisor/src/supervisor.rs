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

//! Starts, stops, and probes the recorder as a detached child process,
//! persisting its PID to the shared `pt-config` env-file so the check
//! survives across separate command-line invocations.

use std::env;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use pt_config::Config;

use crate::error::SupervisorError;
use crate::process;

/// Selectors forwarded to the recorder child via the environment (§6:
/// `NAMESPACE`, `LOGS_PATH`, `TYPE`, `LABELS`).
pub struct RecordSelectors {
    pub namespace: String,
    pub target_kind: String,
    pub label_selector: Option<String>,
}

pub struct Supervisor {
    config: Config,
}

impl Supervisor {
    pub fn new(config: Config) -> Supervisor {
        Supervisor { config }
    }

    /// The persisted config this supervisor operates on, for callers that
    /// need to rewrite it on command exit even when no mutating operation
    /// (`start`/`stop`/`restart`) ran, e.g. `status`.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts the recorder if none is already alive; refuses otherwise.
    pub fn start(&mut self, selectors: RecordSelectors) -> Result<u32, SupervisorError> {
        if self.config.logger_pid != 0 && process::is_alive(self.config.logger_pid) {
            return Err(SupervisorError::AlreadyRunning(self.config.logger_pid));
        }

        let binary = recorder_binary_path()?;
        let mut command = Command::new(&binary);
        command
            .env("NAMESPACE", &selectors.namespace)
            .env("LOGS_PATH", &self.config.logs_path)
            .env("TYPE", &selectors.target_kind)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(labels) = &selectors.label_selector {
            command.env("LABELS", labels);
        }

        let child = command
            .spawn()
            .map_err(|e| SupervisorError::LocalIo(anyhow::anyhow!(e).context(format!(
                "spawning recorder at {}",
                binary.display()
            ))))?;
        let pid = child.id();
        // Deliberately do not wait on `child`: the recorder is meant to
        // outlive this process. Dropping the handle here does not kill it.
        std::mem::forget(child);

        self.config.logger_pid = pid;
        self.config.save()?;
        tracing::info!("recorder started with pid {pid}");
        Ok(pid)
    }

    /// Sends an interrupt to the persisted PID and clears it.
    pub fn stop(&mut self) -> Result<(), SupervisorError> {
        if self.config.logger_pid == 0 {
            return Err(SupervisorError::NotRunning);
        }
        process::interrupt(self.config.logger_pid)?;
        tracing::info!("sent interrupt to recorder pid {}", self.config.logger_pid);
        self.config.logger_pid = 0;
        self.config.save()?;
        Ok(())
    }

    pub fn restart(&mut self, selectors: RecordSelectors) -> Result<u32, SupervisorError> {
        if self.config.logger_pid != 0 {
            // A stale PID (process already dead) is not an error here; only
            // propagate genuine interrupt-send failures.
            if let Err(e) = self.stop() {
                if !matches!(e, SupervisorError::NotRunning) {
                    return Err(e);
                }
            }
            std::thread::sleep(std::time::Duration::from_millis(200));
        }
        self.start(selectors)
    }

    /// Whether a recorder is currently alive, per the persisted PID.
    pub fn status(&self) -> Option<u32> {
        if self.config.logger_pid != 0 && process::is_alive(self.config.logger_pid) {
            Some(self.config.logger_pid)
        } else {
            None
        }
    }
}

/// Locates the `pt-recorder` binary alongside the currently running
/// executable, the way a multi-binary installation lays out its sibling
/// binaries in one `bin` directory. `PT_RECORDER_BIN` overrides this for
/// development and tests.
fn recorder_binary_path() -> Result<PathBuf, SupervisorError> {
    if let Ok(path) = env::var("PT_RECORDER_BIN") {
        return Ok(PathBuf::from(path));
    }
    let exe = env::current_exe().map_err(|e| anyhow::anyhow!(e).context("resolving current executable"))?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable path has no parent directory"))?;
    let name = if cfg!(windows) { "pt-recorder.exe" } else { "pt-recorder" };
    Ok(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config(dir: &std::path::Path) -> Config {
        let path = dir.join(".env");
        let config = Config {
            logs_path: dir.join("logs"),
            logger_pid: 0,
            ..Config::default()
        };
        config.write(&path).unwrap();
        config
    }

    #[test]
    fn start_refuses_when_already_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.logger_pid = std::process::id();
        let mut supervisor = Supervisor::new(config);
        let err = supervisor
            .start(RecordSelectors {
                namespace: "default".into(),
                target_kind: "pod".into(),
                label_selector: None,
            })
            .unwrap_err();
        assert!(matches!(err, SupervisorError::AlreadyRunning(_)));
    }

    #[test]
    fn stop_without_a_running_recorder_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut supervisor = Supervisor::new(config);
        assert!(matches!(supervisor.stop(), Err(SupervisorError::NotRunning)));
    }

    #[test]
    fn status_reports_none_for_a_dead_pid() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.logger_pid = i32::MAX as u32 - 1;
        let supervisor = Supervisor::new(config);
        assert_eq!(supervisor.status(), None);
    }

    #[test]
    fn status_reports_pid_for_the_current_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.logger_pid = std::process::id();
        let supervisor = Supervisor::new(config);
        assert_eq!(supervisor.status(), Some(std::process::id()));
    }

    #[test]
    fn recorder_binary_path_honors_override() {
        std::env::set_var("PT_RECORDER_BIN", "/tmp/fake-pt-recorder");
        assert_eq!(
            recorder_binary_path().unwrap(),
            PathBuf::from("/tmp/fake-pt-recorder")
        );
        std::env::remove_var("PT_RECORDER_BIN");
    }
}
