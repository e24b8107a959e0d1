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

//! The persisted `key=value` config file at `$HOME/.podtail/.env`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

const APP_DIR_NAME: &str = ".podtail";
const DEFAULT_LOGS_PATH: &str = "/tmp/podtail/logs";

/// Mirrors the two keys the command-line frame actually reads and writes:
/// `LOGS_PATH` and `LOGGER_PID`. Unknown keys are preserved on round-trip
/// but not otherwise interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub logs_path: PathBuf,
    pub logger_pid: u32,
    extra: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            logs_path: PathBuf::from(DEFAULT_LOGS_PATH),
            logger_pid: 0,
            extra: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the config file at its default location, creating an empty
    /// one (and the logs directory) if neither exists yet.
    pub fn load() -> anyhow::Result<Config> {
        let path = default_config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let config = if path.exists() {
            Config::read(&path)?
        } else {
            let config = Config::default();
            config.write(&path)?;
            config
        };
        fs::create_dir_all(&config.logs_path)
            .with_context(|| format!("creating {}", config.logs_path.display()))?;
        Ok(config)
    }

    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let mut config = Config::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "LOGS_PATH" => config.logs_path = PathBuf::from(value),
                "LOGGER_PID" => {
                    config.logger_pid = value
                        .parse()
                        .with_context(|| format!("parsing LOGGER_PID {value:?}"))?;
                }
                other => config.extra.push((other.to_string(), value.to_string())),
            }
        }
        Ok(config)
    }

    /// Writes the config back out. Called on every command exit, per the
    /// command-line frame's own convention.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let mut contents = String::new();
        contents.push_str(&format!("LOGS_PATH={}\n", self.logs_path.display()));
        contents.push_str(&format!("LOGGER_PID={}\n", self.logger_pid));
        for (key, value) in &self.extra {
            contents.push_str(&format!("{key}={value}\n"));
        }
        fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.write(&default_config_path()?)
    }
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(APP_DIR_NAME).join(".env"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let config = Config {
            logs_path: PathBuf::from("/tmp/x"),
            logger_pid: 4242,
            extra: Vec::new(),
        };
        config.write(&path).unwrap();
        let read_back = Config::read(&path).unwrap();
        assert_eq!(read_back, config);
    }

    #[test]
    fn ignores_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "LOGS_PATH=/tmp/y\nnotakeyvalue\nLOGGER_PID=7\n").unwrap();
        let config = Config::read(&path).unwrap();
        assert_eq!(config.logs_path, PathBuf::from("/tmp/y"));
        assert_eq!(config.logger_pid, 7);
    }
}
