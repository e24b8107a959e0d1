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

//! `logs show <name>`: prints a pod's raw log, or every replica's log for a
//! workload walked through its metadata index.

use std::path::Path;

use crate::error::ArchiveError;
use crate::index::{self, IndexEntry, IndexKind};

/// One replica's rendered log, ready to print.
pub struct ShownLog {
    pub replica_name: String,
    pub contents: Option<String>,
}

pub struct ShowOptions {
    pub max_pods: usize,
    pub latest_first: bool,
    pub max_lines: Option<usize>,
    /// When set, `max_lines` counts from the end of the log instead of the
    /// start.
    pub end_of_file: bool,
    pub only_names: bool,
}

impl Default for ShowOptions {
    fn default() -> ShowOptions {
        ShowOptions {
            max_pods: usize::MAX,
            latest_first: false,
            max_lines: None,
            end_of_file: false,
            only_names: false,
        }
    }
}

/// A single pod's log, read directly by replica name.
pub fn show_pod(namespace_dir: &Path, replica_name: &str) -> Result<ShownLog, ArchiveError> {
    let path = index::pod_log_path(namespace_dir, replica_name);
    let contents = std::fs::read_to_string(&path)
        .map_err(|_| ArchiveError::NotFound(replica_name.to_string()))?;
    Ok(ShownLog {
        replica_name: replica_name.to_string(),
        contents: Some(contents),
    })
}

/// Every replica of a workload, walked through its metadata index, honoring
/// `--max-pods`/`--latest`/`--only-names`.
pub fn show_workload(
    namespace_dir: &Path,
    kind: IndexKind,
    workload_name: &str,
    options: &ShowOptions,
) -> Result<Vec<ShownLog>, ArchiveError> {
    let path = index::index_path(namespace_dir, kind, workload_name);
    let mut entries = index::read_entries(&path)
        .map_err(|_| ArchiveError::NotFound(workload_name.to_string()))?;
    if options.latest_first {
        entries.reverse();
    }
    entries.truncate(options.max_pods);

    entries
        .into_iter()
        .map(|entry: IndexEntry| {
            if options.only_names {
                return Ok(ShownLog {
                    replica_name: entry.replica_name,
                    contents: None,
                });
            }
            let log_path = index::pod_log_path(namespace_dir, &entry.replica_name);
            let contents = std::fs::read_to_string(&log_path)
                .map_err(|_| ArchiveError::NotFound(entry.replica_name.clone()))?;
            Ok(ShownLog {
                replica_name: entry.replica_name,
                contents: Some(clip_lines(&contents, options.max_lines, options.end_of_file)),
            })
        })
        .collect()
}

fn clip_lines(contents: &str, max_lines: Option<usize>, end_of_file: bool) -> String {
    match max_lines {
        None => contents.to_string(),
        Some(n) => {
            let lines: Vec<&str> = contents.lines().collect();
            if end_of_file {
                let start = lines.len().saturating_sub(n);
                lines[start..].join("\n")
            } else {
                lines[..n.min(lines.len())].join("\n")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_index(dir: &Path, lines: &[(&str, &str)]) -> std::path::PathBuf {
        let path = index::index_path(dir, IndexKind::Deployment, "web");
        let body: String = lines
            .iter()
            .map(|(instant, name)| format!("{instant} ; {name}\n"))
            .collect();
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn show_pod_reads_the_raw_log() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("r1.log"), "hello\nworld\n").unwrap();
        let shown = show_pod(dir.path(), "r1").unwrap();
        assert_eq!(shown.contents.unwrap(), "hello\nworld\n");
    }

    #[test]
    fn show_workload_honors_max_pods_and_order() {
        let dir = tempfile::tempdir().unwrap();
        write_index(
            dir.path(),
            &[
                ("2024-01-01 09:59:00", "r2"),
                ("2024-01-01 10:00:00", "r1"),
                ("2024-01-01 10:00:30", "r3"),
            ],
        );
        std::fs::write(dir.path().join("r2.log"), "a").unwrap();
        std::fs::write(dir.path().join("r1.log"), "b").unwrap();

        let options = ShowOptions {
            max_pods: 2,
            ..ShowOptions::default()
        };
        let shown = show_workload(dir.path(), IndexKind::Deployment, "web", &options).unwrap();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].replica_name, "r2");
        assert_eq!(shown[1].replica_name, "r1");
    }

    #[test]
    fn show_workload_latest_first_reverses_birth_order() {
        let dir = tempfile::tempdir().unwrap();
        write_index(
            dir.path(),
            &[
                ("2024-01-01 09:59:00", "r2"),
                ("2024-01-01 10:00:00", "r1"),
            ],
        );
        let options = ShowOptions {
            latest_first: true,
            only_names: true,
            ..ShowOptions::default()
        };
        let shown = show_workload(dir.path(), IndexKind::Deployment, "web", &options).unwrap();
        assert_eq!(shown[0].replica_name, "r1");
        assert_eq!(shown[1].replica_name, "r2");
        assert!(shown[0].contents.is_none());
    }

    #[test]
    fn max_lines_clips_from_either_end() {
        let contents = "1\n2\n3\n4\n5";
        assert_eq!(clip_lines(contents, Some(2), true), "4\n5");
        assert_eq!(clip_lines(contents, Some(2), false), "1\n2");
        assert_eq!(clip_lines(contents, None, false), contents);
    }
}
