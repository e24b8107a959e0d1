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

//! Read-only access to a workload's metadata index, for the `show` and
//! `diff` commands. The recorder is the only writer (see `pt-recorder`'s
//! `metadata` module); this module only ever reads the file back.

use std::path::{Path, PathBuf};

use crate::error::ArchiveError;

/// One parsed line of a `<kind>.<workload-name>.metadata` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub creation_instant: String,
    pub replica_name: String,
}

/// The workload kind token used in metadata-index file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Deployment,
    ReplicaSet,
}

impl IndexKind {
    fn token(self) -> &'static str {
        match self {
            IndexKind::Deployment => "deployment",
            IndexKind::ReplicaSet => "replicaset",
        }
    }
}

pub fn index_path(namespace_dir: &Path, kind: IndexKind, workload_name: &str) -> PathBuf {
    namespace_dir.join(format!("{}.{}.metadata", kind.token(), workload_name))
}

pub fn pod_log_path(namespace_dir: &Path, replica_name: &str) -> PathBuf {
    namespace_dir.join(format!("{replica_name}.log"))
}

/// Parses every well-formed line of an index file, in file order (birth
/// order, by I-1). Blank lines and lines without the `;` separator are
/// skipped, matching the original parser's tolerance for stray output.
pub fn read_entries(path: &Path) -> Result<Vec<IndexEntry>, ArchiveError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_| ArchiveError::NotFound(path.display().to_string()))?;
    Ok(contents.lines().filter_map(parse_line).collect())
}

fn parse_line(line: &str) -> Option<IndexEntry> {
    if line.trim().is_empty() {
        return None;
    }
    let (instant, name) = line.split_once(';')?;
    Some(IndexEntry {
        creation_instant: instant.trim().to_string(),
        replica_name: name.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.web.metadata");
        std::fs::write(
            &path,
            "2024-01-01 09:59:00 ; r2\n2024-01-01 10:00:00 ; r1\n",
        )
        .unwrap();
        let entries = read_entries(&path).unwrap();
        assert_eq!(
            entries,
            vec![
                IndexEntry {
                    creation_instant: "2024-01-01 09:59:00".into(),
                    replica_name: "r2".into(),
                },
                IndexEntry {
                    creation_instant: "2024-01-01 10:00:00".into(),
                    replica_name: "r1".into(),
                },
            ]
        );
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pod.standalone.metadata");
        std::fs::write(&path, "\nnotakeyvalue\n2024-01-01 10:00:00 ; r1\n").unwrap();
        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].replica_name, "r1");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_entries(&dir.path().join("missing.metadata")).unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound(_)));
    }
}
