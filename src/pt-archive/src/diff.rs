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

//! `logs diff <name>`: pairwise unified diff between consecutive replicas
//! of a workload's metadata index, ANSI-colorized.

use std::path::Path;

use similar::TextDiff;

use crate::error::ArchiveError;
use crate::index::{self, IndexKind};

pub struct PodDiff {
    pub from_pod: String,
    pub to_pod: String,
    /// `None` when the two replicas' logs are byte-identical.
    pub unified: Option<String>,
}

/// Diffs every consecutive pair of replicas for a workload, in birth order.
/// A workload with zero or one replica produces no diffs (mirrors the
/// original's "no diff available for a single pod" behavior).
pub fn diff_workload(
    namespace_dir: &Path,
    kind: IndexKind,
    workload_name: &str,
) -> Result<Vec<PodDiff>, ArchiveError> {
    let path = index::index_path(namespace_dir, kind, workload_name);
    let entries = index::read_entries(&path)
        .map_err(|_| ArchiveError::NotFound(workload_name.to_string()))?;

    let mut diffs = Vec::new();
    for pair in entries.windows(2) {
        let from_pod = pair[0].replica_name.clone();
        let to_pod = pair[1].replica_name.clone();
        let from_log = std::fs::read_to_string(index::pod_log_path(namespace_dir, &from_pod))
            .map_err(|_| ArchiveError::NotFound(from_pod.clone()))?;
        let to_log = std::fs::read_to_string(index::pod_log_path(namespace_dir, &to_pod))
            .map_err(|_| ArchiveError::NotFound(to_pod.clone()))?;

        let text_diff = TextDiff::from_lines(&from_log, &to_log);
        let unified = text_diff
            .unified_diff()
            .context_radius(3)
            .header(&from_pod, &to_pod)
            .to_string();
        diffs.push(PodDiff {
            from_pod,
            to_pod,
            unified: if from_log == to_log { None } else { Some(unified) },
        });
    }
    Ok(diffs)
}

/// Renders a diff with ANSI coloring: `-` lines red, `+` lines green.
pub fn render_colored(diff: &PodDiff) -> String {
    match &diff.unified {
        None => format!(
            "No diff found between {} and {}",
            diff.from_pod, diff.to_pod
        ),
        Some(unified) => pt_config::colorize_diff(unified),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diffs_consecutive_pairs_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = index::index_path(dir.path(), IndexKind::Deployment, "web");
        std::fs::write(
            &path,
            "2024-01-01 09:59:00 ; r2\n2024-01-01 10:00:00 ; r1\n2024-01-01 10:00:30 ; r3\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("r2.log"), "a\nb\n").unwrap();
        std::fs::write(dir.path().join("r1.log"), "a\nc\n").unwrap();
        std::fs::write(dir.path().join("r3.log"), "a\nc\n").unwrap();

        let diffs = diff_workload(dir.path(), IndexKind::Deployment, "web").unwrap();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].from_pod, "r2");
        assert_eq!(diffs[0].to_pod, "r1");
        assert!(diffs[0].unified.is_some());
        assert_eq!(diffs[1].from_pod, "r1");
        assert_eq!(diffs[1].to_pod, "r3");
        assert!(diffs[1].unified.is_none());
    }

    #[test]
    fn single_replica_produces_no_diffs() {
        let dir = tempfile::tempdir().unwrap();
        let path = index::index_path(dir.path(), IndexKind::Deployment, "web");
        std::fs::write(&path, "2024-01-01 09:59:00 ; r2\n").unwrap();
        let diffs = diff_workload(dir.path(), IndexKind::Deployment, "web").unwrap();
        assert!(diffs.is_empty());
    }
}
