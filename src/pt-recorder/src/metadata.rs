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

//! Per-workload append-only metadata index files.

use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::RecorderError;

/// Appends one `<creation-instant> ; <replica-name>` line to the metadata
/// index at `path`, creating the file if necessary. The write is guarded by
/// an advisory exclusive lock (`flock(2)`) held only across the append;
/// it is cooperative and does not stop a writer that ignores it.
pub fn append_line(
    path: &Path,
    creation_instant: DateTime<Utc>,
    replica_name: &str,
) -> Result<(), RecorderError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(RecorderError::from)?;

    lock_exclusive(&file)?;
    let line = format!(
        "{} ; {}\n",
        creation_instant.format("%Y-%m-%d %H:%M:%S"),
        replica_name
    );
    let result = file.write_all(line.as_bytes()).map_err(RecorderError::from);
    unlock(&file);
    result
}

fn lock_exclusive(file: &std::fs::File) -> Result<(), RecorderError> {
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if rc != 0 {
        return Err(RecorderError::from(std::io::Error::last_os_error()));
    }
    Ok(())
}

fn unlock(file: &std::fs::File) {
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

/// Builds the metadata-index file name for a workload: `<kind>.<name>.metadata`.
pub fn index_file_name(kind_token: &str, workload_name: &str) -> String {
    format!("{kind_token}.{workload_name}.metadata")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn appends_in_the_exact_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.web.metadata");
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 9, 59, 0).unwrap();
        append_line(&path, instant, "r2").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "2024-01-01 09:59:00 ; r2\n");
    }

    #[test]
    fn appends_preserve_earlier_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.web.metadata");
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 9, 59, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        append_line(&path, first, "r2").unwrap();
        append_line(&path, second, "r1").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "2024-01-01 09:59:00 ; r2\n2024-01-01 10:00:00 ; r1\n");
    }

    #[test]
    fn file_name_uses_kind_token_and_name() {
        assert_eq!(index_file_name("deployment", "web"), "deployment.web.metadata");
        assert_eq!(index_file_name("pod", "standalone-1"), "pod.standalone-1.metadata");
    }
}
