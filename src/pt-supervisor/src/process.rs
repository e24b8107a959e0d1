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

//! Low-level POSIX process primitives: a signal-0 liveness probe and an
//! interrupt send, both by raw PID, independent of `std::process::Child`
//! (the supervisor only ever holds a PID persisted across process restarts,
//! never a live `Child` handle).

/// Returns whether a process with the given PID currently exists, via a
/// signal-0 probe. A PID of `0` is never considered alive.
pub fn is_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    // SAFETY: `kill` with signal 0 performs no action beyond existence and
    // permission checks; it sends no actual signal.
    let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
    rc == 0
}

/// Sends `SIGINT` to `pid`, the same interrupt the recorder's own shutdown
/// path listens for via `tokio::signal::ctrl_c()`.
pub fn interrupt(pid: u32) -> std::io::Result<()> {
    // SAFETY: `kill` is safe to call with any PID; a failure is reported
    // through `errno`, not undefined behavior.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_alive() {
        assert!(is_alive(std::process::id()));
    }

    #[test]
    fn zero_pid_is_never_alive() {
        assert!(!is_alive(0));
    }

    #[test]
    fn implausible_pid_is_not_alive() {
        // A PID this large is never valid on Linux (pid_max tops out well
        // below it), so the probe should reliably report "not alive".
        assert!(!is_alive(i32::MAX as u32 - 1));
    }
}
