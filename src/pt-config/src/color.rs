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

//! ANSI coloring for diff output and labeled log lines.

pub const COLOR_RED: &str = "\x1b[31m";
pub const COLOR_GREEN: &str = "\x1b[32m";
pub const COLOR_YELLOW: &str = "\x1b[33m";
pub const COLOR_RESET: &str = "\x1b[0m";

/// Wraps `text` in `color`, resetting immediately after.
pub fn color_line(text: &str, color: &str) -> String {
    format!("{color}{text}{COLOR_RESET}")
}

/// Colorizes a unified diff: removed lines red, added lines green, context
/// lines untouched. Operates line-by-line on the already-rendered diff text.
pub fn colorize_diff(diff: &str) -> String {
    let mut out = String::new();
    for line in diff.split('\n') {
        if line.starts_with('-') {
            out.push_str(&color_line(line, COLOR_RED));
            out.push('\n');
        } else if line.starts_with('+') {
            out.push_str(&color_line(line, COLOR_GREEN));
            out.push('\n');
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
