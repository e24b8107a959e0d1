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

//! Error-formatting helpers.

use std::error::Error as StdError;
use std::fmt::Write;

/// Extension trait for rendering an error together with its full causal
/// chain, the way a user-facing `fatal:` message should.
pub trait ErrorExt {
    /// Renders `self` followed by `caused by: ...` for each source in the
    /// chain, one per line.
    fn display_with_causes(&self) -> String;
}

impl<E> ErrorExt for E
where
    E: StdError,
{
    fn display_with_causes(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            write!(out, "\ncaused by: {err}").expect("writing to String cannot fail");
            source = err.source();
        }
        out
    }
}

impl ErrorExt for anyhow::Error {
    fn display_with_causes(&self) -> String {
        let mut out = self.to_string();
        for cause in self.chain().skip(1) {
            write!(out, "\ncaused by: {cause}").expect("writing to String cannot fail");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Inner;
    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "inner failure")
        }
    }
    impl StdError for Inner {}

    #[test]
    fn anyhow_chain_is_rendered() {
        let err = anyhow::Error::new(Inner).context("outer failure");
        let rendered = err.display_with_causes();
        assert_eq!(rendered, "outer failure\ncaused by: inner failure");
    }
}
