// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-column record layout of the solver input file
//!
//! Every record starts with a keyword padded to 10 columns, followed by
//! right-aligned fields: integers in 6 columns, reals in 16 columns with 6
//! decimals. Continuation lines start with a blank keyword.

use std::fmt::Write as _;

/// Keyword column width
pub const KEYWORD_WIDTH: usize = 10;
/// Integer field width
pub const INT_WIDTH: usize = 6;
/// Real field width
pub const REAL_WIDTH: usize = 16;

/// One output line under construction
#[derive(Debug, Default)]
pub struct Record {
    line: String,
}

impl Record {
    /// Start a record with a keyword
    pub fn new(keyword: &str) -> Self {
        let mut line = String::with_capacity(80);
        let _ = write!(line, "{:<width$}", keyword, width = KEYWORD_WIDTH);
        Self { line }
    }

    /// Start a continuation line
    pub fn blank() -> Self {
        Self::new("")
    }

    /// Integer field
    pub fn int(mut self, value: impl Into<i64>) -> Self {
        let _ = write!(self.line, "{:>width$}", value.into(), width = INT_WIDTH);
        self
    }

    /// Index or count field
    pub fn count(self, value: usize) -> Self {
        self.int(i64::try_from(value).unwrap_or(i64::MAX))
    }

    /// Fixed-point real field
    pub fn real(mut self, value: f64) -> Self {
        let _ = write!(self.line, "{:>width$.6}", clean(value), width = REAL_WIDTH);
        self
    }

    /// Scientific real field
    pub fn exp(mut self, value: f64) -> Self {
        let _ = write!(self.line, "{:>width$.6e}", clean(value), width = REAL_WIDTH);
        self
    }

    /// Several scientific real fields
    pub fn exps(self, values: &[f64]) -> Self {
        values.iter().fold(self, |record, &v| record.exp(v))
    }

    /// Code or name field, separated by one space
    pub fn text(mut self, value: &str) -> Self {
        self.line.push(' ');
        self.line.push_str(value);
        self
    }

    /// Final line without trailing blanks
    pub fn finish(self) -> String {
        self.line.trim_end().to_string()
    }
}

// Negative zero prints as "-0.000000"
fn clean(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Single-keyword record
pub fn keyword(keyword: &str) -> String {
    Record::new(keyword).finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns() {
        let line = Record::new("NODE").count(12).real(1.5).real(-0.0).finish();
        assert_eq!(
            line,
            "NODE          12        1.500000        0.000000"
        );
        assert_eq!(line.len(), KEYWORD_WIDTH + INT_WIDTH + 2 * REAL_WIDTH);
    }

    #[test]
    fn test_exp_and_text() {
        let line = Record::new("STEELEC3").exp(2.1e11).finish();
        assert_eq!(line, format!("STEELEC3  {:>16}", "2.100000e11"));
        assert_eq!(Record::blank().text("F0").text("NO").finish(), "           F0 NO");
        assert_eq!(keyword("END_FIX"), "END_FIX");
    }
}
