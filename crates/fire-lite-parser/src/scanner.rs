// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line and block scanner using SIMD-accelerated byte searching
//!
//! Splits a properties file into header lines and `{`...`}` blocks and
//! checks brace nesting before any line is interpreted.

use fire_lite_model::{Error, Result};
use memchr::{memchr2, memchr_iter};

/// A significant line with its 1-based number
pub type Line<'a> = (usize, &'a str);

/// One top-level record of a properties file
#[derive(Clone, Debug, PartialEq)]
pub enum Record<'a> {
    /// `selector: value` line before the first block
    Header(Line<'a>),
    /// Block with its address line and body lines
    Block {
        /// Address line, without the opening brace
        address: Line<'a>,
        /// Non-blank, non-comment lines between the braces
        body: Vec<Line<'a>>,
    },
}

/// Scanner over the lines of a properties file
pub struct BlockScanner<'a> {
    content: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> BlockScanner<'a> {
    /// Create a new scanner for the given content
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            pos: 0,
            line: 0,
        }
    }

    /// Next significant line, trimmed; blank and `#` lines are skipped
    pub fn next_line(&mut self) -> Option<Line<'a>> {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() {
            let end = memchr_iter(b'\n', &bytes[self.pos..])
                .next()
                .map_or(bytes.len(), |offset| self.pos + offset);
            let raw = &self.content[self.pos..end];
            self.pos = end + 1;
            self.line += 1;

            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return Some((self.line, text));
        }
        None
    }

    /// Split the whole content into records
    ///
    /// Fails on a nested `{`, a stray `}`, a header line after the first
    /// block or an unterminated block.
    pub fn records(content: &'a str) -> Result<Vec<Record<'a>>> {
        let mut scanner = Self::new(content);
        let mut records = Vec::new();
        let mut open: Option<(Line<'a>, Vec<Line<'a>>)> = None;
        let mut seen_block = false;

        while let Some((line, text)) = scanner.next_line() {
            let brace = memchr2(b'{', b'}', text.as_bytes()).map(|i| text.as_bytes()[i]);
            match (open.take(), brace) {
                (Some((address, body)), Some(b'}')) => {
                    if text != "}" {
                        return Err(Error::parse(line, "'}' must stand on its own line"));
                    }
                    records.push(Record::Block { address, body });
                }
                (Some(_), Some(_)) => {
                    return Err(Error::parse(line, "nested '{' inside a block"));
                }
                (Some((address, mut body)), None) => {
                    body.push((line, text));
                    open = Some((address, body));
                }
                (None, Some(b'{')) => {
                    let Some(address) = text.strip_suffix('{') else {
                        return Err(Error::parse(line, "'{' must end the block address"));
                    };
                    if address.contains('{') {
                        return Err(Error::parse(line, "nested '{' inside a block"));
                    }
                    open = Some(((line, address.trim_end()), Vec::new()));
                    seen_block = true;
                }
                (None, Some(_)) => {
                    return Err(Error::parse(line, "'}' without a matching '{'"));
                }
                (None, None) => {
                    if seen_block {
                        return Err(Error::parse(line, "header line after the first block"));
                    }
                    records.push(Record::Header((line, text)));
                }
            }
        }

        if let Some(((line, _), _)) = open {
            return Err(Error::parse(line, "block is never closed"));
        }
        Ok(records)
    }

    /// Count blocks without interpreting them
    pub fn block_count(content: &'a str) -> Result<usize> {
        Ok(Self::records(content)?
            .iter()
            .filter(|record| matches!(record, Record::Block { .. }))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_lite_model::ErrorKind;

    const TEST_PROPS: &str = "# fire-lite properties
Problem: Thermal 2D

Surface 7(0) - Material {
  Name: steel
}
# trailing comment
Material steel(Surface) - Material/Steel EC3 {
}
";

    #[test]
    fn test_scanner_skips_comments() {
        let mut scanner = BlockScanner::new(TEST_PROPS);
        assert_eq!(scanner.next_line(), Some((2, "Problem: Thermal 2D")));
        assert_eq!(scanner.next_line(), Some((4, "Surface 7(0) - Material {")));
    }

    #[test]
    fn test_records() {
        let records = BlockScanner::records(TEST_PROPS).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Record::Header((2, "Problem: Thermal 2D")));
        assert_eq!(
            records[1],
            Record::Block {
                address: (4, "Surface 7(0) - Material"),
                body: vec![(5, "Name: steel")],
            }
        );
        assert_eq!(BlockScanner::block_count(TEST_PROPS).unwrap(), 2);
    }

    #[test]
    fn test_nesting_errors() {
        let nested = "Curve 1() - Block {\nCurve 2() - Block {\n}\n}\n";
        let err = BlockScanner::records(nested).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("line 2"));

        let stray = "Problem: Torsion\n}\n";
        assert!(BlockScanner::records(stray).unwrap_err().to_string().contains("line 2"));

        let open = "Curve 1() - Block {\nX: F0\n";
        assert!(BlockScanner::records(open).unwrap_err().to_string().contains("line 1"));

        let late = "Curve 1() - Block {\n}\nProblem: Torsion\n";
        assert!(BlockScanner::records(late).is_err());
    }

    #[test]
    fn test_crlf_lines() {
        let records = BlockScanner::records("Problem: Torsion\r\nFinal time: 60\r\n").unwrap();
        assert_eq!(records[1], Record::Header((2, "Final time: 60")));
    }
}
