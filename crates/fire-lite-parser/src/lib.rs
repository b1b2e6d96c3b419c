// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fire-Lite Parser - Persisted properties files
//!
//! This crate reads and writes the line-oriented properties file that
//! stores a [`Session`]: header `selector: value` lines followed by
//! brace-delimited blocks addressing entities, physical groups and catalog
//! entries.
//!
//! # Features
//!
//! - **Fast block scanning** using `memchr`
//! - **Line grammar** using `nom` combinators
//! - **All-or-nothing loads** - a failed load leaves the session untouched
//! - **Deferred catalog checks** - blocks may reference entries defined later
//!
//! # Example
//!
//! ```ignore
//! use fire_lite_parser::{load_file, write_file};
//!
//! let session = load_file("frame.props")?;
//! println!("{} assignments", session.overlay().len());
//! write_file(&session, "frame-copy.props")?;
//! ```

mod decoder;
mod scanner;
mod tokenizer;
mod writer;

pub use decoder::PropertiesDecoder;
pub use scanner::{BlockScanner, Line, Record};
pub use tokenizer::{parse_address, Address, AddressScope};
pub use writer::{overlay_summary, write_file, write_string};

use fire_lite_model::{Result, Session};
use std::path::Path;

/// Load properties text into a fresh default session
pub fn load_str(content: &str) -> Result<Session> {
    let mut session = Session::new();
    load_into(&mut session, content)?;
    Ok(session)
}

/// Load properties text into an existing session
///
/// The file replaces the session's overlay and catalog and applies its
/// header lines to a copy of the session's tree. The session is only
/// replaced once the whole file has been applied.
pub fn load_into(session: &mut Session, content: &str) -> Result<()> {
    let decoder = PropertiesDecoder::new(content)?;
    let mut scratch = Session::with_tree(session.tree().clone());
    decoder.decode_into(&mut scratch)?;
    log::info!(
        "loaded {} assignments and {} records",
        scratch.overlay().len(),
        decoder.records().len()
    );
    *session = scratch;
    Ok(())
}

/// Load a properties file into a fresh default session
pub fn load_file(path: impl AsRef<Path>) -> Result<Session> {
    let content = std::fs::read_to_string(path.as_ref())?;
    log::debug!("read {} bytes from {}", content.len(), path.as_ref().display());
    load_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_lite_model::{ErrorKind, ProblemKind};

    #[test]
    fn test_failed_load_keeps_session() {
        let mut session = load_str("Problem: Torsion\n").unwrap();
        let content = "Problem: Thermal 2D\nCurve 1() - Block {\n";
        let err = load_into(&mut session, content).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(session.problem().unwrap(), ProblemKind::Torsion);

        let err = load_into(
            &mut session,
            "Problem: Thermal 2D\nSurface 2(0) - Material {\n  Name: missing\n}\n",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Referential);
        assert_eq!(session.problem().unwrap(), ProblemKind::Torsion);
        assert!(session.overlay().is_empty());
    }

    #[test]
    fn test_load_keeps_tree_edits() {
        let mut session = Session::new();
        session.select(&[], "Problem", "Structural 2D").unwrap();
        load_into(&mut session, "# only a comment\n").unwrap();
        assert_eq!(session.problem().unwrap(), ProblemKind::Structural2D);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path().join("absent.props")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
