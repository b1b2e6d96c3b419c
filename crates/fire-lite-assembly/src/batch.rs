// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Non-interactive generation from a directory holding one model

use crate::pipeline::{self, EmitReport};
use fire_lite_model::{Error, MeshTopology, Result};
use std::path::{Path, PathBuf};

/// Extension of geometry files
pub const GEOMETRY_EXTENSION: &str = "geo";
/// Extension of persisted properties files
pub const PROPERTIES_EXTENSION: &str = "props";
/// Extension of solver input files
pub const OUTPUT_EXTENSION: &str = "IN";

/// Geometry file with its properties file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputPair {
    pub stem: String,
    pub geometry: PathBuf,
    pub properties: PathBuf,
}

impl InputPair {
    /// Solver input written next to the geometry
    pub fn output(&self) -> PathBuf {
        self.geometry.with_extension(OUTPUT_EXTENSION)
    }
}

/// Find the only geometry file of a directory that has a properties file
pub fn find_input_pair(dir: &Path) -> Result<InputPair> {
    let mut pairs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(true, |ext| ext != GEOMETRY_EXTENSION) {
            continue;
        }
        let properties = path.with_extension(PROPERTIES_EXTENSION);
        if !properties.is_file() {
            log::debug!("{} has no properties file", path.display());
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        pairs.push(InputPair {
            stem,
            geometry: path,
            properties,
        });
    }
    pairs.sort_by(|a, b| a.stem.cmp(&b.stem));

    match pairs.len() {
        1 => Ok(pairs.remove(0)),
        0 => Err(Error::configuration(format!(
            "{} holds no .{} file with a matching .{} file",
            dir.display(),
            GEOMETRY_EXTENSION,
            PROPERTIES_EXTENSION
        ))),
        _ => {
            let stems: Vec<&str> = pairs.iter().map(|p| p.stem.as_str()).collect();
            Err(Error::configuration(format!(
                "{} holds several models: {}",
                dir.display(),
                stems.join(", ")
            )))
        }
    }
}

/// Generate the solver input of the model in `dir`
///
/// A stale input file is removed before anything else, so a failed run
/// leaves no output behind.
pub fn run<M, F>(dir: &Path, load_mesh: F) -> Result<EmitReport>
where
    M: MeshTopology,
    F: FnOnce(&Path) -> Result<M>,
{
    let pair = find_input_pair(dir)?;
    let output = pair.output();
    if output.exists() {
        log::info!("removing stale {}", output.display());
        std::fs::remove_file(&output)?;
    }
    let session = fire_lite_parser::load_file(&pair.properties)?;
    let mesh = load_mesh(&pair.geometry)?;
    pipeline::run(&session, &mesh, &output)
}
