// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generate pipeline: Configure, Resolve, Validate, Emit
//!
//! Each stage fails fast; a failed stage stops the run and leaves the
//! pipeline on that stage.

use crate::options::{EmitOptions, ResolveOptions};
use crate::resolver::ModelAssembler;
use crate::router::ElementFamily;
use crate::writer::{write_atomic, InputWriter};
use fire_lite_model::{MeshTopology, Result, Session};
use std::fmt;
use std::path::{Path, PathBuf};

/// Pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Configure,
    Resolve,
    Validate,
    Emit,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::Resolve => "resolve",
            Stage::Validate => "validate",
            Stage::Emit => "emit",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run
#[derive(Clone, Debug, PartialEq)]
pub struct EmitReport {
    pub output: PathBuf,
    pub nodes: usize,
    pub elements: Vec<(ElementFamily, usize)>,
    pub sections: usize,
    pub materials: usize,
}

/// One generate run over a session and a mesh
pub struct Pipeline<'a> {
    session: &'a Session,
    mesh: &'a dyn MeshTopology,
    stage: Stage,
}

impl<'a> Pipeline<'a> {
    pub fn new(session: &'a Session, mesh: &'a dyn MeshTopology) -> Self {
        Self {
            session,
            mesh,
            stage: Stage::Configure,
        }
    }

    /// Current stage; the failing stage after an error
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        log::info!("{} stage", stage);
        self.stage = stage;
    }

    /// Run every stage and write the input file to `output`
    pub fn run(&mut self, output: &Path) -> Result<EmitReport> {
        self.enter(Stage::Configure);
        let resolve = ResolveOptions::from_tree(self.session.tree())?;
        let emit = EmitOptions::from_tree(self.session.tree())?;

        self.enter(Stage::Resolve);
        let resolution = ModelAssembler::new(self.session, self.mesh, resolve).resolve()?;

        self.enter(Stage::Validate);
        let image = InputWriter::with_options(self.session, self.mesh, emit).render(&resolution)?;
        image.validate()?;

        self.enter(Stage::Emit);
        write_atomic(output, &image.text)?;

        self.enter(Stage::Done);
        log::info!(
            "wrote {} with {} nodes and {} elements",
            output.display(),
            image.nodes,
            image.element_count()
        );
        Ok(EmitReport {
            output: output.to_path_buf(),
            nodes: image.nodes,
            elements: image.elements,
            sections: image.sections,
            materials: image.materials,
        })
    }
}

/// Run the whole pipeline once
pub fn run(
    session: &Session,
    mesh: &dyn MeshTopology,
    output: impl AsRef<Path>,
) -> Result<EmitReport> {
    Pipeline::new(session, mesh).run(output.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_lite_model::{
        AssignMode, CatalogEntry, CatalogKind, Category, ElementKind, EntityId, ErrorKind,
        InMemoryMesh, PropertySnapshot, Scope, ShapeType,
    };

    fn plate() -> (Session, InMemoryMesh) {
        let mut session = Session::new();
        session.select(&[], "Problem", "Thermal 2D").unwrap();
        let mut mesh = InMemoryMesh::new();
        mesh.add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [0.0, 1.0, 0.0]);
        mesh.add_element(1u64, ElementKind::Triangle, 7u32, &[1, 2, 3]).unwrap();
        (session, mesh)
    }

    #[test]
    fn test_run_writes_file() {
        let (mut session, mesh) = plate();
        session
            .define_catalog_entry(
                CatalogKind::Material,
                CatalogEntry::new(
                    "steel",
                    ShapeType::Surface,
                    PropertySnapshot::new().with_subtype("Thermal"),
                ),
            )
            .unwrap();
        session
            .assign(
                Category::Material,
                ShapeType::Surface,
                Scope::Entity(EntityId(7)),
                PropertySnapshot::new().with_text("Name", "steel"),
                AssignMode::Add,
                None,
            )
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plate.IN");

        let mut pipeline = Pipeline::new(&session, &mesh);
        let report = pipeline.run(&output).unwrap();
        assert_eq!(pipeline.stage(), Stage::Done);
        assert_eq!(report.nodes, 3);
        assert_eq!(report.elements, vec![(ElementFamily::Solid, 1)]);
        assert_eq!(report.materials, 1);
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.lines().any(|l| l.starts_with("USER1")));
    }

    #[test]
    fn test_failing_stage_is_kept() {
        let (session, mesh) = plate();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plate.IN");

        let mut pipeline = Pipeline::new(&session, &mesh);
        let err = pipeline.run(&output).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(pipeline.stage(), Stage::Resolve);
        assert!(!output.exists());
    }

    #[test]
    fn test_configuration_errors_stop_first() {
        let (mut session, mesh) = plate();
        session.apply_header("Final time", "1").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::new(&session, &mesh);
        let err = pipeline.run(&dir.path().join("plate.IN")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(pipeline.stage(), Stage::Configure);
    }
}
