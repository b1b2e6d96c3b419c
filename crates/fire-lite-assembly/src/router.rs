// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Family Router - Dynamic dispatch to element family writers
//!
//! Classifies every emitted mesh element into a solver element family and
//! hands each family's members to the writer registered for it.

use crate::numbering::NodeNumbering;
use crate::options::EmitOptions;
use crate::resolver::{ElementRef, ElementAttributeTable, Resolution};
use fire_lite_model::{
    Category, Error, MeshTopology, ProblemKind, Result, Session, ShapeType,
};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Solver element family, in emission order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementFamily {
    PointMass,
    Beam,
    Shell,
    Solid,
    Truss,
}

impl ElementFamily {
    pub const ALL: [ElementFamily; 5] = [
        ElementFamily::PointMass,
        ElementFamily::Beam,
        ElementFamily::Shell,
        ElementFamily::Solid,
        ElementFamily::Truss,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ElementFamily::PointMass => "point mass",
            ElementFamily::Beam => "beam",
            ElementFamily::Shell => "shell",
            ElementFamily::Solid => "solid",
            ElementFamily::Truss => "truss",
        }
    }

    /// Family of an element, `None` when it is not emitted as an element
    pub fn classify(
        problem: ProblemKind,
        table: &ElementAttributeTable,
        element: ElementRef,
    ) -> Option<Self> {
        let structural = !problem.is_thermal();
        match (element.shape, problem) {
            (ShapeType::Point, _) if structural => table
                .get(Category::Mass, element)
                .is_set()
                .then_some(ElementFamily::PointMass),
            (ShapeType::Curve, _) if structural => {
                let truss = table
                    .get(Category::Section, element)
                    .snapshot()
                    .and_then(|s| s.subtype.as_deref())
                    == Some("Truss");
                Some(if truss {
                    ElementFamily::Truss
                } else {
                    ElementFamily::Beam
                })
            }
            (ShapeType::Surface, ProblemKind::Structural3D) => Some(ElementFamily::Shell),
            (ShapeType::Surface, ProblemKind::Thermal2D | ProblemKind::Torsion) => {
                Some(ElementFamily::Solid)
            }
            (ShapeType::Volume, ProblemKind::Structural3D | ProblemKind::Thermal3D) => {
                Some(ElementFamily::Solid)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ElementFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a family writer reads
pub struct EmitContext<'a> {
    pub options: &'a EmitOptions,
    pub session: &'a Session,
    pub mesh: &'a dyn MeshTopology,
    pub resolution: &'a Resolution,
    pub numbering: &'a NodeNumbering,
}

impl EmitContext<'_> {
    pub fn table(&self) -> &ElementAttributeTable {
        &self.resolution.table
    }
}

/// Records produced for one family
#[derive(Clone, Debug, PartialEq)]
pub struct FamilyBlock {
    pub family: ElementFamily,
    /// Finished output lines
    pub records: Vec<String>,
    /// Members in numbering order; element `i` is numbered `i + 1`
    pub elements: Vec<ElementRef>,
    /// Number of distinct sections
    pub sections: usize,
    /// Material indices referenced by the sections
    pub material_refs: Vec<usize>,
}

impl FamilyBlock {
    /// Solver number of a member element
    pub fn number_of(&self, element: ElementRef) -> Option<usize> {
        self.elements.iter().position(|e| *e == element).map(|i| i + 1)
    }
}

/// Element family writer trait
///
/// Each writer renders the connectivity and section records of one
/// family.
pub trait FamilyWriter: Send + Sync {
    /// Family handled by this writer
    fn family(&self) -> ElementFamily;

    /// Render the members of the family, in the given order
    fn write(&self, ctx: &EmitContext<'_>, members: &[ElementRef]) -> Result<FamilyBlock>;
}

/// Family router - routes element families to writers
pub struct FamilyRouter {
    writers: FxHashMap<ElementFamily, Arc<dyn FamilyWriter>>,
}

impl FamilyRouter {
    /// Create new router without any writers registered
    pub fn new() -> Self {
        Self {
            writers: FxHashMap::default(),
        }
    }

    /// Create router with the built-in writer of every family
    pub fn with_default_writers() -> Self {
        use crate::families::{BeamWriter, PointMassWriter, ShellWriter, SolidWriter, TrussWriter};

        let mut router = Self::new();
        router.register(Arc::new(PointMassWriter));
        router.register(Arc::new(BeamWriter));
        router.register(Arc::new(ShellWriter));
        router.register(Arc::new(SolidWriter));
        router.register(Arc::new(TrussWriter));
        router
    }

    /// Register a writer, replacing any previous one for its family
    pub fn register(&mut self, writer: Arc<dyn FamilyWriter>) {
        self.writers.insert(writer.family(), writer);
    }

    /// Check if a family has a registered writer
    pub fn has_writer(&self, family: ElementFamily) -> bool {
        self.writers.contains_key(&family)
    }

    /// Members of every family, in mesh order
    pub fn members(
        problem: ProblemKind,
        mesh: &dyn MeshTopology,
        table: &ElementAttributeTable,
    ) -> FxHashMap<ElementFamily, Vec<ElementRef>> {
        let mut members: FxHashMap<ElementFamily, Vec<ElementRef>> = FxHashMap::default();
        for shape in ShapeType::ALL {
            for index in 0..mesh.elements(shape).len() {
                let element = ElementRef::new(shape, index);
                if let Some(family) = ElementFamily::classify(problem, table, element) {
                    members.entry(family).or_default().push(element);
                }
            }
        }
        members
    }

    /// Write every non-empty family, in family order
    pub fn route(&self, ctx: &EmitContext<'_>) -> Result<Vec<FamilyBlock>> {
        let mut members = Self::members(ctx.options.problem, ctx.mesh, ctx.table());
        let mut blocks = Vec::new();
        for family in ElementFamily::ALL {
            let Some(list) = members.remove(&family) else {
                continue;
            };
            let writer = self.writers.get(&family).ok_or_else(|| {
                Error::configuration(format!("no writer registered for {} elements", family))
            })?;
            let block = writer.write(ctx, &list)?;
            log::debug!(
                "{} family: {} elements, {} sections",
                family,
                block.elements.len(),
                block.sections
            );
            blocks.push(block);
        }
        Ok(blocks)
    }
}

impl Default for FamilyRouter {
    fn default() -> Self {
        Self::with_default_writers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ResolveOptions;
    use crate::resolver::ModelAssembler;
    use fire_lite_model::{
        AssignMode, ElementKind, EntityId, ErrorKind, InMemoryMesh, PropertySnapshot, Scope,
    };

    fn frame() -> (Session, InMemoryMesh) {
        let mut session = Session::new();
        session.select(&[], "Problem", "Structural 2D").unwrap();
        let truss = PropertySnapshot::new()
            .with_subtype("Truss")
            .with_float("Area", 0.01);
        session
            .assign(
                Category::Section,
                ShapeType::Curve,
                Scope::Entity(EntityId(2)),
                truss,
                AssignMode::Add,
                None,
            )
            .unwrap();
        let mut mesh = InMemoryMesh::new();
        mesh.add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [1.0, 1.0, 0.0]);
        mesh.add_element(1u64, ElementKind::Line, 1u32, &[1, 2])
            .unwrap()
            .add_element(2u64, ElementKind::Line, 2u32, &[2, 3])
            .unwrap()
            .add_element(3u64, ElementKind::Point, 9u32, &[1])
            .unwrap();
        (session, mesh)
    }

    #[test]
    fn test_classify() {
        let (session, mesh) = frame();
        let options = ResolveOptions::new(ProblemKind::Structural2D).bulk();
        let resolution = ModelAssembler::new(&session, &mesh, options).resolve().unwrap();
        let members = FamilyRouter::members(ProblemKind::Structural2D, &mesh, &resolution.table);
        assert_eq!(
            members.get(&ElementFamily::Beam),
            Some(&vec![ElementRef::new(ShapeType::Curve, 0)])
        );
        assert_eq!(
            members.get(&ElementFamily::Truss),
            Some(&vec![ElementRef::new(ShapeType::Curve, 1)])
        );
        // Point elements without a mass are not elements
        assert!(!members.contains_key(&ElementFamily::PointMass));
    }

    #[test]
    fn test_missing_writer() {
        let (session, mesh) = frame();
        let options = ResolveOptions::new(ProblemKind::Structural2D).bulk();
        let resolution = ModelAssembler::new(&session, &mesh, options).resolve().unwrap();
        let emit = EmitOptions::from_tree(session.tree()).unwrap();
        let numbering = NodeNumbering::build(&mesh, ProblemKind::Structural2D, &[]).unwrap();
        let ctx = EmitContext {
            options: &emit,
            session: &session,
            mesh: &mesh,
            resolution: &resolution,
            numbering: &numbering,
        };

        let router = FamilyRouter::new();
        assert!(!router.has_writer(ElementFamily::Beam));
        let err = router.route(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(FamilyRouter::default().has_writer(ElementFamily::Truss));
    }
}
