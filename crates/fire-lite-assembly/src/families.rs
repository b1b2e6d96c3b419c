// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in element family writers
//!
//! Every writer renumbers its members from 1, deduplicates their resolved
//! descriptive tuples into a [`SectionTable`] and renders:
//!
//! ```text
//! BEAM         2     1
//! ELEM         1     1     4     2     1
//! ...
//! BEAMTYPE     1     1     1 ipe300.tem
//! ```

use crate::layout::Record;
use crate::numbering::BeamNodes;
use crate::resolver::{ElementAttributeTable, ElementRef};
use crate::router::{ElementFamily, EmitContext, FamilyBlock, FamilyWriter};
use crate::sections::{RealKey, SectionTable};
use fire_lite_model::{
    CatalogKind, Category, Error, MeshElement, MeshTopology, NodeId, ProblemKind, Result,
    Session, ShapeType,
};
use nalgebra::Vector3;
use rustc_hash::FxHashMap;

/// Order of the components of relaxation vectors
const DOF_ORDER: [&str; 7] = ["X", "Y", "Z", "RX", "RY", "RZ", "W"];

/// Node numbers per continuation line of a node list
const NODES_PER_LINE: usize = 10;

fn mesh_element<'a>(ctx: &EmitContext<'a>, element: ElementRef) -> Result<&'a MeshElement> {
    ctx.mesh
        .elements(element.shape)
        .get(element.index)
        .ok_or_else(|| {
            Error::consistency(format!("no {} element at {}", element.shape, element.index))
        })
}

fn node_numbers(ctx: &EmitContext<'_>, element: &MeshElement, pad: usize) -> Result<Vec<usize>> {
    let mut numbers = element
        .nodes
        .iter()
        .map(|&node| ctx.numbering.number(node))
        .collect::<Result<Vec<_>>>()?;
    if numbers.len() < pad {
        numbers.resize(pad, 0);
    }
    Ok(numbers)
}

/// 1-based catalog indices of the materials of an element
fn materials(ctx: &EmitContext<'_>, element: ElementRef, mesh: &MeshElement) -> Result<Vec<usize>> {
    let names = ctx.table().get(Category::Material, element).names();
    if names.is_empty() {
        return Err(Error::validation(format!(
            "Material is not set on element {} of {} entity {}",
            mesh.id, element.shape, mesh.entity
        )));
    }
    names
        .into_iter()
        .map(|name| {
            ctx.session
                .catalog()
                .resolve_index(CatalogKind::Material, name, element.shape)
        })
        .collect()
}

fn header(keyword: &str, members: usize, sections: usize) -> String {
    Record::new(keyword).count(members).count(sections).finish()
}

fn with_materials(record: Record, materials: &[usize]) -> Record {
    materials
        .iter()
        .fold(record.count(materials.len()), |record, &m| record.count(m))
}

fn all_materials<'a>(keys: impl Iterator<Item = &'a [usize]>) -> Vec<usize> {
    let mut refs: Vec<usize> = keys.flatten().copied().collect();
    refs.sort_unstable();
    refs.dedup();
    refs
}

/// Beams needing synthesized nodes, with their local axes in 3-D
pub fn beam_nodes(
    problem: ProblemKind,
    session: &Session,
    mesh: &dyn MeshTopology,
    table: &ElementAttributeTable,
) -> Result<Vec<BeamNodes>> {
    let mut beams = Vec::new();
    for (index, element) in mesh.elements(ShapeType::Curve).iter().enumerate() {
        let at = ElementRef::new(ShapeType::Curve, index);
        if ElementFamily::classify(problem, table, at) != Some(ElementFamily::Beam) {
            continue;
        }
        let axis = if problem == ProblemKind::Structural3D {
            Some(local_axis(session, table, at, element)?)
        } else {
            None
        };
        beams.push(BeamNodes { element: at, axis });
    }
    Ok(beams)
}

fn local_axis(
    session: &Session,
    table: &ElementAttributeTable,
    at: ElementRef,
    element: &MeshElement,
) -> Result<Vector3<f64>> {
    let name = table
        .get(Category::LocalAxis, at)
        .names()
        .first()
        .copied()
        .ok_or_else(|| {
            Error::validation(format!(
                "LocalAxis is not set on beam element {} of entity {}",
                element.id, element.entity
            ))
        })?;
    let entry = session
        .catalog()
        .get(CatalogKind::LocalAxis, name, ShapeType::Curve)
        .ok_or_else(|| {
            Error::referential(CatalogKind::LocalAxis.name(), name, ShapeType::Curve.name())
        })?;
    match entry.snapshot.vector("Vector") {
        Some([x, y, z, ..]) => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(Error::format(format!(
            "local axis '{}' needs a three-component vector",
            name
        ))),
    }
}

/// Values of a 7-component DOF vector for the problem's DOFs
fn dof_values(problem: ProblemKind, vector: &[f64]) -> Vec<f64> {
    problem
        .dofs()
        .iter()
        .map(|dof| {
            DOF_ORDER
                .iter()
                .position(|d| d == dof)
                .and_then(|i| vector.get(i))
                .copied()
                .unwrap_or(0.0)
        })
        .collect()
}

/// Two-node beams with a synthesized middle node
pub struct BeamWriter;

impl FamilyWriter for BeamWriter {
    fn family(&self) -> ElementFamily {
        ElementFamily::Beam
    }

    fn write(&self, ctx: &EmitContext<'_>, members: &[ElementRef]) -> Result<FamilyBlock> {
        let problem = ctx.options.problem;
        let table = ctx.table();
        let mut sections: SectionTable<(String, Vec<usize>)> = SectionTable::new();
        let mut elements = Vec::with_capacity(members.len());
        let mut releases = Vec::new();

        for (i, &at) in members.iter().enumerate() {
            let number = i + 1;
            let element = mesh_element(ctx, at)?;
            let nodes = node_numbers(ctx, element, 2)?;
            let file = table
                .get(Category::Section, at)
                .snapshot()
                .and_then(|s| s.text("Section file"))
                .unwrap_or_default();
            if file.is_empty() {
                return Err(Error::validation(format!(
                    "beam element {} of entity {} has no section file",
                    element.id, element.entity
                )));
            }
            let section = sections.intern((file.to_string(), materials(ctx, at, element)?));

            let missing = || {
                Error::consistency(format!("beam element {} has no synthesized nodes", element.id))
            };
            let mid = ctx.numbering.midpoint(at).ok_or_else(missing)?;
            let mut record = Record::new("ELEM")
                .count(number)
                .count(nodes[0])
                .count(mid)
                .count(nodes[1]);
            if problem == ProblemKind::Structural3D {
                record = record.count(ctx.numbering.orientation(at).ok_or_else(missing)?);
            }
            elements.push(record.count(section).finish());

            let (Some(relaxation), Some(position)) = (
                table.get(Category::Relaxation, at).snapshot(),
                table.position(at.index),
            ) else {
                continue;
            };
            let (first, last) = if position.is_reversed() {
                (nodes[1], nodes[0])
            } else {
                (nodes[0], nodes[1])
            };
            let ends = [
                (position.is_first(), first, "Start"),
                (position.is_last(), last, "End"),
            ];
            for (applies, node, key) in ends {
                let Some(vector) = relaxation.vector(key).filter(|_| applies) else {
                    continue;
                };
                if vector.iter().all(|v| *v == 0.0) {
                    continue;
                }
                releases.push(
                    Record::new("RELAX")
                        .count(number)
                        .count(node)
                        .exps(&dof_values(problem, vector))
                        .finish(),
                );
            }
        }

        let mut records = vec![header("BEAM", members.len(), sections.len())];
        records.extend(elements);
        for (number, (file, mats)) in sections.iter() {
            let record = with_materials(Record::new("BEAMTYPE").count(number), mats);
            records.push(record.text(file).finish());
        }
        records.extend(releases);

        Ok(FamilyBlock {
            family: ElementFamily::Beam,
            records,
            elements: members.to_vec(),
            sections: sections.len(),
            material_refs: all_materials(sections.iter().map(|(_, (_, m))| m.as_slice())),
        })
    }
}

/// Two-node trusses
pub struct TrussWriter;

impl FamilyWriter for TrussWriter {
    fn family(&self) -> ElementFamily {
        ElementFamily::Truss
    }

    fn write(&self, ctx: &EmitContext<'_>, members: &[ElementRef]) -> Result<FamilyBlock> {
        let mut sections: SectionTable<(RealKey, RealKey, Vec<usize>)> = SectionTable::new();
        let mut elements = Vec::with_capacity(members.len());
        for (i, &at) in members.iter().enumerate() {
            let element = mesh_element(ctx, at)?;
            let nodes = node_numbers(ctx, element, 2)?;
            let section = ctx.table().get(Category::Section, at).snapshot();
            let value = |key: &str| section.and_then(|s| s.number(key)).unwrap_or(0.0);
            let key = (
                RealKey::new(value("Area")),
                RealKey::new(value("Residual stress")),
                materials(ctx, at, element)?,
            );
            let section = sections.intern(key);
            elements.push(
                Record::new("ELEM")
                    .count(i + 1)
                    .count(nodes[0])
                    .count(nodes[1])
                    .count(section)
                    .finish(),
            );
        }

        let mut records = vec![header("TRUSS", members.len(), sections.len())];
        records.extend(elements);
        for (number, (area, residual, mats)) in sections.iter() {
            let record = Record::new("TRUSSTYPE")
                .count(number)
                .exp(area.value())
                .exp(residual.value());
            records.push(with_materials(record, mats).finish());
        }
        Ok(FamilyBlock {
            family: ElementFamily::Truss,
            records,
            elements: members.to_vec(),
            sections: sections.len(),
            material_refs: all_materials(sections.iter().map(|(_, (_, _, m))| m.as_slice())),
        })
    }
}

/// Triangular and quadrangular shells
pub struct ShellWriter;

impl FamilyWriter for ShellWriter {
    fn family(&self) -> ElementFamily {
        ElementFamily::Shell
    }

    fn write(&self, ctx: &EmitContext<'_>, members: &[ElementRef]) -> Result<FamilyBlock> {
        let mut sections: SectionTable<([RealKey; 3], Vec<usize>)> = SectionTable::new();
        let mut elements = Vec::with_capacity(members.len());
        for (i, &at) in members.iter().enumerate() {
            let element = mesh_element(ctx, at)?;
            let nodes = node_numbers(ctx, element, 4)?;
            let section = ctx.table().get(Category::Section, at).snapshot().ok_or_else(|| {
                Error::validation(format!(
                    "Section is not set on shell element {} of entity {}",
                    element.id, element.entity
                ))
            })?;
            let value = |key: &str| RealKey::new(section.number(key).unwrap_or(0.0));
            let key = (
                [value("Thickness"), value("Rebar area"), value("Rebar depth")],
                materials(ctx, at, element)?,
            );
            let section = sections.intern(key);
            let record = nodes
                .iter()
                .fold(Record::new("ELEM").count(i + 1), |r, &n| r.count(n));
            elements.push(record.count(section).finish());
        }

        let mut records = vec![header("SHELL", members.len(), sections.len())];
        records.extend(elements);
        for (number, (values, mats)) in sections.iter() {
            let record = values
                .iter()
                .fold(Record::new("SHELLTYPE").count(number), |r, v| r.exp(v.value()));
            records.push(with_materials(record, mats).finish());
        }
        Ok(FamilyBlock {
            family: ElementFamily::Shell,
            records,
            elements: members.to_vec(),
            sections: sections.len(),
            material_refs: all_materials(sections.iter().map(|(_, (_, m))| m.as_slice())),
        })
    }
}

/// Plane and volume elements, with their boundary fluxes and node lists
pub struct SolidWriter;

impl SolidWriter {
    /// Faces of the members, keyed by their sorted node ids
    fn faces(
        ctx: &EmitContext<'_>,
        members: &[ElementRef],
    ) -> Result<FxHashMap<Vec<NodeId>, (usize, usize)>> {
        let mut faces = FxHashMap::default();
        for (i, &at) in members.iter().enumerate() {
            let element = mesh_element(ctx, at)?;
            for (f, local) in element.kind.faces().iter().enumerate() {
                let mut key: Vec<NodeId> = local
                    .iter()
                    .filter_map(|&n| element.nodes.get(n).copied())
                    .collect();
                key.sort_unstable();
                faces.entry(key).or_insert((i + 1, f + 1));
            }
        }
        Ok(faces)
    }

    fn frontiers(ctx: &EmitContext<'_>, members: &[ElementRef]) -> Result<Vec<String>> {
        let Some(&first) = members.first() else {
            return Ok(Vec::new());
        };
        let boundary = match first.shape {
            ShapeType::Volume => ShapeType::Surface,
            _ => ShapeType::Curve,
        };
        let Some(column) = ctx.table().column(Category::Flux, boundary) else {
            return Ok(Vec::new());
        };
        let faces = Self::faces(ctx, members)?;

        let mut records = Vec::new();
        for (element, value) in ctx.mesh.elements(boundary).iter().zip(column) {
            let Some(function) = value.snapshot().and_then(|s| s.text("Function")) else {
                continue;
            };
            let mut key = element.nodes.clone();
            key.sort_unstable();
            match faces.get(&key) {
                Some(&(number, face)) => records.push(
                    Record::new("FRONTIER")
                        .count(number)
                        .count(face)
                        .text(function)
                        .finish(),
                ),
                None => log::warn!(
                    "flux on {} element {} of entity {} is not on a solid face",
                    boundary,
                    element.id,
                    element.entity
                ),
            }
        }
        Ok(records)
    }

    fn node_lists(ctx: &EmitContext<'_>) -> Result<Vec<String>> {
        let mut records = Vec::new();
        for list in &ctx.resolution.node_lists {
            let keyword = match list.category {
                Category::Void => "VOID",
                _ => "SYMMETRY",
            };
            records.push(
                Record::new(keyword)
                    .count(list.nodes.len())
                    .text(&list.label)
                    .finish(),
            );
            let numbers = list
                .nodes
                .iter()
                .map(|&node| ctx.numbering.number(node))
                .collect::<Result<Vec<_>>>()?;
            for chunk in numbers.chunks(NODES_PER_LINE) {
                let record = chunk.iter().fold(Record::blank(), |r, &n| r.count(n));
                records.push(record.finish());
            }
        }
        Ok(records)
    }
}

impl FamilyWriter for SolidWriter {
    fn family(&self) -> ElementFamily {
        ElementFamily::Solid
    }

    fn write(&self, ctx: &EmitContext<'_>, members: &[ElementRef]) -> Result<FamilyBlock> {
        let mut sections: SectionTable<Vec<usize>> = SectionTable::new();
        let mut elements = Vec::with_capacity(members.len());
        for (i, &at) in members.iter().enumerate() {
            let element = mesh_element(ctx, at)?;
            let pad = if at.shape == ShapeType::Volume { 8 } else { 4 };
            let nodes = node_numbers(ctx, element, pad)?;
            let section = sections.intern(materials(ctx, at, element)?);
            let record = nodes
                .iter()
                .fold(Record::new("ELEM").count(i + 1), |r, &n| r.count(n));
            elements.push(record.count(section).finish());
        }

        let mut records = vec![header("SOLID", members.len(), sections.len())];
        records.extend(elements);
        for (number, mats) in sections.iter() {
            records.push(with_materials(Record::new("SOLIDTYPE").count(number), mats).finish());
        }
        records.extend(Self::frontiers(ctx, members)?);
        records.extend(Self::node_lists(ctx)?);

        Ok(FamilyBlock {
            family: ElementFamily::Solid,
            records,
            elements: members.to_vec(),
            sections: sections.len(),
            material_refs: all_materials(sections.iter().map(|(_, m)| m.as_slice())),
        })
    }
}

/// Lumped masses on point elements
pub struct PointMassWriter;

impl FamilyWriter for PointMassWriter {
    fn family(&self) -> ElementFamily {
        ElementFamily::PointMass
    }

    fn write(&self, ctx: &EmitContext<'_>, members: &[ElementRef]) -> Result<FamilyBlock> {
        let mut sections: SectionTable<(RealKey, RealKey)> = SectionTable::new();
        let mut elements = Vec::with_capacity(members.len());
        for (i, &at) in members.iter().enumerate() {
            let element = mesh_element(ctx, at)?;
            let nodes = node_numbers(ctx, element, 1)?;
            let mass = ctx.table().get(Category::Mass, at).snapshot();
            let value = |key: &str| RealKey::new(mass.and_then(|s| s.number(key)).unwrap_or(0.0));
            let section = sections.intern((value("Translational"), value("Rotational")));
            elements.push(
                Record::new("ELEM")
                    .count(i + 1)
                    .count(nodes[0])
                    .count(section)
                    .finish(),
            );
        }

        let mut records = vec![header("MASS", members.len(), sections.len())];
        records.extend(elements);
        for (number, (translational, rotational)) in sections.iter() {
            records.push(
                Record::new("MASSTYPE")
                    .count(number)
                    .exp(translational.value())
                    .exp(rotational.value())
                    .finish(),
            );
        }
        Ok(FamilyBlock {
            family: ElementFamily::PointMass,
            records,
            elements: members.to_vec(),
            sections: sections.len(),
            material_refs: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::NodeNumbering;
    use crate::options::{EmitOptions, ResolveOptions};
    use crate::resolver::{ModelAssembler, Resolution};
    use crate::router::FamilyRouter;
    use fire_lite_model::{
        AssignMode, CatalogEntry, ElementKind, EntityId, InMemoryMesh, PropertySnapshot,
        PropertyValue, Scope,
    };

    struct Fixture {
        session: Session,
        mesh: InMemoryMesh,
    }

    impl Fixture {
        fn new(problem: &str) -> Self {
            let mut session = Session::new();
            session.select(&[], "Problem", problem).unwrap();
            Self {
                session,
                mesh: InMemoryMesh::new(),
            }
        }

        fn material(&mut self, name: &str, shape: ShapeType) -> &mut Self {
            self.session
                .define_catalog_entry(
                    CatalogKind::Material,
                    CatalogEntry::new(
                        name,
                        shape,
                        PropertySnapshot::new().with_subtype("Steel EC3"),
                    ),
                )
                .unwrap();
            self
        }

        fn assign(
            &mut self,
            category: Category,
            shape: ShapeType,
            entity: u32,
            snapshot: PropertySnapshot,
        ) -> &mut Self {
            let scope = Scope::Entity(EntityId(entity));
            self.session
                .assign(category, shape, scope, snapshot, AssignMode::Add, None)
                .unwrap();
            self
        }

        fn blocks(&self) -> Result<Vec<FamilyBlock>> {
            let problem = self.session.problem()?;
            let options = ResolveOptions::new(problem);
            let resolution: Resolution =
                ModelAssembler::new(&self.session, &self.mesh, options).resolve()?;
            let beams = beam_nodes(problem, &self.session, &self.mesh, &resolution.table)?;
            let numbering = NodeNumbering::build(&self.mesh, problem, &beams)?;
            let options = EmitOptions::from_tree(self.session.tree())?;
            let ctx = EmitContext {
                options: &options,
                session: &self.session,
                mesh: &self.mesh,
                resolution: &resolution,
                numbering: &numbering,
            };
            FamilyRouter::with_default_writers().route(&ctx)
        }
    }

    fn named(name: &str) -> PropertySnapshot {
        PropertySnapshot::new().with_text("Name", name)
    }

    #[test]
    fn test_shared_section() {
        let mut f = Fixture::new("Thermal 2D");
        f.material("steel", ShapeType::Surface)
            .assign(Category::Material, ShapeType::Surface, 7, named("steel"));
        f.mesh
            .add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [1.0, 1.0, 0.0])
            .add_node(4u64, [0.0, 1.0, 0.0]);
        f.mesh
            .add_element(1u64, ElementKind::Triangle, 7u32, &[1, 2, 3])
            .unwrap()
            .add_element(2u64, ElementKind::Triangle, 7u32, &[1, 3, 4])
            .unwrap();

        let blocks = f.blocks().unwrap();
        assert_eq!(blocks.len(), 1);
        let solid = &blocks[0];
        assert_eq!(solid.family, ElementFamily::Solid);
        assert_eq!(solid.sections, 1);
        assert_eq!(solid.records[0], header("SOLID", 2, 1));
        assert!(solid.records[1].ends_with("     0     1"));
        assert!(solid.records[2].ends_with("     0     1"));
        assert_eq!(
            solid.records[3],
            Record::new("SOLIDTYPE").count(1).count(1).count(1).finish()
        );
        assert_eq!(solid.material_refs, vec![1]);
    }

    fn truss_fixture(second_area: f64) -> Fixture {
        let mut f = Fixture::new("Structural 2D");
        f.material("steel", ShapeType::Curve);
        for (entity, area) in [(1, 0.01), (2, second_area)] {
            let section = PropertySnapshot::new()
                .with_subtype("Truss")
                .with_float("Area", area);
            f.assign(Category::Section, ShapeType::Curve, entity, section)
                .assign(Category::Material, ShapeType::Curve, entity, named("steel"));
        }
        f.mesh
            .add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [2.0, 0.0, 0.0]);
        f.mesh
            .add_element(1u64, ElementKind::Line, 1u32, &[1, 2])
            .unwrap()
            .add_element(2u64, ElementKind::Line, 2u32, &[2, 3])
            .unwrap();
        f
    }

    #[test]
    fn test_truss_section_dedup() {
        let same = truss_fixture(0.01).blocks().unwrap();
        assert_eq!(same[0].family, ElementFamily::Truss);
        assert_eq!(same[0].sections, 1);

        let different = truss_fixture(0.02).blocks().unwrap();
        assert_eq!(different[0].sections, 2);
        assert!(different[0].records[2].ends_with("     2"));
    }

    #[test]
    fn test_beam_with_relaxation() {
        let mut f = Fixture::new("Structural 2D");
        f.material("steel", ShapeType::Curve);
        let section = PropertySnapshot::new()
            .with_subtype("Beam")
            .with_text("Section file", "ipe300.tem");
        let mut relax = vec![0.0; 7];
        relax[5] = 1.0;
        let relaxation = PropertySnapshot::new().with("Start", PropertyValue::Vector(relax));
        f.assign(Category::Section, ShapeType::Curve, 1, section)
            .assign(Category::Material, ShapeType::Curve, 1, named("steel"))
            .assign(Category::Relaxation, ShapeType::Curve, 1, relaxation);
        f.mesh
            .add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [2.0, 0.0, 0.0]);
        // Listed against the curve direction
        f.mesh
            .add_element(1u64, ElementKind::Line, 1u32, &[3, 2])
            .unwrap()
            .add_element(2u64, ElementKind::Line, 1u32, &[2, 1])
            .unwrap();

        let blocks = f.blocks().unwrap();
        let beam = &blocks[0];
        assert_eq!(beam.family, ElementFamily::Beam);
        assert_eq!(beam.sections, 1);
        // Nodes 3, 2, 1 are numbered 1, 2, 3; midpoints follow
        assert_eq!(
            beam.records[1],
            Record::new("ELEM").count(1).count(1).count(4).count(2).count(1).finish()
        );
        assert_eq!(
            beam.records[3],
            Record::new("BEAMTYPE").count(1).count(1).count(1).text("ipe300.tem").finish()
        );
        // The curve starts at node 3, the free end met first
        assert_eq!(
            beam.records[4],
            Record::new("RELAX").count(1).count(1).exps(&[0.0, 0.0, 1.0]).finish()
        );
        assert_eq!(beam.records.len(), 5);
    }

    #[test]
    fn test_frontier_matches_face() {
        let mut f = Fixture::new("Thermal 2D");
        f.material("steel", ShapeType::Surface)
            .assign(Category::Material, ShapeType::Surface, 7, named("steel"))
            .assign(
                Category::Flux,
                ShapeType::Curve,
                3,
                PropertySnapshot::new().with_text("Function", "FISO"),
            );
        f.mesh
            .add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [0.0, 1.0, 0.0]);
        f.mesh
            .add_element(1u64, ElementKind::Triangle, 7u32, &[1, 2, 3])
            .unwrap()
            .add_element(2u64, ElementKind::Line, 3u32, &[3, 2])
            .unwrap();

        let blocks = f.blocks().unwrap();
        let frontier = blocks[0]
            .records
            .iter()
            .find(|r| r.starts_with("FRONTIER"))
            .unwrap();
        assert_eq!(
            frontier,
            &Record::new("FRONTIER").count(1).count(2).text("FISO").finish()
        );
    }

    #[test]
    fn test_beam_3d_needs_local_axis() {
        let mut f = Fixture::new("Structural 3D");
        f.material("steel", ShapeType::Curve);
        let section = PropertySnapshot::new()
            .with_subtype("Beam")
            .with_text("Section file", "hea200.tem");
        f.assign(Category::Section, ShapeType::Curve, 1, section)
            .assign(Category::Material, ShapeType::Curve, 1, named("steel"));
        f.mesh
            .add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [2.0, 0.0, 0.0]);
        f.mesh
            .add_element(1u64, ElementKind::Line, 1u32, &[1, 2])
            .unwrap();
        let err = f.blocks().unwrap_err();
        assert!(err.to_string().contains("LocalAxis"));

        f.session
            .define_catalog_entry(
                CatalogKind::LocalAxis,
                CatalogEntry::new("up", ShapeType::Curve, PropertySnapshot::new()),
            )
            .unwrap();
        f.assign(Category::LocalAxis, ShapeType::Curve, 1, named("up"));
        let blocks = f.blocks().unwrap();
        assert_eq!(
            blocks[0].records[1],
            Record::new("ELEM").count(1).count(1).count(3).count(2).count(4).count(1).finish()
        );
    }
}
