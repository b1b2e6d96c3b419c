// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input Writer - Render a resolved model as solver input
//!
//! The whole file is rendered in memory, validated, then persisted through
//! a temporary file in the target directory so a failed run never leaves a
//! partial file behind.
//!
//! Block order:
//!
//! 1. header (`TITLE`, `PROBLEM`, sizes, solver strategy or initial temperature)
//! 2. `NODES`
//! 3. `FIXATIONS` ... `END_FIX` (structural problems)
//! 4. element families: point mass, beam, shell, solid, truss
//! 5. `MATERIALS`
//! 6. `LOADS` ... `END_LOAD` (structural problems)
//! 7. `TIME` ... `ENDTIME`, `OUTPUT`

use crate::families::beam_nodes;
use crate::layout::{keyword, Record};
use crate::numbering::NodeNumbering;
use crate::options::EmitOptions;
use crate::resolver::{ElementRef, Resolution};
use crate::router::{ElementFamily, EmitContext, FamilyBlock, FamilyRouter};
use fire_lite_model::{
    CatalogKind, Category, Error, MeshTopology, PropertySnapshot, ProblemKind, Result, Session,
    ShapeType,
};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Rendered solver input with the figures used to validate it
#[derive(Clone, Debug, PartialEq)]
pub struct InputImage {
    pub text: String,
    /// Emitted nodes, synthesized ones included
    pub nodes: usize,
    /// Element count per emitted family
    pub elements: Vec<(ElementFamily, usize)>,
    /// Distinct sections over all families
    pub sections: usize,
    /// Emitted material definitions
    pub materials: usize,
    /// Material indices referenced by sections
    pub material_refs: Vec<usize>,
}

impl InputImage {
    /// Total element count
    pub fn element_count(&self) -> usize {
        self.elements.iter().map(|(_, n)| n).sum()
    }

    /// Check the image before it is written
    pub fn validate(&self) -> Result<()> {
        if self.element_count() == 0 {
            return Err(Error::validation("the model has no elements to emit"));
        }
        if let Some(bad) = self
            .material_refs
            .iter()
            .find(|&&m| m == 0 || m > self.materials)
        {
            return Err(Error::validation(format!(
                "material {} is referenced but only {} are defined",
                bad, self.materials
            )));
        }
        Ok(())
    }
}

/// Solver input writer over a resolved model
pub struct InputWriter<'a> {
    session: &'a Session,
    mesh: &'a dyn MeshTopology,
    options: EmitOptions,
    router: FamilyRouter,
}

impl<'a> InputWriter<'a> {
    /// Writer with options read from the session's tree
    pub fn new(session: &'a Session, mesh: &'a dyn MeshTopology) -> Result<Self> {
        let options = EmitOptions::from_tree(session.tree())?;
        Ok(Self::with_options(session, mesh, options))
    }

    pub fn with_options(
        session: &'a Session,
        mesh: &'a dyn MeshTopology,
        options: EmitOptions,
    ) -> Self {
        Self {
            session,
            mesh,
            options,
            router: FamilyRouter::with_default_writers(),
        }
    }

    /// Replace the family router
    pub fn with_router(mut self, router: FamilyRouter) -> Self {
        self.router = router;
        self
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// Render the complete input file
    pub fn render(&self, resolution: &Resolution) -> Result<InputImage> {
        let problem = self.options.problem;
        if resolution.problem != problem {
            return Err(Error::configuration(format!(
                "resolution is for {} but the writer emits {}",
                resolution.problem, problem
            )));
        }
        let beams = beam_nodes(problem, self.session, self.mesh, &resolution.table)?;
        let numbering = NodeNumbering::build(self.mesh, problem, &beams)?;
        let ctx = EmitContext {
            options: &self.options,
            session: self.session,
            mesh: self.mesh,
            resolution,
            numbering: &numbering,
        };
        let blocks = self.router.route(&ctx)?;

        let mut lines: Vec<String> = Vec::new();
        self.header(&mut lines, numbering.len());
        nodes(&mut lines, problem, &numbering);
        if !problem.is_thermal() {
            fixations(&mut lines, &ctx)?;
        }
        for block in &blocks {
            lines.extend(block.records.iter().cloned());
        }
        let materials = self.materials(&mut lines)?;
        if !problem.is_thermal() {
            loads(&mut lines, &ctx, &blocks)?;
        }
        self.time(&mut lines);

        let mut text = lines.join("\n");
        text.push('\n');
        let mut material_refs: Vec<usize> = blocks
            .iter()
            .flat_map(|b| b.material_refs.iter().copied())
            .collect();
        material_refs.sort_unstable();
        material_refs.dedup();

        let image = InputImage {
            text,
            nodes: numbering.len(),
            elements: blocks.iter().map(|b| (b.family, b.elements.len())).collect(),
            sections: blocks.iter().map(|b| b.sections).sum(),
            materials,
            material_refs,
        };
        log::debug!(
            "rendered {} nodes, {} elements, {} sections, {} materials",
            image.nodes,
            image.element_count(),
            image.sections,
            image.materials
        );
        Ok(image)
    }

    /// Render, validate and persist the input file
    pub fn write(&self, resolution: &Resolution, path: impl AsRef<Path>) -> Result<InputImage> {
        let image = self.render(resolution)?;
        image.validate()?;
        write_atomic(path.as_ref(), &image.text)?;
        log::info!("wrote {} ({} bytes)", path.as_ref().display(), image.text.len());
        Ok(image)
    }

    fn header(&self, lines: &mut Vec<String>, node_count: usize) {
        let problem = self.options.problem;
        let params = &self.options.params;
        lines.push(Record::new("TITLE").text(&self.options.title).finish());
        lines.push(Record::new("PROBLEM").text(problem_code(problem)).finish());
        lines.push(Record::new("NNODE").count(node_count).finish());
        lines.push(Record::new("NDIM").count(problem.ndim()).finish());
        lines.push(Record::new("NDOFMAX").count(problem.dofs().len()).finish());
        lines.push(
            Record::new("NMAT")
                .count(self.session.catalog().len(CatalogKind::Material))
                .finish(),
        );
        if let Some(temperature) = params.initial_temperature {
            lines.push(Record::new("TEMPINIT").real(temperature).finish());
        }
        if let Some(strategy) = params.strategy {
            lines.push(Record::new("STRATEGY").int(strategy).finish());
        }
        if let Some(convergence) = params.convergence {
            lines.push(Record::new("CONVERG").exp(convergence).finish());
        }
        if let Some(npttot) = params.npttot {
            lines.push(Record::new("NPTTOT").int(npttot).finish());
        }
    }

    /// Every catalog material, in catalog order
    fn materials(&self, lines: &mut Vec<String>) -> Result<usize> {
        let tree = self.session.tree();
        let entries = self.session.catalog().entries(CatalogKind::Material);
        lines.push(keyword("MATERIALS"));
        for entry in entries {
            let snapshot = &entry.snapshot;
            let template =
                tree.catalog_template(CatalogKind::Material, snapshot.subtype.as_deref())?;
            let values: Vec<f64> = template
                .properties
                .iter()
                .filter(|def| def.labels.is_empty() && def.value.as_f64().is_some())
                .map(|def| snapshot.number(&def.key).unwrap_or(0.0))
                .collect();
            lines.push(Record::new(material_code(&template.key, snapshot)).exps(&values).finish());
        }
        Ok(entries.len())
    }

    fn time(&self, lines: &mut Vec<String>) {
        let params = &self.options.params;
        lines.push(keyword("TIME"));
        lines.push(
            Record::blank()
                .real(params.time_step)
                .real(params.final_time)
                .finish(),
        );
        lines.push(keyword("ENDTIME"));
        lines.push(keyword("OUTPUT"));
        lines.push(Record::new("TIMEPRINT").real(params.output_step).finish());
    }
}

/// Solver name of a problem kind
pub fn problem_code(problem: ProblemKind) -> &'static str {
    match problem {
        ProblemKind::Structural3D => "STRUCTURE3D",
        ProblemKind::Structural2D => "STRUCTURE2D",
        ProblemKind::Thermal2D => "THERMAL2D",
        ProblemKind::Thermal3D => "THERMAL3D",
        ProblemKind::Torsion => "TORSION",
    }
}

/// Solver keyword of a material model
fn material_code(model: &str, snapshot: &PropertySnapshot) -> &'static str {
    match model {
        "Steel EC3" => "STEELEC3",
        "Concrete EC2" => match snapshot.get("Aggregate").and_then(|v| v.as_int()) {
            Some(1) => "CALCONC_EN",
            _ => "SILCONC_EN",
        },
        "Thermal" => "USER1",
        _ => "ELASTIC",
    }
}

fn nodes(lines: &mut Vec<String>, problem: ProblemKind, numbering: &NodeNumbering) {
    let ndim = problem.ndim();
    lines.push(keyword("NODES"));
    for node in numbering.nodes() {
        let record = node.coords[..ndim]
            .iter()
            .fold(Record::new("NODE").count(node.number), |r, &c| r.real(c));
        lines.push(record.finish());
    }
}

fn fixations(lines: &mut Vec<String>, ctx: &EmitContext<'_>) -> Result<()> {
    let dofs = ctx.options.problem.dofs();
    lines.push(keyword("FIXATIONS"));
    for fixation in &ctx.resolution.fixations {
        let record = fixation
            .codes
            .iter()
            .fold(
                Record::new("BLOCK").count(ctx.numbering.number(fixation.node)?),
                |r, code| r.text(code),
            );
        lines.push(record.finish());
    }
    for class in ctx.resolution.equivalences.classes() {
        let mut numbers = class
            .nodes
            .iter()
            .map(|&node| ctx.numbering.number(node))
            .collect::<Result<Vec<_>>>()?;
        numbers.sort_unstable();
        let Some((&master, slaves)) = numbers.split_first() else {
            continue;
        };
        for &slave in slaves {
            let record = (0..dofs.len()).fold(
                Record::new("SAME").count(slave).count(master),
                |r, d| r.text(if class.mask.contains(d) { "YES" } else { "NO" }),
            );
            lines.push(record.finish());
        }
    }
    lines.push(keyword("END_FIX"));
    Ok(())
}

/// Values of a nodal load for the problem's DOFs
fn nodal_values(problem: ProblemKind, load: &PropertySnapshot) -> Vec<f64> {
    problem
        .dofs()
        .iter()
        .map(|dof| {
            let key = match *dof {
                "X" => "FX",
                "Y" => "FY",
                "Z" => "FZ",
                "RX" => "MX",
                "RY" => "MY",
                "RZ" => "MZ",
                _ => return 0.0,
            };
            load.number(key).unwrap_or(0.0)
        })
        .collect()
}

fn components(load: &PropertySnapshot) -> Vec<f64> {
    ["QX", "QY", "QZ"]
        .iter()
        .map(|key| load.number(key).unwrap_or(0.0))
        .collect()
}

fn host_number(
    ctx: &EmitContext<'_>,
    blocks: &[FamilyBlock],
    family: ElementFamily,
    at: ElementRef,
) -> Result<usize> {
    blocks
        .iter()
        .find(|b| b.family == family)
        .and_then(|b| b.number_of(at))
        .ok_or_else(|| {
            let (id, entity) = ctx
                .mesh
                .elements(at.shape)
                .get(at.index)
                .map(|e| (e.id.to_string(), e.entity.to_string()))
                .unwrap_or_default();
            Error::consistency(format!(
                "Load on {} element {} of entity {} needs a {} element",
                at.shape, id, entity, family
            ))
        })
}

/// Load records grouped by time function, functions in first-seen order
fn loads(lines: &mut Vec<String>, ctx: &EmitContext<'_>, blocks: &[FamilyBlock]) -> Result<()> {
    let problem = ctx.options.problem;
    let table = ctx.table();
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();

    for &shape in Category::Load.shapes_for(problem) {
        let Some(column) = table.column(Category::Load, shape) else {
            continue;
        };
        for (index, (element, value)) in ctx.mesh.elements(shape).iter().zip(column).enumerate() {
            let at = ElementRef::new(shape, index);
            for load in value.snapshots() {
                let records = match (shape, load.subtype.as_deref()) {
                    (ShapeType::Point, _) => element
                        .nodes
                        .iter()
                        .map(|&node| {
                            Ok(Record::new("NODELOAD")
                                .count(ctx.numbering.number(node)?)
                                .exps(&nodal_values(problem, load))
                                .finish())
                        })
                        .collect::<Result<Vec<_>>>()?,
                    (ShapeType::Curve, Some("Trapezoidal")) => {
                        let number = host_number(ctx, blocks, ElementFamily::Beam, at)?;
                        let start = load.vector("Start").unwrap_or(&[]);
                        let end = load.vector("End").unwrap_or(&[]);
                        let (a, b) = match table.position(index) {
                            Some(position) => position.interpolate(start, end),
                            None => (start.to_vec(), end.to_vec()),
                        };
                        vec![Record::new("TRAPBEAM").count(number).exps(&a).exps(&b).finish()]
                    }
                    (ShapeType::Curve, _) => {
                        let number = host_number(ctx, blocks, ElementFamily::Beam, at)?;
                        let record = Record::new("DISTRBEAM").count(number);
                        vec![record.exps(&components(load)).finish()]
                    }
                    _ => {
                        let number = host_number(ctx, blocks, ElementFamily::Shell, at)?;
                        vec![Record::new("DISTRSH").count(number).exps(&components(load)).finish()]
                    }
                };
                let function = load.text("Function").unwrap_or("FLOAD");
                match groups.iter_mut().find(|(f, _)| f == function) {
                    Some((_, list)) => list.extend(records),
                    None => groups.push((function.to_string(), records)),
                }
            }
        }
    }

    lines.push(keyword("LOADS"));
    for (function, records) in groups {
        lines.push(Record::new("FUNCTION").text(&function).finish());
        lines.extend(records);
    }
    lines.push(keyword("END_LOAD"));
    Ok(())
}

/// Write a file through a temporary sibling and an atomic rename
pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(())
}
