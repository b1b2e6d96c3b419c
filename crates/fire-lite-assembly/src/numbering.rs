// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deterministic node renumbering and synthesized beam nodes

use crate::resolver::ElementRef;
use fire_lite_model::{Error, MeshTopology, MeshTopologyExt, NodeId, ProblemKind, Result, ShapeType};
use nalgebra::{Point3, Vector3};
use rustc_hash::{FxHashMap, FxHashSet};

/// Where an emitted node comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeSource {
    Mesh(NodeId),
    /// Middle node of a beam element
    Midpoint(ElementRef),
    /// Orientation reference node of a 3-D beam element
    Orientation(ElementRef),
}

/// One emitted node
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumberedNode {
    pub number: usize,
    pub coords: [f64; 3],
    pub source: NodeSource,
}

/// Beam element needing synthesized nodes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamNodes {
    pub element: ElementRef,
    /// Local axis of a 3-D beam; `None` skips the orientation node
    pub axis: Option<Vector3<f64>>,
}

/// Mapping from mesh node ids and synthesized nodes to 1-based numbers
#[derive(Clone, Debug, Default)]
pub struct NodeNumbering {
    nodes: Vec<NumberedNode>,
    mesh: FxHashMap<NodeId, usize>,
    midpoints: FxHashMap<ElementRef, usize>,
    orientations: FxHashMap<ElementRef, usize>,
}

impl NodeNumbering {
    /// Number the nodes of the elements emitted for a problem
    ///
    /// Mesh nodes come first, in first-seen order over point elements
    /// (structural problems) then the problem's element shapes. Torsion
    /// puts the min-x border first, then the max-x border, each by
    /// ascending y. Synthesized nodes follow in beam order.
    pub fn build(
        mesh: &dyn MeshTopology,
        problem: ProblemKind,
        beams: &[BeamNodes],
    ) -> Result<Self> {
        let mut order: Vec<NodeId> = Vec::new();
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        for shape in emitted_shapes(problem) {
            for element in mesh.elements(shape) {
                for &node in &element.nodes {
                    if seen.insert(node) {
                        order.push(node);
                    }
                }
            }
        }
        if problem == ProblemKind::Torsion {
            order = border_order(mesh, order)?;
        }

        let mut numbering = Self::default();
        for node in order {
            let coords = mesh.node_or_err(node)?.coords;
            let number = numbering.push(coords, NodeSource::Mesh(node));
            numbering.mesh.insert(node, number);
        }

        for beam in beams {
            let (a, b) = beam_ends(mesh, beam.element)?;
            let mid = nalgebra::center(&a, &b);
            let number = numbering.push([mid.x, mid.y, mid.z], NodeSource::Midpoint(beam.element));
            numbering.midpoints.insert(beam.element, number);

            if let Some(axis) = beam.axis {
                let at = orientation_point(&a, &b, &axis);
                let source = NodeSource::Orientation(beam.element);
                let number = numbering.push([at.x, at.y, at.z], source);
                numbering.orientations.insert(beam.element, number);
            }
        }
        log::debug!(
            "numbered {} mesh nodes and {} synthesized nodes",
            numbering.mesh.len(),
            numbering.nodes.len() - numbering.mesh.len()
        );
        Ok(numbering)
    }

    fn push(&mut self, coords: [f64; 3], source: NodeSource) -> usize {
        let number = self.nodes.len() + 1;
        self.nodes.push(NumberedNode {
            number,
            coords,
            source,
        });
        number
    }

    /// Number of a mesh node
    pub fn number(&self, node: NodeId) -> Result<usize> {
        self.mesh
            .get(&node)
            .copied()
            .ok_or_else(|| {
                Error::consistency(format!("node {} is not part of any emitted element", node))
            })
    }

    /// Number of a beam's midpoint node
    pub fn midpoint(&self, element: ElementRef) -> Option<usize> {
        self.midpoints.get(&element).copied()
    }

    /// Number of a beam's orientation node
    pub fn orientation(&self, element: ElementRef) -> Option<usize> {
        self.orientations.get(&element).copied()
    }

    /// All nodes in numbering order
    pub fn nodes(&self) -> &[NumberedNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn emitted_shapes(problem: ProblemKind) -> Vec<ShapeType> {
    let mut shapes = Vec::with_capacity(4);
    if !problem.is_thermal() {
        shapes.push(ShapeType::Point);
    }
    shapes.extend_from_slice(problem.element_shapes());
    shapes
}

fn border_order(mesh: &dyn MeshTopology, order: Vec<NodeId>) -> Result<Vec<NodeId>> {
    let mut coords = Vec::with_capacity(order.len());
    for &node in &order {
        coords.push(mesh.node_or_err(node)?.coords);
    }
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for c in &coords {
        min_x = min_x.min(c[0]);
        max_x = max_x.max(c[0]);
        min_y = min_y.min(c[1]);
        max_y = max_y.max(c[1]);
    }
    if coords.is_empty() {
        return Ok(order);
    }
    let tolerance = 1e-9 * (max_x - min_x).max(max_y - min_y).max(1.0);

    let mut placed = vec![false; order.len()];
    let border = |target: f64, placed: &mut Vec<bool>| {
        let mut side: Vec<usize> = (0..order.len())
            .filter(|&i| !placed[i] && (coords[i][0] - target).abs() <= tolerance)
            .collect();
        side.sort_by(|&a, &b| coords[a][1].total_cmp(&coords[b][1]));
        for &i in &side {
            placed[i] = true;
        }
        side
    };
    let left = border(min_x, &mut placed);
    let right = border(max_x, &mut placed);

    let rest = (0..order.len()).filter(|&i| !placed[i]);
    Ok(left
        .into_iter()
        .chain(right)
        .chain(rest)
        .map(|i| order[i])
        .collect())
}

fn beam_ends(mesh: &dyn MeshTopology, element: ElementRef) -> Result<(Point3<f64>, Point3<f64>)> {
    let beam = mesh
        .elements(element.shape)
        .get(element.index)
        .ok_or_else(|| {
            Error::consistency(format!("no {} element at {}", element.shape, element.index))
        })?;
    let [first, second] = beam.nodes.as_slice() else {
        return Err(Error::validation(format!(
            "beam element {} needs two nodes",
            beam.id
        )));
    };
    let a = Point3::from(mesh.node_or_err(*first)?.coords);
    let b = Point3::from(mesh.node_or_err(*second)?.coords);
    if nalgebra::distance(&a, &b) == 0.0 {
        return Err(Error::validation(format!(
            "beam element {} of entity {} has zero length",
            beam.id, beam.entity
        )));
    }
    Ok((a, b))
}

/// Point one beam length away from the midpoint, along the part of the
/// local axis perpendicular to the beam
pub fn orientation_point(a: &Point3<f64>, b: &Point3<f64>, axis: &Vector3<f64>) -> Point3<f64> {
    let along = b - a;
    let length = along.norm();
    let direction = along / length;
    let mid = nalgebra::center(a, b);

    let perpendicular = |v: &Vector3<f64>| v - direction * v.dot(&direction);
    let mut normal = perpendicular(axis);
    if normal.norm() <= 1e-12 * axis.norm().max(1.0) {
        let fallback = if direction.z.abs() > 0.9 {
            Vector3::y()
        } else {
            Vector3::z()
        };
        log::warn!(
            "local axis {:?} is zero or parallel to the beam, using {:?}",
            axis.as_slice(),
            fallback.as_slice()
        );
        normal = perpendicular(&fallback);
    }
    mid + normal.normalize() * length
}
