// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordinal position of line elements along their parent curve

use fire_lite_model::{
    ElementKind, EntityId, MeshElement, MeshTopology, MeshTopologyExt, NodeId, Result, ShapeType,
};
use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// Where a line element sits on its curve
///
/// `start` and `end` are the arc-length fractions of the curve at the
/// element's first and second node, so a reversed element has
/// `start > end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePosition {
    /// Rank along the curve, from its free end
    pub index: usize,
    /// Number of elements on the curve
    pub count: usize,
    /// Curve fraction at the element's first node
    pub start: f64,
    /// Curve fraction at the element's second node
    pub end: f64,
}

impl CurvePosition {
    /// Whether the element touches the curve start
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Whether the element touches the curve end
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.count
    }

    /// Whether the element runs against the curve direction
    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }

    /// Linear interpolation of two vectors at the element's nodes
    pub fn interpolate(&self, from: &[f64], to: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let at = |t: f64| -> Vec<f64> {
            from.iter()
                .zip(to)
                .map(|(a, b)| a + (b - a) * t)
                .collect()
        };
        (at(self.start), at(self.end))
    }
}

/// Positions of every curve element, indexed like `mesh.elements(Curve)`
///
/// Each curve's elements are chained through shared nodes from a free
/// end. Curves whose elements do not form a simple open chain keep mesh
/// order with uniform fractions.
pub fn curve_positions(mesh: &dyn MeshTopology) -> Result<Vec<Option<CurvePosition>>> {
    let elements = mesh.elements(ShapeType::Curve);
    let mut positions = vec![None; elements.len()];

    let mut order: Vec<EntityId> = Vec::new();
    let mut members: FxHashMap<EntityId, Vec<usize>> = FxHashMap::default();
    for (index, element) in elements.iter().enumerate() {
        if element.kind != ElementKind::Line {
            continue;
        }
        members
            .entry(element.entity)
            .or_insert_with(|| {
                order.push(element.entity);
                Vec::new()
            })
            .push(index);
    }

    for entity in order {
        let Some(indices) = members.get(&entity) else {
            continue;
        };
        let count = indices.len();
        let Some(chain) = chain_order(elements, indices) else {
            log::debug!("curve {} is not a simple chain, keeping mesh order", entity);
            for (rank, &index) in indices.iter().enumerate() {
                positions[index] = Some(CurvePosition {
                    index: rank,
                    count,
                    start: rank as f64 / count as f64,
                    end: (rank + 1) as f64 / count as f64,
                });
            }
            continue;
        };

        let mut lengths = Vec::with_capacity(count);
        for &(index, _) in &chain {
            let nodes = &elements[index].nodes;
            let a = point(mesh, nodes[0])?;
            let b = point(mesh, nodes[1])?;
            lengths.push(nalgebra::distance(&a, &b));
        }
        let total: f64 = lengths.iter().sum();

        let mut walked = 0.0;
        for (rank, (&(index, entry), length)) in chain.iter().zip(&lengths).enumerate() {
            let (from, to) = if total > 0.0 {
                (walked / total, (walked + length) / total)
            } else {
                (rank as f64 / count as f64, (rank + 1) as f64 / count as f64)
            };
            walked += length;
            let forward = elements[index].nodes[0] == entry;
            positions[index] = Some(CurvePosition {
                index: rank,
                count,
                start: if forward { from } else { to },
                end: if forward { to } else { from },
            });
        }
    }
    Ok(positions)
}

fn point(mesh: &dyn MeshTopology, id: NodeId) -> Result<Point3<f64>> {
    let node = mesh.node_or_err(id)?;
    Ok(Point3::from(node.coords))
}

/// Chain order of a curve's elements with each element's entry node
fn chain_order(elements: &[MeshElement], indices: &[usize]) -> Option<Vec<(usize, NodeId)>> {
    let mut incident: FxHashMap<NodeId, Vec<usize>> = FxHashMap::default();
    for &index in indices {
        let nodes = &elements[index].nodes;
        if nodes.len() != 2 || nodes[0] == nodes[1] {
            return None;
        }
        for &node in nodes {
            incident.entry(node).or_default().push(index);
        }
    }
    if incident.values().any(|list| list.len() > 2) {
        return None;
    }

    // First free end in mesh order
    let start = indices.iter().find_map(|&index| {
        elements[index]
            .nodes
            .iter()
            .copied()
            .find(|node| incident.get(node).is_some_and(|list| list.len() == 1))
    })?;

    let mut order = Vec::with_capacity(indices.len());
    let mut used = vec![false; elements.len()];
    let mut current = start;
    while let Some(&index) = incident
        .get(&current)
        .and_then(|list| list.iter().find(|&&index| !used[index]))
    {
        used[index] = true;
        order.push((index, current));
        let nodes = &elements[index].nodes;
        current = if nodes[0] == current { nodes[1] } else { nodes[0] };
    }

    (order.len() == indices.len()).then_some(order)
}
