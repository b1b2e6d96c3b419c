// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for model representation
//!
//! This module defines the identifiers and enumerations shared by the
//! property engine, the resolver and the emitter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometric entity identifier
///
/// Wraps the host geometry tag of a point, curve, surface or volume.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

/// Physical group identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize, Default)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0)
    }
}

impl From<u32> for GroupId {
    fn from(id: u32) -> Self {
        GroupId(id)
    }
}

/// Mesh node identifier as assigned by the meshing kernel
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize, Default)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// Mesh element identifier as assigned by the meshing kernel
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize, Default)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        ElementId(id)
    }
}

/// Kind of geometric entity, one per topological dimension
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum ShapeType {
    Point,
    Curve,
    Surface,
    Volume,
}

impl ShapeType {
    /// All shape types in ascending dimension
    pub const ALL: [ShapeType; 4] = [
        ShapeType::Point,
        ShapeType::Curve,
        ShapeType::Surface,
        ShapeType::Volume,
    ];

    /// Topological dimension (0..=3)
    pub fn dimension(&self) -> u8 {
        match self {
            ShapeType::Point => 0,
            ShapeType::Curve => 1,
            ShapeType::Surface => 2,
            ShapeType::Volume => 3,
        }
    }

    /// Shape type of a topological dimension
    pub fn from_dimension(dim: u8) -> Option<Self> {
        Self::ALL.get(dim as usize).copied()
    }

    /// Name used in persisted files
    pub fn name(&self) -> &'static str {
        match self {
            ShapeType::Point => "Point",
            ShapeType::Curve => "Curve",
            ShapeType::Surface => "Surface",
            ShapeType::Volume => "Volume",
        }
    }

    /// Parse a persisted shape name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|shape| shape.name().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mesh element type
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ElementKind {
    Point,
    Line,
    Triangle,
    Quadrangle,
    Tetrahedron,
    Hexahedron,
    Prism,
}

impl ElementKind {
    /// Shape type the element discretizes
    pub fn shape(&self) -> ShapeType {
        match self {
            ElementKind::Point => ShapeType::Point,
            ElementKind::Line => ShapeType::Curve,
            ElementKind::Triangle | ElementKind::Quadrangle => ShapeType::Surface,
            ElementKind::Tetrahedron | ElementKind::Hexahedron | ElementKind::Prism => {
                ShapeType::Volume
            }
        }
    }

    /// Number of corner nodes
    pub fn node_count(&self) -> usize {
        match self {
            ElementKind::Point => 1,
            ElementKind::Line => 2,
            ElementKind::Triangle => 3,
            ElementKind::Quadrangle => 4,
            ElementKind::Tetrahedron => 4,
            ElementKind::Hexahedron => 8,
            ElementKind::Prism => 6,
        }
    }

    /// Faces as local node indices (edges for 2-D elements)
    pub fn faces(&self) -> &'static [&'static [usize]] {
        match self {
            ElementKind::Point | ElementKind::Line => &[],
            ElementKind::Triangle => &[&[0, 1], &[1, 2], &[2, 0]],
            ElementKind::Quadrangle => &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]],
            ElementKind::Tetrahedron => &[&[0, 1, 2], &[0, 1, 3], &[1, 2, 3], &[0, 2, 3]],
            ElementKind::Hexahedron => &[
                &[0, 1, 2, 3],
                &[4, 5, 6, 7],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
            ],
            ElementKind::Prism => &[
                &[0, 1, 2],
                &[3, 4, 5],
                &[0, 1, 4, 3],
                &[1, 2, 5, 4],
                &[2, 0, 3, 5],
            ],
        }
    }
}

/// Analysis performed by the downstream solver
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ProblemKind {
    /// Transient heat transfer on a 2-D cross-section
    Thermal2D,
    /// Torsional stiffness of a 2-D cross-section
    Torsion,
    /// Transient heat transfer in a 3-D solid
    Thermal3D,
    /// Plane frame analysis
    Structural2D,
    /// Space frame, shell and solid analysis
    Structural3D,
}

impl ProblemKind {
    /// All problem kinds in tree order
    pub const ALL: [ProblemKind; 5] = [
        ProblemKind::Structural3D,
        ProblemKind::Structural2D,
        ProblemKind::Thermal2D,
        ProblemKind::Thermal3D,
        ProblemKind::Torsion,
    ];

    /// Display name, also the variant name in the property tree
    pub fn name(&self) -> &'static str {
        match self {
            ProblemKind::Thermal2D => "Thermal 2D",
            ProblemKind::Torsion => "Torsion",
            ProblemKind::Thermal3D => "Thermal 3D",
            ProblemKind::Structural2D => "Structural 2D",
            ProblemKind::Structural3D => "Structural 3D",
        }
    }

    /// Parse a display name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
    }

    /// Whether the solver runs a heat-transfer analysis
    pub fn is_thermal(&self) -> bool {
        matches!(
            self,
            ProblemKind::Thermal2D | ProblemKind::Thermal3D | ProblemKind::Torsion
        )
    }

    /// Spatial dimension of the emitted model
    pub fn ndim(&self) -> usize {
        match self {
            ProblemKind::Thermal2D | ProblemKind::Torsion | ProblemKind::Structural2D => 2,
            ProblemKind::Thermal3D | ProblemKind::Structural3D => 3,
        }
    }

    /// Degree-of-freedom names per node
    pub fn dofs(&self) -> &'static [&'static str] {
        match self {
            ProblemKind::Thermal2D | ProblemKind::Thermal3D | ProblemKind::Torsion => &["T"],
            ProblemKind::Structural2D => &["X", "Y", "RZ"],
            ProblemKind::Structural3D => &["X", "Y", "Z", "RX", "RY", "RZ", "W"],
        }
    }

    /// Shapes whose mesh elements become solver elements
    pub fn element_shapes(&self) -> &'static [ShapeType] {
        match self {
            ProblemKind::Thermal2D | ProblemKind::Torsion => &[ShapeType::Surface],
            ProblemKind::Thermal3D => &[ShapeType::Volume],
            ProblemKind::Structural2D => &[ShapeType::Curve],
            ProblemKind::Structural3D => {
                &[ShapeType::Curve, ShapeType::Surface, ShapeType::Volume]
            }
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_dimensions() {
        for (dim, shape) in ShapeType::ALL.iter().enumerate() {
            assert_eq!(shape.dimension() as usize, dim);
            assert_eq!(ShapeType::from_dimension(dim as u8), Some(*shape));
        }
        assert_eq!(ShapeType::from_dimension(4), None);
    }

    #[test]
    fn test_shape_parse() {
        assert_eq!(ShapeType::parse("curve"), Some(ShapeType::Curve));
        assert_eq!(ShapeType::parse(" Volume "), Some(ShapeType::Volume));
        assert_eq!(ShapeType::parse("Line"), None);
    }

    #[test]
    fn test_element_kind_shape() {
        assert_eq!(ElementKind::Quadrangle.shape(), ShapeType::Surface);
        assert_eq!(ElementKind::Prism.node_count(), 6);
        assert_eq!(ElementKind::Hexahedron.faces().len(), 6);
    }

    #[test]
    fn test_problem_kind() {
        assert_eq!(ProblemKind::parse("structural 3d"), Some(ProblemKind::Structural3D));
        assert!(ProblemKind::Torsion.is_thermal());
        assert_eq!(ProblemKind::Structural2D.dofs(), &["X", "Y", "RZ"]);
        assert_eq!(ProblemKind::Structural3D.dofs().len(), 7);
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityId(7).to_string(), "E7");
        assert_eq!(GroupId(1).to_string(), "G1");
        assert_eq!(NodeId(12).to_string(), "N12");
        assert_eq!(ElementId(40).to_string(), "#40");
    }
}
