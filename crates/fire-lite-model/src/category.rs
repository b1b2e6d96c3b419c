// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assignable property categories and their resolution rules

use crate::{CatalogKind, ProblemKind, ShapeType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How overlay slots of a category are keyed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotScheme {
    /// One slot per entity or group, keyed `id`
    Single,
    /// Independent occurrences, keyed `id/n`
    Occurrences,
}

/// How entity and group assignments combine during resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    /// Exactly one source; entity and group together is a conflict
    Exclusive,
    /// Per-DOF merge of all sources; the same DOF fixed differently is a conflict
    DofMerge,
    /// All sources concatenated
    Concatenate,
    /// Exclusive per element, then merged into node equivalence classes
    NodeEquivalence,
    /// Exclusive per element, then collected into labelled node lists
    NodeLists,
}

/// Static description of a category
#[derive(Clone, Copy, Debug)]
pub struct CategoryInfo {
    /// Shapes the category can be attached to
    pub shapes: &'static [ShapeType],
    /// Slot keying
    pub scheme: SlotScheme,
    /// Entity/group combination rule
    pub aggregation: Aggregation,
    /// Catalog referenced by the `Name` field
    pub catalog: Option<CatalogKind>,
    /// Separator used when joining several values into text
    pub separator: &'static str,
    /// Whether every element of an applicable shape must resolve a value
    pub mandatory: bool,
}

/// A kind of assignable property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Material,
    LocalAxis,
    Section,
    Block,
    Same,
    Load,
    Flux,
    Relaxation,
    Mass,
    Void,
    Symmetry,
}

const POINT_CURVE_SURFACE: &[ShapeType] = &[ShapeType::Point, ShapeType::Curve, ShapeType::Surface];
const CURVE_SURFACE: &[ShapeType] = &[ShapeType::Curve, ShapeType::Surface];
const CURVE: &[ShapeType] = &[ShapeType::Curve];

impl Category {
    /// All categories in resolution order
    pub const ALL: [Category; 11] = [
        Category::Material,
        Category::LocalAxis,
        Category::Section,
        Category::Block,
        Category::Same,
        Category::Load,
        Category::Flux,
        Category::Relaxation,
        Category::Mass,
        Category::Void,
        Category::Symmetry,
    ];

    /// Static rules of this category
    pub fn info(&self) -> CategoryInfo {
        let exclusive = |shapes: &'static [ShapeType]| CategoryInfo {
            shapes,
            scheme: SlotScheme::Single,
            aggregation: Aggregation::Exclusive,
            catalog: None,
            separator: ",",
            mandatory: false,
        };
        match self {
            Category::Material => CategoryInfo {
                shapes: &[ShapeType::Curve, ShapeType::Surface, ShapeType::Volume],
                scheme: SlotScheme::Occurrences,
                catalog: Some(CatalogKind::Material),
                mandatory: true,
                ..exclusive(CURVE)
            },
            Category::LocalAxis => CategoryInfo {
                scheme: SlotScheme::Occurrences,
                catalog: Some(CatalogKind::LocalAxis),
                mandatory: true,
                ..exclusive(CURVE)
            },
            Category::Section => exclusive(CURVE_SURFACE),
            Category::Block => CategoryInfo {
                aggregation: Aggregation::DofMerge,
                ..exclusive(POINT_CURVE_SURFACE)
            },
            Category::Same => CategoryInfo {
                aggregation: Aggregation::NodeEquivalence,
                ..exclusive(POINT_CURVE_SURFACE)
            },
            Category::Load => CategoryInfo {
                scheme: SlotScheme::Occurrences,
                aggregation: Aggregation::Concatenate,
                separator: ";",
                ..exclusive(POINT_CURVE_SURFACE)
            },
            Category::Flux => exclusive(CURVE_SURFACE),
            Category::Relaxation => exclusive(CURVE),
            Category::Mass => exclusive(&[ShapeType::Point]),
            Category::Void | Category::Symmetry => CategoryInfo {
                aggregation: Aggregation::NodeLists,
                ..exclusive(CURVE)
            },
        }
    }

    /// Name used in persisted files and in the property tree
    pub fn name(&self) -> &'static str {
        match self {
            Category::Material => "Material",
            Category::LocalAxis => "LocalAxis",
            Category::Section => "Section",
            Category::Block => "Block",
            Category::Same => "Same",
            Category::Load => "Load",
            Category::Flux => "Flux",
            Category::Relaxation => "Relaxation",
            Category::Mass => "Mass",
            Category::Void => "Void",
            Category::Symmetry => "Symmetry",
        }
    }

    /// Parse a persisted category name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(s))
    }

    /// Whether the category can be attached to a shape
    pub fn applies_to(&self, shape: ShapeType) -> bool {
        self.info().shapes.contains(&shape)
    }

    /// Catalog referenced by this category, if delocalized
    pub fn catalog(&self) -> Option<CatalogKind> {
        self.info().catalog
    }

    /// Whether the category holds one slot per entity or group
    pub fn is_single_valued(&self) -> bool {
        self.info().scheme == SlotScheme::Single
    }

    /// Whether entity and group assignments may coexist
    pub fn allows_aggregation(&self) -> bool {
        matches!(
            self.info().aggregation,
            Aggregation::DofMerge | Aggregation::Concatenate
        )
    }

    /// Shapes on which the category is resolved for a problem (empty when unused)
    pub fn shapes_for(&self, problem: ProblemKind) -> &'static [ShapeType] {
        use ProblemKind::*;
        match (self, problem) {
            (Category::Material, Thermal2D | Torsion) => &[ShapeType::Surface],
            (Category::Material, Thermal3D) => &[ShapeType::Volume],
            (Category::Material, Structural2D) => CURVE,
            (Category::Material, Structural3D) => {
                &[ShapeType::Curve, ShapeType::Surface, ShapeType::Volume]
            }
            (Category::LocalAxis, Structural3D) => CURVE,
            (Category::Section, Structural2D) => CURVE,
            (Category::Section, Structural3D) => CURVE_SURFACE,
            (Category::Block | Category::Same | Category::Load, Structural2D) => {
                &[ShapeType::Point, ShapeType::Curve]
            }
            (Category::Block | Category::Same | Category::Load, Structural3D) => {
                POINT_CURVE_SURFACE
            }
            (Category::Relaxation, Structural2D | Structural3D) => CURVE,
            (Category::Mass, Structural2D | Structural3D) => &[ShapeType::Point],
            (Category::Flux, Thermal2D | Torsion) => CURVE,
            (Category::Flux, Thermal3D) => &[ShapeType::Surface],
            (Category::Void | Category::Symmetry, Thermal2D | Torsion) => CURVE,
            _ => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.name()), Some(category));
        }
        assert_eq!(Category::parse("block"), Some(Category::Block));
        assert_eq!(Category::parse("Rebar"), None);
    }

    #[test]
    fn test_flags() {
        assert!(Category::Load.allows_aggregation());
        assert!(Category::Block.allows_aggregation());
        assert!(!Category::Material.allows_aggregation());
        assert!(Category::Section.is_single_valued());
        assert!(!Category::Material.is_single_valued());
        assert_eq!(Category::Material.catalog(), Some(CatalogKind::Material));
        assert_eq!(Category::Load.info().separator, ";");
    }

    #[test]
    fn test_problem_shapes_are_attachable() {
        for category in Category::ALL {
            for problem in ProblemKind::ALL {
                for shape in category.shapes_for(problem) {
                    assert!(category.applies_to(*shape), "{} on {}", category, shape);
                }
            }
        }
    }
}
