// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered tree of mutually exclusive configuration choices
//!
//! Every [`TreeNode`] carries editable [`PropertyDef`]s and any number of
//! [`VariantGroup`]s. A variant group holds the alternatives for one selector
//! together with the index of the active one, so selecting a variant never
//! reorders the tree.
//!
//! # Example
//!
//! ```ignore
//! use fire_lite_model::{PathStep, PropertyTree, ProblemKind};
//!
//! let mut tree = PropertyTree::default_tree();
//! tree.select_variant(&[], "Problem", "Thermal 2D")?;
//! assert_eq!(tree.problem()?, ProblemKind::Thermal2D);
//!
//! let node = tree.locate(&[PathStep::active("Problem")])?;
//! println!("{} has {} parameters", node.name, node.properties.len());
//! ```

use crate::{
    key_matches, strip_ordinal, CatalogKind, Category, Error, ProblemKind, PropertyDef,
    PropertySnapshot, PropertyValue, Result, ShapeType,
};
use serde::{Deserialize, Serialize};

/// Selector of the root problem group
pub const PROBLEM_SELECTOR: &str = "Problem";

/// Selector of the material catalog templates
pub const MATERIALS_SELECTOR: &str = "Materials";

/// Selector of the local-axis catalog templates
pub const LOCAL_AXES_SELECTOR: &str = "LocalAxes";

/// A node of the property tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Display name, possibly with a leading ordinal
    pub name: String,
    /// Matching key (name without ordinal)
    pub key: String,
    /// Editable parameters of this node
    pub properties: Vec<PropertyDef>,
    /// Child selectors, in definition order
    pub groups: Vec<VariantGroup>,
}

impl TreeNode {
    /// Create a childless node without properties
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: strip_ordinal(&name),
            name,
            properties: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Add a property
    pub fn with_property(mut self, def: PropertyDef) -> Self {
        self.properties.push(def);
        self
    }

    /// Add several properties
    pub fn with_properties(mut self, defs: impl IntoIterator<Item = PropertyDef>) -> Self {
        self.properties.extend(defs);
        self
    }

    /// Add a child selector
    pub fn with_group(mut self, group: VariantGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Check if this node has no child selectors
    pub fn is_leaf(&self) -> bool {
        self.groups.is_empty()
    }

    /// Child selector by key
    pub fn group(&self, selector: &str) -> Option<&VariantGroup> {
        self.groups.iter().find(|g| key_matches(&g.key, selector))
    }

    /// Mutable child selector by key
    pub fn group_mut(&mut self, selector: &str) -> Option<&mut VariantGroup> {
        self.groups.iter_mut().find(|g| key_matches(&g.key, selector))
    }

    /// Property by key
    pub fn property(&self, key: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| key_matches(&p.key, key))
    }

    /// Mutable property by key
    pub fn property_mut(&mut self, key: &str) -> Option<&mut PropertyDef> {
        self.properties.iter_mut().find(|p| key_matches(&p.key, key))
    }

    /// Whether `selector` names a child group or a property
    pub fn has_selector(&self, selector: &str) -> bool {
        self.group(selector).is_some() || self.property(selector).is_some()
    }

    /// Select a variant, or set a property value
    ///
    /// When `selector` names a child group the variant called `value`
    /// becomes active; when it names a property the raw value is converted
    /// and stored. Nothing is changed on failure.
    pub fn select(&mut self, selector: &str, value: &str) -> Result<()> {
        if let Some(group) = self.group_mut(selector) {
            let index = group.position(value).ok_or_else(|| {
                Error::configuration(format!(
                    "'{}' is not a variant of '{}'",
                    value, group.selector
                ))
            })?;
            group.active = index;
            return Ok(());
        }
        let node_name = self.name.clone();
        let def = self.property_mut(selector).ok_or_else(|| {
            Error::configuration(format!(
                "'{}' is neither a selector nor a property of '{}'",
                selector, node_name
            ))
        })?;
        def.set_from_str(value)
    }

    /// Current values of this node's properties, in definition order
    pub fn snapshot(&self) -> PropertySnapshot {
        PropertySnapshot {
            subtype: None,
            subcategory: None,
            values: self
                .properties
                .iter()
                .map(|def| (def.key.clone(), def.value.clone()))
                .collect(),
        }
    }
}

/// Mutually exclusive alternatives for one selector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantGroup {
    /// Display name of the selector
    pub selector: String,
    /// Matching key of the selector
    pub key: String,
    active: usize,
    variants: Vec<TreeNode>,
}

impl VariantGroup {
    /// Create a group whose first variant is active
    pub fn new(selector: impl Into<String>, first: TreeNode) -> Self {
        let selector = selector.into();
        Self {
            key: strip_ordinal(&selector),
            selector,
            active: 0,
            variants: vec![first],
        }
    }

    /// Add an alternative
    pub fn with_variant(mut self, variant: TreeNode) -> Self {
        self.variants.push(variant);
        self
    }

    /// Index of the active variant
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The active variant
    pub fn active(&self) -> &TreeNode {
        &self.variants[self.active]
    }

    /// The active variant, mutably
    pub fn active_mut(&mut self) -> &mut TreeNode {
        &mut self.variants[self.active]
    }

    /// All variants in definition order
    pub fn variants(&self) -> &[TreeNode] {
        &self.variants
    }

    /// Variant by name
    pub fn variant(&self, name: &str) -> Option<&TreeNode> {
        self.position(name).map(|index| &self.variants[index])
    }

    /// Index of a variant by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| key_matches(&v.key, name))
    }

    /// Variants with the active one first, then the rest in definition order
    pub fn iter_active_first(&self) -> impl Iterator<Item = (bool, &TreeNode)> {
        std::iter::once((true, self.active())).chain(
            self.variants
                .iter()
                .enumerate()
                .filter(move |(index, _)| *index != self.active)
                .map(|(_, variant)| (false, variant)),
        )
    }
}

/// How a path step picks a variant
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchField {
    /// Variant whose key equals the value
    Name,
    /// The active variant, value ignored
    Active,
    /// Variant whose property with this key displays as the value
    Property(String),
}

/// One level of a tree path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathStep {
    /// Selector of the group to descend into
    pub group: String,
    /// Matching rule
    pub field: MatchField,
    /// Value to match
    pub value: String,
}

impl PathStep {
    /// Descend into the variant called `name`
    pub fn named(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            field: MatchField::Name,
            value: name.into(),
        }
    }

    /// Descend into the active variant
    pub fn active(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            field: MatchField::Active,
            value: String::new(),
        }
    }

    /// Descend into the variant whose `property` displays as `value`
    pub fn by_property(
        group: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            field: MatchField::Property(property.into()),
            value: value.into(),
        }
    }

    fn pick(&self, group: &VariantGroup) -> Result<usize> {
        let found = match &self.field {
            MatchField::Name => group.position(&self.value),
            MatchField::Active => Some(group.active),
            MatchField::Property(key) => group.variants.iter().position(|variant| {
                variant.property(key).is_some_and(|def| {
                    def.display_value(&def.value)
                        .eq_ignore_ascii_case(self.value.trim())
                })
            }),
        };
        found.ok_or_else(|| {
            Error::configuration(format!(
                "no variant of '{}' matches '{}'",
                group.selector, self.value
            ))
        })
    }
}

/// Visitor decision after entering a node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the node's children
    Continue,
    /// Do not descend
    Skip,
}

/// Read-only walk over the tree
///
/// Children are visited group by group, active variant first.
pub trait TreeVisitor {
    /// Called on every node; `path` holds the node names from the root
    fn enter(&mut self, path: &[String], node: &TreeNode, active: bool) -> Visit;
}

impl<F> TreeVisitor for F
where
    F: FnMut(&[String], &TreeNode, bool) -> Visit,
{
    fn enter(&mut self, path: &[String], node: &TreeNode, active: bool) -> Visit {
        self(path, node, active)
    }
}

fn walk<V: TreeVisitor + ?Sized>(
    node: &TreeNode,
    active: bool,
    path: &mut Vec<String>,
    visitor: &mut V,
) {
    path.push(node.name.clone());
    if visitor.enter(path, node, active) == Visit::Continue {
        for group in &node.groups {
            for (is_active, variant) in group.iter_active_first() {
                walk(variant, active && is_active, path, visitor);
            }
        }
    }
    path.pop();
}

/// The configuration tree of a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyTree {
    root: TreeNode,
}

impl PropertyTree {
    /// Wrap a root node
    pub fn new(root: TreeNode) -> Self {
        Self { root }
    }

    /// Root node
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Descend from the root along `path`
    pub fn locate(&self, path: &[PathStep]) -> Result<&TreeNode> {
        let mut node = &self.root;
        for step in path {
            let group = node.group(&step.group).ok_or_else(|| no_group(node, &step.group))?;
            node = &group.variants[step.pick(group)?];
        }
        Ok(node)
    }

    /// Descend from the root along `path`, mutably
    pub fn locate_mut(&mut self, path: &[PathStep]) -> Result<&mut TreeNode> {
        let mut node = &mut self.root;
        for step in path {
            if node.group(&step.group).is_none() {
                return Err(no_group(node, &step.group));
            }
            let group = node
                .group_mut(&step.group)
                .ok_or_else(|| Error::configuration(step.group.clone()))?;
            let index = step.pick(group)?;
            node = &mut group.variants[index];
        }
        Ok(node)
    }

    /// Descend along `path`, then through the active variant of the first
    /// group until a childless node is reached
    pub fn locate_leaf(&self, path: &[PathStep]) -> Result<&TreeNode> {
        let mut node = self.locate(path)?;
        while let Some(group) = node.groups.first() {
            node = group.active();
        }
        Ok(node)
    }

    /// Select a variant or set a property on the node at `path`
    ///
    /// After success the group's active variant is `value`.
    pub fn select_variant(&mut self, path: &[PathStep], selector: &str, value: &str) -> Result<()> {
        self.locate_mut(path)?.select(selector, value)?;
        log::debug!("selected {} = {}", selector, value);
        Ok(())
    }

    /// Walk the whole tree
    pub fn visit<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) {
        let mut path = Vec::new();
        walk(&self.root, true, &mut path, visitor);
    }

    /// Slash-joined paths of every node, active variants first
    pub fn enumerate(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.visit(&mut |path: &[String], _: &TreeNode, _: bool| {
            paths.push(path.join("/"));
            Visit::Continue
        });
        paths
    }

    /// Remove a non-active variant from the group `selector` under `path`
    pub fn cut(&mut self, path: &[PathStep], selector: &str, variant: &str) -> Result<TreeNode> {
        let node = self.locate_mut(path)?;
        let node_name = node.name.clone();
        let group = node
            .group_mut(selector)
            .ok_or_else(|| {
                Error::configuration(format!("'{}' has no selector '{}'", node_name, selector))
            })?;
        let index = group.position(variant).ok_or_else(|| {
            Error::configuration(format!("'{}' is not a variant of '{}'", variant, group.selector))
        })?;
        if group.variants.len() == 1 {
            return Err(Error::configuration(format!(
                "cannot remove '{}', the last variant of '{}'",
                variant, group.selector
            )));
        }
        if index == group.active {
            return Err(Error::configuration(format!(
                "cannot remove '{}', the active variant of '{}'",
                variant, group.selector
            )));
        }
        if index < group.active {
            group.active -= 1;
        }
        Ok(group.variants.remove(index))
    }

    /// Rename the node at `path`; the last step must name it
    pub fn rename(&mut self, path: &[PathStep], new_name: &str) -> Result<()> {
        if new_name.trim().is_empty() {
            return Err(Error::format("node name must not be empty"));
        }
        let Some((last, parent_path)) = path.split_last() else {
            self.root.key = strip_ordinal(new_name);
            self.root.name = new_name.to_string();
            return Ok(());
        };
        let parent = self.locate_mut(parent_path)?;
        if parent.group(&last.group).is_none() {
            return Err(no_group(parent, &last.group));
        }
        let group = parent
            .group_mut(&last.group)
            .ok_or_else(|| Error::configuration(last.group.clone()))?;
        let index = last.pick(group)?;
        if let Some(other) = group.position(new_name) {
            if other != index {
                return Err(Error::consistency(format!(
                    "'{}' already has a variant named '{}'",
                    group.selector, new_name
                )));
            }
        }
        let node = &mut group.variants[index];
        node.key = strip_ordinal(new_name);
        node.name = new_name.to_string();
        Ok(())
    }

    /// Active problem kind
    pub fn problem(&self) -> Result<ProblemKind> {
        let node = self.problem_node()?;
        ProblemKind::parse(&node.key)
            .ok_or_else(|| Error::configuration(format!("'{}' is not a problem kind", node.name)))
    }

    /// Active problem node holding the run parameters
    pub fn problem_node(&self) -> Result<&TreeNode> {
        self.locate(&[PathStep::active(PROBLEM_SELECTOR)])
    }

    /// Apply one `selector: value` header line
    ///
    /// The root is tried first, then the active problem node.
    pub fn apply_header(&mut self, selector: &str, value: &str) -> Result<()> {
        if self.root.has_selector(selector) {
            return self.select_variant(&[], selector, value);
        }
        let problem = [PathStep::active(PROBLEM_SELECTOR)];
        if self.locate(&problem)?.has_selector(selector) {
            return self.select_variant(&problem, selector, value);
        }
        Err(Error::configuration(format!("unknown selector '{}'", selector)))
    }

    /// Template node of a category attached to a shape
    ///
    /// Without `subtype` the active sub-type is used.
    pub fn leaf_template(
        &self,
        shape: ShapeType,
        category: Category,
        subtype: Option<&str>,
    ) -> Result<&TreeNode> {
        if !category.applies_to(shape) {
            return Err(Error::configuration(format!(
                "{} cannot be attached to {}",
                category, shape
            )));
        }
        let step = match subtype {
            Some(subtype) => PathStep::named(category.name(), subtype),
            None => PathStep::active(category.name()),
        };
        self.locate(&[PathStep::active(shape.name()), step])
    }

    /// Template node of a catalog definition
    pub fn catalog_template(&self, kind: CatalogKind, subtype: Option<&str>) -> Result<&TreeNode> {
        let selector = match kind {
            CatalogKind::Material => MATERIALS_SELECTOR,
            CatalogKind::LocalAxis => LOCAL_AXES_SELECTOR,
        };
        let step = match subtype {
            Some(subtype) => PathStep::named(selector, subtype),
            None => PathStep::active(selector),
        };
        self.locate(&[step])
    }

    /// Default values of a category leaf, tagged with its sub-type
    pub fn default_snapshot(
        &self,
        shape: ShapeType,
        category: Category,
        subtype: Option<&str>,
    ) -> Result<PropertySnapshot> {
        let node = self.leaf_template(shape, category, subtype)?;
        Ok(tagged_snapshot(node, category.name()))
    }

    /// Default values of a catalog definition, tagged with its sub-type
    pub fn default_catalog_snapshot(
        &self,
        kind: CatalogKind,
        subtype: Option<&str>,
    ) -> Result<PropertySnapshot> {
        let node = self.catalog_template(kind, subtype)?;
        Ok(tagged_snapshot(node, kind.name()))
    }

    /// Complete a category snapshot with template defaults
    ///
    /// The result carries every template field in template order and the
    /// canonical sub-type tag. Unknown fields are rejected.
    pub fn fill_leaf(
        &self,
        shape: ShapeType,
        category: Category,
        snapshot: &PropertySnapshot,
    ) -> Result<PropertySnapshot> {
        let node = self.leaf_template(shape, category, snapshot.subtype.as_deref())?;
        filled(node, category.name(), snapshot)
    }

    /// Complete a catalog snapshot with template defaults
    pub fn fill_catalog(
        &self,
        kind: CatalogKind,
        snapshot: &PropertySnapshot,
    ) -> Result<PropertySnapshot> {
        let node = self.catalog_template(kind, snapshot.subtype.as_deref())?;
        filled(node, kind.name(), snapshot)
    }

    /// Built-in defaults
    pub fn default_tree() -> Self {
        let mut problems = VariantGroup::new(PROBLEM_SELECTOR, problem_node(ProblemKind::ALL[0]));
        for kind in &ProblemKind::ALL[1..] {
            problems = problems.with_variant(problem_node(*kind));
        }
        let mut root = TreeNode::new("Model").with_group(problems);
        for shape in ShapeType::ALL {
            let mut node = TreeNode::new(shape.name());
            for category in Category::ALL {
                if category.applies_to(shape) {
                    node = node.with_group(category_group(shape, category));
                }
            }
            root = root.with_group(VariantGroup::new(shape.name(), node));
        }
        Self::new(
            root.with_group(material_templates())
                .with_group(VariantGroup::new(
                    LOCAL_AXES_SELECTOR,
                    TreeNode::new("Local axis")
                        .with_property(PropertyDef::text("0Name", "").required())
                        .with_property(PropertyDef::vector("1Vector", vec![0.0, 0.0, 1.0])),
                )),
        )
    }
}

impl Default for PropertyTree {
    fn default() -> Self {
        Self::default_tree()
    }
}

fn no_group(node: &TreeNode, selector: &str) -> Error {
    Error::configuration(format!("'{}' has no selector '{}'", node.name, selector))
}

// Single-variant leaves named after their category carry no sub-type
fn tagged_snapshot(node: &TreeNode, container: &str) -> PropertySnapshot {
    let mut snapshot = node.snapshot();
    if !key_matches(&node.key, container) {
        snapshot.subtype = Some(node.key.clone());
    }
    snapshot
}

fn filled(
    node: &TreeNode,
    container: &str,
    snapshot: &PropertySnapshot,
) -> Result<PropertySnapshot> {
    let mut full = tagged_snapshot(node, container);
    full.subcategory = snapshot.subcategory.clone();
    for (key, value) in &snapshot.values {
        let def = node.property(key).ok_or_else(|| {
            Error::configuration(format!("'{}' is not a property of '{}'", key, node.name))
        })?;
        full.set(&def.key, value.clone());
    }
    Ok(full)
}

fn problem_node(kind: ProblemKind) -> TreeNode {
    let node = TreeNode::new(kind.name()).with_properties([
        PropertyDef::text("0Title", "fire-lite model"),
        PropertyDef::float("1Time step", 12.0).with_bounds(1e-6, 1e9),
        PropertyDef::float("2Final time", 3600.0).with_bounds(0.0, 1e9),
        PropertyDef::float("3Output step", 60.0).with_bounds(1e-6, 1e9),
    ]);
    if kind.is_thermal() {
        node.with_property(PropertyDef::float("4Initial temperature", 20.0))
    } else {
        node.with_properties([
            PropertyDef::float("4Convergence", 1e-3).with_bounds(0.0, 1.0),
            PropertyDef::int("5Strategy", 0).with_labels(&[("Pure NR", 0), ("Modified NR", 1)]),
            PropertyDef::int("6NPTTOT", 100).with_bounds(1.0, 1e6),
        ])
    }
}

fn dof_text(names: &[&str]) -> Vec<PropertyDef> {
    names.iter().map(|dof| PropertyDef::text(*dof, "NO")).collect()
}

fn dof_flags(names: &[&str]) -> Vec<PropertyDef> {
    names
        .iter()
        .map(|dof| PropertyDef::int(*dof, 0).with_labels(&[("NO", 0), ("YES", 1)]))
        .collect()
}

fn components(names: &[&str]) -> Vec<PropertyDef> {
    names.iter().map(|name| PropertyDef::float(*name, 0.0)).collect()
}

fn function() -> PropertyDef {
    PropertyDef::text("Function", "FLOAD").required()
}

const ALL_DOFS: [&str; 7] = ["X", "Y", "Z", "RX", "RY", "RZ", "W"];

fn category_group(shape: ShapeType, category: Category) -> VariantGroup {
    let single = |node: TreeNode| VariantGroup::new(category.name(), node);
    match (category, shape) {
        (Category::Material, _) | (Category::LocalAxis, _) => single(
            TreeNode::new(category.name()).with_property(PropertyDef::text("Name", "").required()),
        ),
        (Category::Section, ShapeType::Surface) => single(TreeNode::new("Shell").with_properties([
            PropertyDef::float("Thickness", 0.1).with_bounds(0.0, 1e3),
            PropertyDef::float("Rebar area", 0.0).with_bounds(0.0, 1e3),
            PropertyDef::float("Rebar depth", 0.0),
        ])),
        (Category::Section, _) => single(
            TreeNode::new("Beam").with_property(PropertyDef::text("Section file", "").required()),
        )
        .with_variant(TreeNode::new("Truss").with_properties([
            PropertyDef::float("Area", 0.0).with_bounds(0.0, 1e3),
            PropertyDef::float("Residual stress", 0.0),
        ])),
        (Category::Block, _) => single(TreeNode::new("Block").with_properties(dof_text(&ALL_DOFS))),
        (Category::Same, _) => single(TreeNode::new("Same").with_properties(dof_flags(&ALL_DOFS))),
        (Category::Load, ShapeType::Point) => single(
            TreeNode::new("Nodal")
                .with_property(function())
                .with_properties(components(&["FX", "FY", "FZ", "MX", "MY", "MZ"])),
        ),
        (Category::Load, ShapeType::Curve) => single(
            TreeNode::new("Distributed")
                .with_property(function())
                .with_properties(components(&["QX", "QY", "QZ"])),
        )
        .with_variant(
            TreeNode::new("Trapezoidal")
                .with_property(function())
                .with_property(PropertyDef::vector("Start", vec![0.0, 0.0, 0.0]))
                .with_property(PropertyDef::vector("End", vec![0.0, 0.0, 0.0])),
        ),
        (Category::Load, _) => single(
            TreeNode::new("Surface")
                .with_property(function())
                .with_properties(components(&["QX", "QY", "QZ"])),
        ),
        (Category::Flux, _) => single(
            TreeNode::new("Frontier")
                .with_property(PropertyDef::text("Function", "FISO").required()),
        ),
        (Category::Relaxation, _) => single(
            TreeNode::new("Relaxation")
                .with_property(PropertyDef::vector("Start", vec![0.0; 7]))
                .with_property(PropertyDef::vector("End", vec![0.0; 7])),
        ),
        (Category::Mass, _) => single(TreeNode::new("Mass").with_properties([
            PropertyDef::float("Translational", 0.0).with_bounds(0.0, 1e12),
            PropertyDef::float("Rotational", 0.0).with_bounds(0.0, 1e12),
        ])),
        (Category::Void, _) | (Category::Symmetry, _) => single(
            TreeNode::new(category.name()).with_property(PropertyDef::text("Label", "").required()),
        ),
    }
}

fn material_templates() -> VariantGroup {
    let name = || PropertyDef::text("0Name", "").required();
    VariantGroup::new(
        MATERIALS_SELECTOR,
        TreeNode::new("Steel EC3").with_properties([
            name(),
            PropertyDef::float("1Young modulus", 2.1e11).with_bounds(0.0, 1e13),
            PropertyDef::float("2Poisson ratio", 0.3).with_bounds(0.0, 0.5),
            PropertyDef::float("3Yield strength", 355e6).with_bounds(0.0, 1e10),
        ]),
    )
    .with_variant(TreeNode::new("Concrete EC2").with_properties([
        name(),
        PropertyDef::float("1Poisson ratio", 0.2).with_bounds(0.0, 0.5),
        PropertyDef::float("2Compressive strength", 30e6).with_bounds(0.0, 1e10),
        PropertyDef::float("3Tensile strength", 0.0).with_bounds(0.0, 1e10),
        PropertyDef::int("4Aggregate", 0).with_labels(&[("Siliceous", 0), ("Calcareous", 1)]),
    ]))
    .with_variant(TreeNode::new("Thermal").with_properties([
        name(),
        PropertyDef::float("1Conductivity", 1.6).with_bounds(0.0, 1e4),
        PropertyDef::float("2Specific heat", 900.0).with_bounds(0.0, 1e6),
        PropertyDef::float("3Specific mass", 2300.0).with_bounds(0.0, 1e5),
        PropertyDef::float("4Water content", 0.0).with_bounds(0.0, 1e3),
        PropertyDef::float("5Convection hot", 25.0).with_bounds(0.0, 1e3),
        PropertyDef::float("6Convection cold", 9.0).with_bounds(0.0, 1e3),
        PropertyDef::float("7Emissivity", 0.8).with_bounds(0.0, 1.0),
    ]))
    .with_variant(TreeNode::new("Elastic").with_properties([
        name(),
        PropertyDef::float("1Young modulus", 2.1e11).with_bounds(0.0, 1e13),
        PropertyDef::float("2Poisson ratio", 0.3).with_bounds(0.0, 0.5),
    ]))
}

/// Check a snapshot against the template it was captured from
///
/// Required visible fields must be non-empty, values must have the
/// template's kind and respect its bounds. Fields missing from the
/// snapshot take the template default.
pub fn validate_snapshot(template: &TreeNode, snapshot: &PropertySnapshot) -> Result<()> {
    for (key, _) in &snapshot.values {
        if template.property(key).is_none() {
            return Err(Error::configuration(format!(
                "'{}' is not a property of '{}'",
                key, template.name
            )));
        }
    }
    for def in &template.properties {
        let value = snapshot.get(&def.key).unwrap_or(&def.value);
        let same_kind = matches!(
            (&def.value, value),
            (PropertyValue::Int(_), PropertyValue::Int(_))
                | (PropertyValue::Float(_), PropertyValue::Float(_) | PropertyValue::Int(_))
                | (PropertyValue::Text(_), PropertyValue::Text(_))
                | (PropertyValue::Vector(_), PropertyValue::Vector(_))
        );
        if !same_kind {
            return Err(Error::format(format!(
                "'{}' of '{}' expects a {} value, got {}",
                def.key,
                template.name,
                def.value.kind_name(),
                value.kind_name()
            )));
        }
        if def.required && def.visible && value.is_empty() {
            return Err(Error::format(format!(
                "required field '{}' of '{}' is empty",
                def.key, template.name
            )));
        }
        def.check_bounds(value)?;
    }
    Ok(())
}
