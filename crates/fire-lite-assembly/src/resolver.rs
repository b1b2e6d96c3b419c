// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model Assembler - Flatten tree, overlay and catalog per mesh element
//!
//! For every category used by the active problem and every mesh element of
//! the category's shapes, the assembler combines the owning entity's
//! assignment with the assignments of the physical groups covering the
//! entity. The result is an [`ElementAttributeTable`] plus the node-level
//! aggregates (shared-DOF classes, fixations and boundary node lists).
//!
//! Resolution is fail-fast and recomputed from scratch on every call.

use crate::equivalence::{DofMask, NodeEquivalenceGroups};
use crate::options::ResolveOptions;
use crate::positions::{curve_positions, CurvePosition};
use fire_lite_model::{
    Aggregation, Category, EntityId, Error, GroupId, MeshElement, MeshTopology,
    MeshTopologyExt, NodeId, ProblemKind, PropertySnapshot, Result, Scope, Session, ShapeType,
    SlotScheme,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// DOF code meaning "not fixed"
pub const FREE: &str = "NO";

/// Address of a mesh element: its shape and index in `mesh.elements(shape)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef {
    pub shape: ShapeType,
    pub index: usize,
}

impl ElementRef {
    pub fn new(shape: ShapeType, index: usize) -> Self {
        Self { shape, index }
    }
}

/// Resolved value of one category on one element
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ResolvedValue {
    /// Nothing assigned
    #[default]
    Unset,
    /// One value; `source` is the first contributing owner
    Value {
        snapshot: PropertySnapshot,
        source: Scope,
    },
    /// Occurrences or concatenated assignments, in resolution order
    List(Vec<PropertySnapshot>),
}

static UNSET: ResolvedValue = ResolvedValue::Unset;

impl ResolvedValue {
    /// Whether anything was assigned
    pub fn is_set(&self) -> bool {
        !matches!(self, ResolvedValue::Unset)
    }

    /// The single value, or the first of a list
    pub fn snapshot(&self) -> Option<&PropertySnapshot> {
        match self {
            ResolvedValue::Unset => None,
            ResolvedValue::Value { snapshot, .. } => Some(snapshot),
            ResolvedValue::List(list) => list.first(),
        }
    }

    /// Every captured snapshot
    pub fn snapshots(&self) -> Vec<&PropertySnapshot> {
        match self {
            ResolvedValue::Unset => Vec::new(),
            ResolvedValue::Value { snapshot, .. } => vec![snapshot],
            ResolvedValue::List(list) => list.iter().collect(),
        }
    }

    /// Catalog names referenced by the value
    pub fn names(&self) -> Vec<&str> {
        self.snapshots().into_iter().filter_map(|s| s.name()).collect()
    }

    /// One-line rendering with the category's join separator
    pub fn render(&self, category: Category) -> String {
        self.snapshots()
            .iter()
            .map(|s| s.summary())
            .collect::<Vec<_>>()
            .join(category.info().separator)
    }
}

/// Per category and shape, one resolved value per mesh element
#[derive(Clone, Debug, Default)]
pub struct ElementAttributeTable {
    columns: FxHashMap<(Category, ShapeType), Vec<ResolvedValue>>,
    positions: Vec<Option<CurvePosition>>,
}

impl ElementAttributeTable {
    /// Value of a category on an element (`Unset` when not resolved)
    pub fn get(&self, category: Category, element: ElementRef) -> &ResolvedValue {
        self.columns
            .get(&(category, element.shape))
            .and_then(|column| column.get(element.index))
            .unwrap_or(&UNSET)
    }

    /// All values of a category on a shape
    pub fn column(&self, category: Category, shape: ShapeType) -> Option<&[ResolvedValue]> {
        self.columns.get(&(category, shape)).map(Vec::as_slice)
    }

    /// Resolved (category, shape) pairs, sorted
    pub fn categories(&self) -> Vec<(Category, ShapeType)> {
        let mut keys: Vec<_> = self.columns.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Position of a curve element along its curve
    pub fn position(&self, index: usize) -> Option<CurvePosition> {
        self.positions.get(index).copied().flatten()
    }
}

/// Merged fixation codes of one node, one per problem DOF
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeFixation {
    pub node: NodeId,
    pub codes: Vec<String>,
}

/// Ordered boundary nodes sharing a void or symmetry label
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeList {
    pub category: Category,
    pub label: String,
    pub nodes: Vec<NodeId>,
}

/// Output of one resolve pass
#[derive(Clone, Debug)]
pub struct Resolution {
    pub problem: ProblemKind,
    pub table: ElementAttributeTable,
    pub equivalences: NodeEquivalenceGroups,
    /// Fixed nodes in first-seen order
    pub fixations: Vec<NodeFixation>,
    /// Void and symmetry lists in first-seen order
    pub node_lists: Vec<NodeList>,
}

type Slots<'a> = Vec<&'a PropertySnapshot>;

/// Resolver over a borrowed session and mesh
pub struct ModelAssembler<'a> {
    session: &'a Session,
    mesh: &'a dyn MeshTopology,
    options: ResolveOptions,
}

impl<'a> ModelAssembler<'a> {
    pub fn new(session: &'a Session, mesh: &'a dyn MeshTopology, options: ResolveOptions) -> Self {
        Self {
            session,
            mesh,
            options,
        }
    }

    /// Run a full resolve pass
    pub fn resolve(&self) -> Result<Resolution> {
        let problem = self.options.problem;
        let mut table = ElementAttributeTable {
            columns: FxHashMap::default(),
            positions: curve_positions(self.mesh)?,
        };
        for category in Category::ALL {
            for &shape in category.shapes_for(problem) {
                let column = self.resolve_column(category, shape)?;
                table.columns.insert((category, shape), column);
            }
        }
        if !self.options.bulk {
            self.check_mandatory(&table)?;
        }

        let equivalences = self.node_equivalences(&table)?;
        let fixations = self.fixations(&table)?;
        let node_lists = self.node_lists(&table);
        log::debug!(
            "resolved {} columns for {}: {} tied classes, {} fixed nodes, {} node lists",
            table.columns.len(),
            problem,
            equivalences.len(),
            fixations.len(),
            node_lists.len()
        );
        Ok(Resolution {
            problem,
            table,
            equivalences,
            fixations,
            node_lists,
        })
    }

    fn resolve_column(&self, category: Category, shape: ShapeType) -> Result<Vec<ResolvedValue>> {
        let (ents, pgs) = self.session.overlay().query(category, shape);
        let mut own: FxHashMap<EntityId, Slots<'_>> = FxHashMap::default();
        for assignment in &ents {
            own.entry(assignment.id).or_default().push(assignment.snapshot);
        }
        let mut by_group: FxHashMap<GroupId, Slots<'_>> = FxHashMap::default();
        for assignment in &pgs {
            by_group
                .entry(assignment.id)
                .or_default()
                .push(assignment.snapshot);
        }
        for group in by_group.keys() {
            if self.mesh.group(shape, *group).is_none() {
                log::warn!(
                    "{} is assigned to {} group {} which has no mesh counterpart",
                    category,
                    shape,
                    group
                );
            }
        }

        let elements = self.mesh.elements(shape);
        let mut resolved: FxHashMap<EntityId, ResolvedValue> = FxHashMap::default();
        let mut column = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(value) = resolved.get(&element.entity) {
                column.push(value.clone());
                continue;
            }
            let mut covering: Vec<(GroupId, &Slots<'_>)> = self
                .mesh
                .groups_containing(shape, element.entity)
                .into_iter()
                .filter_map(|group| by_group.get(&group.id).map(|slots| (group.id, slots)))
                .collect();
            covering.sort_by_key(|(id, _)| *id);
            covering.dedup_by_key(|(id, _)| *id);

            let own_slots = own.get(&element.entity).map(Vec::as_slice).unwrap_or(&[]);
            let value = combine(
                category,
                shape,
                self.options.problem,
                element.entity,
                own_slots,
                &covering,
            )?;
            self.check_references(category, shape, element.entity, &value)?;
            resolved.insert(element.entity, value.clone());
            column.push(value);
        }
        log::debug!(
            "{} on {}: {} of {} elements set",
            category,
            shape,
            column.iter().filter(|v| v.is_set()).count(),
            column.len()
        );
        Ok(column)
    }

    fn check_references(
        &self,
        category: Category,
        shape: ShapeType,
        entity: EntityId,
        value: &ResolvedValue,
    ) -> Result<()> {
        let Some(kind) = category.catalog() else {
            return Ok(());
        };
        if self.options.bulk {
            return Ok(());
        }
        for snapshot in value.snapshots() {
            let name = snapshot.name().unwrap_or_default();
            if !self.session.catalog().contains(kind, name, shape) {
                return Err(Error::referential(
                    kind.name(),
                    name,
                    format!("{} entity {}", shape, entity),
                ));
            }
        }
        Ok(())
    }

    fn check_mandatory(&self, table: &ElementAttributeTable) -> Result<()> {
        for category in Category::ALL {
            if !category.info().mandatory {
                continue;
            }
            for &shape in category.shapes_for(self.options.problem) {
                let Some(column) = table.column(category, shape) else {
                    continue;
                };
                let elements = self.mesh.elements(shape);
                for (index, (element, value)) in elements.iter().zip(column).enumerate() {
                    if value.is_set() || !requires(table, category, ElementRef::new(shape, index)) {
                        continue;
                    }
                    return Err(unset(category, shape, element));
                }
            }
        }
        Ok(())
    }

    fn node_equivalences(&self, table: &ElementAttributeTable) -> Result<NodeEquivalenceGroups> {
        let dofs = self.options.problem.dofs();
        let mut groups = NodeEquivalenceGroups::new(dofs);
        // Every source ties all of its nodes into one class
        let mut anchors: FxHashMap<(ShapeType, Scope), NodeId> = FxHashMap::default();
        for &shape in Category::Same.shapes_for(self.options.problem) {
            let Some(column) = table.column(Category::Same, shape) else {
                continue;
            };
            for (element, value) in self.mesh.elements(shape).iter().zip(column) {
                let ResolvedValue::Value { snapshot, source } = value else {
                    continue;
                };
                let mask = DofMask::from_snapshot(snapshot, dofs);
                if mask.is_empty() {
                    continue;
                }
                let mut nodes = element.nodes.clone();
                match anchors.get(&(shape, *source)) {
                    Some(anchor) => nodes.push(*anchor),
                    None => {
                        if let Some(first) = element.nodes.first() {
                            anchors.insert((shape, *source), *first);
                        }
                    }
                }
                groups.tie(&nodes, mask, element.entity)?;
            }
        }
        Ok(groups)
    }

    fn fixations(&self, table: &ElementAttributeTable) -> Result<Vec<NodeFixation>> {
        let dofs = self.options.problem.dofs();
        let mut slots: FxHashMap<NodeId, usize> = FxHashMap::default();
        let mut fixations: Vec<NodeFixation> = Vec::new();
        let mut origin: Vec<Vec<Option<EntityId>>> = Vec::new();

        for &shape in Category::Block.shapes_for(self.options.problem) {
            let Some(column) = table.column(Category::Block, shape) else {
                continue;
            };
            for (element, value) in self.mesh.elements(shape).iter().zip(column) {
                let Some(snapshot) = value.snapshot() else {
                    continue;
                };
                for &node in &element.nodes {
                    let slot = *slots.entry(node).or_insert_with(|| {
                        fixations.push(NodeFixation {
                            node,
                            codes: vec![FREE.to_string(); dofs.len()],
                        });
                        origin.push(vec![None; dofs.len()]);
                        fixations.len() - 1
                    });
                    for (d, dof) in dofs.iter().enumerate() {
                        let code = snapshot.text(dof).unwrap_or(FREE);
                        if code == FREE {
                            continue;
                        }
                        let current = &mut fixations[slot].codes[d];
                        if current.as_str() == FREE {
                            *current = code.to_string();
                            origin[slot][d] = Some(element.entity);
                        } else if current.as_str() != code {
                            let first = origin[slot][d].map(|e| e.to_string()).unwrap_or_default();
                            return Err(Error::consistency(format!(
                                "Block {} of node {} is {} from entity {} but {} from entity {}",
                                dof, node, current, first, code, element.entity
                            )));
                        }
                    }
                }
            }
        }
        fixations.retain(|f| f.codes.iter().any(|code| code != FREE));
        Ok(fixations)
    }

    fn node_lists(&self, table: &ElementAttributeTable) -> Vec<NodeList> {
        let mut lists: Vec<NodeList> = Vec::new();
        for category in [Category::Void, Category::Symmetry] {
            for &shape in category.shapes_for(self.options.problem) {
                let Some(column) = table.column(category, shape) else {
                    continue;
                };
                let elements = self.mesh.elements(shape);

                // Curves in first-seen order, elements along each curve
                let mut rank: FxHashMap<EntityId, usize> = FxHashMap::default();
                for element in elements {
                    let next = rank.len();
                    rank.entry(element.entity).or_insert(next);
                }
                let mut order: Vec<usize> = (0..elements.len()).collect();
                order.sort_by_key(|&i| {
                    let along = table.position(i).map(|p| p.index).unwrap_or(i);
                    (rank.get(&elements[i].entity).copied().unwrap_or(0), along)
                });

                let mut seen: FxHashMap<String, FxHashSet<NodeId>> = FxHashMap::default();
                for i in order {
                    let (element, value) = (&elements[i], &column[i]);
                    let Some(label) = value.snapshot().and_then(|s| s.text("Label")) else {
                        continue;
                    };
                    let list = match lists
                        .iter()
                        .position(|l| l.category == category && l.label == label)
                    {
                        Some(at) => &mut lists[at],
                        None => {
                            lists.push(NodeList {
                                category,
                                label: label.to_string(),
                                nodes: Vec::new(),
                            });
                            let at = lists.len() - 1;
                            &mut lists[at]
                        }
                    };
                    let mut nodes = element.nodes.clone();
                    if table.position(i).is_some_and(|p| p.is_reversed()) {
                        nodes.reverse();
                    }
                    let seen = seen.entry(label.to_string()).or_default();
                    for node in nodes {
                        if seen.insert(node) {
                            list.nodes.push(node);
                        }
                    }
                }
            }
        }
        lists
    }
}

/// Combine one entity's own slots with the slots of its covering groups
fn combine(
    category: Category,
    shape: ShapeType,
    problem: ProblemKind,
    entity: EntityId,
    own: &[&PropertySnapshot],
    covering: &[(GroupId, &Slots<'_>)],
) -> Result<ResolvedValue> {
    let info = category.info();
    match info.aggregation {
        Aggregation::DofMerge => merge_dofs(category, problem.dofs(), entity, own, covering),
        Aggregation::Concatenate => {
            let list: Vec<PropertySnapshot> = own
                .iter()
                .copied()
                .chain(covering.iter().flat_map(|(_, slots)| slots.iter().copied()))
                .cloned()
                .collect();
            Ok(if list.is_empty() {
                ResolvedValue::Unset
            } else {
                ResolvedValue::List(list)
            })
        }
        Aggregation::Exclusive | Aggregation::NodeEquivalence | Aggregation::NodeLists => {
            if let [(first, _), (second, _), ..] = covering {
                return Err(Error::consistency(format!(
                    "{} of {} entity {} is assigned by both group {} and group {}",
                    category, shape, entity, first, second
                )));
            }
            let (source, slots): (Scope, &[&PropertySnapshot]) = match (own, covering.first()) {
                ([_, ..], Some((group, _))) => {
                    return Err(Error::consistency(format!(
                        "{} of {} entity {} is assigned on the entity and by group {}",
                        category, shape, entity, group
                    )))
                }
                ([_, ..], None) => (Scope::Entity(entity), own),
                ([], Some((group, slots))) => (Scope::Group(*group), slots.as_slice()),
                ([], None) => return Ok(ResolvedValue::Unset),
            };
            Ok(match (info.scheme, slots) {
                (_, []) => ResolvedValue::Unset,
                (SlotScheme::Single, [snapshot, ..]) => ResolvedValue::Value {
                    snapshot: (*snapshot).clone(),
                    source,
                },
                (SlotScheme::Occurrences, _) => {
                    ResolvedValue::List(slots.iter().map(|s| (*s).clone()).collect())
                }
            })
        }
    }
}

/// Per-DOF merge: the entity first, then its groups in id order
///
/// Only the problem's DOFs take part; the others keep their template values.
fn merge_dofs(
    category: Category,
    dofs: &[&str],
    entity: EntityId,
    own: &[&PropertySnapshot],
    covering: &[(GroupId, &Slots<'_>)],
) -> Result<ResolvedValue> {
    let sources = own
        .iter()
        .map(|snapshot| (Scope::Entity(entity), *snapshot))
        .chain(covering.iter().flat_map(|(group, slots)| {
            slots
                .iter()
                .map(move |snapshot| (Scope::Group(*group), *snapshot))
        }));

    let mut merged: Option<(PropertySnapshot, Scope)> = None;
    let mut origin: FxHashMap<String, Scope> = FxHashMap::default();
    for (scope, snapshot) in sources {
        let (target, _) = merged.get_or_insert_with(|| (snapshot.clone(), scope));
        for (dof, value) in &snapshot.values {
            let code = value.as_text().unwrap_or(FREE);
            if code == FREE || !dofs.contains(&dof.as_str()) {
                continue;
            }
            match origin.get(dof) {
                None => {
                    target.set(dof, value.clone());
                    origin.insert(dof.clone(), scope);
                }
                Some(first) if target.get(dof) != Some(value) => {
                    return Err(Error::consistency(format!(
                        "{} {} of entity {} is {} by {} but {} by {}",
                        category,
                        dof,
                        entity,
                        target.text(dof).unwrap_or(FREE),
                        first,
                        code,
                        scope
                    )));
                }
                Some(_) => {}
            }
        }
    }
    Ok(match merged {
        Some((snapshot, source)) => ResolvedValue::Value { snapshot, source },
        None => ResolvedValue::Unset,
    })
}

/// Whether a mandatory category must be set on this element
fn requires(table: &ElementAttributeTable, category: Category, element: ElementRef) -> bool {
    match category {
        // Trusses carry no orientation
        Category::LocalAxis => {
            table
                .get(Category::Section, element)
                .snapshot()
                .and_then(|s| s.subtype.as_deref())
                != Some("Truss")
        }
        _ => true,
    }
}

fn unset(category: Category, shape: ShapeType, element: &MeshElement) -> Error {
    Error::validation(format!(
        "{} is not set on element {} of {} entity {}",
        category, element.id, shape, element.entity
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_lite_model::{
        AssignMode, CatalogEntry, CatalogKind, ElementKind, ErrorKind, InMemoryMesh, PropertyValue,
    };

    fn session(problem: &str) -> Session {
        let mut session = Session::new();
        session.select(&[], "Problem", problem).unwrap();
        session
    }

    fn material(session: &mut Session, name: &str, shape: ShapeType) {
        session
            .define_catalog_entry(
                CatalogKind::Material,
                CatalogEntry::new(name, shape, PropertySnapshot::new().with_subtype("Steel EC3")),
            )
            .unwrap();
    }

    fn assign(
        session: &mut Session,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        snapshot: PropertySnapshot,
    ) {
        session
            .assign(category, shape, scope, snapshot, AssignMode::Add, None)
            .unwrap();
    }

    fn resolve(session: &Session, mesh: &InMemoryMesh) -> Result<Resolution> {
        let options = ResolveOptions::from_tree(session.tree())?;
        ModelAssembler::new(session, mesh, options).resolve()
    }

    fn two_triangles() -> InMemoryMesh {
        let mut mesh = InMemoryMesh::new();
        mesh.add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [1.0, 1.0, 0.0])
            .add_node(4u64, [0.0, 1.0, 0.0]);
        mesh.add_element(1u64, ElementKind::Triangle, 7u32, &[1, 2, 3])
            .unwrap()
            .add_element(2u64, ElementKind::Triangle, 7u32, &[1, 3, 4])
            .unwrap();
        mesh
    }

    #[test]
    fn test_entity_material() {
        let mut s = session("Thermal 2D");
        material(&mut s, "steel", ShapeType::Surface);
        assign(
            &mut s,
            Category::Material,
            ShapeType::Surface,
            Scope::Entity(EntityId(7)),
            PropertySnapshot::new().with_text("Name", "steel"),
        );
        let resolution = resolve(&s, &two_triangles()).unwrap();
        for index in 0..2 {
            let value = resolution
                .table
                .get(Category::Material, ElementRef::new(ShapeType::Surface, index));
            assert_eq!(value.names(), vec!["steel"]);
        }
    }

    #[test]
    fn test_group_material() {
        let mut s = session("Thermal 2D");
        material(&mut s, "steel", ShapeType::Surface);
        assign(
            &mut s,
            Category::Material,
            ShapeType::Surface,
            Scope::Group(GroupId(1)),
            PropertySnapshot::new().with_text("Name", "steel"),
        );
        let mut mesh = two_triangles();
        mesh.add_group(1u32, ShapeType::Surface, "slab", &[7]);
        let resolution = resolve(&s, &mesh).unwrap();
        let value = resolution
            .table
            .get(Category::Material, ElementRef::new(ShapeType::Surface, 1));
        assert_eq!(value.names(), vec!["steel"]);
    }

    #[test]
    fn test_missing_material() {
        let s = session("Thermal 2D");
        let err = resolve(&s, &two_triangles()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("E7"));

        // Bulk resolution keeps the sentinel
        let options = ResolveOptions::new(ProblemKind::Thermal2D).bulk();
        let mesh = two_triangles();
        let resolution = ModelAssembler::new(&s, &mesh, options).resolve().unwrap();
        assert!(!resolution
            .table
            .get(Category::Material, ElementRef::new(ShapeType::Surface, 0))
            .is_set());
    }

    #[test]
    fn test_removed_catalog_entry_is_referential() {
        let mut s = session("Thermal 2D");
        material(&mut s, "steel", ShapeType::Surface);
        // A bulk load may leave references to entries defined for another shape
        s.assign_bulk(
            Category::Material,
            ShapeType::Surface,
            Scope::Entity(EntityId(7)),
            None,
            PropertySnapshot::new().with_text("Name", "concrete"),
        )
        .unwrap();
        let err = resolve(&s, &two_triangles()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Referential);
    }

    fn beam_line() -> InMemoryMesh {
        let mut mesh = InMemoryMesh::new();
        mesh.add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0]);
        mesh.add_element(1u64, ElementKind::Line, 3u32, &[1, 2]).unwrap();
        mesh.add_group(1u32, ShapeType::Curve, "supports", &[3]);
        mesh
    }

    fn block(dof: &str, code: &str) -> PropertySnapshot {
        PropertySnapshot::new().with_text(dof, code)
    }

    #[test]
    fn test_block_conflict_names_entity_and_group() {
        let mut s = session("Structural 2D");
        let (entity, group) = (Scope::Entity(EntityId(3)), Scope::Group(GroupId(1)));
        assign(&mut s, Category::Block, ShapeType::Curve, entity, block("X", "YES"));
        assign(&mut s, Category::Block, ShapeType::Curve, group, block("X", "F0"));
        let options = ResolveOptions::new(ProblemKind::Structural2D).bulk();
        let mesh = beam_line();
        let err = ModelAssembler::new(&s, &mesh, options).resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
        let message = err.to_string();
        assert!(message.contains("E3"));
        assert!(message.contains("G1"));
    }

    #[test]
    fn test_block_merges_dofs() {
        let mut s = session("Structural 2D");
        let (entity, group) = (Scope::Entity(EntityId(3)), Scope::Group(GroupId(1)));
        assign(&mut s, Category::Block, ShapeType::Curve, entity, block("X", "YES"));
        assign(&mut s, Category::Block, ShapeType::Curve, group, block("Y", "F0"));
        let options = ResolveOptions::new(ProblemKind::Structural2D).bulk();
        let mesh = beam_line();
        let resolution = ModelAssembler::new(&s, &mesh, options).resolve().unwrap();
        let value = resolution
            .table
            .get(Category::Block, ElementRef::new(ShapeType::Curve, 0));
        let snapshot = value.snapshot().unwrap();
        assert_eq!(snapshot.text("X"), Some("YES"));
        assert_eq!(snapshot.text("Y"), Some("F0"));
        assert_eq!(snapshot.text("RZ"), Some("NO"));

        assert_eq!(resolution.fixations.len(), 2);
        assert_eq!(resolution.fixations[0].codes, vec!["YES", "F0", "NO"]);
    }

    #[test]
    fn test_block_ignores_unused_dofs() {
        let mut s = session("Structural 2D");
        let (entity, group) = (Scope::Entity(EntityId(3)), Scope::Group(GroupId(1)));
        let own = block("X", "YES").with_text("Z", "YES");
        let covering = block("X", "YES").with_text("Z", "F0");
        assign(&mut s, Category::Block, ShapeType::Curve, entity, own);
        assign(&mut s, Category::Block, ShapeType::Curve, group, covering);
        let options = ResolveOptions::new(ProblemKind::Structural2D).bulk();
        let mesh = beam_line();
        let resolution = ModelAssembler::new(&s, &mesh, options).resolve().unwrap();
        assert_eq!(resolution.fixations[0].codes, vec!["YES", "NO", "NO"]);
    }

    #[test]
    fn test_exclusive_entity_and_group_conflict() {
        let mut s = session("Structural 2D");
        let section = PropertySnapshot::new()
            .with_subtype("Truss")
            .with_float("Area", 0.01);
        assign(&mut s, Category::Section, ShapeType::Curve, Scope::Entity(EntityId(3)), section);
        // The overlay only checks coverage when given a mesh
        let other = PropertySnapshot::new()
            .with_subtype("Truss")
            .with_float("Area", 0.02);
        assign(&mut s, Category::Section, ShapeType::Curve, Scope::Group(GroupId(1)), other);
        let options = ResolveOptions::new(ProblemKind::Structural2D).bulk();
        let mesh = beam_line();
        let err = ModelAssembler::new(&s, &mesh, options).resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert!(err.to_string().contains("G1"));
    }

    #[test]
    fn test_loads_concatenate() {
        let mut s = session("Structural 2D");
        let mut distributed = PropertySnapshot::new().with_subtype("Distributed");
        distributed.set("QY", PropertyValue::Float(-5000.0));
        assign(&mut s, Category::Load, ShapeType::Curve, Scope::Entity(EntityId(3)), distributed);
        let trapezoid = PropertySnapshot::new()
            .with_subtype("Trapezoidal")
            .with("End", PropertyValue::Vector(vec![0.0, -1000.0, 0.0]));
        assign(&mut s, Category::Load, ShapeType::Curve, Scope::Group(GroupId(1)), trapezoid);
        let options = ResolveOptions::new(ProblemKind::Structural2D).bulk();
        let mesh = beam_line();
        let resolution = ModelAssembler::new(&s, &mesh, options).resolve().unwrap();
        let value = resolution
            .table
            .get(Category::Load, ElementRef::new(ShapeType::Curve, 0));
        let subtypes: Vec<_> = value
            .snapshots()
            .iter()
            .map(|s| s.subtype.clone().unwrap_or_default())
            .collect();
        assert_eq!(subtypes, vec!["Distributed", "Trapezoidal"]);
        assert_eq!(value.render(Category::Load).matches(';').count(), 1);
    }

    fn same(dof: &str) -> PropertySnapshot {
        PropertySnapshot::new().with(dof, PropertyValue::Int(1))
    }

    fn shared_node_mesh() -> InMemoryMesh {
        let mut mesh = InMemoryMesh::new();
        mesh.add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [0.0, 1.0, 0.0]);
        mesh.add_element(1u64, ElementKind::Line, 1u32, &[1, 2])
            .unwrap()
            .add_element(2u64, ElementKind::Line, 2u32, &[1, 3])
            .unwrap();
        mesh
    }

    #[test]
    fn test_same_merges_across_entities() {
        let mut s = session("Structural 3D");
        assign(&mut s, Category::Same, ShapeType::Curve, Scope::Entity(EntityId(1)), same("X"));
        assign(&mut s, Category::Same, ShapeType::Curve, Scope::Entity(EntityId(2)), same("X"));
        let options = ResolveOptions::new(ProblemKind::Structural3D).bulk();
        let mesh = shared_node_mesh();
        let resolution = ModelAssembler::new(&s, &mesh, options).resolve().unwrap();
        let classes = resolution.equivalences.classes();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].nodes, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(classes[0].entities, vec![EntityId(1), EntityId(2)]);
    }

    #[test]
    fn test_same_conflicting_axes() {
        let mut s = session("Structural 3D");
        assign(&mut s, Category::Same, ShapeType::Curve, Scope::Entity(EntityId(1)), same("X"));
        assign(&mut s, Category::Same, ShapeType::Curve, Scope::Entity(EntityId(2)), same("Y"));
        let options = ResolveOptions::new(ProblemKind::Structural3D).bulk();
        let mesh = shared_node_mesh();
        let err = ModelAssembler::new(&s, &mesh, options).resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_void_node_list_follows_curve() {
        let mut s = session("Torsion");
        let label = PropertySnapshot::new().with_text("Label", "hole");
        assign(&mut s, Category::Void, ShapeType::Curve, Scope::Entity(EntityId(4)), label);
        let mut mesh = InMemoryMesh::new();
        mesh.add_node(1u64, [0.0, 0.0, 0.0])
            .add_node(2u64, [1.0, 0.0, 0.0])
            .add_node(3u64, [2.0, 0.0, 0.0]);
        mesh.add_element(1u64, ElementKind::Line, 4u32, &[3, 2])
            .unwrap()
            .add_element(2u64, ElementKind::Line, 4u32, &[1, 2])
            .unwrap();
        let options = ResolveOptions::new(ProblemKind::Torsion).bulk();
        let resolution = ModelAssembler::new(&s, &mesh, options).resolve().unwrap();
        assert_eq!(resolution.node_lists.len(), 1);
        assert_eq!(resolution.node_lists[0].label, "hole");
        assert_eq!(
            resolution.node_lists[0].nodes,
            vec![NodeId(3), NodeId(2), NodeId(1)]
        );
    }
}
