// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property instances attached to entities and physical groups
//!
//! The overlay keeps two maps, one for entity scope and one for group scope,
//! each keyed by `(Category, ShapeType)` and then by [`SlotKey`]. Single
//! valued categories use slot `id`; multi-occurrence categories use `id/n`.

use crate::{
    validate_snapshot, CatalogKind, Category, Catalog, EntityId, Error, GroupId, MeshTopology,
    MeshTopologyExt, PropertySnapshot, PropertyTree, Result, ShapeType, SlotScheme,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Slot address inside one `(Category, ShapeType)` map
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    /// Entity or group id
    pub id: u32,
    /// Occurrence number for multi-occurrence categories
    pub occurrence: Option<u32>,
}

impl SlotKey {
    /// Slot of a single-valued category
    pub fn single(id: u32) -> Self {
        Self {
            id,
            occurrence: None,
        }
    }

    /// Slot of one occurrence
    pub fn occurrence(id: u32, occurrence: u32) -> Self {
        Self {
            id,
            occurrence: Some(occurrence),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.occurrence {
            Some(n) => write!(f, "{}/{}", self.id, n),
            None => write!(f, "{}", self.id),
        }
    }
}

impl FromStr for SlotKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let number = |text: &str| {
            lexical_core::parse::<u32>(text.trim().as_bytes())
                .map_err(|_| Error::format(format!("'{}' is not a slot key", s)))
        };
        match s.trim().split_once('/') {
            Some((id, n)) => Ok(Self::occurrence(number(id)?, number(n)?)),
            None => Ok(Self::single(number(s)?)),
        }
    }
}

/// Owner of an assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Entity(EntityId),
    Group(GroupId),
}

impl Scope {
    /// Raw entity or group id
    pub fn id(&self) -> u32 {
        match self {
            Scope::Entity(id) => id.0,
            Scope::Group(id) => id.0,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Entity(id) => write!(f, "entity {}", id),
            Scope::Group(id) => write!(f, "group {}", id),
        }
    }
}

/// Edit operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignMode {
    Add,
    Update,
    Remove,
}

/// Collaborators consulted while validating an assignment
#[derive(Clone, Copy)]
pub struct AssignContext<'a> {
    /// Catalog used to check name references
    pub catalog: &'a Catalog,
    /// Tree holding the leaf templates
    pub tree: &'a PropertyTree,
    /// Group membership for the entity-versus-group check, when available
    pub mesh: Option<&'a dyn MeshTopology>,
    /// Bulk load: catalog references are recorded instead of checked
    pub bulk: bool,
    /// Occurrence addressed by the edit, for multi-occurrence categories
    pub occurrence: Option<u32>,
}

impl<'a> AssignContext<'a> {
    /// Interactive context without mesh
    pub fn new(catalog: &'a Catalog, tree: &'a PropertyTree) -> Self {
        Self {
            catalog,
            tree,
            mesh: None,
            bulk: false,
            occurrence: None,
        }
    }

    /// Attach group membership
    pub fn with_mesh(mut self, mesh: &'a dyn MeshTopology) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Switch to bulk-load mode
    pub fn bulk(mut self) -> Self {
        self.bulk = true;
        self
    }

    /// Address one occurrence: the slot to update or remove, or the
    /// number an added occurrence takes
    pub fn at_occurrence(mut self, occurrence: u32) -> Self {
        self.occurrence = Some(occurrence);
        self
    }
}

/// A catalog reference whose check was deferred by a bulk load
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardRef {
    pub kind: CatalogKind,
    pub name: String,
    pub shape: ShapeType,
    pub category: Category,
    pub scope: Scope,
}

/// One stored assignment
#[derive(Clone, Copy, Debug)]
pub struct Assignment<'a, Id> {
    /// Owning entity or group
    pub id: Id,
    /// Slot address
    pub key: SlotKey,
    /// Captured values
    pub snapshot: &'a PropertySnapshot,
}

type SlotMap = FxHashMap<(Category, ShapeType), BTreeMap<SlotKey, PropertySnapshot>>;

/// Entity and group assignments of a session
#[derive(Clone, Debug, Default)]
pub struct AttributeOverlay {
    ents: SlotMap,
    pgs: SlotMap,
    forward: Vec<ForwardRef>,
}

fn slots_of(
    map: &BTreeMap<SlotKey, PropertySnapshot>,
    id: u32,
) -> impl Iterator<Item = (&SlotKey, &PropertySnapshot)> {
    map.range(SlotKey::single(id)..=SlotKey::occurrence(id, u32::MAX))
}

impl AttributeOverlay {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, scope: &Scope) -> &SlotMap {
        match scope {
            Scope::Entity(_) => &self.ents,
            Scope::Group(_) => &self.pgs,
        }
    }

    fn map_mut(&mut self, scope: &Scope) -> &mut SlotMap {
        match scope {
            Scope::Entity(_) => &mut self.ents,
            Scope::Group(_) => &mut self.pgs,
        }
    }

    /// Add, update or remove an assignment
    ///
    /// The snapshot is completed with template defaults first. Returns the
    /// slot that was written or removed. On failure the overlay is left as
    /// it was.
    pub fn assign(
        &mut self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        snapshot: PropertySnapshot,
        mode: AssignMode,
        ctx: &AssignContext<'_>,
    ) -> Result<SlotKey> {
        if !category.applies_to(shape) {
            return Err(Error::configuration(format!(
                "{} cannot be attached to {}",
                category, shape
            )));
        }
        let snapshot = ctx.tree.fill_leaf(shape, category, &snapshot)?;
        match mode {
            AssignMode::Add => self.add(category, shape, scope, snapshot, ctx),
            AssignMode::Remove => {
                let (owner, key) = self.find_slot(category, shape, scope, &snapshot, ctx, false)?;
                self.take_slot(category, shape, owner, key)?;
                Ok(key)
            }
            AssignMode::Update => {
                let (owner, key) = self.find_slot(category, shape, scope, &snapshot, ctx, true)?;
                let forward = self.forward.clone();
                let old = self.take_slot(category, shape, owner, key)?;
                let mut ctx = *ctx;
                ctx.occurrence = key.occurrence;
                match self.add(category, shape, owner, snapshot, &ctx) {
                    Ok(key) => Ok(key),
                    Err(err) => {
                        self.map_mut(&owner)
                            .entry((category, shape))
                            .or_default()
                            .insert(key, old);
                        self.forward = forward;
                        Err(err)
                    }
                }
            }
        }
    }

    fn add(
        &mut self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        snapshot: PropertySnapshot,
        ctx: &AssignContext<'_>,
    ) -> Result<SlotKey> {
        let template = ctx
            .tree
            .leaf_template(shape, category, snapshot.subtype.as_deref())?;
        validate_snapshot(template, &snapshot)?;

        let id = scope.id();
        let existing = self
            .map(&scope)
            .get(&(category, shape))
            .map(|map| slots_of(map, id).collect::<Vec<_>>())
            .unwrap_or_default();

        let key = match category.info().scheme {
            SlotScheme::Single => {
                if !existing.is_empty() {
                    return Err(Error::consistency(format!(
                        "{} is already assigned to {} {}",
                        category, shape, scope
                    )));
                }
                SlotKey::single(id)
            }
            SlotScheme::Occurrences => {
                if let Some(name) = catalog_name(category, &snapshot) {
                    if existing.iter().any(|(_, s)| s.name() == Some(name)) {
                        return Err(Error::consistency(format!(
                            "{} '{}' is already assigned to {} {}",
                            category, name, shape, scope
                        )));
                    }
                }
                let next = match ctx.occurrence {
                    Some(n) if existing.iter().any(|(key, _)| key.occurrence == Some(n)) => {
                        return Err(Error::consistency(format!(
                            "{} occurrence {} is already used on {} {}",
                            category, n, shape, scope
                        )));
                    }
                    Some(n) => n,
                    None => existing
                        .iter()
                        .filter_map(|(key, _)| key.occurrence)
                        .max()
                        .map_or(0, |max| max + 1),
                };
                SlotKey::occurrence(id, next)
            }
        };

        let mut forward = None;
        if let (Some(kind), Some(name)) = (category.catalog(), catalog_name(category, &snapshot)) {
            if !ctx.catalog.contains(kind, name, shape) {
                if !ctx.bulk {
                    return Err(Error::referential(kind.name(), name, shape.name()));
                }
                forward = Some(ForwardRef {
                    kind,
                    name: name.to_string(),
                    shape,
                    category,
                    scope,
                });
            }
        }

        if let Some(mesh) = ctx.mesh {
            if !category.allows_aggregation() {
                self.check_coverage(category, shape, scope, mesh)?;
            }
        }

        self.forward.extend(forward);
        self.map_mut(&scope)
            .entry((category, shape))
            .or_default()
            .insert(key, snapshot);
        Ok(key)
    }

    fn check_coverage(
        &self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        mesh: &dyn MeshTopology,
    ) -> Result<()> {
        let ents = self.ents.get(&(category, shape));
        let pgs = self.pgs.get(&(category, shape));
        let entity_has = |entity: EntityId| {
            ents.is_some_and(|map| slots_of(map, entity.0).next().is_some())
        };
        let group_has = |group: GroupId| {
            pgs.is_some_and(|map| slots_of(map, group.0).next().is_some())
        };

        match scope {
            Scope::Entity(entity) => {
                if let Some(group) = mesh
                    .groups_containing(shape, entity)
                    .into_iter()
                    .find(|g| group_has(g.id))
                {
                    return Err(Error::consistency(format!(
                        "{} of {} {} conflicts with group {}",
                        category, shape, entity, group.id
                    )));
                }
            }
            Scope::Group(id) => {
                let Some(group) = mesh.group(shape, id) else {
                    return Ok(());
                };
                for entity in &group.entities {
                    if entity_has(*entity) {
                        return Err(Error::consistency(format!(
                            "{} of group {} conflicts with {} {}",
                            category, id, shape, entity
                        )));
                    }
                    if let Some(other) = mesh
                        .groups_containing(shape, *entity)
                        .into_iter()
                        .find(|g| g.id != id && group_has(g.id))
                    {
                        return Err(Error::consistency(format!(
                            "{} of group {} conflicts with group {} on {} {}",
                            category, id, other.id, shape, entity
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Find the slot an update or removal addresses
    ///
    /// An explicit occurrence wins. Otherwise catalog-referencing categories
    /// match by name, scanning entity scope and then group scope; an update
    /// of another multi-occurrence category needs the id to hold exactly one
    /// occurrence, and a removal matches the values.
    fn find_slot(
        &self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        snapshot: &PropertySnapshot,
        ctx: &AssignContext<'_>,
        update: bool,
    ) -> Result<(Scope, SlotKey)> {
        let id = scope.id();
        let name = catalog_name(category, snapshot);
        let owners = match (category.info().scheme, ctx.occurrence, name) {
            (SlotScheme::Occurrences, None, Some(_)) => {
                vec![Scope::Entity(EntityId(id)), Scope::Group(GroupId(id))]
            }
            _ => vec![scope],
        };

        for owner in owners {
            let Some(map) = self.map(&owner).get(&(category, shape)) else {
                continue;
            };
            let slots: Vec<_> = slots_of(map, id).collect();
            let found = match (category.info().scheme, ctx.occurrence, name) {
                (SlotScheme::Single, _, _) => slots.first().map(|(key, _)| **key),
                (SlotScheme::Occurrences, Some(n), _) => {
                    let key = SlotKey::occurrence(id, n);
                    map.contains_key(&key).then_some(key)
                }
                (SlotScheme::Occurrences, None, Some(name)) => slots
                    .iter()
                    .find(|(_, s)| s.name() == Some(name))
                    .map(|(key, _)| **key),
                (SlotScheme::Occurrences, None, None) if update => match slots.as_slice() {
                    [(key, _)] => Some(**key),
                    [] => None,
                    _ => {
                        return Err(Error::consistency(format!(
                            "{} {} holds {} {} occurrences; name the one to update",
                            shape,
                            owner,
                            slots.len(),
                            category
                        )));
                    }
                },
                (SlotScheme::Occurrences, None, None) => slots
                    .iter()
                    .find(|(_, s)| *s == snapshot)
                    .map(|(key, _)| **key),
            };
            if let Some(key) = found {
                return Ok((owner, key));
            }
        }
        Err(Error::consistency(format!(
            "no matching {} assigned to {} {}",
            category, shape, scope
        )))
    }

    /// Remove a slot and the deferred reference it recorded
    fn take_slot(
        &mut self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        key: SlotKey,
    ) -> Result<PropertySnapshot> {
        let removed = self
            .map_mut(&scope)
            .get_mut(&(category, shape))
            .and_then(|map| map.remove(&key))
            .ok_or_else(|| {
                Error::consistency(format!("{} has no slot {} for {}", scope, key, category))
            })?;
        if let Some(name) = catalog_name(category, &removed) {
            self.forward.retain(|r| {
                !(r.category == category && r.shape == shape && r.scope == scope && r.name == name)
            });
        }
        Ok(removed)
    }

    /// Remove one slot by address
    pub fn remove_slot(
        &mut self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        key: SlotKey,
    ) -> Result<PropertySnapshot> {
        self.take_slot(category, shape, scope, key)
    }

    /// All assignments of a category on a shape, entities then groups, in slot order
    pub fn query(
        &self,
        category: Category,
        shape: ShapeType,
    ) -> (Vec<Assignment<'_, EntityId>>, Vec<Assignment<'_, GroupId>>) {
        (
            assignments(&self.ents, category, shape, EntityId),
            assignments(&self.pgs, category, shape, GroupId),
        )
    }

    /// Assignments held by one entity or group, in occurrence order
    pub fn slots(
        &self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
    ) -> Vec<(SlotKey, &PropertySnapshot)> {
        self.map(&scope)
            .get(&(category, shape))
            .map(|map| {
                slots_of(map, scope.id())
                    .map(|(key, snapshot)| (*key, snapshot))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every slot of one scope kind, sorted by shape, category and slot
    pub fn entries(&self, groups: bool) -> Vec<(Category, ShapeType, SlotKey, &PropertySnapshot)> {
        let map = if groups { &self.pgs } else { &self.ents };
        let mut entries: Vec<_> = map
            .iter()
            .flat_map(|((category, shape), slots)| {
                slots
                    .iter()
                    .map(move |(key, snapshot)| (*category, *shape, *key, snapshot))
            })
            .collect();
        entries.sort_by_key(|(category, shape, key, _)| (*shape, *category, *key));
        entries
    }

    /// Whether any slot references a catalog entry
    pub fn references(&self, kind: CatalogKind, name: &str, shape: ShapeType) -> bool {
        self.ents
            .iter()
            .chain(self.pgs.iter())
            .filter(|((category, s), _)| category.catalog() == Some(kind) && *s == shape)
            .flat_map(|(_, slots)| slots.values())
            .any(|snapshot| snapshot.name() == Some(name))
    }

    /// Catalog references deferred by bulk loads
    pub fn forward_references(&self) -> &[ForwardRef] {
        &self.forward
    }

    /// Check deferred references against a catalog and forget them
    pub fn settle_forward_references(&mut self, catalog: &Catalog) -> Result<()> {
        if let Some(missing) = self
            .forward
            .iter()
            .find(|r| !catalog.contains(r.kind, &r.name, r.shape))
        {
            return Err(Error::referential(
                missing.kind.name(),
                missing.name.clone(),
                missing.shape.name(),
            ));
        }
        self.forward.clear();
        Ok(())
    }

    /// Total number of slots
    pub fn len(&self) -> usize {
        self.ents
            .values()
            .chain(self.pgs.values())
            .map(|slots| slots.len())
            .sum()
    }

    /// Whether the overlay has no slots
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn assignments<Id>(
    map: &SlotMap,
    category: Category,
    shape: ShapeType,
    make_id: impl Fn(u32) -> Id,
) -> Vec<Assignment<'_, Id>> {
    map.get(&(category, shape))
        .into_iter()
        .flat_map(|slots| slots.iter())
        .map(|(key, snapshot)| Assignment {
            id: make_id(key.id),
            key: *key,
            snapshot,
        })
        .collect()
}

fn catalog_name(category: Category, snapshot: &PropertySnapshot) -> Option<&str> {
    category.catalog().and_then(|_| snapshot.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogEntry, ErrorKind, InMemoryMesh};

    struct Fixture {
        tree: PropertyTree,
        catalog: Catalog,
    }

    impl Fixture {
        fn new() -> Self {
            let mut catalog = Catalog::new();
            for name in ["steel", "concrete"] {
                catalog
                    .append(
                        CatalogKind::Material,
                        CatalogEntry::new(name, ShapeType::Surface, PropertySnapshot::new()),
                    )
                    .unwrap();
            }
            Self {
                tree: PropertyTree::default_tree(),
                catalog,
            }
        }

        fn ctx(&self) -> AssignContext<'_> {
            AssignContext::new(&self.catalog, &self.tree)
        }

        fn material(
            &self,
            overlay: &mut AttributeOverlay,
            scope: Scope,
            name: &str,
            mode: AssignMode,
        ) -> Result<SlotKey> {
            overlay.assign(
                Category::Material,
                ShapeType::Surface,
                scope,
                material(name),
                mode,
                &self.ctx(),
            )
        }

        fn block(
            &self,
            overlay: &mut AttributeOverlay,
            shape: ShapeType,
            scope: Scope,
            snapshot: PropertySnapshot,
            mode: AssignMode,
        ) -> Result<SlotKey> {
            overlay.assign(Category::Block, shape, scope, snapshot, mode, &self.ctx())
        }
    }

    fn material(name: &str) -> PropertySnapshot {
        PropertySnapshot::new().with_text("Name", name)
    }

    fn block(x: &str) -> PropertySnapshot {
        PropertySnapshot::new()
            .with_subtype("Block")
            .with_text("X", x)
    }

    fn point_load(fz: f64) -> PropertySnapshot {
        PropertySnapshot::new().with_subtype("Nodal").with_float("FZ", fz)
    }

    #[test]
    fn test_slot_key_text() {
        assert_eq!(SlotKey::occurrence(3, 1).to_string(), "3/1");
        assert_eq!("3/1".parse::<SlotKey>().unwrap(), SlotKey::occurrence(3, 1));
        assert_eq!("7".parse::<SlotKey>().unwrap(), SlotKey::single(7));
        assert!("x/1".parse::<SlotKey>().is_err());
    }

    #[test]
    fn test_single_valued_add_twice() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        let scope = Scope::Entity(EntityId(3));
        let curve = ShapeType::Curve;
        fx.block(&mut overlay, curve, scope, block("F0"), AssignMode::Add)
            .unwrap();
        let err = fx
            .block(&mut overlay, curve, scope, block("NO"), AssignMode::Add)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);

        fx.block(&mut overlay, curve, scope, block("NO"), AssignMode::Update)
            .unwrap();
        let (ents, pgs) = overlay.query(Category::Block, curve);
        assert_eq!(ents.len(), 1);
        assert!(pgs.is_empty());
        assert_eq!(ents[0].snapshot.text("X"), Some("NO"));
    }

    #[test]
    fn test_occurrence_numbering() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        let scope = Scope::Entity(EntityId(7));
        let first = fx
            .material(&mut overlay, scope, "steel", AssignMode::Add)
            .unwrap();
        let second = fx
            .material(&mut overlay, scope, "concrete", AssignMode::Add)
            .unwrap();
        assert_eq!(first.to_string(), "7/0");
        assert_eq!(second.to_string(), "7/1");

        let err = fx
            .material(&mut overlay, scope, "steel", AssignMode::Add)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);

        let removed = fx
            .material(&mut overlay, scope, "steel", AssignMode::Remove)
            .unwrap();
        assert_eq!(removed, first);
        let slots = overlay.slots(Category::Material, ShapeType::Surface, scope);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].1.name(), Some("concrete"));
    }

    #[test]
    fn test_update_load_occurrence() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        let scope = Scope::Entity(EntityId(1));
        let load = |overlay: &mut AttributeOverlay, fz, mode, ctx: &AssignContext<'_>| {
            overlay.assign(Category::Load, ShapeType::Point, scope, point_load(fz), mode, ctx)
        };

        load(&mut overlay, -10.0, AssignMode::Add, &fx.ctx()).unwrap();
        let key = load(&mut overlay, -20.0, AssignMode::Update, &fx.ctx()).unwrap();
        assert_eq!(key, SlotKey::occurrence(1, 0));
        let slots = overlay.slots(Category::Load, ShapeType::Point, scope);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].1.number("FZ"), Some(-20.0));

        // With several occurrences the edit names the one it changes
        load(&mut overlay, -5.0, AssignMode::Add, &fx.ctx()).unwrap();
        let err = load(&mut overlay, -30.0, AssignMode::Update, &fx.ctx()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
        let key = load(&mut overlay, -30.0, AssignMode::Update, &fx.ctx().at_occurrence(1))
            .unwrap();
        assert_eq!(key, SlotKey::occurrence(1, 1));
        let slots = overlay.slots(Category::Load, ShapeType::Point, scope);
        assert_eq!(slots[0].1.number("FZ"), Some(-20.0));
        assert_eq!(slots[1].1.number("FZ"), Some(-30.0));

        let err = load(&mut overlay, -1.0, AssignMode::Update, &fx.ctx().at_occurrence(4))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_failed_occurrence_update_restores() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        let scope = Scope::Entity(EntityId(1));
        overlay
            .assign(
                Category::Load,
                ShapeType::Point,
                scope,
                point_load(-10.0),
                AssignMode::Add,
                &fx.ctx(),
            )
            .unwrap();
        let bad = point_load(-20.0).with_text("FZ", "heavy");
        let err = overlay
            .assign(
                Category::Load,
                ShapeType::Point,
                scope,
                bad,
                AssignMode::Update,
                &fx.ctx().at_occurrence(0),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let slots = overlay.slots(Category::Load, ShapeType::Point, scope);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].0, SlotKey::occurrence(1, 0));
        assert_eq!(slots[0].1.number("FZ"), Some(-10.0));
    }

    #[test]
    fn test_remove_finds_group_slot() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        fx.material(&mut overlay, Scope::Group(GroupId(5)), "steel", AssignMode::Add)
            .unwrap();
        let key = fx
            .material(&mut overlay, Scope::Entity(EntityId(5)), "steel", AssignMode::Remove)
            .unwrap();
        assert_eq!(key, SlotKey::occurrence(5, 0));
        assert!(overlay.is_empty());

        // The entity slot is preferred over the group slot
        fx.material(&mut overlay, Scope::Group(GroupId(5)), "steel", AssignMode::Add)
            .unwrap();
        fx.material(&mut overlay, Scope::Entity(EntityId(5)), "steel", AssignMode::Add)
            .unwrap();
        fx.material(&mut overlay, Scope::Group(GroupId(5)), "steel", AssignMode::Remove)
            .unwrap();
        assert_eq!(overlay.entries(true).len(), 1);
        assert!(overlay.entries(false).is_empty());
    }

    #[test]
    fn test_missing_catalog_reference() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        let scope = Scope::Entity(EntityId(1));
        let err = fx
            .material(&mut overlay, scope, "concreteA", AssignMode::Add)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Referential);
        assert!(overlay.is_empty());

        // Bulk load defers the check
        let bulk = fx.ctx().bulk();
        overlay
            .assign(
                Category::Material,
                ShapeType::Surface,
                scope,
                material("concreteA"),
                AssignMode::Add,
                &bulk,
            )
            .unwrap();
        assert_eq!(overlay.forward_references().len(), 1);
        assert_eq!(
            overlay.settle_forward_references(&fx.catalog).unwrap_err().kind(),
            ErrorKind::Referential
        );

        let mut catalog = fx.catalog.clone();
        catalog
            .append(
                CatalogKind::Material,
                CatalogEntry::new("concreteA", ShapeType::Surface, PropertySnapshot::new()),
            )
            .unwrap();
        overlay.settle_forward_references(&catalog).unwrap();
        assert!(overlay.forward_references().is_empty());
    }

    #[test]
    fn test_removed_slot_drops_deferred_reference() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        let bulk = fx.ctx().bulk();
        let scope = Scope::Entity(EntityId(1));
        for name in ["concreteA", "concreteB"] {
            overlay
                .assign(
                    Category::Material,
                    ShapeType::Surface,
                    scope,
                    material(name),
                    AssignMode::Add,
                    &bulk,
                )
                .unwrap();
        }
        assert_eq!(overlay.forward_references().len(), 2);

        fx.material(&mut overlay, scope, "concreteA", AssignMode::Remove)
            .unwrap();
        overlay
            .remove_slot(
                Category::Material,
                ShapeType::Surface,
                scope,
                SlotKey::occurrence(1, 1),
            )
            .unwrap();
        assert!(overlay.forward_references().is_empty());
        overlay.settle_forward_references(&fx.catalog).unwrap();
    }

    #[test]
    fn test_required_field() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        let err = overlay
            .assign(
                Category::Void,
                ShapeType::Curve,
                Scope::Entity(EntityId(1)),
                PropertySnapshot::new().with_text("Label", " "),
                AssignMode::Add,
                &fx.ctx(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_entity_and_group_conflict() {
        let fx = Fixture::new();
        let mut mesh = InMemoryMesh::new();
        mesh.add_group(1u32, ShapeType::Surface, "slab", &[7, 8]);
        let ctx = fx.ctx().with_mesh(&mesh);
        let group = Scope::Group(GroupId(1));
        let entity = Scope::Entity(EntityId(8));
        let surface = ShapeType::Surface;
        let mut overlay = AttributeOverlay::new();
        overlay
            .assign(Category::Material, surface, group, material("steel"), AssignMode::Add, &ctx)
            .unwrap();
        let err = overlay
            .assign(Category::Material, surface, entity, material("steel"), AssignMode::Add, &ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert!(err.to_string().contains("G1"));

        // Loads aggregate, so entity and group may both carry one
        let load = PropertySnapshot::new()
            .with_subtype("Surface")
            .with_float("QZ", -1.0);
        overlay
            .assign(Category::Load, surface, group, load.clone(), AssignMode::Add, &ctx)
            .unwrap();
        overlay
            .assign(Category::Load, surface, entity, load, AssignMode::Add, &ctx)
            .unwrap();
    }

    #[test]
    fn test_failed_update_restores() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        let scope = Scope::Entity(EntityId(2));
        let point = ShapeType::Point;
        fx.block(&mut overlay, point, scope, block("F0"), AssignMode::Add)
            .unwrap();
        let bad = block("F0").with_float("Y", 1.0);
        assert!(fx
            .block(&mut overlay, point, scope, bad, AssignMode::Update)
            .is_err());
        let slots = overlay.slots(Category::Block, point, scope);
        assert_eq!(slots[0].1.text("X"), Some("F0"));

        let other = Scope::Entity(EntityId(9));
        let err = fx
            .block(&mut overlay, point, other, block("F0"), AssignMode::Remove)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_references() {
        let fx = Fixture::new();
        let mut overlay = AttributeOverlay::new();
        fx.material(&mut overlay, Scope::Group(GroupId(4)), "steel", AssignMode::Add)
            .unwrap();
        assert!(overlay.references(CatalogKind::Material, "steel", ShapeType::Surface));
        assert!(!overlay.references(CatalogKind::Material, "steel", ShapeType::Curve));
        assert_eq!(overlay.entries(true).len(), 1);
        assert!(overlay.entries(false).is_empty());
    }
}
