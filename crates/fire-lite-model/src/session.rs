// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-writer owner of the tree, the overlay and the catalog

use crate::{
    validate_snapshot, AssignContext, AssignMode, AttributeOverlay, Catalog, CatalogEntry,
    CatalogKind, Category, Error, MeshTopology, PathStep, ProblemKind, PropertySnapshot,
    PropertyTree, PropertyValue, Result, Scope, ShapeType, SlotKey,
};

/// Editable model state
///
/// Every edit bridge event maps to one method. Methods validate before
/// mutating, so a failed edit leaves the session unchanged.
#[derive(Clone, Debug, Default)]
pub struct Session {
    tree: PropertyTree,
    overlay: AttributeOverlay,
    catalog: Catalog,
}

impl Session {
    /// Session with built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Session around an existing tree
    pub fn with_tree(tree: PropertyTree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    /// Configuration tree
    pub fn tree(&self) -> &PropertyTree {
        &self.tree
    }

    /// Attribute overlay
    pub fn overlay(&self) -> &AttributeOverlay {
        &self.overlay
    }

    /// Material and local-axis catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Active problem kind
    pub fn problem(&self) -> Result<ProblemKind> {
        self.tree.problem()
    }

    /// "select variant V under selector S" / "set property P to V"
    pub fn select(&mut self, path: &[PathStep], selector: &str, value: &str) -> Result<()> {
        self.tree.select_variant(path, selector, value)
    }

    /// Apply a `selector: value` header line
    pub fn apply_header(&mut self, selector: &str, value: &str) -> Result<()> {
        self.tree.apply_header(selector, value)
    }

    /// "add/update/remove occurrence of category C on entity/group E"
    pub fn assign(
        &mut self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        snapshot: PropertySnapshot,
        mode: AssignMode,
        mesh: Option<&dyn MeshTopology>,
    ) -> Result<SlotKey> {
        let mut ctx = AssignContext::new(&self.catalog, &self.tree);
        ctx.mesh = mesh;
        let key = self
            .overlay
            .assign(category, shape, scope, snapshot, mode, &ctx)?;
        log::debug!("{:?} {} on {} {} slot {}", mode, category, shape, scope, key);
        Ok(key)
    }

    /// Replace the values of one occurrence, keeping its number
    pub fn update_occurrence(
        &mut self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        occurrence: u32,
        snapshot: PropertySnapshot,
    ) -> Result<SlotKey> {
        let ctx = AssignContext::new(&self.catalog, &self.tree).at_occurrence(occurrence);
        let key = self
            .overlay
            .assign(category, shape, scope, snapshot, AssignMode::Update, &ctx)?;
        log::debug!("Update {} on {} {} slot {}", category, shape, scope, key);
        Ok(key)
    }

    /// Remove one occurrence by number
    pub fn remove_occurrence(
        &mut self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        occurrence: u32,
    ) -> Result<PropertySnapshot> {
        let key = SlotKey::occurrence(scope.id(), occurrence);
        self.overlay.remove_slot(category, shape, scope, key)
    }

    /// Add an assignment during a bulk load, deferring catalog checks
    ///
    /// A persisted occurrence number is kept as the slot's number.
    pub fn assign_bulk(
        &mut self,
        category: Category,
        shape: ShapeType,
        scope: Scope,
        occurrence: Option<u32>,
        snapshot: PropertySnapshot,
    ) -> Result<SlotKey> {
        let mut ctx = AssignContext::new(&self.catalog, &self.tree).bulk();
        ctx.occurrence = occurrence;
        self.overlay
            .assign(category, shape, scope, snapshot, AssignMode::Add, &ctx)
    }

    /// Check the catalog references deferred by [`Session::assign_bulk`]
    pub fn finish_bulk(&mut self) -> Result<()> {
        self.overlay.settle_forward_references(&self.catalog)
    }

    fn checked_entry(&self, kind: CatalogKind, mut entry: CatalogEntry) -> Result<CatalogEntry> {
        let mut snapshot = self.tree.fill_catalog(kind, &entry.snapshot)?;
        if snapshot.name().is_none() {
            snapshot.set("Name", PropertyValue::Text(entry.name.clone()));
        }
        if snapshot.name() != Some(entry.name.as_str()) {
            return Err(Error::consistency(format!(
                "{} '{}' carries the name '{}'",
                kind,
                entry.name,
                snapshot.name().unwrap_or_default()
            )));
        }
        let template = self
            .tree
            .catalog_template(kind, snapshot.subtype.as_deref())?;
        validate_snapshot(template, &snapshot)?;
        entry.snapshot = snapshot;
        Ok(entry)
    }

    /// Define a new catalog entry; it becomes the previewed one
    pub fn define_catalog_entry(&mut self, kind: CatalogKind, entry: CatalogEntry) -> Result<()> {
        let entry = self.checked_entry(kind, entry)?;
        self.catalog.insert(kind, entry)
    }

    /// Define a catalog entry after the existing ones, as a file load does
    pub fn append_catalog_entry(&mut self, kind: CatalogKind, entry: CatalogEntry) -> Result<()> {
        let entry = self.checked_entry(kind, entry)?;
        self.catalog.append(kind, entry)
    }

    /// Replace the values of a catalog entry
    pub fn update_catalog_entry(
        &mut self,
        kind: CatalogKind,
        name: &str,
        shape: ShapeType,
        snapshot: PropertySnapshot,
    ) -> Result<()> {
        let entry = self.checked_entry(kind, CatalogEntry::new(name, shape, snapshot))?;
        self.catalog.update(kind, name, shape, entry.snapshot)
    }

    /// Remove a catalog entry nothing refers to
    pub fn remove_catalog_entry(
        &mut self,
        kind: CatalogKind,
        name: &str,
        shape: ShapeType,
    ) -> Result<CatalogEntry> {
        if self.overlay.references(kind, name, shape) {
            return Err(Error::referential(
                kind.name(),
                format!("{} (still assigned)", name),
                shape.name(),
            ));
        }
        self.catalog.remove(kind, name, shape)
    }

    /// Move a catalog entry to the front to preview it
    pub fn preview_catalog_entry(
        &mut self,
        kind: CatalogKind,
        name: &str,
        shape: ShapeType,
    ) -> Result<()> {
        self.catalog.reorder_to_front(kind, name, shape)
    }
}
