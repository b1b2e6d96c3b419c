// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Name-addressed registries of delocalized definitions
//!
//! Materials and local axes are defined once and referenced by name from the
//! attribute overlay. Entries are keyed by `(name, shape)`; list order carries
//! the preview convention (index 0 is the most recently selected entry) and
//! the 1-based indices used in the solver input.

use crate::{Error, PropertySnapshot, Result, ShapeType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CatalogKind {
    Material,
    LocalAxis,
}

impl CatalogKind {
    /// All catalog kinds
    pub const ALL: [CatalogKind; 2] = [CatalogKind::Material, CatalogKind::LocalAxis];

    /// Name used in persisted files and in the property tree
    pub fn name(&self) -> &'static str {
        match self {
            CatalogKind::Material => "Material",
            CatalogKind::LocalAxis => "LocalAxis",
        }
    }

    /// Parse a persisted catalog name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique name within `(kind, shape)`
    pub name: String,
    /// Shape type the definition applies to
    pub shape: ShapeType,
    /// Captured property values (sub-type selects the definition template)
    pub snapshot: PropertySnapshot,
}

impl CatalogEntry {
    /// Create a new entry
    pub fn new(name: impl Into<String>, shape: ShapeType, snapshot: PropertySnapshot) -> Self {
        Self {
            name: name.into(),
            shape,
            snapshot,
        }
    }

    fn is(&self, name: &str, shape: ShapeType) -> bool {
        self.shape == shape && self.name == name
    }
}

/// Material and local-axis registries
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    materials: Vec<CatalogEntry>,
    local_axes: Vec<CatalogEntry>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, kind: CatalogKind) -> &Vec<CatalogEntry> {
        match kind {
            CatalogKind::Material => &self.materials,
            CatalogKind::LocalAxis => &self.local_axes,
        }
    }

    fn list_mut(&mut self, kind: CatalogKind) -> &mut Vec<CatalogEntry> {
        match kind {
            CatalogKind::Material => &mut self.materials,
            CatalogKind::LocalAxis => &mut self.local_axes,
        }
    }

    fn position(&self, kind: CatalogKind, name: &str, shape: ShapeType) -> Option<usize> {
        self.list(kind).iter().position(|e| e.is(name, shape))
    }

    fn missing(kind: CatalogKind, name: &str, shape: ShapeType) -> Error {
        Error::referential(kind.name(), name, shape.name())
    }

    /// Entries of a kind in catalog order
    pub fn entries(&self, kind: CatalogKind) -> &[CatalogEntry] {
        self.list(kind)
    }

    /// Look up an entry
    pub fn get(&self, kind: CatalogKind, name: &str, shape: ShapeType) -> Option<&CatalogEntry> {
        self.list(kind).iter().find(|e| e.is(name, shape))
    }

    /// Check whether an entry exists
    pub fn contains(&self, kind: CatalogKind, name: &str, shape: ShapeType) -> bool {
        self.position(kind, name, shape).is_some()
    }

    fn check_new(&self, kind: CatalogKind, entry: &CatalogEntry) -> Result<()> {
        if entry.name.trim().is_empty() {
            return Err(Error::format(format!("{} name must not be empty", kind)));
        }
        if self.contains(kind, &entry.name, entry.shape) {
            return Err(Error::consistency(format!(
                "{} '{}' is already defined for {}",
                kind, entry.name, entry.shape
            )));
        }
        Ok(())
    }

    /// Insert a new entry at the front (it becomes the previewed entry)
    pub fn insert(&mut self, kind: CatalogKind, entry: CatalogEntry) -> Result<()> {
        self.check_new(kind, &entry)?;
        self.list_mut(kind).insert(0, entry);
        Ok(())
    }

    /// Append a new entry, preserving load order
    pub fn append(&mut self, kind: CatalogKind, entry: CatalogEntry) -> Result<()> {
        self.check_new(kind, &entry)?;
        self.list_mut(kind).push(entry);
        Ok(())
    }

    /// Replace the values of an existing entry
    pub fn update(
        &mut self,
        kind: CatalogKind,
        name: &str,
        shape: ShapeType,
        snapshot: PropertySnapshot,
    ) -> Result<()> {
        let index = self
            .position(kind, name, shape)
            .ok_or_else(|| Self::missing(kind, name, shape))?;
        self.list_mut(kind)[index].snapshot = snapshot;
        Ok(())
    }

    /// Remove an entry
    pub fn remove(
        &mut self,
        kind: CatalogKind,
        name: &str,
        shape: ShapeType,
    ) -> Result<CatalogEntry> {
        let index = self
            .position(kind, name, shape)
            .ok_or_else(|| Self::missing(kind, name, shape))?;
        Ok(self.list_mut(kind).remove(index))
    }

    /// Move an entry to index 0 to preview it
    pub fn reorder_to_front(
        &mut self,
        kind: CatalogKind,
        name: &str,
        shape: ShapeType,
    ) -> Result<()> {
        let index = self
            .position(kind, name, shape)
            .ok_or_else(|| Self::missing(kind, name, shape))?;
        let entry = self.list_mut(kind).remove(index);
        self.list_mut(kind).insert(0, entry);
        Ok(())
    }

    /// 1-based index of an entry in its kind's list
    ///
    /// Only stable until the next edit; callers recompute it on every pass.
    pub fn resolve_index(&self, kind: CatalogKind, name: &str, shape: ShapeType) -> Result<usize> {
        self.position(kind, name, shape)
            .map(|index| index + 1)
            .ok_or_else(|| Self::missing(kind, name, shape))
    }

    /// Total number of entries of a kind
    pub fn len(&self, kind: CatalogKind) -> usize {
        self.list(kind).len()
    }

    /// Whether both registries are empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty() && self.local_axes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn entry(name: &str, shape: ShapeType) -> CatalogEntry {
        CatalogEntry::new(name, shape, PropertySnapshot::new().with_subtype("Steel EC3"))
    }

    #[test]
    fn test_same_name_different_shapes() {
        let mut catalog = Catalog::new();
        catalog.insert(CatalogKind::Material, entry("steel", ShapeType::Curve)).unwrap();
        catalog.insert(CatalogKind::Material, entry("steel", ShapeType::Surface)).unwrap();
        let err = catalog
            .insert(CatalogKind::Material, entry("steel", ShapeType::Curve))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert_eq!(catalog.len(CatalogKind::Material), 2);
    }

    #[test]
    fn test_insert_previews_newest() {
        let mut catalog = Catalog::new();
        catalog.insert(CatalogKind::Material, entry("a", ShapeType::Curve)).unwrap();
        catalog.insert(CatalogKind::Material, entry("b", ShapeType::Curve)).unwrap();
        assert_eq!(catalog.entries(CatalogKind::Material)[0].name, "b");
    }

    #[test]
    fn test_reorder_changes_resolved_index() {
        let mut catalog = Catalog::new();
        for name in ["a", "b", "c"] {
            catalog.append(CatalogKind::Material, entry(name, ShapeType::Curve)).unwrap();
        }
        assert_eq!(catalog.resolve_index(CatalogKind::Material, "c", ShapeType::Curve).unwrap(), 3);
        catalog.reorder_to_front(CatalogKind::Material, "c", ShapeType::Curve).unwrap();
        assert_eq!(catalog.resolve_index(CatalogKind::Material, "c", ShapeType::Curve).unwrap(), 1);
        assert_eq!(catalog.resolve_index(CatalogKind::Material, "a", ShapeType::Curve).unwrap(), 2);
    }

    #[test]
    fn test_missing_entry_is_referential() {
        let catalog = Catalog::new();
        let err = catalog
            .resolve_index(CatalogKind::LocalAxis, "y-up", ShapeType::Curve)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Referential);
    }

    #[test]
    fn test_remove_and_update() {
        let mut catalog = Catalog::new();
        catalog.insert(CatalogKind::LocalAxis, entry("z", ShapeType::Curve)).unwrap();
        let snapshot = PropertySnapshot::new().with(
            "Vector",
            crate::PropertyValue::Vector(vec![0.0, 1.0, 0.0]),
        );
        catalog
            .update(CatalogKind::LocalAxis, "z", ShapeType::Curve, snapshot.clone())
            .unwrap();
        let removed = catalog.remove(CatalogKind::LocalAxis, "z", ShapeType::Curve).unwrap();
        assert_eq!(removed.snapshot, snapshot);
        assert!(catalog.is_empty());
    }
}
