// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fire-Lite Model - Property model and shared types for fire-engineering FE models
//!
//! This crate holds the editable state that turns a meshed geometric model
//! into a finite-element description: the configuration tree, the
//! attribute overlay that attaches properties to entities and physical
//! groups, and the material and local-axis catalogs.
//!
//! # Architecture
//!
//! - [`PropertyTree`] - Ordered tree of mutually exclusive choices and their parameters
//! - [`AttributeOverlay`] - Per-entity and per-group property instances
//! - [`Catalog`] - Name-addressed material and local-axis definitions
//! - [`Category`] - Assignable property kinds and their resolution rules
//! - [`MeshTopology`] - Read-only view of the external geometry and mesh
//! - [`Session`] - Single-writer owner of tree, overlay and catalog
//!
//! # Example
//!
//! ```ignore
//! use fire_lite_model::*;
//!
//! let mut session = Session::new();
//! session.select(&[], "Problem", "Thermal 2D")?;
//! session.define_catalog_entry(
//!     CatalogKind::Material,
//!     CatalogEntry::new(
//!         "steel",
//!         ShapeType::Surface,
//!         PropertySnapshot::new().with_subtype("Steel EC3"),
//!     ),
//! )?;
//! session.assign(
//!     Category::Material,
//!     ShapeType::Surface,
//!     Scope::Entity(EntityId(7)),
//!     PropertySnapshot::new().with_text("Name", "steel"),
//!     AssignMode::Add,
//!     None,
//! )?;
//! ```

pub mod catalog;
pub mod category;
pub mod error;
pub mod mesh;
pub mod overlay;
pub mod properties;
pub mod session;
pub mod traits;
pub mod tree;
pub mod types;

// Re-export all public types
pub use catalog::*;
pub use category::*;
pub use error::*;
pub use mesh::*;
pub use overlay::*;
pub use properties::*;
pub use session::*;
pub use traits::*;
pub use tree::*;
pub use types::*;
