// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Fire-Lite Assembly
//!
//! Turns an edited property model and a mesh into the input file of the
//! fire-engineering solver.
//!
//! ## Overview
//!
//! - **Resolution**: Merge entity and group assignments per element, check
//!   references and mandatory categories ([`ModelAssembler`])
//! - **Numbering**: Dense node numbers plus synthesized beam nodes ([`NodeNumbering`])
//! - **Emission**: Fixed-column records routed per element family ([`InputWriter`])
//! - **Pipeline**: Configure, Resolve, Validate, Emit with atomic output ([`Pipeline`])
//!
//! ## Architecture
//!
//! Element families are written by implementations of [`FamilyWriter`]
//! registered on a [`FamilyRouter`]. The mesh is only seen through
//! `MeshTopology` from `fire-lite-model`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fire_lite_assembly::{run, run_solver};
//!
//! let session = fire_lite_parser::load_file("slab.props")?;
//! let report = run(&session, &mesh, "slab.IN")?;
//! println!("{} nodes, {} materials", report.nodes, report.materials);
//! run_solver("safir", &report.output)?;
//! ```

pub mod batch;
pub mod equivalence;
pub mod families;
pub mod layout;
pub mod numbering;
pub mod options;
pub mod pipeline;
pub mod positions;
pub mod resolver;
pub mod router;
pub mod sections;
pub mod solver;
pub mod writer;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

// Re-export main types
pub use equivalence::{DofMask, EquivalenceClass, NodeEquivalenceGroups};
pub use fire_lite_model::{Error, ErrorKind, Result};
pub use numbering::{BeamNodes, NodeNumbering, NodeSource, NumberedNode};
pub use options::{EmitOptions, ResolveOptions, RunParameters};
pub use pipeline::{run, EmitReport, Pipeline, Stage};
pub use positions::{curve_positions, CurvePosition};
pub use resolver::{
    ElementAttributeTable, ElementRef, ModelAssembler, NodeFixation, NodeList, Resolution,
    ResolvedValue,
};
pub use router::{ElementFamily, EmitContext, FamilyBlock, FamilyRouter, FamilyWriter};
pub use solver::run_solver;
pub use writer::{write_atomic, InputImage, InputWriter};

// Re-export family writers
pub use families::{BeamWriter, PointMassWriter, ShellWriter, SolidWriter, TrussWriter};
