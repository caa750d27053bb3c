//! # Core Module
//!
//! Stateless building blocks of the dihedral analysis pipeline.
//!
//! - **Data Models** ([`models`]) - Angle kinds, residue identities and the row-major [`models::table::AngleTable`]
//! - **Table I/O** ([`io`]) - Persisting and reloading angle tables with their column layout
//! - **Angle Providers** ([`source`]) - The adapter contract for external dihedral extractors
//! - **Statistics** ([`stats`]) - Circular correlation, unwrapping and change-point detection
//! - **Rendering** ([`render`]) - Density rasters and annotated angle traces
//! - **Compositing** ([`compose`]) - Typed invocation of external image tools
//!
//! Nothing in this layer touches the filesystem implicitly or keeps global state;
//! every function takes its inputs as parameters.

pub mod compose;
pub mod io;
pub mod models;
pub mod render;
pub mod source;
pub mod stats;
