//! # Engine Module
//!
//! Orchestration of the dihedral analysis stages on top of [`crate::core`].
//!
//! - **Configuration** ([`config`]) - Validated analysis parameters
//! - **Error Handling** ([`error`]) - The error taxonomy every stage reports through
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Artifacts** ([`artifacts`]) - Deterministic names for every produced file
//! - **Tasks** ([`tasks`]) - Chunked extraction, correlation, segmentation and rendering
//!
//! Structural problems in the input (empty chunks, inconsistent layouts, unknown
//! residues) abort immediately. Degenerate data (constant columns or series) is
//! absorbed into neutral results and logged.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod progress;
pub mod tasks;
