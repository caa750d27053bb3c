//! # MDavocado Core Library
//!
//! Batch analysis of per-residue dihedral angle trajectories from molecular
//! dynamics simulations: chunked extraction, circular correlation between angle
//! columns, change-point segmentation of each residue's trajectory, and density
//! images (Ramachandran/Janin maps) per time window.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless models, table persistence, the angle
//!   source contract, circular statistics, change-point detection and rendering.
//!
//! - **[`engine`]: The Logic Core.** Configuration, error taxonomy, progress
//!   reporting, artifact naming and the individual pipeline tasks.
//!
//! - **[`workflows`]: The Public API.** Entry points that run a single stage or the
//!   whole pipeline against an output directory.

pub mod core;
pub mod engine;
pub mod workflows;
