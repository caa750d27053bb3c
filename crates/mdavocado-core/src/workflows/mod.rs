//! # Workflows Module
//!
//! Top-level entry points. Each workflow takes explicit inputs (an angle source
//! or a previously written output directory), runs one or more engine tasks with
//! progress reporting, and returns handles to what it wrote.
//!
//! - **Pipeline** ([`pipeline`]) - Extraction, correlation, segmentation and
//!   chunk rendering, individually or end to end.
//! - **Compositing** ([`composite`]) - Montages and animations of rendered chunk
//!   images through an external [`Compositor`](crate::core::compose::Compositor).

pub mod composite;
pub mod pipeline;
