//! The individual pipeline stages.
//!
//! Each task takes its inputs explicitly, writes its artifacts through an
//! [`ArtifactStore`](crate::engine::artifacts::ArtifactStore) and returns a
//! handle to what it produced. Independent units of work (chunks, residues,
//! images) run on the rayon pool when the `parallel` feature is enabled.

pub mod chunking;
pub mod correlation;
pub mod density;
pub mod segmentation;
