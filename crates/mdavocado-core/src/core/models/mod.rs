//! Stateless data models shared by every stage of the analysis.
//!
//! - [`angles`]: dihedral kinds, angle families and their periodic domains.
//! - [`residue`]: residue labels and the positional chain assignment.
//! - [`table`]: the per-frame angle table that flows between stages.

pub mod angles;
pub mod residue;
pub mod table;
