//! Persistence of angle tables.
//!
//! Chunk artifacts and the canonical table are plain CSV files with a leading
//! `frame` column, so they reload in exactly the row and column order they were
//! written and can be inspected with ordinary tools.

pub mod csv_table;
pub mod traits;
