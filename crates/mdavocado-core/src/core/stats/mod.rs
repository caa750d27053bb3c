//! Statistics on periodic angle series.
//!
//! - [`circular`]: circular means, the circular correlation matrix, and
//!   unwrapping of ±360° jumps.
//! - [`changepoint`]: window-based change-point detection with an l2 cost.

pub mod changepoint;
pub mod circular;
