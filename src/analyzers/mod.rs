//! Per-zone price statistics.
//!
//! Joined listings are grouped by census section or marketing zone, and
//! PRICE/UNITPRICE summaries are laid out as columns ready to be merged
//! back onto the listings.

pub mod aggregate;
pub mod types;

pub use aggregate::{census_statistics, marketing_statistics, zone_statistics};
pub use types::{STAT_COLUMNS, ZoneKind};
