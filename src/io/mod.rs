//! Input/output helpers.
//!
//! - parameter JSON loading (`params`)
//! - sampled-table CSV export (`export`)
//! - table snapshot JSON read/write (`table`)

pub mod export;
pub mod params;
pub mod table;

pub use export::*;
pub use params::*;
pub use table::*;
