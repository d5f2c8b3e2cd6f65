//! Access to solver field snapshots and wall-adjacent cell geometry.
//!
//! The flow solver writes one directory per time level, split across
//! `processorN` partitions until reconstructed. This crate lists those
//! levels, checks they are complete, parses the ASCII field files and
//! extracts the cells that line the channel wall.

pub mod access;
pub mod case;
pub mod error;
pub mod foam;
pub mod wall;

pub use access::{FlowFieldSnapshot, Materialization, SnapshotSource, TimeLevel, WallFieldAccess};
pub use case::{FoamCase, Reconstructor};
pub use error::{FieldError, FieldResult};
pub use foam::{FieldValues, ParseMode, ParsedField};
pub use wall::{WallCellSizes, WallCells, find_wall_cells};
