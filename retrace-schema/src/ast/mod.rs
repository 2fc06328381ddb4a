//! Shape model types.
//!
//! This module contains the column, table-shape and structural-operation
//! types shared by history replay and diffing.

mod column;
mod operation;
mod shape;

pub use column::*;
pub use operation::*;
pub use shape::*;
