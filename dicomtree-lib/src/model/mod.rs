//! The tree model exposed to presentation layers.
//!
//! [`DicomModel`] implements the usual hierarchical item-model contract
//! (index and parent resolution, row and column counts, cell values,
//! sorting, incremental fetching) on top of the lazily built node
//! [`Tree`](crate::tree::Tree).

mod dicom;
mod field;
mod index;
mod observer;
mod value;

pub use dicom::*;
pub use field::*;
pub use index::*;
pub use observer::*;
pub use value::*;
