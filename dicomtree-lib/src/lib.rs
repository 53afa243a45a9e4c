//! Lazy hierarchical browser over a DICOM index database.
//!
//! Presents the patient → study → series → image hierarchy stored in a
//! relational database as an on-demand tree model. Only the tree positions a
//! consumer has addressed are cached, and each cached position only knows as
//! many rows as have been asked for.

pub mod backend;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod query;
pub mod tree;

pub use config::ModelConfig;
pub use model::DicomModel;
