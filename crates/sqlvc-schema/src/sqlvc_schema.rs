//! sqlvc Schema - the reconciliation and drift-detection engine
//!
//! This crate provides:
//! - The schema object model (`SchemaObject`, `ObjectKind`, `ObjectKey`)
//! - A catalog reader issuing SQL Server metadata queries
//! - Normalization of raw catalog rows into schema objects
//! - Deterministic `CREATE TABLE` synthesis from column and key metadata
//! - Reconciliation of a live snapshot against a saved one

pub mod catalog;
pub mod compare;
mod error;
pub mod normalize;
mod object;
pub mod synthesis;

#[cfg(test)]
mod mock;

pub use catalog::{CatalogReader, ColumnRow, ObjectRow, PrimaryKeyRow};
pub use compare::*;
pub use error::*;
pub use normalize::normalize;
pub use object::*;
pub use synthesis::{PrimaryKey, SynthesisReport, render_table_ddl, synthesize_table_definitions};
