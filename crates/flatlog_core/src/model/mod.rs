//! Pipeline data model for flat-log conversion.
//!
//! # Responsibility
//! - Define the per-note record that travels through every pipeline stage.
//! - Keep raw extracted fields separate from stage-derived fields.
//!
//! # Invariants
//! - Raw fields are immutable once a record is created.
//! - Each derived field is written at most once, by its owning stage.

pub mod note;
