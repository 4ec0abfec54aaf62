//! Field normalization stages.
//!
//! # Responsibility
//! - Canonicalize timestamps, derive filenames and normalize tag lists.
//! - Write each derived value onto its `NoteRecord` exactly once.
//!
//! # Invariants
//! - A stage assigns nothing unless every note in the batch passes it.
//! - Failures are aggregated across the batch before a stage returns.

pub mod datetime;
pub mod filename;
pub mod tags;
