//! Document assembly and persistence.
//!
//! # Responsibility
//! - Turn fully enriched note records into front-matter documents.
//! - Write documents to the output directory under the overwrite policy.
//!
//! # Invariants
//! - Each record is consumed exactly once.
//! - Writing stops at the first destination conflict.

pub mod document;
pub mod writer;
