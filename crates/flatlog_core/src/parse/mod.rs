//! Flat-log decomposition: block splitting and field extraction.
//!
//! # Responsibility
//! - Partition raw log text into ordered note blocks.
//! - Decompose each block into its four raw fields.
//!
//! # Invariants
//! - Parsing is pure; no filesystem access happens here.
//! - Extraction failures are collected for the whole batch before reporting.

pub mod extractor;
pub mod splitter;
