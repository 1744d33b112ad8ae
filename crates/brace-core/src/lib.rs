//! Core types and utilities for the brace widget constraint engine.
//!
//! This crate provides the foundational types used across the other brace crates:
//! - Value types (points, vectors, scalar quantities)
//! - Resolution schemes and constraint priorities
//! - The scale-relative epsilon used for every equality test
//! - Error types

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
