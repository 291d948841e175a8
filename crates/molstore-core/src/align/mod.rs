//! # Align Module
//!
//! Rigid superposition of point sets and structures.
//!
//! ## Key Components
//!
//! - **[`Superposition`]** - Kabsch fit of one point set onto another with reflection
//!   correction, reusable to transform further points or whole structures
//! - **[`SuperpositionError`]** - Length mismatch and empty input

pub mod superposition;

pub use superposition::{Superposition, SuperpositionError};
