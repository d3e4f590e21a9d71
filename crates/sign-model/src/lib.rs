//! Handsign Sign Model
//!
//! Defines the core data contracts shared by the recognition pipeline and
//! its collaborators:
//! - **Landmarks:** 21-point hands, per-frame hand lists, timed JSONL frames
//! - **Signs:** dictionary entries, categories, and per-frame candidates
//! - **Dictionary:** the immutable, id-unique union of all sign categories
//!
//! All landmark coordinates are normalized to `[0.0, 1.0]` relative to the
//! source image, as produced by the pose-estimation model.

pub mod dictionary;
pub mod landmark;
pub mod sign;

pub use dictionary::*;
pub use landmark::*;
pub use sign::*;
