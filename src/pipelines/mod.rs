//! Render pipeline definitions.
//!
//! - `basic` builds the lit scene pipeline (and the generic pipeline helper)
//! - `light` holds the hemispheric light uniform and its bind group

pub mod basic;
pub mod light;
