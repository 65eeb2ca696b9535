// src/nn/layers/mod.rs
// Module declaration and basic usage tests for the normalization layers

pub mod evonorm;

// Re-export commonly used layers for convenience
pub use evonorm::{EvoNormB0, EvoNormS0};
