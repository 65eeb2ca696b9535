//! # EvoNorm
//!
//! EvoNorm normalization-activation layers for convolutional networks,
//! implemented on top of `ndarray`.
//!
//! The EvoNorm family ("Evolving Normalization-Activation Layers", Liu et al.
//! 2020) replaces the usual normalize-then-activate pair with a single fused
//! transform. This crate provides the two variants of the family:
//!
//! - `EvoNormB0`: blends per-instance and per-batch statistics, tracking a
//!   running variance estimate for inference
//! - `EvoNormS0`: gates the input with a learnable swish and divides by a
//!   grouped standard deviation, needing no running statistics at all
//!
//! ## Features
//!
//! - PyTorch-style `Module` trait with parameter collection and train/eval
//!   mode switching
//! - Pure-function formula core (`nn::functional`) usable without any layer
//!   state
//! - Tensor storage and channelwise broadcasting via `ndarray`
//! - Written 100% in safe Rust
//!
//! ## Example
//!
//! ```rust
//! use evonorm::{EvoNormB0, Module};
//! use ndarray::Array4;
//!
//! let layer = EvoNormB0::<f32>::new_default(8);
//! let input = Array4::<f32>::ones((2, 8, 4, 4));
//! let output = layer.forward(&input).unwrap();
//! assert_eq!(output.dim(), input.dim());
//! ```

pub mod nn;

// Re-export commonly used types for convenience
pub use nn::{EvoNormB0, EvoNormS0, Module, ModuleList, Parameter};
