// src/nn/layers/evonorm.rs
// EvoNorm normalization-activation layers (B0 and S0 variants)
// Drop-in replacements for batch/instance normalization fused with an activation

use std::cell::RefCell;

use ndarray::{Array4, NdFloat};
use num_traits::FromPrimitive;

use crate::nn::Module;
use crate::nn::functional;
use crate::nn::parameter::Parameter;

/// Default momentum for the running-variance update.
pub const DEFAULT_MOMENTUM: f64 = 0.9;
/// Default additive guard against zero variance.
pub const DEFAULT_EPS: f64 = 1e-5;
/// Default channel-group count for EvoNormS0.
pub const DEFAULT_GROUPS: usize = 32;

/// EvoNorm-B0 layer.
///
/// Batch-statistics variant of the EvoNorm family described in
/// "Evolving Normalization-Activation Layers" (Liu et al., 2020). Instead of
/// normalizing and then activating, the layer divides the input by a blend of
/// instance and batch statistics, fusing both roles into one transform.
///
/// # Mathematical Definition
///
/// During training:
/// ```text
/// σ_b² = Var[x] over (N, H, W), per channel      // batch variance
/// running_var = momentum * running_var + (1 - momentum) * σ_b²
/// ```
///
/// During inference, `σ_b²` is the stored running variance. In both modes:
/// ```text
/// σ_i = √(Var[x] over (H, W) + ε)                // instance std, per sample
/// den = max(v * x + σ_i, √(σ_b² + ε))
/// y   = (x / den) * γ + β
/// ```
///
/// # Parameters
///
/// * `gamma` (γ): Learnable scale, shape `(1, C, 1, 1)`, initialized to 1
/// * `beta` (β): Learnable shift, shape `(1, C, 1, 1)`, initialized to 0
/// * `v`: Learnable mixing factor for the instance term, initialized to 1
/// * `running_var`: Running batch-variance estimate (not learnable),
///   initialized to 1
#[derive(Debug)]
pub struct EvoNormB0<T>
where
    T: NdFloat,
{
    /// Number of input channels
    in_channels: usize,
    /// Momentum for the running-variance update
    momentum: f64,
    /// Small epsilon for numerical stability
    eps: f64,
    /// Learnable scale parameter (γ)
    pub gamma: Parameter<T>,
    /// Learnable shift parameter (β)
    pub beta: Parameter<T>,
    /// Learnable mixing factor (v)
    pub v: Parameter<T>,
    /// Running variance for inference (not learnable)
    running_var: RefCell<Array4<T>>,
    /// Number of training batches folded into the running variance
    num_batches_tracked: RefCell<usize>,
    /// Training mode flag
    training: bool,
}

impl<T> EvoNormB0<T>
where
    T: NdFloat + FromPrimitive,
{
    /// Create a new EvoNorm-B0 layer for `in_channels` feature maps.
    pub fn new(in_channels: usize, momentum: f64, eps: f64) -> Self {
        let shape = (1, in_channels, 1, 1);

        let mut gamma = Parameter::ones(shape);
        gamma.set_name("gamma".to_string());
        let mut beta = Parameter::zeros(shape);
        beta.set_name("beta".to_string());
        let mut v = Parameter::ones(shape);
        v.set_name("v".to_string());

        // Starts at one so the first inference-mode call never divides by a
        // degenerate estimate.
        let running_var = RefCell::new(Array4::ones(shape));

        Self {
            in_channels,
            momentum,
            eps,
            gamma,
            beta,
            v,
            running_var,
            num_batches_tracked: RefCell::new(0),
            training: true,
        }
    }

    /// Create an EvoNorm-B0 layer with the default momentum and epsilon.
    pub fn new_default(in_channels: usize) -> Self {
        Self::new(in_channels, DEFAULT_MOMENTUM, DEFAULT_EPS)
    }

    fn check_channels(&self, input: &Array4<T>) -> Result<(), String> {
        let channels = input.dim().1;
        if channels != self.in_channels {
            return Err(format!(
                "Input channel size {} doesn't match EvoNormB0 channel size {}",
                channels, self.in_channels
            ));
        }
        Ok(())
    }

    /// Fold the current batch variance into the running estimate:
    /// `running = momentum * running + (1 - momentum) * batch_var`.
    fn update_running_var(&self, batch_var: &Array4<T>) {
        let momentum = T::from_f64(self.momentum).unwrap();
        let one_minus_momentum = T::one() - momentum;

        {
            let mut running_var = self.running_var.borrow_mut();
            let scaled_running = &*running_var * momentum;
            let scaled_batch = batch_var * one_minus_momentum;
            *running_var = scaled_running + scaled_batch;
        }

        *self.num_batches_tracked.borrow_mut() += 1;
    }

    /// Current running variance estimate, shape `(1, C, 1, 1)`.
    pub fn running_var(&self) -> Array4<T> {
        self.running_var.borrow().clone()
    }

    /// Number of training-mode batches folded into the running variance.
    pub fn num_batches_tracked(&self) -> usize {
        *self.num_batches_tracked.borrow()
    }

    /// Reset the running variance to its initial state.
    pub fn reset_running_stats(&self) {
        self.running_var.borrow_mut().fill(T::one());
        *self.num_batches_tracked.borrow_mut() = 0;
    }

    /// Momentum of the running-variance update.
    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    /// Epsilon value.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.in_channels
    }
}

impl<T> Module<T> for EvoNormB0<T>
where
    T: NdFloat + FromPrimitive,
{
    /// Forward pass: divide by the blended denominator and apply the affine
    /// transformation.
    ///
    /// Training mode computes the batch variance from `input` and folds it
    /// into the running estimate; inference mode reads the stored estimate
    /// and leaves it untouched.
    fn forward(&self, input: &Array4<T>) -> Result<Array4<T>, String> {
        self.check_channels(input)?;
        let eps = T::from_f64(self.eps).unwrap();

        let variance = if self.training {
            let batch_var = functional::batch_variance(input);
            self.update_running_var(&batch_var);
            batch_var
        } else {
            self.running_var.borrow().clone()
        };

        Ok(functional::evonorm_b0(
            input,
            &self.gamma.data,
            &self.beta.data,
            &self.v.data,
            &variance,
            eps,
        ))
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        vec![&self.gamma, &self.beta, &self.v]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        vec![&mut self.gamma, &mut self.beta, &mut self.v]
    }

    fn training(&self) -> bool {
        self.training
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}

/// EvoNorm-S0 layer.
///
/// Sample-statistics variant of the EvoNorm family: gates the input with a
/// learnable swish and divides by a grouped standard deviation, so it keeps
/// no running statistics and behaves identically in training and inference.
///
/// # Mathematical Definition
///
/// ```text
/// σ_g = √(Var[x] over (C/groups, H, W) + ε)      // group std, per sample
/// y   = (x * sigmoid(v * x) / σ_g) * γ + β
/// ```
///
/// # Parameters
///
/// * `gamma` (γ): Learnable scale, shape `(1, C, 1, 1)`, initialized to 1
/// * `beta` (β): Learnable shift, shape `(1, C, 1, 1)`, initialized to 0
/// * `v`: Learnable swish gate weight, initialized to 1
#[derive(Debug)]
pub struct EvoNormS0<T>
where
    T: NdFloat,
{
    /// Number of input channels
    in_channels: usize,
    /// Number of channel groups for the grouped standard deviation
    groups: usize,
    /// Small epsilon for numerical stability
    eps: f64,
    /// Learnable scale parameter (γ)
    pub gamma: Parameter<T>,
    /// Learnable shift parameter (β)
    pub beta: Parameter<T>,
    /// Learnable swish gate weight (v)
    pub v: Parameter<T>,
    /// Training mode flag (kept for the Module contract; the computation is
    /// mode-independent)
    training: bool,
}

impl<T> EvoNormS0<T>
where
    T: NdFloat + FromPrimitive,
{
    /// Create a new EvoNorm-S0 layer.
    ///
    /// Fails when `groups` is zero or does not evenly divide `in_channels`.
    pub fn new(in_channels: usize, groups: usize, eps: f64) -> Result<Self, String> {
        if groups == 0 {
            return Err("EvoNormS0 requires at least one channel group".to_string());
        }
        if in_channels % groups != 0 {
            return Err(format!(
                "in_channels ({}) must be divisible by groups ({})",
                in_channels, groups
            ));
        }

        let shape = (1, in_channels, 1, 1);
        let mut gamma = Parameter::ones(shape);
        gamma.set_name("gamma".to_string());
        let mut beta = Parameter::zeros(shape);
        beta.set_name("beta".to_string());
        let mut v = Parameter::ones(shape);
        v.set_name("v".to_string());

        Ok(Self {
            in_channels,
            groups,
            eps,
            gamma,
            beta,
            v,
            training: true,
        })
    }

    /// Create an EvoNorm-S0 layer with the default group count and epsilon.
    ///
    /// `in_channels` must be divisible by 32.
    pub fn new_default(in_channels: usize) -> Result<Self, String> {
        Self::new(in_channels, DEFAULT_GROUPS, DEFAULT_EPS)
    }

    fn check_channels(&self, input: &Array4<T>) -> Result<(), String> {
        let channels = input.dim().1;
        if channels != self.in_channels {
            return Err(format!(
                "Input channel size {} doesn't match EvoNormS0 channel size {}",
                channels, self.in_channels
            ));
        }
        Ok(())
    }

    /// Number of channel groups.
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// Epsilon value.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.in_channels
    }
}

impl<T> Module<T> for EvoNormS0<T>
where
    T: NdFloat + FromPrimitive,
{
    /// Forward pass: swish gate, grouped standard deviation, affine transform.
    fn forward(&self, input: &Array4<T>) -> Result<Array4<T>, String> {
        self.check_channels(input)?;
        let eps = T::from_f64(self.eps).unwrap();

        functional::evonorm_s0(
            input,
            &self.gamma.data,
            &self.beta.data,
            &self.v.data,
            self.groups,
            eps,
        )
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        vec![&self.gamma, &self.beta, &self.v]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        vec![&mut self.gamma, &mut self.beta, &mut self.v]
    }

    fn training(&self) -> bool {
        self.training
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}
