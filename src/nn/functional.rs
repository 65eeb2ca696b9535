// src/nn/functional.rs
// Pure tensor-in, tensor-out formulas behind the EvoNorm layers.
// Parameters are explicit arguments so every formula can be unit-tested
// without any layer state or mode bookkeeping.

use ndarray::{Array4, ArrayView, Axis, Dimension, NdFloat, Zip, s};
use num_traits::FromPrimitive;

/// Population variance (`ddof = 0`) over every element of the view.
fn variance_of<T, D>(view: ArrayView<'_, T, D>) -> T
where
    T: NdFloat + FromPrimitive,
    D: Dimension,
{
    let count = T::from_usize(view.len()).unwrap();
    let mean = view.sum() / count;
    view.fold(T::zero(), |acc, &e| acc + (e - mean) * (e - mean)) / count
}

/// Per-channel population variance over the batch and spatial dimensions.
///
/// Input shape `(N, C, H, W)`, output shape `(1, C, 1, 1)`.
pub fn batch_variance<T>(x: &Array4<T>) -> Array4<T>
where
    T: NdFloat + FromPrimitive,
{
    let channels = x.dim().1;
    Array4::from_shape_fn((1, channels, 1, 1), |(_, c, _, _)| {
        variance_of(x.index_axis(Axis(1), c))
    })
}

/// Per-sample, per-channel standard deviation over the spatial dimensions.
///
/// `eps` is added to the variance before the square root.
/// Input shape `(N, C, H, W)`, output shape `(N, C, 1, 1)`.
pub fn instance_std<T>(x: &Array4<T>, eps: T) -> Array4<T>
where
    T: NdFloat + FromPrimitive,
{
    let (batch, channels, _, _) = x.dim();
    Array4::from_shape_fn((batch, channels, 1, 1), |(n, c, _, _)| {
        (variance_of(x.slice(s![n, c, .., ..])) + eps).sqrt()
    })
}

/// Per-sample, per-group standard deviation over a channel group and the
/// spatial dimensions.
///
/// Channels are partitioned into `groups` contiguous groups of equal size and
/// each group's value is replicated across its channels, so the result
/// broadcasts channelwise like any other per-channel statistic.
/// Input shape `(N, C, H, W)`, output shape `(N, C, 1, 1)`.
pub fn group_std<T>(x: &Array4<T>, groups: usize, eps: T) -> Result<Array4<T>, String>
where
    T: NdFloat + FromPrimitive,
{
    let (batch, channels, _, _) = x.dim();
    if groups == 0 {
        return Err("group_std requires at least one channel group".to_string());
    }
    if channels % groups != 0 {
        return Err(format!(
            "Number of channels ({}) must be divisible by groups ({})",
            channels, groups
        ));
    }
    let channels_per_group = channels / groups;

    let mut std = Array4::zeros((batch, channels, 1, 1));
    for n in 0..batch {
        for g in 0..groups {
            let start = g * channels_per_group;
            let end = start + channels_per_group;
            let sd = (variance_of(x.slice(s![n, start..end, .., ..])) + eps).sqrt();
            std.slice_mut(s![n, start..end, .., ..]).fill(sd);
        }
    }

    Ok(std)
}

/// Elementwise logistic sigmoid.
pub fn sigmoid<T>(x: &Array4<T>) -> Array4<T>
where
    T: NdFloat,
{
    x.mapv(|e| T::one() / (T::one() + (-e).exp()))
}

/// Swish gate `x * sigmoid(v * x)` with a per-channel gate weight `v` of
/// shape `(1, C, 1, 1)`.
pub fn swish<T>(x: &Array4<T>, v: &Array4<T>) -> Array4<T>
where
    T: NdFloat,
{
    let gated = sigmoid(&(v * x));
    x * &gated
}

/// The EvoNorm-B0 transform.
///
/// ```text
/// den = max(v * x + instance_std(x), sqrt(variance + eps))
/// out = (x / den) * gamma + beta
/// ```
///
/// `variance` is the per-channel variance of shape `(1, C, 1, 1)` selected by
/// the caller: the current batch variance during training, the running
/// estimate at inference. The formula itself is mode-free.
pub fn evonorm_b0<T>(
    x: &Array4<T>,
    gamma: &Array4<T>,
    beta: &Array4<T>,
    v: &Array4<T>,
    variance: &Array4<T>,
    eps: T,
) -> Array4<T>
where
    T: NdFloat + FromPrimitive,
{
    let inst_std = instance_std(x, eps);
    let batch_std = variance.mapv(|e| (e + eps).sqrt());
    let batch_std_bc = batch_std
        .broadcast(x.raw_dim())
        .expect("Failed to broadcast per-channel std to input shape");

    // den = max(v * x + instance_std, batch_std), elementwise
    let mut den = &(v * x) + &inst_std;
    Zip::from(&mut den).and(&batch_std_bc).for_each(|d, &b| {
        if b > *d {
            *d = b;
        }
    });

    let normalized = x / &den;
    // affine transformation
    let scaled = &normalized * gamma;
    &scaled + beta
}

/// The EvoNorm-S0 transform.
///
/// ```text
/// out = (x * sigmoid(v * x) / group_std(x)) * gamma + beta
/// ```
///
/// Fails when `groups` does not evenly partition the input channels.
pub fn evonorm_s0<T>(
    x: &Array4<T>,
    gamma: &Array4<T>,
    beta: &Array4<T>,
    v: &Array4<T>,
    groups: usize,
    eps: T,
) -> Result<Array4<T>, String>
where
    T: NdFloat + FromPrimitive,
{
    let std = group_std(x, groups, eps)?;
    let gated = swish(x, v);

    let normalized = &gated / &std;
    // affine transformation
    let scaled = &normalized * gamma;
    Ok(&scaled + beta)
}
