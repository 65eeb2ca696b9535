use ndarray::{Array4, NdFloat};
use num_traits::FromPrimitive;

/// A Parameter is a special kind of tensor that represents learnable parameters
/// in a neural network.
///
/// Parameters are automatically included when collecting parameters from a
/// module, and they always require gradients for training. This is similar to
/// PyTorch's Parameter class. Every parameter in this crate is a per-channel
/// tensor of shape `(1, C, 1, 1)` that broadcasts over `(N, C, H, W)` inputs.
///
/// # Examples
///
/// ```rust
/// use evonorm::Parameter;
/// use ndarray::Array4;
///
/// let gamma_data = Array4::<f64>::ones((1, 16, 1, 1));
/// let gamma = Parameter::new(gamma_data);
/// ```
#[derive(Debug, Clone)]
pub struct Parameter<T>
where
    T: NdFloat,
{
    /// The actual tensor data
    pub data: Array4<T>,
    /// Whether this parameter requires gradients (always true for parameters)
    pub requires_grad: bool,
    /// Optional name for debugging and visualization
    pub name: Option<String>,
}

impl<T> Parameter<T>
where
    T: NdFloat,
{
    /// Creates a new parameter from tensor data.
    ///
    /// # Arguments
    ///
    /// * `data` - The tensor data for this parameter
    pub fn new(data: Array4<T>) -> Self {
        Self {
            data,
            requires_grad: true, // Parameters always require gradients
            name: None,
        }
    }

    /// Creates a new parameter with a name for debugging.
    ///
    /// # Arguments
    ///
    /// * `data` - The tensor data
    /// * `name` - A name for this parameter
    pub fn new_named(data: Array4<T>, name: String) -> Self {
        Self {
            data,
            requires_grad: true,
            name: Some(name),
        }
    }

    /// Creates a parameter filled with ones.
    pub fn ones(shape: (usize, usize, usize, usize)) -> Self {
        Self::new(Array4::ones(shape))
    }

    /// Creates a parameter filled with zeros.
    pub fn zeros(shape: (usize, usize, usize, usize)) -> Self {
        Self::new(Array4::zeros(shape))
    }

    /// Creates a parameter with custom initialization.
    ///
    /// # Arguments
    ///
    /// * `shape` - Shape of the parameter tensor
    /// * `init_fn` - Initialization function that returns a value for each element
    pub fn from_init<F>(shape: (usize, usize, usize, usize), mut init_fn: F) -> Self
    where
        F: FnMut() -> f64,
        T: FromPrimitive,
    {
        let data = Array4::from_shape_simple_fn(shape, || {
            T::from_f64(init_fn()).expect("Failed to convert initializer value")
        });

        Self::new(data)
    }

    /// Returns the shape of the parameter.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Returns the number of elements in the parameter.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Gets the parameter name if available.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the parameter name.
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

impl<T> From<Array4<T>> for Parameter<T>
where
    T: NdFloat,
{
    fn from(data: Array4<T>) -> Self {
        Self::new(data)
    }
}
