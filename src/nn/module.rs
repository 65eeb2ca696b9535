use crate::nn::parameter::Parameter;
use ndarray::{Array4, NdFloat};

/// The base trait for all neural network modules.
///
/// This trait defines the interface that all neural network components must
/// implement. It provides methods for parameter management, training/evaluation
/// mode switching, and the forward pass computation.
///
/// # Design Philosophy
///
/// Similar to PyTorch's Module class, this trait allows for:
/// - Hierarchical composition of neural network layers
/// - Automatic parameter collection and management
/// - Training/evaluation mode switching
/// - Clean forward pass interface
///
/// # Examples
///
/// ```rust
/// use evonorm::nn::{Module, Parameter};
/// use ndarray::Array4;
///
/// struct ChannelScale {
///     gamma: Parameter<f64>,
///     training: bool,
/// }
///
/// impl Module<f64> for ChannelScale {
///     fn forward(&self, input: &Array4<f64>) -> Result<Array4<f64>, String> {
///         Ok(input * &self.gamma.data)
///     }
///
///     fn parameters(&self) -> Vec<&Parameter<f64>> {
///         vec![&self.gamma]
///     }
///
///     fn parameters_mut(&mut self) -> Vec<&mut Parameter<f64>> {
///         vec![&mut self.gamma]
///     }
///
///     fn training(&self) -> bool {
///         self.training
///     }
///
///     fn set_training(&mut self, training: bool) {
///         self.training = training;
///     }
/// }
/// ```
pub trait Module<T>
where
    T: NdFloat,
{
    /// Performs the forward pass of the module.
    ///
    /// # Arguments
    ///
    /// * `input` - The input activation tensor, shape `(N, C, H, W)`
    ///
    /// # Returns
    ///
    /// The output tensor after applying this module, with the same shape
    fn forward(&self, input: &Array4<T>) -> Result<Array4<T>, String>;

    /// Returns all parameters of this module.
    ///
    /// This method should recursively collect parameters from all submodules.
    /// The default implementation returns an empty vector, but most modules
    /// will override this to return their learnable parameters.
    fn parameters(&self) -> Vec<&Parameter<T>> {
        Vec::new()
    }

    /// Returns mutable references to all parameters of this module.
    ///
    /// This is useful for optimizers that need to modify parameters directly.
    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        Vec::new()
    }

    /// Returns whether the module is in training mode.
    ///
    /// Training mode affects layers that keep running statistics.
    fn training(&self) -> bool {
        true // Default to training mode
    }

    /// Sets the training mode for this module and all submodules.
    ///
    /// # Arguments
    ///
    /// * `training` - Whether to set training mode (true) or evaluation mode (false)
    fn set_training(&mut self, training: bool);

    /// Sets the module to evaluation mode.
    ///
    /// This is equivalent to calling `set_training(false)`.
    fn eval(&mut self) {
        self.set_training(false);
    }

    /// Sets the module to training mode.
    ///
    /// This is equivalent to calling `set_training(true)`.
    fn train(&mut self) {
        self.set_training(true);
    }

    /// Returns the number of parameters in this module.
    ///
    /// This includes parameters from all submodules.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.size()).sum()
    }
}

/// A container that holds multiple modules in a list.
///
/// This is similar to PyTorch's ModuleList and allows for dynamic
/// construction of neural networks.
///
/// # Examples
///
/// ```rust
/// use evonorm::nn::{EvoNormB0, EvoNormS0, ModuleList};
///
/// let mut layers = ModuleList::new();
/// layers.push(Box::new(EvoNormB0::<f64>::new_default(16)));
/// layers.push(Box::new(EvoNormS0::<f64>::new(16, 4, 1e-5).unwrap()));
/// ```
pub struct ModuleList<T>
where
    T: NdFloat,
{
    modules: Vec<Box<dyn Module<T>>>,
    training: bool,
}

impl<T> ModuleList<T>
where
    T: NdFloat,
{
    /// Creates a new empty ModuleList.
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            training: true,
        }
    }

    /// Adds a module to the list.
    ///
    /// # Arguments
    ///
    /// * `module` - The module to add (must be boxed for trait object storage)
    pub fn push(&mut self, module: Box<dyn Module<T>>) {
        self.modules.push(module);
    }

    /// Returns the number of modules in the list.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Returns an iterator over the modules.
    pub fn iter(&self) -> std::slice::Iter<Box<dyn Module<T>>> {
        self.modules.iter()
    }

    /// Returns a mutable iterator over the modules.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<Box<dyn Module<T>>> {
        self.modules.iter_mut()
    }

    /// Applies each module in sequence.
    ///
    /// This is useful for implementing sequential forward passes.
    ///
    /// # Arguments
    ///
    /// * `input` - The initial input tensor
    ///
    /// # Returns
    ///
    /// The final output tensor after applying all modules
    pub fn forward_sequential(&self, input: &Array4<T>) -> Result<Array4<T>, String> {
        let mut current = input.clone();
        for module in &self.modules {
            current = module.forward(&current)?;
        }
        Ok(current)
    }
}

impl<T> Default for ModuleList<T>
where
    T: NdFloat,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Module<T> for ModuleList<T>
where
    T: NdFloat,
{
    fn forward(&self, input: &Array4<T>) -> Result<Array4<T>, String> {
        self.forward_sequential(input)
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        let mut params = Vec::new();
        for module in &self.modules {
            params.extend(module.parameters());
        }
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        let mut params = Vec::new();
        for module in &mut self.modules {
            params.extend(module.parameters_mut());
        }
        params
    }

    fn training(&self) -> bool {
        self.training
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
        for module in &mut self.modules {
            module.set_training(training);
        }
    }
}
