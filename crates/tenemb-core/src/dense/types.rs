//! Dense tensor type definition and basic accessors

use scirs2_core::ndarray_ext::{Array, Array2, ArrayView, ArrayViewMut, Ix2, IxDyn};
use scirs2_core::numeric::Num;

/// Dense N-dimensional tensor backed by scirs2_core's ndarray
///
/// Used for dense embedding tables, their tensorized reshapes, and the
/// intermediate results of factor contractions.
///
/// # Type Parameters
///
/// * `T` - The element type (typically `f32` or `f64`)
///
/// # Examples
///
/// ```
/// use tenemb_core::DenseND;
///
/// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
/// assert_eq!(tensor.shape(), &[2, 3, 4]);
/// assert_eq!(tensor.rank(), 3);
/// ```
#[derive(Clone)]
pub struct DenseND<T> {
    /// Underlying ndarray storage (via scirs2_core)
    pub(crate) data: Array<T, IxDyn>,
}

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Create a tensor from an existing ndarray
    ///
    /// # Examples
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::Array;
    /// use tenemb_core::DenseND;
    ///
    /// let arr = Array::<f64, _>::zeros(vec![2, 3]);
    /// let tensor = DenseND::from_array(arr);
    /// assert_eq!(tensor.shape(), &[2, 3]);
    /// ```
    pub fn from_array(array: Array<T, IxDyn>) -> Self {
        Self { data: array }
    }

    /// Create a tensor from a matrix
    pub fn from_matrix(matrix: Array2<T>) -> Self {
        Self {
            data: matrix.into_dyn(),
        }
    }

    /// Create a tensor from a vector with given shape
    ///
    /// # Arguments
    ///
    /// * `vec` - Flattened data in row-major order
    /// * `shape` - Target shape
    ///
    /// # Examples
    ///
    /// ```
    /// use tenemb_core::DenseND;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    /// let tensor = DenseND::from_vec(data, &[2, 3]).unwrap();
    /// assert_eq!(tensor.shape(), &[2, 3]);
    /// ```
    pub fn from_vec(vec: Vec<T>, shape: &[usize]) -> anyhow::Result<Self> {
        let total: usize = shape.iter().product();
        if vec.len() != total {
            anyhow::bail!(
                "Shape {:?} requires {} elements, but got {}",
                shape,
                total,
                vec.len()
            );
        }
        let array = Array::from_shape_vec(IxDyn(shape), vec)?;
        Ok(Self { data: array })
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Shape of this tensor
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the tensor has zero elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if the tensor is C-contiguous in memory
    pub fn is_contiguous(&self) -> bool {
        self.data.is_standard_layout()
    }

    /// Immutable reference to the underlying ndarray
    pub fn as_array(&self) -> &Array<T, IxDyn> {
        &self.data
    }

    /// Mutable reference to the underlying ndarray
    pub fn as_array_mut(&mut self) -> &mut Array<T, IxDyn> {
        &mut self.data
    }

    /// Consume the tensor and return the underlying ndarray
    pub fn into_array(self) -> Array<T, IxDyn> {
        self.data
    }

    /// Immutable view of the tensor
    pub fn view(&self) -> ArrayView<'_, T, IxDyn> {
        self.data.view()
    }

    /// Mutable view of the tensor
    pub fn view_mut(&mut self) -> ArrayViewMut<'_, T, IxDyn> {
        self.data.view_mut()
    }

    /// Create a tensor filled with `value`
    pub fn from_elem(shape: &[usize], value: T) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// Create a tensor of zeros
    ///
    /// # Examples
    ///
    /// ```
    /// use tenemb_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
    /// assert_eq!(tensor[&[0, 0, 0][..]], 0.0);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// Create a tensor of ones
    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// Flatten to a vector in row-major order regardless of memory layout
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// Convert a 2-D tensor into a C-contiguous matrix
    ///
    /// # Errors
    ///
    /// Fails if the tensor does not have exactly two modes.
    pub fn to_matrix(&self) -> anyhow::Result<Array2<T>> {
        anyhow::ensure!(
            self.rank() == 2,
            "Expected a 2-D tensor, got shape {:?}",
            self.shape()
        );
        self.data
            .as_standard_layout()
            .into_owned()
            .into_dimensionality::<Ix2>()
            .map_err(|e| anyhow::anyhow!("Failed to convert to 2D: {}", e))
    }
}
