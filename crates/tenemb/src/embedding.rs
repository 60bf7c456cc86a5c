//! Factorized embedding layer
//!
//! [`FactorizedEmbedding`] is a drop-in replacement for a dense
//! (num_embeddings × embedding_dim) lookup table. The table is tensorized,
//! either automatically with [`suggest_shape`] or from explicit shapes, and
//! stored as a single [`FactorizedTensor`].
//!
//! # Example
//!
//! ```
//! use scirs2_core::ndarray_ext::Array2;
//! use tenemb::{EmbeddingConfig, FactorizedEmbedding, Scheme};
//!
//! let config = EmbeddingConfig::new(1000, 64)
//!     .with_d(3, 2)
//!     .with_scheme(Scheme::BlockTt)
//!     .with_rank(4)
//!     .with_seed(0);
//! let layer = FactorizedEmbedding::<f32>::new(config).unwrap();
//! assert_eq!(layer.tensor_shape().row_modes(), &[10, 10, 10]);
//!
//! let indices = Array2::from_shape_fn((5, 7), |(i, j)| (i * 131 + j * 17) % 1000);
//! let out = layer.forward(&indices.view()).unwrap();
//! assert_eq!(out.shape(), &[5, 7, 64]);
//! ```

use scirs2_core::ndarray_ext::{s, Array2, ArrayView, ArrayView2, Dimension};
use scirs2_core::random::{rngs::StdRng, thread_rng, SeedableRng};
use tenemb_core::{ComputeContext, DenseND, Element, Shape};
use tenemb_factorized::{
    suggest_shape, FactorizedError, FactorizedTensor, FitOptions, Rank, Result, Scheme,
    TensorizedShape,
};
use tracing::{debug, info};

/// How the table dimensions are split into tensor modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reshape {
    /// Suggest `row_modes` and `col_modes` balanced factors, padding if needed
    Auto { row_modes: usize, col_modes: usize },
    /// Caller-provided modes whose products equal the table dimensions
    Explicit { rows: Shape, cols: Shape },
}

/// Where the initial weights come from
#[derive(Debug, Clone)]
pub enum Initialization<'a, T> {
    /// Zero-mean normal draws with std `1/√(3·num_embeddings)`
    Random,
    /// Fit the factors to an existing (num_embeddings × embedding_dim) table
    DecomposeFrom(ArrayView2<'a, T>, FitOptions),
}

/// Initialization choice for [`FactorizedEmbedding::from_dense`]
#[derive(Debug, Clone, PartialEq)]
pub enum WeightInit {
    /// Ignore the table's values, draw random weights
    Random,
    /// Decompose the table into the factors
    Decompose(FitOptions),
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit::Decompose(FitOptions::default())
    }
}

/// Configuration of a [`FactorizedEmbedding`]
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Number of table rows
    pub num_embeddings: usize,
    /// Length of each embedding vector
    pub embedding_dim: usize,
    /// Suggest tensorized shapes instead of taking explicit ones
    pub auto_reshape: bool,
    /// Number of row modes and column modes used by auto-reshape
    pub d: (usize, usize),
    /// Explicit row modes (requires `auto_reshape == false`)
    pub tensorized_num_embeddings: Option<Vec<usize>>,
    /// Explicit column modes (requires `auto_reshape == false`)
    pub tensorized_embedding_dim: Option<Vec<usize>>,
    pub scheme: Scheme,
    pub rank: Rank,
    /// Placement and dtype of the factors; `None` means host memory with the
    /// layer's element type
    pub context: Option<ComputeContext>,
    /// Seed for weight initialization; `None` draws one from the thread RNG
    pub seed: Option<u64>,
}

impl EmbeddingConfig {
    /// Defaults: auto-reshape with d = (3, 3), BlockTT, rank 8
    pub fn new(num_embeddings: usize, embedding_dim: usize) -> Self {
        Self {
            num_embeddings,
            embedding_dim,
            auto_reshape: true,
            d: (3, 3),
            tensorized_num_embeddings: None,
            tensorized_embedding_dim: None,
            scheme: Scheme::BlockTt,
            rank: Rank::Uniform(8),
            context: None,
            seed: None,
        }
    }

    /// Number of row and column modes for auto-reshape
    pub fn with_d(mut self, row_modes: usize, col_modes: usize) -> Self {
        self.d = (row_modes, col_modes);
        self
    }

    /// Same number of modes for rows and columns
    pub fn d_both(mut self, d: usize) -> Self {
        self.d = (d, d);
        self
    }

    pub fn with_auto_reshape(mut self, auto_reshape: bool) -> Self {
        self.auto_reshape = auto_reshape;
        self
    }

    /// Explicit tensorized shapes
    ///
    /// Only valid together with `with_auto_reshape(false)`.
    pub fn with_tensorized_shapes(mut self, rows: &[usize], cols: &[usize]) -> Self {
        self.tensorized_num_embeddings = Some(rows.to_vec());
        self.tensorized_embedding_dim = Some(cols.to_vec());
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_rank(mut self, rank: impl Into<Rank>) -> Self {
        self.rank = rank.into();
        self
    }

    pub fn with_context(mut self, context: ComputeContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the reshape options
    ///
    /// # Errors
    ///
    /// [`FactorizedError::InvalidArgument`] when auto-reshape is combined with
    /// explicit shapes, when explicit shapes are missing, or when their
    /// products do not match the table dimensions.
    pub fn reshape(&self) -> Result<Reshape> {
        if self.num_embeddings == 0 || self.embedding_dim == 0 {
            return Err(FactorizedError::InvalidArgument(format!(
                "Embedding table dimensions must be positive, got ({}, {})",
                self.num_embeddings, self.embedding_dim
            )));
        }

        let explicit = (
            self.tensorized_num_embeddings.as_ref(),
            self.tensorized_embedding_dim.as_ref(),
        );
        if self.auto_reshape {
            if explicit.0.is_some() || explicit.1.is_some() {
                return Err(FactorizedError::InvalidArgument(
                    "auto-reshape enabled but explicit tensorized dimensions also provided"
                        .to_string(),
                ));
            }
            let (row_modes, col_modes) = self.d;
            if row_modes == 0 || col_modes == 0 {
                return Err(FactorizedError::InvalidArgument(format!(
                    "Auto-reshape needs at least one mode per axis, got d = {:?}",
                    self.d
                )));
            }
            return Ok(Reshape::Auto {
                row_modes,
                col_modes,
            });
        }

        match explicit {
            (Some(rows), Some(cols)) => {
                let (row_product, col_product) =
                    (rows.iter().product::<usize>(), cols.iter().product::<usize>());
                if row_product != self.num_embeddings || col_product != self.embedding_dim {
                    return Err(FactorizedError::InvalidArgument(format!(
                        "Tensorized shapes {:?} x {:?} give a ({}, {}) table, expected ({}, {})",
                        rows,
                        cols,
                        row_product,
                        col_product,
                        self.num_embeddings,
                        self.embedding_dim
                    )));
                }
                Ok(Reshape::Explicit {
                    rows: Shape::from_slice(rows),
                    cols: Shape::from_slice(cols),
                })
            }
            _ => Err(FactorizedError::InvalidArgument(
                "auto-reshape disabled but tensorized_num_embeddings and tensorized_embedding_dim not both provided"
                    .to_string(),
            )),
        }
    }

    /// Row and column modes this configuration builds
    pub fn tensorized_shape(&self) -> Result<TensorizedShape> {
        match self.reshape()? {
            Reshape::Auto {
                row_modes,
                col_modes,
            } => {
                let rows = suggest_shape(self.num_embeddings, row_modes)?;
                let cols = suggest_shape(self.embedding_dim, col_modes)?;
                TensorizedShape::new(&rows, &cols)
            }
            Reshape::Explicit { rows, cols } => TensorizedShape::new(&rows, &cols),
        }
    }
}

/// Embedding table stored as a factorized tensor
///
/// With auto-reshape the table may be padded up to the suggested shape; the
/// padded sizes are what [`num_embeddings`](Self::num_embeddings) and
/// [`embedding_dim`](Self::embedding_dim) report.
#[derive(Debug, Clone)]
pub struct FactorizedEmbedding<T> {
    num_embeddings: usize,
    embedding_dim: usize,
    weight: FactorizedTensor<T>,
    rng: StdRng,
}

impl<T> FactorizedEmbedding<T>
where
    T: Element,
{
    /// Build a randomly initialized layer
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        Self::with_initialization(config, Initialization::Random)
    }

    /// Build a layer and initialize its weights as requested
    ///
    /// A table passed through [`Initialization::DecomposeFrom`] must have
    /// shape (config.num_embeddings, config.embedding_dim); it is zero-padded
    /// when auto-reshape rounds the dimensions up.
    pub fn with_initialization(config: EmbeddingConfig, init: Initialization<'_, T>) -> Result<Self> {
        let shape = config.tensorized_shape()?;
        let context = config
            .context
            .unwrap_or_else(ComputeContext::for_element::<T>);
        let weight = FactorizedTensor::new(shape.clone(), &config.rank, config.scheme, context)?;
        let seed = config.seed.unwrap_or_else(|| thread_rng().random::<u64>());

        let mut layer = Self {
            num_embeddings: shape.num_rows(),
            embedding_dim: shape.num_cols(),
            weight,
            rng: StdRng::seed_from_u64(seed),
        };

        match init {
            Initialization::Random => layer.reset_parameters()?,
            Initialization::DecomposeFrom(table, options) => {
                let expected = (config.num_embeddings, config.embedding_dim);
                if table.dim() != expected {
                    return Err(FactorizedError::InvalidArgument(format!(
                        "Table has shape {:?}, expected {:?}",
                        table.dim(),
                        expected
                    )));
                }
                let options = match (options.seed, config.seed) {
                    (None, Some(seed)) => options.with_seed(seed),
                    _ => options,
                };
                let padded = pad_table(&table, layer.num_embeddings, layer.embedding_dim);
                layer.weight.init_from_matrix(&padded.view(), &options)?;
            }
        }

        info!(
            scheme = %layer.scheme(),
            shape = %layer.tensor_shape(),
            rank = ?layer.rank(),
            parameters = layer.num_parameters(),
            compression = layer.compression_ratio(),
            "built factorized embedding"
        );
        Ok(layer)
    }

    /// Build a layer from an existing dense table
    ///
    /// The size fields of `config` are replaced by the table's dimensions.
    pub fn from_dense(table: &ArrayView2<'_, T>, config: EmbeddingConfig, init: WeightInit) -> Result<Self> {
        let (num_embeddings, embedding_dim) = table.dim();
        let config = EmbeddingConfig {
            num_embeddings,
            embedding_dim,
            ..config
        };
        match init {
            WeightInit::Random => Self::with_initialization(config, Initialization::Random),
            WeightInit::Decompose(options) => Self::with_initialization(
                config,
                Initialization::DecomposeFrom(table.view(), options),
            ),
        }
    }

    /// Re-draw the weights with std `1/√(3·num_embeddings)`
    pub fn reset_parameters(&mut self) -> Result<()> {
        let std = 1.0 / (3.0 * self.num_embeddings as f64).sqrt();
        self.weight.normal_with_rng(0.0, std, &mut self.rng)
    }

    /// Look up embeddings for an index array of any shape
    ///
    /// Returns a tensor of shape `(*indices.shape(), embedding_dim)`.
    ///
    /// # Errors
    ///
    /// [`FactorizedError::InvalidArgument`] if any index is not below
    /// [`num_embeddings`](Self::num_embeddings).
    pub fn forward<D: Dimension>(&self, indices: &ArrayView<'_, usize, D>) -> Result<DenseND<T>> {
        let flat: Vec<usize> = indices.iter().copied().collect();
        debug!(
            batch = flat.len(),
            scheme = %self.scheme(),
            "factorized embedding lookup"
        );
        let rows = self.forward_flat(&flat)?;

        let mut out_shape = indices.shape().to_vec();
        out_shape.push(self.embedding_dim);
        Ok(DenseND::from_vec(rows.iter().copied().collect(), &out_shape)?)
    }

    /// Look up embeddings for a flat list of indices, shape (B, embedding_dim)
    pub fn forward_flat(&self, indices: &[usize]) -> Result<Array2<T>> {
        self.weight.index_rows(indices)?.into_matrix()
    }

    /// Reconstruct the full (num_embeddings × embedding_dim) table
    pub fn to_dense(&self) -> Result<Array2<T>> {
        self.weight.to_matrix()
    }

    pub fn num_embeddings(&self) -> usize {
        self.num_embeddings
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Tensorized row and column modes
    pub fn tensor_shape(&self) -> &TensorizedShape {
        self.weight.shape()
    }

    /// Logical weight shape (num_embeddings, embedding_dim)
    pub fn weight_shape(&self) -> (usize, usize) {
        (self.num_embeddings, self.embedding_dim)
    }

    pub fn rank(&self) -> &[usize] {
        self.weight.rank()
    }

    pub fn scheme(&self) -> Scheme {
        self.weight.scheme()
    }

    /// The owned factorized weight
    pub fn weight(&self) -> &FactorizedTensor<T> {
        &self.weight
    }

    /// Mutable access for in-place updates of the factors
    pub fn weight_mut(&mut self) -> &mut FactorizedTensor<T> {
        &mut self.weight
    }

    pub fn num_parameters(&self) -> usize {
        self.weight.num_parameters()
    }

    pub fn compression_ratio(&self) -> f64 {
        self.weight.compression_ratio()
    }
}

/// Copy `table` into the top-left corner of a zero (rows × cols) matrix
fn pad_table<T: Element>(table: &ArrayView2<'_, T>, rows: usize, cols: usize) -> Array2<T> {
    if table.dim() == (rows, cols) {
        return table.to_owned();
    }
    let (r, c) = table.dim();
    let mut padded = Array2::zeros((rows, cols));
    padded.slice_mut(s![..r, ..c]).assign(table);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::{Array, Array1, IxDyn};

    #[test]
    fn test_config_defaults() {
        let config = EmbeddingConfig::new(100, 16);
        assert!(config.auto_reshape);
        assert_eq!(config.d, (3, 3));
        assert_eq!(config.scheme, Scheme::BlockTt);
        assert_eq!(config.rank, Rank::Uniform(8));
        assert_eq!(config.clone().d_both(2).d, (2, 2));
    }

    #[test]
    fn test_reshape_modes() {
        let auto = EmbeddingConfig::new(100, 16).with_d(2, 2).reshape().unwrap();
        assert_eq!(
            auto,
            Reshape::Auto {
                row_modes: 2,
                col_modes: 2
            }
        );

        let explicit = EmbeddingConfig::new(100, 16)
            .with_auto_reshape(false)
            .with_tensorized_shapes(&[4, 25], &[4, 4])
            .reshape()
            .unwrap();
        assert!(matches!(explicit, Reshape::Explicit { .. }));
    }

    #[test]
    fn test_conflicting_reshape_options() {
        let err = EmbeddingConfig::new(100, 16)
            .with_tensorized_shapes(&[10, 10], &[4, 4])
            .reshape()
            .unwrap_err();
        assert!(err.to_string().contains("auto-reshape enabled"));

        let missing = EmbeddingConfig::new(100, 16).with_auto_reshape(false).reshape();
        assert!(matches!(missing, Err(FactorizedError::InvalidArgument(_))));
    }

    #[test]
    fn test_auto_reshape_pads() {
        let layer = FactorizedEmbedding::<f64>::new(
            EmbeddingConfig::new(37, 6).with_d(2, 2).with_rank(2).with_seed(1),
        )
        .unwrap();
        assert_eq!(layer.tensor_shape().row_modes(), &[5, 8]);
        assert_eq!(layer.weight_shape(), (40, 6));
        assert!(layer.forward_flat(&[39]).is_ok());
        assert!(layer.forward_flat(&[40]).is_err());
    }

    #[test]
    fn test_forward_scalar_and_vector_indices() {
        let layer = FactorizedEmbedding::<f64>::new(
            EmbeddingConfig::new(64, 8).with_d(2, 1).with_rank(3).with_seed(4),
        )
        .unwrap();

        let scalar = Array::from_elem(IxDyn(&[]), 5usize);
        let out = layer.forward(&scalar.view()).unwrap();
        assert_eq!(out.shape(), &[8]);

        let vector = Array1::from(vec![5usize, 0, 5]);
        let out = layer.forward(&vector.view()).unwrap();
        assert_eq!(out.shape(), &[3, 8]);
        let m = out.to_matrix().unwrap();
        assert_eq!(m.row(0), m.row(2));
    }

    #[test]
    fn test_seeded_layers_are_reproducible() {
        let config = EmbeddingConfig::new(100, 16)
            .with_d(2, 2)
            .with_scheme(Scheme::Tucker)
            .with_rank(3)
            .with_seed(12);
        let a = FactorizedEmbedding::<f64>::new(config.clone()).unwrap();
        let b = FactorizedEmbedding::<f64>::new(config).unwrap();
        assert_eq!(a.to_dense().unwrap(), b.to_dense().unwrap());
    }

    #[test]
    fn test_unseeded_layers_draw_from_thread_rng() {
        let config = EmbeddingConfig::new(100, 16).with_d(2, 2).with_rank(3);
        let a = FactorizedEmbedding::<f64>::new(config.clone()).unwrap();
        let b = FactorizedEmbedding::<f64>::new(config).unwrap();
        assert_ne!(a.to_dense().unwrap(), b.to_dense().unwrap());
    }

    #[test]
    fn test_pad_table() {
        let table = Array2::from_elem((2, 3), 1.0f64);
        let padded = pad_table(&table.view(), 4, 3);
        assert_eq!(padded.shape(), &[4, 3]);
        assert_eq!(padded.sum(), 6.0);
    }
}
