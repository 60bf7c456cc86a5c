//! Shape manipulation: contiguous reshape, permute, unfold/fold

use super::types::DenseND;
use scirs2_core::ndarray_ext::{Array2, Ix2, IxDyn};
use scirs2_core::numeric::Num;

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Reshape the tensor to a new shape in row-major order
    ///
    /// The result is always C-contiguous. Non-contiguous inputs (for example
    /// the output of a permutation) are copied in logical order first.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenemb_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
    /// let reshaped = tensor.reshape(&[6, 4]).unwrap();
    /// assert_eq!(reshaped.shape(), &[6, 4]);
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> anyhow::Result<Self> {
        let new_size: usize = new_shape.iter().product();
        let old_size = self.len();
        if new_size != old_size {
            anyhow::bail!(
                "Cannot reshape tensor of size {} into shape {:?} (size {})",
                old_size,
                new_shape,
                new_size
            );
        }
        if let Ok(reshaped) = self.data.view().into_shape_with_order(IxDyn(new_shape)) {
            Ok(Self {
                data: reshaped.to_owned(),
            })
        } else {
            Self::from_vec(self.to_vec(), new_shape)
        }
    }

    /// Consuming variant of [`reshape`](Self::reshape) that avoids a copy
    /// when the storage is already contiguous
    pub fn into_shape(self, new_shape: &[usize]) -> anyhow::Result<Self> {
        let new_size: usize = new_shape.iter().product();
        anyhow::ensure!(
            new_size == self.len(),
            "Cannot reshape tensor of size {} into shape {:?} (size {})",
            self.len(),
            new_shape,
            new_size
        );
        let contiguous = if self.data.is_standard_layout() {
            self.data
        } else {
            self.data.as_standard_layout().into_owned()
        };
        let data = contiguous.into_shape_with_order(IxDyn(new_shape))?;
        Ok(Self { data })
    }

    /// Permute the axes of the tensor
    ///
    /// The result is a strided (generally non-contiguous) tensor.
    pub fn permute(&self, axes: &[usize]) -> anyhow::Result<Self> {
        if axes.len() != self.rank() {
            anyhow::bail!(
                "Permutation axes length {} does not match tensor rank {}",
                axes.len(),
                self.rank()
            );
        }
        let mut seen = vec![false; self.rank()];
        for &axis in axes {
            if axis >= self.rank() {
                anyhow::bail!("Invalid axis {} for rank {}", axis, self.rank());
            }
            if seen[axis] {
                anyhow::bail!("Duplicate axis {} in permutation", axis);
            }
            seen[axis] = true;
        }
        let permuted = self.data.clone().permuted_axes(IxDyn(axes));
        Ok(Self { data: permuted })
    }

    /// Unfold (matricize) the tensor along `mode`
    ///
    /// Returns a matrix of shape `(I_mode, Π_{k≠mode} I_k)` whose columns are
    /// the mode fibers, remaining modes in their original order.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenemb_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::ones(&[2, 3, 4]);
    /// let unfolded = tensor.unfold(1).unwrap();
    /// assert_eq!(unfolded.shape(), &[3, 8]);
    /// ```
    pub fn unfold(&self, mode: usize) -> anyhow::Result<Array2<T>> {
        if mode >= self.rank() {
            anyhow::bail!("Mode {} out of bounds for rank {}", mode, self.rank());
        }

        let shape = self.shape();
        let rows = shape[mode];
        let cols: usize = shape
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != mode)
            .map(|(_, &s)| s)
            .product();

        let mut perm: Vec<usize> = vec![mode];
        perm.extend((0..mode).chain((mode + 1)..self.rank()));

        let permuted = self.permute(&perm)?;
        let reshaped = permuted.reshape(&[rows, cols])?;

        reshaped
            .data
            .into_dimensionality::<Ix2>()
            .map_err(|e| anyhow::anyhow!("Failed to convert to 2D: {}", e))
    }

    /// Fold a mode-`mode` unfolding back into a tensor of `shape`
    ///
    /// Inverse of [`unfold`](Self::unfold).
    pub fn fold(matrix: &Array2<T>, shape: &[usize], mode: usize) -> anyhow::Result<Self> {
        if mode >= shape.len() {
            anyhow::bail!("Mode {} out of bounds for target shape {:?}", mode, shape);
        }

        let expected_rows = shape[mode];
        let expected_cols: usize = shape
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != mode)
            .map(|(_, &s)| s)
            .product();

        if matrix.shape()[0] != expected_rows || matrix.shape()[1] != expected_cols {
            anyhow::bail!(
                "Matrix shape {:?} incompatible with target shape {:?} at mode {}",
                matrix.shape(),
                shape,
                mode
            );
        }

        let mut intermediate_shape = vec![shape[mode]];
        intermediate_shape.extend(
            shape
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != mode)
                .map(|(_, &s)| s),
        );

        let flat: Vec<T> = matrix.iter().cloned().collect();
        let intermediate = Self::from_vec(flat, &intermediate_shape)?;

        let mut inverse_perm = vec![0; shape.len()];
        let mut next = 1;
        for (i, slot) in inverse_perm.iter_mut().enumerate() {
            if i != mode {
                *slot = next;
                next += 1;
            }
        }

        intermediate.permute(&inverse_perm)
    }
}
