//! Trait implementations for `DenseND`: multi-index `Index`/`IndexMut` and a
//! `Debug` that elides the data of large tensors.

use super::types::DenseND;
use scirs2_core::ndarray_ext::IxDyn;
use std::fmt;

/// Tensors with more elements than this print only their shape
const DEBUG_MAX_ELEMENTS: usize = 64;

impl<T> std::ops::Index<&[usize]> for DenseND<T> {
    type Output = T;
    fn index(&self, index: &[usize]) -> &Self::Output {
        &self.data[IxDyn(index)]
    }
}

impl<T> std::ops::IndexMut<&[usize]> for DenseND<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut Self::Output {
        &mut self.data[IxDyn(index)]
    }
}

impl<T: fmt::Debug> fmt::Debug for DenseND<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("DenseND");
        s.field("shape", &self.data.shape());
        if self.data.len() <= DEBUG_MAX_ELEMENTS {
            s.field("data", &self.data.iter().collect::<Vec<_>>());
        } else {
            s.field("elements", &self.data.len());
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_index_read_write() {
        let mut tensor = DenseND::<f64>::zeros(&[2, 3]);
        tensor[&[1, 2][..]] = 4.0;
        assert_eq!(tensor[&[1, 2][..]], 4.0);
        assert_eq!(tensor.to_vec().iter().sum::<f64>(), 4.0);
    }

    #[derive(Debug)]
    struct Holder<T> {
        tensor: DenseND<T>,
    }

    #[test]
    fn test_debug_needs_only_debug_elements() {
        let holder = Holder {
            tensor: DenseND::from_vec(vec![1.5f64, -2.0], &[2]).unwrap(),
        };
        assert_eq!(holder.tensor.len(), 2);
        let printed = format!("{:?}", holder);
        assert!(printed.contains("1.5"));
        assert!(printed.contains("shape: [2]"));
    }

    #[test]
    fn test_debug_elides_large_tensors() {
        let small = format!("{:?}", DenseND::<f64>::ones(&[2, 2]));
        assert!(small.contains("data"));

        let large = format!("{:?}", DenseND::<f64>::zeros(&[100, 64]));
        assert!(large.contains("elements: 6400"));
        assert!(!large.contains("data"));
    }
}
