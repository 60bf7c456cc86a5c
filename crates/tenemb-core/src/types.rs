//! Shared type definitions: element trait, dtype and device tokens.

use scirs2_core::ndarray_ext::ScalarOperand;
use scirs2_core::numeric::{Float, FloatConst, NumAssign, NumCast};
use smallvec::SmallVec;
use std::fmt;
use std::iter::Sum;

/// Shape type using SmallVec to avoid heap allocation for common cases.
///
/// Tensorized embedding shapes rarely exceed 6 modes per axis, so the
/// inline capacity covers almost every layer.
///
/// # Examples
///
/// ```
/// use tenemb_core::Shape;
///
/// let shape: Shape = Shape::from_slice(&[10, 10, 10]);
/// assert_eq!(shape.iter().product::<usize>(), 1000);
/// ```
pub type Shape = SmallVec<[usize; 6]>;

/// Element data type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dtype {
    /// 32-bit IEEE float
    F32,
    /// 64-bit IEEE float
    F64,
}

impl Dtype {
    /// Size of one element in bytes
    pub fn size_of(self) -> usize {
        match self {
            Dtype::F32 => 4,
            Dtype::F64 => 8,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::F32 => write!(f, "f32"),
            Dtype::F64 => write!(f, "f64"),
        }
    }
}

/// Device on which factor arrays live.
///
/// Only host memory is backed today; the token exists so that callers state
/// placement explicitly instead of relying on ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Device {
    /// Host CPU memory
    #[default]
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

/// Opaque compute-context token carried by every factorized tensor.
///
/// # Examples
///
/// ```
/// use tenemb_core::{ComputeContext, Device, Dtype};
///
/// let ctx = ComputeContext::for_element::<f32>();
/// assert_eq!(ctx.dtype, Dtype::F32);
/// assert_eq!(ctx.device, Device::Cpu);
/// assert!(ctx.ensure_element::<f32>().is_ok());
/// assert!(ctx.ensure_element::<f64>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComputeContext {
    /// Placement of the factor arrays
    pub device: Device,
    /// Element type of the factor arrays
    pub dtype: Dtype,
}

impl ComputeContext {
    /// Create a context on the given device with the given dtype
    pub fn new(device: Device, dtype: Dtype) -> Self {
        Self { device, dtype }
    }

    /// Host context matching the element type `T`
    pub fn for_element<T: Element>() -> Self {
        Self {
            device: Device::Cpu,
            dtype: T::DTYPE,
        }
    }

    /// Check that this context describes arrays of element type `T`
    pub fn ensure_element<T: Element>(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.dtype == T::DTYPE,
            "Compute context dtype {} does not match element type {}",
            self.dtype,
            T::DTYPE
        );
        Ok(())
    }
}

impl Default for ComputeContext {
    fn default() -> Self {
        Self::for_element::<f32>()
    }
}

impl fmt::Display for ComputeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.dtype)
    }
}

/// Scalar element usable in factorized tensors.
///
/// Collects the numeric bounds needed by the SVD, QR and least-squares
/// routines of `scirs2_linalg`, together with the runtime [`Dtype`] tag.
pub trait Element:
    Float
    + FloatConst
    + NumAssign
    + NumCast
    + Sum
    + ScalarOperand
    + Send
    + Sync
    + fmt::Debug
    + fmt::Display
    + 'static
{
    /// Runtime tag for this element type
    const DTYPE: Dtype;
}

impl Element for f32 {
    const DTYPE: Dtype = Dtype::F32;
}

impl Element for f64 {
    const DTYPE: Dtype = Dtype::F64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_tags() {
        assert_eq!(<f32 as Element>::DTYPE, Dtype::F32);
        assert_eq!(<f64 as Element>::DTYPE, Dtype::F64);
        assert_eq!(Dtype::F64.size_of(), 8);
    }

    #[test]
    fn test_context_display() {
        let ctx = ComputeContext::new(Device::Cpu, Dtype::F64);
        assert_eq!(ctx.to_string(), "cpu:f64");
    }

    #[test]
    fn test_context_mismatch() {
        let ctx = ComputeContext::for_element::<f64>();
        let err = ctx.ensure_element::<f32>().unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
