//! Integration tests for tenemb-core: tensorizing embedding tables

use scirs2_core::ndarray_ext::Array2;
use tenemb_core::{unravel_index, ComputeContext, DenseND, Dtype};

#[test]
fn test_tensorize_table_rows_follow_mixed_radix() {
    // 12 x 4 table, rows tensorized as (3, 4), columns as (2, 2)
    let table = Array2::from_shape_fn((12, 4), |(i, j)| (i * 10 + j) as f64);
    let dense = DenseND::from_matrix(table.clone());
    let tensor = dense.reshape(&[3, 4, 2, 2]).unwrap();

    let mut row_multi = [0usize; 2];
    let mut col_multi = [0usize; 2];
    for i in 0..12 {
        unravel_index(i, &[3, 4], &mut row_multi).unwrap();
        for j in 0..4 {
            unravel_index(j, &[2, 2], &mut col_multi).unwrap();
            let idx = [row_multi[0], row_multi[1], col_multi[0], col_multi[1]];
            assert_eq!(tensor[&idx[..]], table[[i, j]]);
        }
    }
}

#[test]
fn test_matrix_roundtrip_through_tensor() {
    let table = Array2::from_shape_fn((6, 6), |(i, j)| (i as f64) - (j as f64));
    let tensor = DenseND::from_matrix(table.clone()).reshape(&[2, 3, 3, 2]).unwrap();
    let back = tensor.reshape(&[6, 6]).unwrap().to_matrix().unwrap();
    assert_eq!(back, table);
}

#[test]
fn test_to_matrix_requires_two_modes() {
    let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
    assert!(tensor.to_matrix().is_err());
}

#[test]
fn test_default_context_is_cpu_f32() {
    let ctx = ComputeContext::default();
    assert_eq!(ctx.dtype, Dtype::F32);
    assert!(ctx.ensure_element::<f32>().is_ok());
}
