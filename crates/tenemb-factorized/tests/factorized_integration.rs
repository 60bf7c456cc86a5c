//! Integration tests for factorized tensors
//!
//! Exercises the public surface end to end: shape suggestion, rank
//! resolution, random initialization, row lookups and fitting to dense tables.

use scirs2_core::ndarray_ext::Array2;
use scirs2_core::random::{rngs::StdRng, SeedableRng};
use tenemb_core::{ComputeContext, DenseND};
use tenemb_factorized::{
    suggest_shape, tt_rank_bounds, FactorizedError, FactorizedTensor, FitOptions, Rank, RowSlice,
    Scheme, TensorizedShape,
};

const SCHEMES: [Scheme; 3] = [Scheme::Cp, Scheme::Tucker, Scheme::BlockTt];

fn tensor(shape: &TensorizedShape, rank: Rank, scheme: Scheme) -> FactorizedTensor<f64> {
    FactorizedTensor::new(
        shape.clone(),
        &rank,
        scheme,
        ComputeContext::for_element::<f64>(),
    )
    .unwrap()
}

/// Table with a decaying spectrum
fn table(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = DenseND::<f64>::random_normal(&[rows, cols], 0.0, 1.0, &mut rng)
        .unwrap()
        .to_matrix()
        .unwrap();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let smooth = ((i as f64) * 0.3).sin() * ((j as f64) * 0.7).cos();
        smooth + 0.05 * noise[[i, j]]
    })
}

#[test]
fn test_normal_init_gives_finite_table_of_declared_shape() {
    let shape = TensorizedShape::new(&[10, 10, 10], &[8, 8]).unwrap();
    for scheme in SCHEMES {
        let mut t = tensor(&shape, Rank::Uniform(4), scheme);
        t.normal_with_rng(0.0, 0.1, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let dense = t.densify().unwrap();
        assert_eq!(dense.shape(), &[1000, 64]);
        assert!(dense.all_finite(), "{} produced non-finite entries", scheme);
    }
}

#[test]
fn test_normal_init_matches_target_std() {
    let shape = TensorizedShape::new(&[10, 10, 10], &[8, 8]).unwrap();
    let target = 0.2;
    for (scheme, rank) in [
        (Scheme::Cp, Rank::Uniform(16)),
        (Scheme::Tucker, Rank::Uniform(4)),
        (Scheme::BlockTt, Rank::Uniform(8)),
    ] {
        let mut t = tensor(&shape, rank, scheme);
        t.normal_with_rng(0.0, target, &mut StdRng::seed_from_u64(17))
            .unwrap();
        let dense = t.to_matrix().unwrap();
        let n = dense.len() as f64;
        let std = (dense.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
        assert!(
            std > target * 0.5 && std < target * 2.0,
            "{}: empirical std {}",
            scheme,
            std
        );
    }
}

#[test]
fn test_every_row_lookup_matches_dense() {
    let shape = TensorizedShape::new(&[4, 5], &[2, 3]).unwrap();
    for scheme in SCHEMES {
        let mut t = tensor(&shape, Rank::Uniform(3), scheme);
        t.normal_with_rng(0.0, 1.0, &mut StdRng::seed_from_u64(2))
            .unwrap();
        let full = t.to_matrix().unwrap();
        for row in 0..t.num_rows() {
            let picked = t.lookup(&[row]).unwrap();
            for col in 0..t.num_cols() {
                assert!((picked[[0, col]] - full[[row, col]]).abs() < 1e-10);
            }
        }
    }
}

#[test]
fn test_row_slice_post_processing() {
    let shape = TensorizedShape::new(&[4, 5], &[2, 3]).unwrap();
    let mut cp = tensor(&shape, Rank::Uniform(3), Scheme::Cp);
    cp.normal_with_rng(0.0, 1.0, &mut StdRng::seed_from_u64(8))
        .unwrap();

    match cp.index_rows(&[7, 7, 19]).unwrap() {
        RowSlice::Cp(rows) => {
            assert_eq!(rows.batch_size(), 3);
            assert_eq!(rows.rank(), 3);
            assert_eq!(rows.num_cols(), 6);
            let m = rows.to_matrix().unwrap();
            assert_eq!(m.row(0), m.row(1));
        }
        other => panic!("CP lookup returned {:?}", other),
    }
}

#[test]
fn test_fit_error_decreases_with_rank() {
    let shape = TensorizedShape::new(&[4, 5], &[2, 4]).unwrap();
    let data = table(20, 8, 21);
    let options = FitOptions::default().with_seed(3).with_max_iterations(200);

    let plans = [
        (Scheme::BlockTt, vec![Rank::Uniform(1), Rank::Uniform(2), Rank::Uniform(8)]),
        (Scheme::Tucker, vec![Rank::Uniform(1), Rank::Uniform(2), Rank::Uniform(5)]),
        (Scheme::Cp, vec![Rank::Uniform(1), Rank::Uniform(4), Rank::Uniform(16)]),
    ];

    for (scheme, ranks) in plans {
        let mut errors = Vec::new();
        for rank in ranks {
            let mut t = tensor(&shape, rank, scheme);
            t.init_from_matrix(&data.view(), &options).unwrap();
            errors.push(t.relative_error(&data.view()).unwrap());
        }
        for pair in errors.windows(2) {
            assert!(
                pair[1] <= pair[0] + 1e-6,
                "{} errors not decreasing: {:?}",
                scheme,
                errors
            );
        }
    }
}

#[test]
fn test_block_tt_at_unfolding_bounds_is_exact() {
    let shape = TensorizedShape::new(&[4, 5], &[2, 4]).unwrap();
    let bounds = tt_rank_bounds(&shape.modes());
    assert_eq!(bounds, vec![4, 8, 4]);

    let data = table(20, 8, 4);
    let mut t = tensor(&shape, Rank::PerMode(bounds), Scheme::BlockTt);
    t.init_from_matrix(&data.view(), &FitOptions::default())
        .unwrap();
    assert!(t.relative_error(&data.view()).unwrap() < 1e-8);
    assert!(t.compression_ratio() < 1.0);
}

#[test]
fn test_fit_replaces_random_factors() {
    let shape = TensorizedShape::new(&[4, 5], &[2, 4]).unwrap();
    let data = table(20, 8, 9);
    let mut t = tensor(&shape, Rank::Uniform(8), Scheme::BlockTt);
    t.normal_(0.0, 1.0).unwrap();
    let before = t.relative_error(&data.view()).unwrap();
    t.init_from_matrix(&data.view(), &FitOptions::default())
        .unwrap();
    let after = t.relative_error(&data.view()).unwrap();
    assert!(after < before);
}

#[test]
fn test_failed_fit_leaves_tensor_untouched() {
    let shape = TensorizedShape::new(&[4, 5], &[2, 4]).unwrap();
    let mut t = tensor(&shape, Rank::Uniform(2), Scheme::Tucker);
    t.normal_with_rng(0.0, 1.0, &mut StdRng::seed_from_u64(1))
        .unwrap();
    let before = t.to_matrix().unwrap();

    let bad = Array2::<f64>::zeros((8, 20));
    assert!(t.init_from_matrix(&bad.view(), &FitOptions::default()).is_err());
    assert_eq!(t.to_matrix().unwrap(), before);
}

#[test]
fn test_suggested_shapes_build_tensors() {
    let rows = suggest_shape(1000, 3).unwrap();
    let cols = suggest_shape(64, 2).unwrap();
    assert_eq!(rows.as_slice(), &[10, 10, 10]);
    assert_eq!(cols.as_slice(), &[8, 8]);

    let shape = TensorizedShape::new(&rows, &cols).unwrap();
    let t = tensor(&shape, "0.1".parse().unwrap(), Scheme::BlockTt);
    assert!(t.num_parameters() as f64 <= 0.1 * 64_000.0);
    assert!(t.compression_ratio() >= 10.0);
}

#[test]
fn test_error_taxonomy() {
    assert!(matches!(
        "Hierarchical".parse::<Scheme>(),
        Err(FactorizedError::UnsupportedScheme(_))
    ));

    let shape = TensorizedShape::new(&[4, 5], &[2, 3]).unwrap();
    let result = FactorizedTensor::<f64>::new(
        shape.clone(),
        &Rank::PerMode(vec![5, 5, 2, 3]),
        Scheme::Tucker,
        ComputeContext::for_element::<f64>(),
    );
    assert!(matches!(result, Err(FactorizedError::InvalidArgument(_))));

    let t = tensor(&shape, Rank::Uniform(2), Scheme::BlockTt);
    assert!(matches!(
        t.index_rows(&[20]),
        Err(FactorizedError::InvalidArgument(_))
    ));
}
