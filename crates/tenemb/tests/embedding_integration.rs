//! Integration tests for the factorized embedding layer

use scirs2_core::ndarray_ext::{Array, Array2, IxDyn};
use scirs2_core::random::{rngs::StdRng, SeedableRng};
use tenemb::prelude::*;

fn dense_table(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = DenseND::<f64>::random_normal(&[rows, cols], 0.0, 1.0, &mut rng)
        .unwrap()
        .to_matrix()
        .unwrap();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        ((i as f64) * 0.11).cos() * ((j as f64) * 0.4).sin() + 0.02 * noise[[i, j]]
    })
}

#[test]
fn test_forward_shape_block_tt() {
    let config = EmbeddingConfig::new(1000, 64)
        .with_d(3, 2)
        .with_scheme(Scheme::BlockTt)
        .with_rank(4)
        .with_seed(42);
    let layer = FactorizedEmbedding::<f64>::new(config).unwrap();
    assert_eq!(layer.tensor_shape().row_modes(), &[10, 10, 10]);
    assert_eq!(layer.tensor_shape().col_modes(), &[8, 8]);
    assert_eq!(layer.rank(), &[1, 4, 4, 4, 4, 1]);

    let indices = Array2::from_shape_fn((5, 7), |(i, j)| (i * 193 + j * 29) % 1000);
    let out = layer.forward(&indices.view()).unwrap();
    assert_eq!(out.shape(), &[5, 7, 64]);
    assert!(out.all_finite());
}

#[test]
fn test_forward_matches_dense_rows_for_every_scheme() {
    for scheme in [Scheme::Cp, Scheme::Tucker, Scheme::BlockTt] {
        let layer = FactorizedEmbedding::<f64>::new(
            EmbeddingConfig::new(120, 12)
                .with_auto_reshape(false)
                .with_tensorized_shapes(&[10, 12], &[3, 4])
                .with_scheme(scheme)
                .with_rank(3)
                .with_seed(7),
        )
        .unwrap();
        assert_eq!(layer.embedding_dim(), 12);
        let dense = layer.to_dense().unwrap();
        assert_eq!(dense.dim(), layer.weight_shape());

        let indices = Array::from_shape_vec(IxDyn(&[2, 2, 2]), vec![0, 5, 119, 5, 60, 1, 2, 3]).unwrap();
        let out = layer.forward(&indices.view()).unwrap();
        assert_eq!(out.shape(), &[2, 2, 2, 12]);

        let flat = out.reshape(&[8, 12]).unwrap().to_matrix().unwrap();
        for (b, &idx) in indices.iter().enumerate() {
            for c in 0..12 {
                assert!(
                    (flat[[b, c]] - dense[[idx, c]]).abs() < 1e-10,
                    "{} mismatch at index {}",
                    scheme,
                    idx
                );
            }
        }
    }
}

#[test]
fn test_reset_parameters_uses_embedding_std() {
    let mut layer = FactorizedEmbedding::<f64>::new(
        EmbeddingConfig::new(1000, 64)
            .with_d(3, 2)
            .with_rank(16)
            .with_seed(3),
    )
    .unwrap();
    let first = layer.to_dense().unwrap();
    layer.reset_parameters().unwrap();
    let second = layer.to_dense().unwrap();
    assert_ne!(first, second);

    let target = 1.0 / (3.0f64 * 1000.0).sqrt();
    let std = (second.iter().map(|v| v * v).sum::<f64>() / second.len() as f64).sqrt();
    assert!(std > 0.5 * target && std < 2.0 * target, "std {} target {}", std, target);
}

#[test]
fn test_conflicting_reshape_arguments() {
    let config = EmbeddingConfig::new(1000, 64).with_tensorized_shapes(&[10, 10, 10], &[8, 8]);
    let err = FactorizedEmbedding::<f64>::new(config).unwrap_err();
    assert!(matches!(err, FactorizedError::InvalidArgument(_)));
    assert!(err.to_string().contains("auto-reshape enabled"));
}

#[test]
fn test_mismatched_explicit_shapes() {
    let config = EmbeddingConfig::new(1000, 64)
        .with_auto_reshape(false)
        .with_tensorized_shapes(&[10, 10, 9], &[8, 8]);
    assert!(matches!(
        FactorizedEmbedding::<f64>::new(config),
        Err(FactorizedError::InvalidArgument(_))
    ));

    let config = EmbeddingConfig::new(1000, 64)
        .with_auto_reshape(false)
        .with_tensorized_shapes(&[10, 100], &[4, 4, 4]);
    let layer = FactorizedEmbedding::<f64>::new(config).unwrap();
    assert_eq!(layer.tensor_shape().col_modes(), &[4, 4, 4]);
}

#[test]
fn test_out_of_range_indices() {
    let layer = FactorizedEmbedding::<f64>::new(
        EmbeddingConfig::new(100, 16).with_d(2, 2).with_rank(2).with_seed(0),
    )
    .unwrap();
    let indices = Array2::from_shape_vec((1, 2), vec![3usize, 100]).unwrap();
    assert!(matches!(
        layer.forward(&indices.view()),
        Err(FactorizedError::InvalidArgument(_))
    ));
}

#[test]
fn test_unknown_scheme_name() {
    let err = "Hierarchical-Tucker".parse::<Scheme>().unwrap_err();
    assert!(matches!(err, FactorizedError::UnsupportedScheme(_)));
}

#[test]
fn test_from_dense_error_decreases_with_rank() {
    let table = dense_table(100, 16, 11);
    let mut errors = Vec::new();
    for rank in [1usize, 3, 100] {
        let layer = FactorizedEmbedding::from_dense(
            &table.view(),
            EmbeddingConfig::new(0, 0)
                .with_d(2, 2)
                .with_scheme(Scheme::BlockTt)
                .with_rank(rank),
            WeightInit::Decompose(FitOptions::default()),
        )
        .unwrap();
        errors.push(layer.weight().relative_error(&table.view()).unwrap());
    }
    assert!(errors[1] <= errors[0] + 1e-9, "errors {:?}", errors);
    // Ranks clamped to the unfolding bounds reproduce the table
    assert!(errors[2] < 1e-8, "errors {:?}", errors);
}

#[test]
fn test_from_dense_tucker_and_cp() {
    let table = dense_table(100, 16, 5);
    for (scheme, low, high) in [(Scheme::Tucker, 1usize, 3usize), (Scheme::Cp, 1, 8)] {
        let options = FitOptions::default().with_seed(2).with_max_iterations(150);
        let fit = |rank: usize| {
            FactorizedEmbedding::from_dense(
                &table.view(),
                EmbeddingConfig::new(0, 0)
                    .with_d(2, 2)
                    .with_scheme(scheme)
                    .with_rank(rank),
                WeightInit::Decompose(options.clone()),
            )
            .unwrap()
            .weight()
            .relative_error(&table.view())
            .unwrap()
        };
        let (e_low, e_high) = (fit(low), fit(high));
        assert!(e_high <= e_low + 1e-6, "{}: {} then {}", scheme, e_low, e_high);
    }
}

#[test]
fn test_from_dense_pads_to_suggested_shape() {
    // 37 rows round up to 40 = 5 x 8
    let table = dense_table(37, 8, 1);
    let layer = FactorizedEmbedding::from_dense(
        &table.view(),
        EmbeddingConfig::new(0, 0).with_d(2, 2).with_rank(64),
        WeightInit::Decompose(FitOptions::default()),
    )
    .unwrap();
    assert_eq!(layer.weight_shape(), (40, 8));

    let dense = layer.to_dense().unwrap();
    for i in 0..37 {
        for j in 0..8 {
            assert!((dense[[i, j]] - table[[i, j]]).abs() < 1e-8);
        }
    }
    for i in 37..40 {
        assert!(dense.row(i).iter().all(|v| v.abs() < 1e-8));
    }
}

#[test]
fn test_from_dense_random_ignores_values() {
    let table = dense_table(100, 16, 2);
    let layer = FactorizedEmbedding::from_dense(
        &table.view(),
        EmbeddingConfig::new(0, 0).with_d(2, 2).with_rank(4).with_seed(9),
        WeightInit::Random,
    )
    .unwrap();
    assert_eq!(layer.weight_shape(), (100, 16));
    assert!(layer.weight().relative_error(&table.view()).unwrap() > 0.5);
}

#[test]
fn test_from_dense_non_finite_table_is_numerical_failure() {
    for scheme in [Scheme::Cp, Scheme::Tucker, Scheme::BlockTt] {
        for bad in [f64::NAN, f64::INFINITY] {
            let mut table = dense_table(100, 16, 4);
            table[[42, 7]] = bad;
            let err = FactorizedEmbedding::from_dense(
                &table.view(),
                EmbeddingConfig::new(0, 0)
                    .with_d(2, 2)
                    .with_scheme(scheme)
                    .with_rank(2),
                WeightInit::Decompose(FitOptions::default()),
            )
            .unwrap_err();
            assert!(
                matches!(err, FactorizedError::NumericalFailure(_)),
                "{} with {}: {}",
                scheme,
                bad,
                err
            );
        }
    }
}

#[test]
fn test_explicit_f32_context() {
    let layer = FactorizedEmbedding::<f32>::new(
        EmbeddingConfig::new(64, 16)
            .with_d(2, 2)
            .with_rank(2)
            .with_context(ComputeContext::new(Device::Cpu, Dtype::F32)),
    )
    .unwrap();
    assert_eq!(layer.weight().context().dtype, Dtype::F32);

    let wrong = FactorizedEmbedding::<f32>::new(
        EmbeddingConfig::new(64, 16).with_context(ComputeContext::for_element::<f64>()),
    );
    assert!(wrong.is_err());
}
