// Integration tests for the hypergeometric family: the functions are checked
// against each other across broadcast shapes and seeded sampling.

#[cfg(test)]
mod integration_tests {
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, arr0, array};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use single_stattools::StatsError;
    use single_stattools::distributions::{
        CdfTail, hygecdf, hygeinv, hygepdf, hygepdf_expand, hygernd, hygestat,
    };

    fn s(v: f64) -> ArrayD<f64> {
        arr0(v).into_dyn()
    }

    #[test]
    fn test_sampling_frequencies_follow_density() {
        let (t, m, n) = (50.0, 10.0, 8.0);
        let draws = 20_000;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let sample = hygernd(&s(t), &s(m), &s(n), Some(&[draws, 1]), &mut rng).unwrap();
        assert_eq!(sample.shape(), &[draws, 1]);

        let mut counts = vec![0usize; 9];
        for &v in sample.iter() {
            assert!(v >= 0.0 && v <= 8.0 && v.fract() == 0.0);
            counts[v as usize] += 1;
        }

        let support = ArrayD::from_shape_vec(vec![9], (0..9).map(|k| k as f64).collect()).unwrap();
        let pmf = hygepdf(&support, &s(t), &s(m), &s(n)).unwrap();
        for (k, &p) in pmf.iter().enumerate() {
            let freq = counts[k] as f64 / draws as f64;
            assert!((freq - p).abs() < 0.02, "k = {k}: {freq} vs {p}");
        }
    }

    #[test]
    fn test_broadcast_parameters() {
        let t = array![[20.0, 30.0], [40.0, 50.0]].into_dyn();
        let m = s(10.0);
        let n = s(5.0);

        let pdf = hygepdf(&s(2.0), &t, &m, &n).unwrap();
        assert_eq!(pdf.shape(), &[2, 2]);

        let lower = hygecdf(&s(2.0), &t, &m, &n, CdfTail::Lower).unwrap();
        let upper = hygecdf(&s(2.0), &t, &m, &n, CdfTail::Upper).unwrap();
        for (l, u) in lower.iter().zip(upper.iter()) {
            assert_relative_eq!(l + u, 1.0, epsilon = 1e-12);
        }

        let q = hygeinv(&s(0.5), &t, &m, &n).unwrap();
        assert_eq!(q.shape(), &[2, 2]);
        // More black balls overall means fewer drawn among the first n.
        assert!(q[[0, 0]] >= q[[1, 1]]);
    }

    #[test]
    fn test_quantile_is_consistent_with_cdf() {
        let (t, m, n) = (s(60.0), s(25.0), s(12.0));
        let probs = array![0.01, 0.1, 0.25, 0.5, 0.75, 0.9, 0.99].into_dyn();
        let q = hygeinv(&probs, &t, &m, &n).unwrap();

        let at_q = hygecdf(&q, &t, &m, &n, CdfTail::Lower).unwrap();
        let below_q = hygecdf(&q.mapv(|k| k - 1.0), &t, &m, &n, CdfTail::Lower).unwrap();
        for ((&p, &c), &b) in probs.iter().zip(at_q.iter()).zip(below_q.iter()) {
            assert!(c >= p - 1e-12);
            assert!(b < p + 1e-12);
        }
    }

    #[test]
    fn test_expand_rows_match_elementwise_density() {
        let t = array![10.0, 12.0, 7.0].into_dyn();
        let m = array![4.0, 6.0, 8.0].into_dyn();
        let n = s(3.0);
        let x = [0.0, 1.0, 2.0, 3.0];

        let matrix = hygepdf_expand(&x, &t, &m, &n).unwrap();
        assert_eq!(matrix.dim(), (3, 4));

        for (row, (&ti, &mi)) in t.iter().zip(m.iter()).enumerate() {
            if mi > ti {
                assert!(matrix.row(row).iter().all(|v| v.is_nan()));
                continue;
            }
            for (col, &xi) in x.iter().enumerate() {
                let single = hygepdf(&s(xi), &s(ti), &s(mi), &s(3.0)).unwrap();
                assert_relative_eq!(matrix[[row, col]], single[[]], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_mismatched_shapes_are_rejected() {
        let t = array![10.0, 20.0].into_dyn();
        let m = array![1.0, 2.0, 3.0].into_dyn();
        let err = hygestat(&t, &m, &s(2.0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StatsError>(),
            Some(StatsError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_moments_match_sampled_mean() {
        let (mean, var) = hygestat(&s(100.0), &s(30.0), &s(20.0)).unwrap();
        assert_relative_eq!(mean[[]], 6.0, epsilon = 1e-12);
        assert_relative_eq!(var[[]], 20.0 * 0.3 * 0.7 * 80.0 / 99.0, epsilon = 1e-12);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let sample = hygernd(&s(100.0), &s(30.0), &s(20.0), Some(&[5000, 1]), &mut rng).unwrap();
        let sample_mean = sample.iter().sum::<f64>() / 5000.0;
        assert!((sample_mean - 6.0).abs() < 0.15);
    }
}
