//! Unit tests for des-core primitives.

#[cfg(test)]
mod ids {
    use crate::EntityId;

    #[test]
    fn ordering() {
        assert!(EntityId(0) < EntityId(1));
        assert!(EntityId(100) > EntityId(99));
    }

    #[test]
    fn index_cast() {
        assert_eq!(EntityId(42).index(), 42);
    }

    #[test]
    fn display() {
        assert_eq!(EntityId(7).to_string(), "EntityId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::SimTime;

    #[test]
    fn arithmetic() {
        let t = SimTime(10.0);
        assert_eq!(t + 5.0, SimTime(15.0));
        assert_eq!(SimTime(15.0) - SimTime(10.0), 5.0);
        let mut u = SimTime::ZERO;
        u += 2.5;
        assert_eq!(u, SimTime(2.5));
    }

    #[test]
    fn ordering_and_min_max() {
        assert!(SimTime(1.0) < SimTime(2.0));
        assert_eq!(SimTime(1.0).min(SimTime(2.0)), SimTime(1.0));
        assert_eq!(SimTime(1.0).max(SimTime(2.0)), SimTime(2.0));
    }

    #[test]
    fn dhms_breakdown() {
        // 1 day, 1 hour, 1 minute, 1.5 seconds
        let t = SimTime(86_400.0 + 3_600.0 + 60.0 + 1.5);
        let (d, h, m, s) = t.dhms();
        assert_eq!(d, 1);
        assert_eq!(h, 1);
        assert_eq!(m, 1);
        assert!((s - 1.5).abs() < 1e-9);
    }

    #[test]
    fn human_format() {
        assert_eq!(SimTime::ZERO.human(), "0d 00:00:00.00");
        assert_eq!(SimTime(86_400.0 * 3.0 + 7.0 * 3_600.0).human(), "3d 07:00:00.00");
        assert_eq!(SimTime(61.25).human(), "0d 00:01:01.25");
    }

    #[test]
    fn negative_clamps_in_breakdown() {
        // dhms never reports negative components, even for a bogus instant.
        let (d, h, m, s) = SimTime(-5.0).dhms();
        assert_eq!((d, h, m), (0, 0, 0));
        assert_eq!(s, 0.0);
    }
}

#[cfg(test)]
mod dist {
    use crate::{Dist, Sampler};

    fn mean_of(sampler: &mut Sampler, n: usize) -> f64 {
        (0..n).map(|_| sampler.sample()).sum::<f64>() / n as f64
    }

    #[test]
    fn constant_is_constant() {
        let mut s = Sampler::seeded(Dist::constant(4.2), 1);
        for _ in 0..10 {
            assert_eq!(s.sample(), 4.2);
        }
    }

    #[test]
    fn deterministic_under_same_seed() {
        let mut a = Sampler::seeded(Dist::exponential(0.5).unwrap(), 99);
        let mut b = Sampler::seeded(Dist::exponential(0.5).unwrap(), 99);
        for _ in 0..100 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn reseed_restarts_the_stream() {
        let mut s = Sampler::seeded(Dist::normal(0.0, 1.0).unwrap(), 7);
        let first: Vec<f64> = (0..5).map(|_| s.sample()).collect();
        s.reseed(7);
        let second: Vec<f64> = (0..5).map(|_| s.sample()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn exponential_mean_close_to_inverse_rate() {
        // rate 1/60 → mean 60
        let mut s = Sampler::seeded(Dist::exponential(1.0 / 60.0).unwrap(), 42);
        let m = mean_of(&mut s, 20_000);
        assert!((m - 60.0).abs() < 2.0, "sample mean {m}");
    }

    #[test]
    fn normal_moments() {
        let mut s = Sampler::seeded(Dist::normal(100.0, 15.0).unwrap(), 42);
        let xs: Vec<f64> = (0..20_000).map(|_| s.sample()).collect();
        let m = xs.iter().sum::<f64>() / xs.len() as f64;
        let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
        assert!((m - 100.0).abs() < 0.5, "mean {m}");
        assert!((var.sqrt() - 15.0).abs() < 0.5, "stddev {}", var.sqrt());
    }

    #[test]
    fn log_normal_natural_scale_parameters() {
        // The constructor takes the natural-scale mean/stddev, not μ/σ.
        let mut s = Sampler::seeded(Dist::log_normal(114.0, 42.0).unwrap(), 42);
        let xs: Vec<f64> = (0..40_000).map(|_| s.sample()).collect();
        let m = xs.iter().sum::<f64>() / xs.len() as f64;
        let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
        assert!((m - 114.0).abs() < 2.0, "mean {m}");
        assert!((var.sqrt() - 42.0).abs() < 3.0, "stddev {}", var.sqrt());
        assert!(xs.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn triangular_bounds_and_mean() {
        let mut s = Sampler::seeded(Dist::triangular(10.0, 30.0, 14.0).unwrap(), 42);
        let xs: Vec<f64> = (0..20_000).map(|_| s.sample()).collect();
        assert!(xs.iter().all(|&x| (10.0..=30.0).contains(&x)));
        let m = xs.iter().sum::<f64>() / xs.len() as f64;
        // mean of triangular = (a + b + c) / 3
        assert!((m - 18.0).abs() < 0.3, "mean {m}");
    }

    #[test]
    fn categorical_returns_indices_in_proportion() {
        let mut s = Sampler::seeded(Dist::categorical(vec![0.2, 0.8]).unwrap(), 42);
        let n = 20_000;
        let mut counts = [0usize; 2];
        for _ in 0..n {
            counts[s.sample_index()] += 1;
        }
        let p1 = counts[1] as f64 / n as f64;
        assert!((p1 - 0.8).abs() < 0.02, "p1 = {p1}");
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(Dist::exponential(0.0).is_err());
        assert!(Dist::exponential(-1.0).is_err());
        assert!(Dist::normal(0.0, -1.0).is_err());
        assert!(Dist::log_normal(0.0, 1.0).is_err());
        assert!(Dist::log_normal(-3.0, 1.0).is_err());
        assert!(Dist::triangular(10.0, 5.0, 7.0).is_err()); // upper < lower
        assert!(Dist::triangular(0.0, 10.0, 20.0).is_err()); // mode outside
        assert!(Dist::categorical(vec![]).is_err());
        assert!(Dist::categorical(vec![0.0, 0.0]).is_err());
    }
}
