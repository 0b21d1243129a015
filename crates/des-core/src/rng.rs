//! The distribution family and its sampler.
//!
//! # Determinism strategy
//!
//! Every [`Sampler`] owns an independent `SmallRng`.  The environment holds
//! one master RNG and reseeds each sampler from it at registration time, so
//! a single `u64` seed reproduces an entire run; samplers never share state
//! and sampling order cannot couple one station's stream to another's.
//!
//! When no seed is supplied the master (and any standalone
//! [`Sampler::new`]) seeds itself from OS entropy, so unseeded runs differ
//! from each other.
//!
//! # Negative samples
//!
//! `Normal` (and a degenerate `Constant`) can produce negative values.  The
//! family does *not* clamp: callers that need a non-negative quantity clamp
//! at the point of use (the engine clamps durations and inter-arrival
//! deltas at zero).

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Exp, LogNormal, Normal, Triangular};

use crate::{DesError, DesResult};

// ── Dist ─────────────────────────────────────────────────────────────────────

/// A prepared scalar distribution.
///
/// Constructors validate parameters once and store the ready-to-sample
/// `rand_distr` object, so `sample` is branch-plus-draw.  Parameters are the
/// *natural-scale* ones a model author has in hand; in particular
/// [`log_normal`][Dist::log_normal] takes the desired mean and standard
/// deviation of the distribution itself and derives the underlying normal's
/// μ and σ internally.
#[derive(Clone, Debug)]
pub enum Dist {
    /// Always returns the same value.
    Constant(f64),
    /// Exponential with rate λ (mean 1/λ).  The Poisson inter-arrival draw.
    Exponential(Exp<f64>),
    /// Gaussian.  May produce negative samples; see the module docs.
    Normal(Normal<f64>),
    /// Log-normal parameterized by natural-scale mean and stddev.
    LogNormal(LogNormal<f64>),
    /// Triangular on `[lower, upper]` with the given mode.
    Triangular(Triangular<f64>),
    /// Discrete draw proportional to the weights; samples as the drawn index.
    Categorical(WeightedIndex<f64>),
}

impl Dist {
    /// A degenerate distribution: every draw is `value`.
    pub fn constant(value: f64) -> Dist {
        Dist::Constant(value)
    }

    /// Exponential with rate `rate` (> 0); mean `1 / rate`.
    pub fn exponential(rate: f64) -> DesResult<Dist> {
        let d = Exp::new(rate)
            .map_err(|e| DesError::Distribution(format!("exponential(rate={rate}): {e}")))?;
        Ok(Dist::Exponential(d))
    }

    /// Normal with the given mean and standard deviation (≥ 0).
    pub fn normal(mean: f64, stddev: f64) -> DesResult<Dist> {
        let d = Normal::new(mean, stddev)
            .map_err(|e| DesError::Distribution(format!("normal({mean}, {stddev}): {e}")))?;
        Ok(Dist::Normal(d))
    }

    /// Log-normal whose *natural-scale* mean and standard deviation are the
    /// given values.  The underlying normal's parameters are derived as
    ///
    /// ```text
    /// μ = ln(mean² / √(mean² + stddev²))
    /// σ = √(ln(1 + stddev² / mean²))
    /// ```
    pub fn log_normal(mean: f64, stddev: f64) -> DesResult<Dist> {
        if !(mean > 0.0) {
            return Err(DesError::Distribution(format!(
                "log_normal({mean}, {stddev}): mean must be > 0"
            )));
        }
        let m2 = mean * mean;
        let s2 = stddev * stddev;
        let mu = (m2 / (m2 + s2).sqrt()).ln();
        let sigma = (1.0 + s2 / m2).ln().sqrt();
        let d = LogNormal::new(mu, sigma)
            .map_err(|e| DesError::Distribution(format!("log_normal({mean}, {stddev}): {e}")))?;
        Ok(Dist::LogNormal(d))
    }

    /// Triangular with lower bound `a`, upper bound `b`, and mode `c`
    /// (`a ≤ c ≤ b`, `a < b`).
    pub fn triangular(a: f64, b: f64, c: f64) -> DesResult<Dist> {
        let d = Triangular::new(a, b, c)
            .map_err(|e| DesError::Distribution(format!("triangular({a}, {b}, {c}): {e}")))?;
        Ok(Dist::Triangular(d))
    }

    /// Categorical over the given weights (non-empty, non-negative, at least
    /// one positive).  A draw samples as the f64 value of the chosen index.
    pub fn categorical(weights: Vec<f64>) -> DesResult<Dist> {
        let d = WeightedIndex::new(&weights)
            .map_err(|e| DesError::Distribution(format!("categorical({weights:?}): {e}")))?;
        Ok(Dist::Categorical(d))
    }
}

// ── Sampler ──────────────────────────────────────────────────────────────────

/// A [`Dist`] bound to its own RNG stream.
///
/// The single operation is [`sample`][Sampler::sample].  Samplers are
/// single-threaded by design: the kernel is strictly sequential and each
/// sampler is owned by exactly one process or source.
pub struct Sampler {
    dist: Dist,
    rng:  SmallRng,
}

impl Sampler {
    /// Bind `dist` to a fresh stream seeded from OS entropy.
    pub fn new(dist: Dist) -> Sampler {
        Sampler { dist, rng: SmallRng::from_entropy() }
    }

    /// Bind `dist` to a deterministic stream.
    pub fn seeded(dist: Dist, seed: u64) -> Sampler {
        Sampler { dist, rng: SmallRng::seed_from_u64(seed) }
    }

    /// Restart the stream from `seed`.  Used by the environment to rebase
    /// every registered sampler onto the run's master seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Draw the next value.
    pub fn sample(&mut self) -> f64 {
        match &self.dist {
            Dist::Constant(v) => *v,
            Dist::Exponential(d) => d.sample(&mut self.rng),
            Dist::Normal(d) => d.sample(&mut self.rng),
            Dist::LogNormal(d) => d.sample(&mut self.rng),
            Dist::Triangular(d) => d.sample(&mut self.rng),
            Dist::Categorical(d) => d.sample(&mut self.rng) as f64,
        }
    }

    /// Draw an index from a categorical sampler.
    ///
    /// Convenience for routing decisions; equivalent to `sample() as usize`.
    pub fn sample_index(&mut self) -> usize {
        self.sample() as usize
    }

    /// The distribution this sampler draws from.
    pub fn dist(&self) -> &Dist {
        &self.dist
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").field("dist", &self.dist).finish()
    }
}
