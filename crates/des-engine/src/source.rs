//! Time-driven entity generators.
//!
//! A source fires at `next_gen`, invoking its generate closure
//! `batch_size` times; each invocation registers a fresh entity with the
//! environment and usually forwards it into an initial process.  After
//! firing, `next_gen` advances by one inter-arrival draw and the source is
//! dropped once it reaches `max_generations`.
//!
//! Inter-arrival draws are clamped at zero so a Normal inter-arrival can
//! never move the schedule backwards.

use des_core::{DesResult, Dist, EntityId, Sampler, SimTime};

use crate::Environment;

/// Signature of the generate hook.  Returns the id of the entity it
/// registered so the trace can name it.
pub type GenerateFn = Box<dyn FnMut(&mut Environment) -> DesResult<EntityId>>;

/// A time-driven generator of entities.
///
/// ```rust,ignore
/// env.add_entity_source(
///     EntitySource::new("trucks", Dist::exponential(1.0 / 600.0)?, |env| {
///         let truck = env.add_entity("Truck", TruckData { load: 30.0 });
///         env.forward_to(truck, "ARR Cascavel")?;
///         Ok(truck)
///     })
///     .limit(120),
/// )?;
/// ```
pub struct EntitySource {
    pub(crate) id:              String,
    pub(crate) inter_arrival:   Sampler,
    pub(crate) batch_size:      u32,
    pub(crate) max_generations: u32,
    pub(crate) next_gen:        SimTime,
    pub(crate) generations:     u32,
    generate:                   GenerateFn,
}

impl EntitySource {
    /// A source firing first at time zero, batch size 1, unbounded.
    pub fn new(
        id: &str,
        inter_arrival: Dist,
        generate: impl FnMut(&mut Environment) -> DesResult<EntityId> + 'static,
    ) -> EntitySource {
        EntitySource {
            id:              id.to_string(),
            inter_arrival:   Sampler::new(inter_arrival),
            batch_size:      1,
            max_generations: 0,
            next_gen:        SimTime::ZERO,
            generations:     0,
            generate:        Box::new(generate),
        }
    }

    // ── Builder methods ───────────────────────────────────────────────────

    /// Entities generated per firing (≥ 1, validated at registration).
    pub fn batch(mut self, n: u32) -> EntitySource {
        self.batch_size = n;
        self
    }

    /// Stop (and remove the source) after `n` firings.  0 = unbounded.
    pub fn limit(mut self, n: u32) -> EntitySource {
        self.max_generations = n;
        self
    }

    /// First firing time (default: time zero).
    pub fn starting_at(mut self, t: impl Into<SimTime>) -> EntitySource {
        self.next_gen = t.into();
        self
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn next_gen(&self) -> SimTime {
        self.next_gen
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn max_generations(&self) -> u32 {
        self.max_generations
    }

    /// Firings so far.
    pub fn generations(&self) -> u32 {
        self.generations
    }

    // ── Kernel-side operations ────────────────────────────────────────────

    /// Run the generate hook once.
    pub(crate) fn fire(&mut self, env: &mut Environment) -> DesResult<EntityId> {
        (self.generate)(env)
    }

    /// Advance the schedule by one (zero-clamped) inter-arrival draw and
    /// count the firing.
    pub(crate) fn advance(&mut self) {
        self.next_gen += self.inter_arrival.sample().max(0.0);
        self.generations += 1;
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.max_generations > 0 && self.generations >= self.max_generations
    }

    pub(crate) fn reseed(&mut self, seed: u64) {
        self.inter_arrival.reseed(seed);
    }
}
