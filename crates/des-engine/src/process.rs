//! Service stations: queue, resource needs, duration, onward routing.

use std::collections::VecDeque;

use des_core::{DesResult, Dist, EntityId, Sampler};

use crate::{Entity, Environment};

/// Signature of a routing handler: decides where a finished entity goes,
/// usually by calling [`Environment::forward_to`].
pub type RouteFn = Box<dyn FnMut(&mut Environment, EntityId) -> DesResult<()>>;

/// Signature of a delay override: a *pure* function of the process and the
/// entity, replacing the sampled duration when present.
pub type DelayFn = Box<dyn Fn(&Process, &Entity) -> f64>;

// ── Routing ───────────────────────────────────────────────────────────────────

/// Where an entity goes when its service completes.  The two options are
/// mutually exclusive by construction; a process without routing disposes
/// its entities on completion.
pub enum Routing {
    /// A handler making a per-entity decision (e.g. a categorical draw over
    /// successor processes).
    Handler(RouteFn),
    /// Unconditionally forward to the named process.
    Goto(String),
}

// ── Needs ─────────────────────────────────────────────────────────────────────

/// One resource requirement of a process.
///
/// Needs are seized in declaration order; the first blocked need stops the
/// admission attempt, so declaration order is also the contention order.
pub struct Need {
    pub resource: String,
    pub amount:   f64,
    /// Resolved index into the environment's resource registry.  Filled on
    /// first use; `None` only before the process has seen any entity.
    pub(crate) slot: Option<usize>,
}

// ── Statistics ────────────────────────────────────────────────────────────────

/// Running totals for one process's admission queue.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProcessStats {
    /// Entities ever enqueued.
    pub entered:    u64,
    /// Entities admitted (dequeued into service).
    pub exited:     u64,
    /// Cumulative seconds spent waiting by admitted entities.
    pub total_wait: f64,
    /// `total_wait / entered` — running mean queue wait.
    pub mean_wait:  f64,
}

// ── Process ───────────────────────────────────────────────────────────────────

/// A service station entities flow through.
///
/// Built fluently and handed to [`Environment::add_process`]:
///
/// ```rust,ignore
/// env.add_process(
///     Process::new("UNL Cascavel")
///         .need("UNL Cascavel", 1.0)
///         .duration(Dist::log_normal(4.3 * 60.0, 0.6 * 60.0)?)
///         .group("terminal")
///         .then("EXI Cascavel"),
/// )?;
/// ```
///
/// Calling both [`then`][Self::then] and [`route`][Self::route] is not an
/// error; the later call wins (there is only one routing slot).
pub struct Process {
    pub(crate) id:       String,
    pub(crate) groups:   Vec<String>,
    pub(crate) needs:    Vec<Need>,
    pub(crate) duration: Sampler,
    pub(crate) delay:    Option<DelayFn>,
    pub(crate) routing:  Option<Routing>,
    pub(crate) queue:    VecDeque<EntityId>,
    pub(crate) stats:    ProcessStats,
}

impl Process {
    /// A process with no needs, zero duration, and no routing.
    pub fn new(id: &str) -> Process {
        Process {
            id:       id.to_string(),
            groups:   Vec::new(),
            needs:    Vec::new(),
            duration: Sampler::new(Dist::constant(0.0)),
            delay:    None,
            routing:  None,
            queue:    VecDeque::new(),
            stats:    ProcessStats::default(),
        }
    }

    // ── Builder methods ───────────────────────────────────────────────────

    /// Require `amount` (> 0) of `resource` for every admission.
    pub fn need(mut self, resource: &str, amount: f64) -> Process {
        self.needs.push(Need { resource: resource.to_string(), amount, slot: None });
        self
    }

    /// Sample service durations from `dist`.  Negative samples (possible
    /// under [`Dist::normal`]) are clamped to zero at use.
    pub fn duration(mut self, dist: Dist) -> Process {
        self.duration = Sampler::new(dist);
        self
    }

    /// Override the sampled duration with a pure function of process and
    /// entity (e.g. tonnage / crane rate).
    pub fn delay(mut self, f: impl Fn(&Process, &Entity) -> f64 + 'static) -> Process {
        self.delay = Some(Box::new(f));
        self
    }

    /// Tag the process for group-filtered reporting.  May be called
    /// repeatedly.
    pub fn group(mut self, tag: &str) -> Process {
        self.groups.push(tag.to_string());
        self
    }

    /// On completion, forward every entity to the named process.
    pub fn then(mut self, next: &str) -> Process {
        self.routing = Some(Routing::Goto(next.to_string()));
        self
    }

    /// On completion, let `f` route the entity.
    pub fn route(
        mut self,
        f: impl FnMut(&mut Environment, EntityId) -> DesResult<()> + 'static,
    ) -> Process {
        self.routing = Some(Routing::Handler(Box::new(f)));
        self
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn has_group(&self, tag: &str) -> bool {
        self.groups.iter().any(|g| g == tag)
    }

    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    /// Entities enqueued but not yet admitted, head first.
    pub fn queue(&self) -> &VecDeque<EntityId> {
        &self.queue
    }

    pub fn stats(&self) -> ProcessStats {
        self.stats
    }

    // ── Kernel-side mutation ──────────────────────────────────────────────

    pub(crate) fn enqueue(&mut self, entity: EntityId) {
        self.queue.push_back(entity);
        self.stats.entered += 1;
    }

    pub(crate) fn reseed(&mut self, seed: u64) {
        self.duration.reseed(seed);
    }

    /// Pop the head into service, folding its wait into the stats.
    pub(crate) fn admit_head(&mut self, wait: f64) {
        if self.queue.pop_front().is_some() {
            self.stats.exited += 1;
            self.stats.total_wait += wait;
            self.stats.mean_wait = self.stats.total_wait / self.stats.entered as f64;
        }
    }
}
