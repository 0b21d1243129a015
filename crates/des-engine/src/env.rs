//! The `Environment` — registries, clock, and the event loop.
//!
//! # Loop shape
//!
//! ```text
//! now := earliest source firing
//! while now < end_time:
//!   ① Generate — fire every source due at `now` (batch_size entities each),
//!                advance its schedule, drop it at max_generations.
//!   ② Settle   — repeat until the next candidate instant is strictly later:
//!                a. drain ongoing completions with ends ≤ now
//!                   (release resources, close journals, route or dispose)
//!                b. sweep the watch set in registration order, admitting
//!                   queue heads whose needs can be seized
//!                c. candidate := min(end_time, earliest source, heap head)
//!   ③ Advance  — now := candidate.
//! ```
//!
//! The settle sub-loop is what makes same-instant cascades correct: a
//! completion can release a resource that admits a waiting entity whose
//! zero-delay service completes and forwards again, all without the clock
//! moving.  Completions always run before admissions at a given instant, and
//! admissions sweep processes in ascending registration order, so every run
//! with the same seed replays identically.

use std::any::Any;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use des_core::{DesError, DesResult, Dist, EntityId, Sampler, SimTime};

use crate::entity::{Entity, QueueKind};
use crate::process::{Need, Process, Routing};
use crate::resource::Resource;
use crate::source::EntitySource;
use crate::trace::{LogLevel, RunTrace};

// ── OngoingProcess ────────────────────────────────────────────────────────────

/// An in-flight service instance awaiting its completion time.
///
/// Ordered by `(ends, seq)`: the sequence number makes same-instant
/// completions drain in scheduling order, so heap order is deterministic.
#[derive(Debug)]
pub(crate) struct OngoingProcess {
    pub(crate) process: usize,
    pub(crate) entity:  EntityId,
    pub(crate) started: SimTime,
    pub(crate) ends:    SimTime,
    seq:                u64,
}

impl PartialEq for OngoingProcess {
    fn eq(&self, other: &Self) -> bool {
        self.ends == other.ends && self.seq == other.seq
    }
}

impl Eq for OngoingProcess {}

impl Ord for OngoingProcess {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.ends, self.seq).cmp(&(other.ends, other.seq))
    }
}

impl PartialOrd for OngoingProcess {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ── Environment ───────────────────────────────────────────────────────────────

/// Owns every resource, process, source, and live entity of one simulation
/// run, and drives the event loop.
///
/// Processes and resources live in registration-order vectors with id →
/// index maps; registration order is therefore the deterministic tie-break
/// for admission across processes competing for the same resource.
pub struct Environment {
    now: SimTime,
    /// The run's terminal instant.
    pub end_time: SimTime,
    /// Console verbosity.  See [`LogLevel`].
    pub log_level: LogLevel,
    /// Block for one line of stdin between clock advances (forces
    /// [`LogLevel::Trace`]).
    pub step_through: bool,

    sources:          Vec<EntitySource>,
    resources:        Vec<Resource>,
    resource_index:   HashMap<String, usize>,
    processes:        Vec<Process>,
    process_index:    HashMap<String, usize>,
    entities:         HashMap<EntityId, Entity>,
    ongoing:          BinaryHeap<Reverse<OngoingProcess>>,
    /// Processes that may have become admissible since the last sweep.
    watch:            BTreeSet<usize>,
    next_entity_id:   u64,
    next_ongoing_seq: u64,
    generated:        u64,
    disposed:         u64,
    master:           SmallRng,
}

impl Environment {
    /// An environment whose master RNG is seeded from OS entropy — runs are
    /// not reproducible across invocations.
    pub fn new() -> Environment {
        Self::with_master(SmallRng::from_entropy())
    }

    /// An environment reproducible from a single seed: every registered
    /// sampler is reseeded from the master stream in registration order.
    pub fn with_seed(seed: u64) -> Environment {
        Self::with_master(SmallRng::seed_from_u64(seed))
    }

    fn with_master(master: SmallRng) -> Environment {
        Environment {
            now:              SimTime::ZERO,
            end_time:         SimTime::ZERO,
            log_level:        LogLevel::Silent,
            step_through:     false,
            sources:          Vec::new(),
            resources:        Vec::new(),
            resource_index:   HashMap::new(),
            processes:        Vec::new(),
            process_index:    HashMap::new(),
            entities:         HashMap::new(),
            ongoing:          BinaryHeap::new(),
            watch:            BTreeSet::new(),
            next_entity_id:   0,
            next_ongoing_seq: 0,
            generated:        0,
            disposed:         0,
            master,
        }
    }

    fn child_seed(&mut self) -> u64 {
        self.master.gen()
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register a resource with the given (non-negative) capacity.
    pub fn add_resource(&mut self, id: &str, capacity: f64) -> DesResult<()> {
        if capacity < 0.0 {
            return Err(DesError::Config(format!(
                "resource {id:?}: capacity must be non-negative, got {capacity}"
            )));
        }
        if self.resource_index.contains_key(id) {
            return Err(DesError::Config(format!("duplicate resource id {id:?}")));
        }
        self.resource_index.insert(id.to_string(), self.resources.len());
        self.resources.push(Resource::new(id, capacity));
        Ok(())
    }

    /// Register a process built with the [`Process`] fluent API.
    ///
    /// Need amounts must be positive and need resources distinct; the
    /// resources themselves may be registered later — they are resolved the
    /// first time an entity is forwarded to this process.
    pub fn add_process(&mut self, process: Process) -> DesResult<()> {
        if self.process_index.contains_key(process.id()) {
            return Err(DesError::Config(format!("duplicate process id {:?}", process.id())));
        }
        for (i, need) in process.needs.iter().enumerate() {
            if need.amount <= 0.0 {
                return Err(DesError::Config(format!(
                    "process {:?}: need {:?} amount must be > 0, got {}",
                    process.id(),
                    need.resource,
                    need.amount
                )));
            }
            if process.needs[..i].iter().any(|n| n.resource == need.resource) {
                return Err(DesError::Config(format!(
                    "process {:?}: duplicate need {:?}",
                    process.id(),
                    need.resource
                )));
            }
        }
        let seed = self.child_seed();
        let mut process = process;
        process.reseed(seed);
        self.process_index.insert(process.id().to_string(), self.processes.len());
        self.processes.push(process);
        Ok(())
    }

    /// Register an entity source built with the [`EntitySource`] fluent API.
    pub fn add_entity_source(&mut self, source: EntitySource) -> DesResult<()> {
        if source.batch_size() == 0 {
            return Err(DesError::Config(format!(
                "source {:?}: batch size must be ≥ 1",
                source.id()
            )));
        }
        let seed = self.child_seed();
        let mut source = source;
        source.reseed(seed);
        self.sources.push(source);
        Ok(())
    }

    /// Register a fresh entity carrying a model payload; returns its id.
    pub fn add_entity<P: Any>(&mut self, kind: &str, payload: P) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        self.generated += 1;
        self.entities.insert(id, Entity::new(id, kind, Box::new(payload)));
        id
    }

    /// A standalone sampler drawing from the environment's seed stream —
    /// for routing handlers and other model-side randomness that should
    /// replay with the run.
    pub fn make_sampler(&mut self, dist: Dist) -> Sampler {
        let seed = self.child_seed();
        Sampler::seeded(dist, seed)
    }

    // ── Read access ───────────────────────────────────────────────────────

    /// The current simulation clock.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// A live entity by id.  Disposed entities are gone.
    pub fn entity(&self, id: EntityId) -> DesResult<&Entity> {
        self.entities.get(&id).ok_or(DesError::UnknownEntity(id))
    }

    /// Mutable access to a live entity (for payload updates in callbacks).
    pub fn entity_mut(&mut self, id: EntityId) -> DesResult<&mut Entity> {
        self.entities.get_mut(&id).ok_or(DesError::UnknownEntity(id))
    }

    pub fn process(&self, id: &str) -> Option<&Process> {
        self.process_index.get(id).map(|&i| &self.processes[i])
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resource_index.get(id).map(|&i| &self.resources[i])
    }

    /// All processes, in registration order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    /// All resources, in registration order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// All live entities (arbitrary order).
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Sources still registered (exhausted ones are removed).
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Entities currently registered (queued, in service, or parked).
    pub fn live_entities(&self) -> usize {
        self.entities.len()
    }

    /// Service instances currently in flight.
    pub fn in_flight(&self) -> usize {
        self.ongoing.len()
    }

    /// Entities ever registered.
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// Entities destroyed after completing an unrouted process.
    pub fn disposed(&self) -> u64 {
        self.disposed
    }

    // ── Forwarding ────────────────────────────────────────────────────────

    /// The sole entry into a process: enqueue `entity` in the process's
    /// admission queue and in every needed resource's FIFO, opening the
    /// corresponding journal entries, and mark the process for the next
    /// admission sweep.  Admission is never attempted synchronously.
    ///
    /// Unknown process or resource ids are fatal misuse.
    pub fn forward_to(&mut self, entity: EntityId, process: &str) -> DesResult<()> {
        let pidx = *self
            .process_index
            .get(process)
            .ok_or_else(|| DesError::UnknownProcess(process.to_string()))?;
        let now = self.now;
        let Environment { processes, resources, resource_index, entities, watch, .. } = self;

        let p = &mut processes[pidx];
        let e = entities.get_mut(&entity).ok_or(DesError::UnknownEntity(entity))?;

        resolve_needs(&mut p.needs, resource_index)?;
        for ni in 0..p.needs.len() {
            let Some(ridx) = p.needs[ni].slot else { continue }; // resolved above
            resources[ridx].enqueue(entity);
            e.enter_queue(QueueKind::Resource, resources[ridx].id(), now);
        }

        p.enqueue(entity);
        e.enter_queue(QueueKind::Process, p.id(), now);
        watch.insert(pidx);
        Ok(())
    }

    // ── The run loop ──────────────────────────────────────────────────────

    /// Drive the clock from the earliest source firing to `end_time`.
    ///
    /// Misuse (unknown ids, payload type mismatches) and errors raised by
    /// model callbacks abort the run here; resources released before
    /// routing stay consistent on that path.
    pub fn run(&mut self) -> DesResult<()> {
        if self.step_through {
            self.log_level = LogLevel::Trace;
        }
        let mut trace = RunTrace::new(self.log_level, self.step_through);
        trace.start_banner(self.end_time);

        match self.sources.iter().map(|s| s.next_gen()).min() {
            Some(first) => self.now = self.now.max(first),
            None => {
                // Nothing will ever happen.
                self.now = self.end_time;
                trace.end_banner();
                return Ok(());
            }
        }

        while self.now < self.end_time {
            trace.clock(self.now);
            self.generate_due(&mut trace)?;
            self.now = self.settle(&mut trace)?;
            trace.tick_end(self.now, self.end_time);
        }

        trace.end_banner();
        Ok(())
    }

    /// Phase ①: fire every source due at the current instant.
    fn generate_due(&mut self, trace: &mut RunTrace) -> DesResult<()> {
        let mut i = 0;
        while i < self.sources.len() {
            if self.sources[i].next_gen() > self.now {
                i += 1;
                continue;
            }
            // Move the source out so its generate hook can borrow `self`.
            let mut source = self.sources.remove(i);
            let mut failure = None;
            for _ in 0..source.batch_size() {
                match source.fire(self) {
                    Ok(eid) => {
                        let name = self
                            .entities
                            .get(&eid)
                            .map(|e| e.name())
                            .unwrap_or_else(|| eid.to_string());
                        trace.generated(source.id(), &name);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            source.advance();
            if !source.exhausted() {
                self.sources.insert(i, source);
                i += 1;
            }
            if let Some(e) = failure {
                return Err(e);
            }
        }
        Ok(())
    }

    /// Phase ②: resolve every completion and admission at the current
    /// instant, then return the next candidate instant.
    fn settle(&mut self, trace: &mut RunTrace) -> DesResult<SimTime> {
        loop {
            // a) completions due now, in (ends, seq) order
            while let Some(Reverse(head)) = self.ongoing.peek() {
                if head.ends > self.now {
                    break;
                }
                if let Some(Reverse(og)) = self.ongoing.pop() {
                    self.complete(og, trace)?;
                }
            }

            // b) admission sweep in registration order; a process leaves the
            //    watch set once its queue is empty
            let watched: Vec<usize> = self.watch.iter().copied().collect();
            for pidx in watched {
                self.maybe_start(pidx, trace)?;
                if self.processes[pidx].queue.is_empty() {
                    self.watch.remove(&pidx);
                }
            }

            // c) next candidate instant
            let mut next = self.end_time;
            if let Some(t) = self.sources.iter().map(|s| s.next_gen()).min() {
                next = next.min(t);
            }
            if let Some(Reverse(og)) = self.ongoing.peek() {
                next = next.min(og.ends);
            }

            if next > self.now {
                return Ok(next);
            }
            // Candidate at `now` or earlier: either a zero-delay completion
            // just scheduled (loop again and drain it), or a source due at
            // this very instant — e.g. one registered mid-tick by a callback
            // — which only the outer generation step can fire.  Returning
            // the unchanged clock keeps it monotonic.
            if !self
                .ongoing
                .peek()
                .is_some_and(|Reverse(og)| og.ends <= self.now)
            {
                return Ok(self.now);
            }
        }
    }

    /// Close out one in-flight service: journal, release, route.
    fn complete(&mut self, og: OngoingProcess, trace: &mut RunTrace) -> DesResult<()> {
        debug_assert!(og.started <= og.ends, "service interval runs backwards");
        let OngoingProcess { process: pidx, entity: eid, .. } = og;
        let now = self.now;
        {
            let Environment { processes, resources, resource_index, entities, .. } = self;
            let entity = entities.get_mut(&eid).ok_or(DesError::UnknownEntity(eid))?;
            entity.end_process(now);
            for (rname, amount) in entity.drain_held() {
                let ridx = *resource_index
                    .get(&rname)
                    .ok_or_else(|| DesError::UnknownResource(rname.clone()))?;
                resources[ridx].release(amount);
            }
            trace.process_ended(processes[pidx].id(), &entity.name());
        }

        // Route: handler first, then static successor, else dispose.  The
        // routing slot is moved out for the duration of the handler call so
        // the handler can freely borrow the environment.
        match self.processes[pidx].routing.take() {
            Some(Routing::Handler(mut f)) => {
                let result = f(self, eid);
                self.processes[pidx].routing = Some(Routing::Handler(f));
                result
            }
            Some(Routing::Goto(next)) => {
                let result = self.forward_to(eid, &next);
                self.processes[pidx].routing = Some(Routing::Goto(next));
                result
            }
            None => {
                self.entities.remove(&eid);
                self.disposed += 1;
                Ok(())
            }
        }
    }

    /// Admission for one process: start queue heads for as long as their
    /// needs can be fully seized.
    ///
    /// Head-of-line discipline is absolute — a blocked head is never
    /// overtaken, and its partial seizures persist across attempts (which
    /// is what prevents starvation of multi-resource requests).  Two heads
    /// each partially holding the other's needs can therefore deadlock; the
    /// kernel does not detect that.
    fn maybe_start(&mut self, pidx: usize, trace: &mut RunTrace) -> DesResult<()> {
        loop {
            let now = self.now;
            let Environment {
                processes,
                resources,
                resource_index,
                entities,
                ongoing,
                next_ongoing_seq,
                ..
            } = self;
            let p = &mut processes[pidx];
            let Some(&eid) = p.queue.front() else {
                return Ok(());
            };
            let entity = entities.get_mut(&eid).ok_or(DesError::UnknownEntity(eid))?;

            // Seize outstanding needs in declaration order; the first
            // resource that cannot cover its amount stops the attempt.
            resolve_needs(&mut p.needs, resource_index)?;
            let mut blocked = false;
            for ni in 0..p.needs.len() {
                let amount = p.needs[ni].amount;
                if entity.held_amount(&p.needs[ni].resource) >= amount {
                    continue;
                }
                let Some(ridx) = p.needs[ni].slot else { continue }; // resolved above
                if resources[ridx].capacity() >= amount {
                    resources[ridx].take(amount);
                    resources[ridx].remove_waiting(eid);
                    entity.seize(resources[ridx].id(), amount, now);
                } else {
                    blocked = true;
                    break;
                }
            }
            if blocked {
                return Ok(());
            }

            // All needs in hand: admit the head.
            entity.leave_queue(QueueKind::Process, p.id(), now);
            entity.start_process(now);
            let wait = entity.last_wait();
            let raw = match &p.delay {
                Some(delay) => delay(p, entity),
                None => p.duration.sample(),
            };
            let duration = raw.max(0.0); // Normal samples may be negative
            trace.process_started(p.id(), &entity.name());
            p.admit_head(wait);

            let seq = *next_ongoing_seq;
            *next_ongoing_seq += 1;
            ongoing.push(Reverse(OngoingProcess {
                process: pidx,
                entity:  eid,
                started: now,
                ends:    now + duration,
                seq,
            }));
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill in the registry slots of any needs that haven't been resolved yet.
/// A need naming a resource that was never registered is fatal here — the
/// first time an entity actually depends on it.
fn resolve_needs(needs: &mut [Need], resource_index: &HashMap<String, usize>) -> DesResult<()> {
    for need in needs.iter_mut() {
        if need.slot.is_none() {
            match resource_index.get(&need.resource) {
                Some(&i) => need.slot = Some(i),
                None => return Err(DesError::UnknownResource(need.resource.clone())),
            }
        }
    }
    Ok(())
}
