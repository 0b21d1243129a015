//! Entities and their per-lifetime journals.
//!
//! An [`Entity`] is a token flowing through processes: a truck, a ship, a
//! work order.  The kernel tracks identity, the journals needed for queue
//! statistics, and the resources the entity currently holds; everything the
//! *model* knows about the entity lives in an opaque payload set at
//! registration and recovered with a checked downcast.
//!
//! Journals are append-only.  Entering a queue opens an entry; leaving
//! closes the most recent open entry for that queue.  Closed entries remain
//! so a disposed entity's full history is available up to the moment of
//! disposal.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use des_core::{DesError, DesResult, EntityId, SimTime};

// ── Journal records ───────────────────────────────────────────────────────────

/// Which kind of queue a [`QueueVisit`] refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueueKind {
    /// A resource's FIFO of waiting entities.
    Resource,
    /// A process's admission queue.
    Process,
}

/// One stay in a queue: opened on enter, closed on leave.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueVisit {
    pub kind:    QueueKind,
    /// Id of the queue's owner (resource id or process id).
    pub queue:   String,
    pub entered: SimTime,
    /// `None` while the entity is still waiting.
    pub left:    Option<SimTime>,
}

/// One pass through a process: queued, then started, then ended.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessVisit {
    pub process: String,
    pub queued:  SimTime,
    pub started: Option<SimTime>,
    pub ended:   Option<SimTime>,
}

impl ProcessVisit {
    /// Seconds spent waiting before admission; 0 if not yet started.
    pub fn wait(&self) -> f64 {
        match self.started {
            Some(t) => t - self.queued,
            None => 0.0,
        }
    }

    /// Seconds of service; `None` until the visit is closed.
    pub fn service(&self) -> Option<f64> {
        match (self.started, self.ended) {
            (Some(s), Some(e)) => Some(e - s),
            _ => None,
        }
    }
}

// ── Entity ────────────────────────────────────────────────────────────────────

/// A token flowing through the simulated system.
///
/// Owned exclusively by the [`Environment`][crate::Environment]; queues and
/// in-flight records refer to it by [`EntityId`].  Destroyed only on
/// disposal (completion of a process with no routing).
pub struct Entity {
    id:              EntityId,
    kind:            String,
    queue_journal:   Vec<QueueVisit>,
    process_journal: Vec<ProcessVisit>,
    /// Resource id → amount, non-empty only between seize and release.
    held:            BTreeMap<String, f64>,
    payload:         Box<dyn Any>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, kind: &str, payload: Box<dyn Any>) -> Entity {
        Entity {
            id,
            kind: kind.to_string(),
            queue_journal: Vec::new(),
            process_journal: Vec::new(),
            held: BTreeMap::new(),
            payload,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The free-form type tag given at registration (e.g. `"Truck"`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Display name used in trace output: `"Truck 12"`.
    pub fn name(&self) -> String {
        format!("{} {}", self.kind, self.id.0)
    }

    // ── Payload access ────────────────────────────────────────────────────

    /// Borrow the model payload as a `T`.
    ///
    /// Asking for the wrong concrete type is a fatal misuse error, the same
    /// class as forwarding to an unknown process.
    pub fn payload<T: Any>(&self) -> DesResult<&T> {
        self.payload.downcast_ref::<T>().ok_or_else(|| DesError::Payload {
            entity:   self.name(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Mutable variant of [`payload`][Self::payload].
    pub fn payload_mut<T: Any>(&mut self) -> DesResult<&mut T> {
        // Precompute: the error path cannot borrow self while payload is.
        let name = self.name();
        self.payload.downcast_mut::<T>().ok_or(DesError::Payload {
            entity:   name,
            expected: std::any::type_name::<T>(),
        })
    }

    // ── Journals ──────────────────────────────────────────────────────────

    /// Every queue stay of this entity's lifetime, in enter order.
    pub fn queue_journal(&self) -> &[QueueVisit] {
        &self.queue_journal
    }

    /// Every process pass of this entity's lifetime, in queueing order.
    pub fn process_journal(&self) -> &[ProcessVisit] {
        &self.process_journal
    }

    /// Resources currently held (id → amount).
    pub fn held(&self) -> &BTreeMap<String, f64> {
        &self.held
    }

    /// Amount of `resource` currently held; 0 if none.
    pub fn held_amount(&self, resource: &str) -> f64 {
        self.held.get(resource).copied().unwrap_or(0.0)
    }

    /// Wait endured before the most recent admission.
    pub(crate) fn last_wait(&self) -> f64 {
        self.process_journal.last().map_or(0.0, ProcessVisit::wait)
    }

    // ── Kernel-side mutation ──────────────────────────────────────────────

    pub(crate) fn enter_queue(&mut self, kind: QueueKind, queue: &str, date: SimTime) {
        self.queue_journal.push(QueueVisit {
            kind,
            queue: queue.to_string(),
            entered: date,
            left: None,
        });
        if kind == QueueKind::Process {
            self.process_journal.push(ProcessVisit {
                process: queue.to_string(),
                queued:  date,
                started: None,
                ended:   None,
            });
        }
    }

    /// Close the most recent open stay in the given queue.
    pub(crate) fn leave_queue(&mut self, kind: QueueKind, queue: &str, date: SimTime) {
        for visit in self.queue_journal.iter_mut().rev() {
            if visit.kind == kind && visit.queue == queue && visit.left.is_none() {
                visit.left = Some(date);
                return;
            }
        }
    }

    pub(crate) fn start_process(&mut self, date: SimTime) {
        if let Some(visit) = self.process_journal.last_mut() {
            visit.started = Some(date);
        }
    }

    pub(crate) fn end_process(&mut self, date: SimTime) {
        if let Some(visit) = self.process_journal.last_mut() {
            visit.ended = Some(date);
        }
    }

    /// Record a seize: the entity now holds `amount` of `resource` and has
    /// left that resource's queue.
    pub(crate) fn seize(&mut self, resource: &str, amount: f64, date: SimTime) {
        self.held.insert(resource.to_string(), amount);
        self.leave_queue(QueueKind::Resource, resource, date);
    }

    /// Release everything: returns the held map, leaving it empty.
    pub(crate) fn drain_held(&mut self) -> BTreeMap<String, f64> {
        std::mem::take(&mut self.held)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("held", &self.held)
            .field("visits", &self.process_journal.len())
            .finish()
    }
}
