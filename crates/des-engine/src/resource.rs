//! Counted-capacity resources.
//!
//! A resource is a named pool of interchangeable capacity (dock berths,
//! scale slots, crane-hours).  Capacity is only decremented at admission
//! time — there is no reservation ahead — and returned in full when the
//! holding entity's process completes.
//!
//! The FIFO holds entities *waiting* on this resource.  An entity leaves
//! the FIFO at the moment it seizes, so holding and waiting are mutually
//! exclusive states per entity and resource.

use std::collections::VecDeque;

use des_core::EntityId;

/// A counted capacity with a FIFO of waiting entities.
pub struct Resource {
    id:       String,
    capacity: f64,
    initial:  f64,
    queue:    VecDeque<EntityId>,
    entered:  u64,
    exited:   u64,
}

impl Resource {
    pub(crate) fn new(id: &str, capacity: f64) -> Resource {
        Resource {
            id: id.to_string(),
            capacity,
            initial: capacity,
            queue: VecDeque::new(),
            entered: 0,
            exited: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Instantaneously available amount.  Always in `[0, initial]`.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// The capacity the resource was registered with.
    pub fn initial_capacity(&self) -> f64 {
        self.initial
    }

    /// Entities waiting on this resource, in enqueue order.
    pub fn waiting(&self) -> &VecDeque<EntityId> {
        &self.queue
    }

    /// Total entities that ever entered the wait queue.
    pub fn entered(&self) -> u64 {
        self.entered
    }

    /// Total entities that left the wait queue by seizing.
    pub fn exited(&self) -> u64 {
        self.exited
    }

    // ── Kernel-side mutation ──────────────────────────────────────────────

    pub(crate) fn enqueue(&mut self, entity: EntityId) {
        self.queue.push_back(entity);
        self.entered += 1;
    }

    /// Drop `entity` from the wait queue (it just seized).  The entity need
    /// not be at the head: head-of-line discipline is per process, and this
    /// queue may be shared by several processes.
    pub(crate) fn remove_waiting(&mut self, entity: EntityId) {
        if let Some(pos) = self.queue.iter().position(|&e| e == entity) {
            self.queue.remove(pos);
            self.exited += 1;
        }
    }

    pub(crate) fn take(&mut self, amount: f64) {
        self.capacity -= amount;
        debug_assert!(self.capacity >= -1e-9, "resource {} over-seized", self.id);
    }

    pub(crate) fn release(&mut self, amount: f64) {
        self.capacity += amount;
        debug_assert!(
            self.capacity <= self.initial + 1e-9,
            "resource {} released above initial capacity",
            self.id
        );
    }
}
