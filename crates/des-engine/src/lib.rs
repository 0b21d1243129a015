//! `des-engine` — process-oriented discrete-event simulation.
//!
//! Entities flow through [`Process`]es that contend for counted
//! [`Resource`] capacity; an [`Environment`] owns everything and advances
//! simulated time in event-driven leaps.
//!
//! # The protocol
//!
//! ```text
//! EntitySource ──generate()──▶ Entity ──forward_to──▶ Process queue
//!                                                         │ admission
//!                                              seize needs (head-of-line)
//!                                                         │
//!                                                   OngoingProcess
//!                                                         │ at date_end
//!                                release resources, route │
//!                       ┌─────────────────┬───────────────┴──┐
//!                  Routing::Handler   Routing::Goto       dispose
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use des_core::Dist;
//! use des_engine::{EntitySource, Environment, Process};
//!
//! let mut env = Environment::with_seed(42);
//! env.add_resource("server", 1.0)?;
//! env.add_process(
//!     Process::new("serve")
//!         .need("server", 1.0)
//!         .duration(Dist::exponential(1.0 / 30.0)?),
//! )?;
//! env.add_entity_source(EntitySource::new(
//!     "arrivals",
//!     Dist::exponential(1.0 / 60.0)?,
//!     |env| {
//!         let id = env.add_entity("Customer", ());
//!         env.forward_to(id, "serve")?;
//!         Ok(id)
//!     },
//! ))?;
//! env.end_time = des_core::SimTime(3_600.0);
//! env.run()?;
//! env.print_process_statistics();
//! ```

pub mod entity;
pub mod env;
pub mod process;
pub mod report;
pub mod resource;
pub mod source;
pub mod trace;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use entity::{Entity, ProcessVisit, QueueKind, QueueVisit};
pub use env::Environment;
pub use process::{DelayFn, Need, Process, ProcessStats, RouteFn, Routing};
pub use resource::Resource;
pub use source::{EntitySource, GenerateFn};
pub use trace::LogLevel;
