//! `des-core` — foundational types for the `des` simulation kernel.
//!
//! This crate has no `des-*` dependencies and a minimal external surface
//! (`rand` + `rand_distr` + `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                            |
//! |-----------|-----------------------------------------------------|
//! | [`time`]  | `SimTime` — continuous simulated seconds            |
//! | [`ids`]   | `EntityId`                                          |
//! | [`rng`]   | `Dist` (distribution family), `Sampler`             |
//! | [`error`] | `DesError`, `DesResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                |
//! |---------|-------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to the plain-data types. |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DesError, DesResult};
pub use ids::EntityId;
pub use rng::{Dist, Sampler};
pub use time::SimTime;
