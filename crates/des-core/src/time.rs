//! Simulation time model.
//!
//! # Design
//!
//! Time is a continuous, monotonically non-decreasing count of simulated
//! seconds, represented as an `f64` newtype.  A continuous scale (rather
//! than an integer tick) is required because inter-arrival and service
//! durations are drawn from continuous distributions; the event loop jumps
//! straight to the next scheduled instant.
//!
//! `SimTime` implements a *total* order via `f64::total_cmp` so it can key
//! ordered collections (the ongoing-process heap).  The kernel never
//! produces NaN timestamps — every time is built from a non-negative start
//! plus non-negative deltas — so the total order agrees with the ordinary
//! one everywhere it is observed.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// An absolute instant on the simulation clock, in seconds.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// Raw seconds since the start of the simulated epoch.
    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }

    /// The smaller of two instants.
    #[inline]
    pub fn min(self, other: SimTime) -> SimTime {
        if other < self { other } else { self }
    }

    /// The larger of two instants.
    #[inline]
    pub fn max(self, other: SimTime) -> SimTime {
        if other > self { other } else { self }
    }

    /// Break the instant into (days, hours, minutes, seconds-with-fraction).
    pub fn dhms(self) -> (u64, u32, u32, f64) {
        let total = self.0.max(0.0);
        let days = (total / 86_400.0).floor();
        let rem = total - days * 86_400.0;
        let hours = (rem / 3_600.0).floor();
        let rem = rem - hours * 3_600.0;
        let minutes = (rem / 60.0).floor();
        let seconds = rem - minutes * 60.0;
        (days as u64, hours as u32, minutes as u32, seconds)
    }

    /// Human-readable form used by banners and the event trace:
    /// `"3d 07:42:01.50"`.
    pub fn human(self) -> String {
        let (d, h, m, s) = self.dhms();
        format!("{d}d {h:02}:{m:02}:{s:05.2}")
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl AddAssign<f64> for SimTime {
    #[inline]
    fn add_assign(&mut self, rhs: f64) {
        self.0 += rhs;
    }
}

impl Sub for SimTime {
    type Output = f64;
    /// Seconds elapsed from `rhs` to `self`.
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl From<f64> for SimTime {
    #[inline]
    fn from(secs: f64) -> SimTime {
        SimTime(secs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0)
    }
}
