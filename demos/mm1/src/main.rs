//! mm1 — smallest demo for the des kernel: a single-server queue.
//!
//! Customers arrive Poisson (mean 60 s) at a server with exponential
//! service (mean 30 s) behind a capacity-1 resource, i.e. an M/M/1 queue at
//! ρ = 0.5.  Run it to watch the progress bar, then compare the reported
//! mean queue wait with the analytic value ρ/(μ−λ) = 30 s.

use anyhow::Result;

use des_core::{Dist, SimTime};
use des_engine::{EntitySource, Environment, LogLevel, Process};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:                  u64 = 42;
const MEAN_INTERARRIVAL_SECS: f64 = 60.0;
const MEAN_SERVICE_SECS:      f64 = 30.0;
const RUN_HOURS:              f64 = 8.0;

fn main() -> Result<()> {
    println!("=== mm1 — single-server queue ===");
    println!(
        "Arrivals: exp(mean {MEAN_INTERARRIVAL_SECS} s)  |  Service: exp(mean {MEAN_SERVICE_SECS} s)  |  Seed: {SEED}"
    );
    println!();

    // 1. Environment and the one server.
    let mut env = Environment::with_seed(SEED);
    env.add_resource("server", 1.0)?;
    env.add_process(
        Process::new("serve")
            .need("server", 1.0)
            .duration(Dist::exponential(1.0 / MEAN_SERVICE_SECS)?)
            .group("queueing"),
    )?;

    // 2. Poisson arrivals.
    env.add_entity_source(EntitySource::new(
        "arrivals",
        Dist::exponential(1.0 / MEAN_INTERARRIVAL_SECS)?,
        |env| {
            let customer = env.add_entity("Customer", ());
            env.forward_to(customer, "serve")?;
            Ok(customer)
        },
    ))?;

    // 3. Run one shift with the progress bar.
    env.end_time = SimTime(RUN_HOURS * 3_600.0);
    env.log_level = LogLevel::Progress;
    env.run()?;

    // 4. Results.
    env.print_process_statistics();
    println!(
        "generated {} | disposed {} | still in system {}",
        env.generated(),
        env.disposed(),
        env.live_entities()
    );

    Ok(())
}
