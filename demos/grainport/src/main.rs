//! grainport — a grain-export corridor model on the des kernel.
//!
//! Trucks deliver soy to inland terminals (weigh-in → reception →
//! classification → unloading → weigh-out), while ships berth at harbor
//! docks to load the exports.  Arrival volumes come from small embedded
//! tab-separated tables, the way the production datasets ship; monthly
//! truck and ship counts are derived from the demanded tonnage and each
//! source is capped at its month's count.
//!
//! Trucks and ships enter through shared check-in processes whose routing
//! handlers read the entity payload to pick the right terminal or dock, so
//! the model has exactly one wiring point per fleet.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Context, Result};

use des_core::{Dist, SimTime};
use des_engine::{EntitySource, Environment, LogLevel, Process};

// ── Constants ─────────────────────────────────────────────────────────────────

const MINUTES: f64 = 60.0;
const HOURS:   f64 = 60.0 * MINUTES;
const DAYS:    f64 = 24.0 * HOURS;

const KTON: f64 = 1_000.0;

const SEED:                u64 = 2_022;
const TRUCK_CAPACITY_TONS: f64 = 30.0;
const UNLOAD_SECS_PER_TON: f64 = 8.6;
const SIM_DAYS:            f64 = 30.0;

const NUM_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Ship size options (tons) and the observed mix at the docks.
const SHIP_DWT_TONS:    [f64; 3] = [50.0 * KTON, 60.0 * KTON, 70.0 * KTON];
const SHIP_DWT_WEIGHTS: [f64; 3] = [0.1, 0.55, 0.35];

// ── Embedded tables (tab-separated, header + rows) ────────────────────────────

const TERMINALS_TSV: &str = "\
terminal\tslots\tmonthly_kton
Cascavel\t2\t90
Sorriso\t1\t60
";

const HARBORS_TSV: &str = "\
harbor\tdocks\tloading_hours\tmonthly_kton
Santos\t2\t36\t300
Paranagua\t1\t30\t180
";

// ── Table rows ────────────────────────────────────────────────────────────────

struct TerminalRow {
    id:           String,
    slots:        f64,
    monthly_kton: f64,
}

struct HarborRow {
    id:            String,
    docks:         f64,
    /// Hours a nominal-size ship spends loading at a dock.
    loading_hours: f64,
    monthly_kton:  f64,
}

fn read_terminals() -> Result<Vec<TerminalRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(TERMINALS_TSV.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("terminals table")?;
        rows.push(TerminalRow {
            id:           record[0].to_string(),
            slots:        record[1].parse().context("terminal slots")?,
            monthly_kton: record[2].parse().context("terminal monthly_kton")?,
        });
    }
    Ok(rows)
}

fn read_harbors() -> Result<Vec<HarborRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(HARBORS_TSV.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("harbors table")?;
        rows.push(HarborRow {
            id:            record[0].to_string(),
            docks:         record[1].parse().context("harbor docks")?,
            loading_hours: record[2].parse().context("harbor loading_hours")?,
            monthly_kton:  record[3].parse().context("harbor monthly_kton")?,
        });
    }
    Ok(rows)
}

// ── Entity payloads ───────────────────────────────────────────────────────────

struct Truck {
    terminal: String,
    load:     f64,
}

struct Ship {
    harbor: String,
    dwt:    f64,
}

// ── Model assembly ────────────────────────────────────────────────────────────

/// Terminal activity chain, one station resource each:
/// weigh-in → reception → classification → unloading → weigh-out.
fn add_terminal(env: &mut Environment, t: &TerminalRow) -> Result<()> {
    let station = |s: &str| format!("{s} {}", t.id);

    env.add_resource(&station("ARR"), t.slots)?;
    env.add_process(
        Process::new(&station("ARR"))
            .need(&station("ARR"), 1.0)
            .duration(Dist::normal(1.2 * MINUTES, 0.1 * MINUTES)?)
            .group("terminal")
            .then(&station("REC")),
    )?;

    env.add_resource(&station("REC"), t.slots)?;
    env.add_process(
        Process::new(&station("REC"))
            .need(&station("REC"), 1.0)
            .duration(Dist::log_normal(1.9 * MINUTES, 0.7 * MINUTES)?)
            .group("terminal")
            .then(&station("CLA")),
    )?;

    env.add_resource(&station("CLA"), t.slots)?;
    env.add_process(
        Process::new(&station("CLA"))
            .need(&station("CLA"), 1.0)
            .duration(Dist::triangular(1.0 * MINUTES, 5.0 * MINUTES, 3.0 * MINUTES)?)
            .group("terminal")
            .then(&station("UNL")),
    )?;

    // Unloading time scales with the actual load on the truck.
    env.add_resource(&station("UNL"), t.slots)?;
    env.add_process(
        Process::new(&station("UNL"))
            .need(&station("UNL"), 1.0)
            .delay(|_, e| {
                e.payload::<Truck>()
                    .map(|truck| truck.load * UNLOAD_SECS_PER_TON)
                    .unwrap_or(0.0)
            })
            .group("terminal")
            .then(&station("EXI")),
    )?;

    env.add_resource(&station("EXI"), t.slots)?;
    env.add_process(
        Process::new(&station("EXI"))
            .need(&station("EXI"), 1.0)
            .duration(Dist::normal(1.2 * MINUTES, 0.1 * MINUTES)?)
            .group("terminal"),
    )?;

    Ok(())
}

/// Harbor docks: berth time scales with the ship's deadweight at the
/// harbor's nominal loading rate.
fn add_harbor(env: &mut Environment, h: &HarborRow) -> Result<()> {
    let dock = format!("DCK {}", h.id);
    let tons_per_sec = SHIP_DWT_TONS[1] / (h.loading_hours * HOURS);
    env.add_resource(&dock, h.docks)?;
    env.add_process(
        Process::new(&dock)
            .need(&dock, 1.0)
            .delay(move |_, e| {
                e.payload::<Ship>().map(|ship| ship.dwt / tons_per_sec).unwrap_or(0.0)
            })
            .group("harbor"),
    )?;
    Ok(())
}

/// Shared entry points: the check-in processes read the payload and route
/// each entity to its own terminal or dock.
fn add_checkins(env: &mut Environment) -> Result<()> {
    env.add_process(Process::new("checkin").route(|env, eid| {
        let terminal = env.entity(eid)?.payload::<Truck>()?.terminal.clone();
        env.forward_to(eid, &format!("ARR {terminal}"))
    }))?;
    env.add_process(Process::new("anchorage").route(|env, eid| {
        let harbor = env.entity(eid)?.payload::<Ship>()?.harbor.clone();
        env.forward_to(eid, &format!("DCK {harbor}"))
    }))?;
    Ok(())
}

/// One truck source per terminal per month, capped at the month's truck
/// count so the arrival volume matches the demanded tonnage.
fn add_truck_sources(env: &mut Environment, t: &TerminalRow) -> Result<()> {
    let mut day = 0u32;
    for (month, &days) in NUM_DAYS.iter().enumerate() {
        let trucks = (t.monthly_kton * KTON / TRUCK_CAPACITY_TONS).ceil();
        let interval = days as f64 * DAYS / trucks;
        let terminal = t.id.clone();
        env.add_entity_source(
            EntitySource::new(
                &format!("{}:{}", t.id, month + 1),
                Dist::exponential(1.0 / interval)?,
                move |env| {
                    let truck = env.add_entity(
                        "Truck",
                        Truck { terminal: terminal.clone(), load: TRUCK_CAPACITY_TONS },
                    );
                    env.forward_to(truck, "checkin")?;
                    Ok(truck)
                },
            )
            .starting_at(day as f64 * DAYS)
            .limit(trucks as u32),
        )?;
        day += days;
    }
    Ok(())
}

/// One ship source per harbor per month.  Each ship draws its size from
/// the DWT mix; the drawn tonnage is tallied per month at generation time
/// as the harbor's booked exports.
fn add_ship_sources(
    env: &mut Environment,
    h: &HarborRow,
    exports: &Rc<RefCell<HashMap<String, [f64; 12]>>>,
) -> Result<()> {
    let mut day = 0u32;
    for (month, &days) in NUM_DAYS.iter().enumerate() {
        let ships = (h.monthly_kton * KTON / SHIP_DWT_TONS[1]).ceil();
        let interval = days as f64 * DAYS / ships;
        let harbor = h.id.clone();
        let exports = Rc::clone(exports);
        let mut dwt_pick = env.make_sampler(Dist::categorical(SHIP_DWT_WEIGHTS.to_vec())?);
        env.add_entity_source(
            EntitySource::new(
                &format!("{}:{}", h.id, month + 1),
                Dist::exponential(1.0 / interval)?,
                move |env| {
                    let dwt = SHIP_DWT_TONS[dwt_pick.sample_index()];
                    let ship =
                        env.add_entity("Ship", Ship { harbor: harbor.clone(), dwt });
                    exports.borrow_mut().entry(harbor.clone()).or_default()[month] += dwt;
                    env.forward_to(ship, "anchorage")?;
                    Ok(ship)
                },
            )
            .starting_at(day as f64 * DAYS)
            .limit(ships as u32),
        )?;
        day += days;
    }
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    println!("=== grainport — soy export corridor ===");

    let terminals = read_terminals()?;
    let harbors = read_harbors()?;
    println!(
        "Terminals: {}  |  Harbors: {}  |  Horizon: {SIM_DAYS} days  |  Seed: {SEED}",
        terminals.len(),
        harbors.len()
    );
    println!();

    let exports: Rc<RefCell<HashMap<String, [f64; 12]>>> = Rc::default();

    let mut env = Environment::with_seed(SEED);
    add_checkins(&mut env)?;
    for t in &terminals {
        add_terminal(&mut env, t)?;
    }
    for h in &harbors {
        add_harbor(&mut env, h)?;
    }
    for t in &terminals {
        add_truck_sources(&mut env, t)?;
    }
    for h in &harbors {
        add_ship_sources(&mut env, h, &exports)?;
    }

    env.end_time = SimTime(SIM_DAYS * DAYS);
    env.log_level = LogLevel::Progress;
    env.run()?;

    env.print_process_group_statistics("terminal");
    println!();
    env.print_process_group_statistics("harbor");
    println!();

    println!("Booked exports by month (tons):");
    for h in &harbors {
        let booked = exports.borrow();
        let by_month = booked.get(&h.id).copied().unwrap_or_default();
        let total: f64 = by_month.iter().sum();
        println!("  {:<12} {:>12.0} total", h.id, total);
        for (m, tons) in by_month.iter().enumerate() {
            if *tons > 0.0 {
                println!("    month {:>2}: {:>12.0}", m + 1, tons);
            }
        }
    }
    println!();

    println!(
        "trucks+ships generated {} | completed {} | still in system {}",
        env.generated(),
        env.disposed(),
        env.live_entities()
    );

    Ok(())
}
