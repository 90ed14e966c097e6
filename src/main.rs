mod simulation;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use simulation::{ControlPolicy, HoldPolicy, QueuePressurePolicy, SimConfig, SimWorld};

/// Logical grid size presets
#[derive(Debug, Clone, Copy, ValueEnum)]
enum GridSize {
    /// 5x5 logical grid
    Small,
    /// 11x11 logical grid
    Medium,
    /// 21x21 logical grid
    Large,
}

impl GridSize {
    fn logical(self) -> usize {
        match self {
            GridSize::Small => 5,
            GridSize::Medium => 11,
            GridSize::Large => 21,
        }
    }
}

#[derive(Parser)]
#[command(name = "grid_traffic")]
#[command(about = "Traffic simulation on a procedurally generated road grid")]
struct Cli {
    /// Grid size preset
    #[arg(long, value_enum, default_value = "small")]
    size: GridSize,

    /// Number of vehicles to spawn up front (fixed-vehicle mode)
    #[arg(long)]
    vehicles: Option<usize>,

    /// Episode seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of simulation ticks
    #[arg(long, default_value = "300")]
    ticks: u32,

    /// Drive the signals with the queue-pressure policy instead of the
    /// autonomous cycle
    #[arg(long)]
    policy: bool,

    /// Print the world map every this many ticks (0 disables)
    #[arg(long, default_value = "50")]
    map_interval: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let logical = cli.size.logical();
    let seed = cli.seed.unwrap_or_else(rand::random);
    let vehicles = cli
        .vehicles
        .unwrap_or_else(|| (logical / 2).max(5));

    let config = SimConfig {
        width: logical,
        height: logical,
        seed,
        max_steps: cli.ticks,
        fixed_vehicles: Some(vehicles),
        override_mode: cli.policy,
    };

    println!("============================================================");
    println!(
        "Grid Traffic - {}x{} (fine {}x{})",
        logical,
        logical,
        logical * 2 + 1,
        logical * 2 + 1
    );
    println!(
        "Mode: {}",
        if cli.policy { "POLICY" } else { "AUTONOMOUS" }
    );
    println!("Seed: {}, vehicles: {}, tick cap: {}", seed, vehicles, cli.ticks);
    println!("============================================================");

    let mut world = SimWorld::new(config)?;
    let mut policy: Box<dyn ControlPolicy> = if cli.policy {
        Box::new(QueuePressurePolicy)
    } else {
        Box::new(HoldPolicy)
    };

    println!("\nInitial state:");
    world.print_summary();
    world.draw_map();

    loop {
        if cli.policy {
            world.apply_policy(policy.as_mut());
        }
        let outcome = world.step();

        if cli.map_interval > 0 && world.current_step() % cli.map_interval == 0 {
            println!("\n--- After tick {} ---", world.current_step());
            world.print_summary();
            world.draw_map();
        }

        if outcome.info.vehicle_count == 0 || outcome.truncated {
            break;
        }
    }

    let summary = world.summary();
    println!("\n============================================================");
    println!("SIMULATION COMPLETE");
    println!("============================================================");
    println!("Total ticks: {}", summary.step);
    println!(
        "Vehicles arrived: {} / {}",
        summary.arrived_count, summary.total_spawned
    );
    println!("Active vehicles: {}", summary.active_vehicles);
    println!("Total intersections: {}", summary.intersection_count);
    println!("Success rate: {:.1}%", summary.success_rate);
    println!("============================================================");

    Ok(())
}
