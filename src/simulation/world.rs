//! Main simulation world that ties everything together
//!
//! [`SimWorld`] owns one episode: the generated road grid, the live vehicle
//! set, and the single seeded RNG everything draws from. Stepping runs the
//! fixed order of signals, then vehicle motion, then spawn bookkeeping.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use super::grid_map::GridMap;
use super::movement::advance_vehicles;
use super::policy::ControlPolicy;
use super::signal::{IntersectionDisplay, SignalCommand};
use super::types::{GridPos, VehicleId};
use super::vehicle::{Vehicle, VehicleKind, VehicleState};

/// Probability of attempting a spawn on any given tick (continuous mode)
const VEHICLE_SPAWN_PROB: f64 = 0.15;

/// Probability that a spawned vehicle is an ambulance (continuous mode)
const AMBULANCE_SPAWN_PROB: f64 = 0.02;

/// Initial spawn count range when no fixed count is configured
const INITIAL_VEHICLES_MIN: usize = 3;
const INITIAL_VEHICLES_MAX: usize = 5;

/// Episode configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Logical lattice width and height
    pub width: usize,
    pub height: usize,
    /// Episode seed; the same seed reproduces the same trajectory given the
    /// same external commands
    pub seed: u64,
    /// Tick cap after which an episode is truncated
    pub max_steps: u32,
    /// Spawn exactly this many vehicles up front and never trickle more
    pub fixed_vehicles: Option<usize>,
    /// Skip the autonomous signal update; signals only change through
    /// [`SimWorld::control_intersection`]
    pub override_mode: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            seed: 0,
            max_steps: 300,
            fixed_vehicles: None,
            override_mode: false,
        }
    }
}

/// Result of one simulation step
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub reward: f32,
    /// True once the tick cap has been reached
    pub truncated: bool,
    pub info: StepInfo,
}

/// Per-step bookkeeping snapshot
#[derive(Debug, Clone, Copy)]
pub struct StepInfo {
    pub step: u32,
    pub vehicle_count: usize,
    pub arrived_count: usize,
    pub intersection_count: usize,
    pub total_spawned: usize,
}

/// End-of-episode style summary of the world
#[derive(Debug, Clone, Copy)]
pub struct WorldSummary {
    pub step: u32,
    pub active_vehicles: usize,
    pub arrived_count: usize,
    pub total_spawned: usize,
    pub intersection_count: usize,
    pub success_rate: f32,
}

/// The main simulation world for one episode
pub struct SimWorld {
    config: SimConfig,
    map: GridMap,
    vehicles: Vec<Vehicle>,
    rng: StdRng,
    current_step: u32,
    arrived_count: usize,
    total_spawned: usize,
    next_vehicle_id: usize,
    max_vehicles: usize,
}

impl SimWorld {
    /// Create a world and run the first episode reset
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let map = GridMap::generate(config.width, config.height, &mut rng)
            .context("Road grid generation failed")?;

        let max_vehicles = Self::vehicle_cap(config.width.max(config.height));

        let mut world = Self {
            config,
            map,
            vehicles: Vec::new(),
            rng,
            current_step: 0,
            arrived_count: 0,
            total_spawned: 0,
            next_vehicle_id: 0,
            max_vehicles,
        };
        world.spawn_initial_vehicles();
        Ok(world)
    }

    /// Discard all episode state and regenerate from the configured seed
    pub fn reset(&mut self) -> Result<()> {
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.map = GridMap::generate(self.config.width, self.config.height, &mut self.rng)
            .context("Road grid generation failed")?;
        self.vehicles.clear();
        self.current_step = 0;
        self.arrived_count = 0;
        self.total_spawned = 0;
        self.next_vehicle_id = 0;
        self.spawn_initial_vehicles();
        Ok(())
    }

    /// Vehicle cap scaled to the logical grid size
    fn vehicle_cap(logical_size: usize) -> usize {
        if logical_size <= 5 {
            10
        } else if logical_size <= 11 {
            25
        } else {
            50
        }
    }

    /// Advance the simulation one tick: signals, then motion, then spawning
    pub fn step(&mut self) -> StepOutcome {
        self.current_step += 1;

        if !self.config.override_mode {
            self.map.update_all_intersections(&mut self.rng);
        }

        self.arrived_count += advance_vehicles(&mut self.vehicles, &self.map);

        if self.config.fixed_vehicles.is_none() {
            self.maybe_spawn_vehicle();
        }

        StepOutcome {
            reward: self.calculate_reward(),
            truncated: self.current_step >= self.config.max_steps,
            info: self.info(),
        }
    }

    /// Route an override command to one intersection
    ///
    /// Fails without touching any state when the coordinate does not name an
    /// intersection.
    pub fn control_intersection(&mut self, pos: GridPos, command: SignalCommand) -> Result<()> {
        let intersection = match self.map.intersection_mut(pos) {
            Some(intersection) => intersection,
            None => bail!("Unknown intersection at {}", pos),
        };
        intersection.apply(command, &mut self.rng);
        Ok(())
    }

    /// Let a policy issue this tick's commands from read-only snapshots
    pub fn apply_policy(&mut self, policy: &mut dyn ControlPolicy) {
        let intersections = self.intersection_states();
        let vehicles = self.vehicle_states();
        for (pos, command) in policy.decide(&intersections, &vehicles) {
            // Positions come from the snapshot, so they always resolve
            let _ = self.control_intersection(pos, command);
        }
    }

    /// Spawn a vehicle with a routed path from `start` to `end`
    ///
    /// Fails, spawning nothing, when either endpoint is impassable or no
    /// path exists.
    pub fn spawn_vehicle(
        &mut self,
        start: GridPos,
        end: GridPos,
        kind: VehicleKind,
    ) -> Result<VehicleId> {
        let route = self
            .map
            .find_path(start, end)
            .with_context(|| format!("No route from {} to {}", start, end))?;

        let id = VehicleId(self.next_vehicle_id);
        self.next_vehicle_id += 1;
        self.vehicles.push(Vehicle::new(id, kind, route));
        self.total_spawned += 1;
        debug!("Spawned {:?} {:?}: {} -> {}", kind, id, start, end);
        Ok(id)
    }

    /// Place the episode's initial vehicles on shuffled boundary exits
    ///
    /// Destinations are kept at least `(fine_w + fine_h) / 6` Manhattan
    /// steps from their start where possible, so routes are not trivially
    /// short.
    fn spawn_initial_vehicles(&mut self) {
        let mut boundary = self.map.boundary_cells();
        boundary.shuffle(&mut self.rng);

        let requested = match self.config.fixed_vehicles {
            Some(count) => count,
            None => self
                .rng
                .random_range(INITIAL_VEHICLES_MIN..=INITIAL_VEHICLES_MAX),
        };
        let count = requested.min(boundary.len());

        let min_dist = (self.map.fine_width + self.map.fine_height) / 6;
        let mut used_starts: HashSet<GridPos> = HashSet::new();

        for _ in 0..count {
            let start = match boundary.iter().copied().find(|b| !used_starts.contains(b)) {
                Some(start) => {
                    used_starts.insert(start);
                    start
                }
                None => break,
            };

            let candidates: Vec<GridPos> =
                boundary.iter().copied().filter(|&b| b != start).collect();
            let far_candidates: Vec<GridPos> = candidates
                .iter()
                .copied()
                .filter(|b| b.manhattan_distance(&start) >= min_dist)
                .collect();
            let pool = if far_candidates.is_empty() {
                &candidates
            } else {
                &far_candidates
            };

            let end = match pool.choose(&mut self.rng) {
                Some(&end) => end,
                None => break,
            };

            if self.spawn_vehicle(start, end, VehicleKind::Car).is_err() {
                used_starts.remove(&start);
            }
        }

        info!(
            "Vehicles spawned: {} (requested: {})",
            self.total_spawned, requested
        );
    }

    /// Continuous-mode spawning: one probabilistic attempt per tick, capped
    /// by the size-scaled vehicle limit
    fn maybe_spawn_vehicle(&mut self) {
        if self.vehicles.len() >= self.max_vehicles {
            return;
        }
        if !self.rng.random_bool(VEHICLE_SPAWN_PROB) {
            return;
        }

        let boundary = self.map.boundary_cells();
        if boundary.len() < 2 {
            return;
        }

        // Exclude cells live vehicles occupy or have reserved as destinations
        let mut occupied: HashSet<GridPos> = HashSet::new();
        for vehicle in &self.vehicles {
            occupied.insert(vehicle.position);
            occupied.insert(vehicle.destination());
        }

        let available_starts: Vec<GridPos> = boundary
            .iter()
            .copied()
            .filter(|b| !occupied.contains(b))
            .collect();
        let start = match available_starts.choose(&mut self.rng) {
            Some(&start) => start,
            None => return,
        };

        let min_dist = (self.map.fine_width + self.map.fine_height) / 6;
        let candidates: Vec<GridPos> = boundary
            .iter()
            .copied()
            .filter(|&b| !occupied.contains(&b) && b != start)
            .collect();
        let far_candidates: Vec<GridPos> = candidates
            .iter()
            .copied()
            .filter(|b| b.manhattan_distance(&start) >= min_dist)
            .collect();
        let pool = if far_candidates.is_empty() {
            &candidates
        } else {
            &far_candidates
        };

        let end = match pool.choose(&mut self.rng) {
            Some(&end) => end,
            None => return,
        };

        let kind = if self.rng.random_bool(AMBULANCE_SPAWN_PROB) {
            VehicleKind::Ambulance { siren_on: true }
        } else {
            VehicleKind::Car
        };

        // Routing failure just means nothing spawns this tick
        let _ = self.spawn_vehicle(start, end, kind);
    }

    /// Episodic reward: cumulative arrivals minus a small per-vehicle cost
    fn calculate_reward(&self) -> f32 {
        self.arrived_count as f32 * 0.1 - self.vehicles.len() as f32 * 0.01
    }

    /// Observation vector: `[active, arrived]` followed by the flattened
    /// fine-grid cell values
    pub fn observation(&self) -> Vec<f32> {
        let mut obs = vec![self.vehicles.len() as f32, self.arrived_count as f32];
        obs.extend(self.map.cell_values());
        obs
    }

    pub fn info(&self) -> StepInfo {
        StepInfo {
            step: self.current_step,
            vehicle_count: self.vehicles.len(),
            arrived_count: self.arrived_count,
            intersection_count: self.map.intersection_count(),
            total_spawned: self.total_spawned,
        }
    }

    pub fn summary(&self) -> WorldSummary {
        WorldSummary {
            step: self.current_step,
            active_vehicles: self.vehicles.len(),
            arrived_count: self.arrived_count,
            total_spawned: self.total_spawned,
            intersection_count: self.map.intersection_count(),
            success_rate: if self.total_spawned > 0 {
                self.arrived_count as f32 / self.total_spawned as f32 * 100.0
            } else {
                0.0
            },
        }
    }

    /// Per-intersection display snapshots, in position order
    pub fn intersection_states(&self) -> Vec<IntersectionDisplay> {
        let mut states: Vec<IntersectionDisplay> = self
            .map
            .intersections()
            .values()
            .map(|intersection| intersection.display())
            .collect();
        states.sort_by_key(|display| display.position);
        states
    }

    /// Per-vehicle snapshots, in spawn order
    pub fn vehicle_states(&self) -> Vec<VehicleState> {
        self.vehicles.iter().map(|v| v.state()).collect()
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn arrived_count(&self) -> usize {
        self.arrived_count
    }

    pub fn total_spawned(&self) -> usize {
        self.total_spawned
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let summary = self.summary();
        println!("=== Grid Traffic Summary ===");
        println!("Step: {}", summary.step);
        println!(
            "Grid: {}x{} (fine {}x{}), intersections: {}",
            self.config.width,
            self.config.height,
            self.map.fine_width,
            self.map.fine_height,
            summary.intersection_count
        );
        println!(
            "Vehicles: {} active, {} arrived / {} spawned",
            summary.active_vehicles, summary.arrived_count, summary.total_spawned
        );
    }

    /// Draw the grid with vehicles overlaid in the terminal
    pub fn draw_map(&self) {
        let mut rows: Vec<Vec<char>> = self
            .map
            .to_string()
            .lines()
            .map(|line| line.chars().collect())
            .collect();

        for vehicle in &self.vehicles {
            let glyph = match vehicle.kind {
                VehicleKind::Car => 'C',
                VehicleKind::Ambulance { .. } => 'A',
            };
            let GridPos { x, y } = vehicle.position;
            if y < rows.len() && x < rows[y].len() {
                rows[y][x] = glyph;
            }
        }

        println!("Legend: █=Wall, +=Intersection, C=Car, A=Ambulance");
        for row in rows {
            let line: String = row.into_iter().collect();
            println!("{}", line);
        }
    }
}
