//! Vehicles and priority scoring
//!
//! Vehicles come in two variants that share all movement state and differ
//! only in a few constants and the wait-time-to-priority formula, so they are
//! a tagged enum rather than trait objects.

use super::types::{Direction, GridPos, VehicleId};

/// Sub-cell movement per tick for an ordinary car, rendering only
pub const CAR_SPEED: f32 = 0.25;

/// Sub-cell movement per tick for an ambulance, rendering only
pub const AMBULANCE_SPEED: f32 = 0.30;

const CAR_PRIORITY_WEIGHT: i32 = 1;
const AMBULANCE_PRIORITY_WEIGHT: i32 = 5;
const SIREN_PRIORITY_BONUS: i32 = 10;
const AMBULANCE_WAIT_MULTIPLIER: i32 = 2;
const CAR_WAIT_DIVISOR: i32 = 10;

/// The vehicle variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleKind {
    Car,
    Ambulance { siren_on: bool },
}

impl VehicleKind {
    pub fn speed(&self) -> f32 {
        match self {
            VehicleKind::Car => CAR_SPEED,
            VehicleKind::Ambulance { .. } => AMBULANCE_SPEED,
        }
    }

    /// Priority score for a given accumulated wait time
    ///
    /// Exposed for inspection and external control policies; the motion
    /// engine itself never consults it (see the crate-level docs on the
    /// spawn-order tie-break).
    pub fn priority(&self, wait_ticks: i32) -> i32 {
        match self {
            VehicleKind::Car => CAR_PRIORITY_WEIGHT + wait_ticks / CAR_WAIT_DIVISOR,
            VehicleKind::Ambulance { siren_on } => {
                let siren_bonus = if *siren_on { SIREN_PRIORITY_BONUS } else { 0 };
                AMBULANCE_PRIORITY_WEIGHT + siren_bonus + wait_ticks * AMBULANCE_WAIT_MULTIPLIER
            }
        }
    }
}

/// A vehicle following a precomputed route across the grid
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub kind: VehicleKind,
    /// Current fine-grid cell, always a passable cell
    pub position: GridPos,
    /// Fraction of the way into the current cell; rendering only, never
    /// consulted by movement logic
    pub progress: f32,
    /// Ticks spent blocked since the last successful advance
    pub wait_ticks: i32,
    /// Immutable shortest-path route including the spawn cell
    route: Vec<GridPos>,
    /// Index of the current cell within the route
    cursor: usize,
}

impl Vehicle {
    /// Create a vehicle at the start of `route`
    ///
    /// The route must be non-empty; its first cell is the spawn position and
    /// its last cell is the destination.
    pub fn new(id: VehicleId, kind: VehicleKind, route: Vec<GridPos>) -> Self {
        debug_assert!(!route.is_empty(), "a vehicle route needs at least one cell");
        let position = route[0];
        Self {
            id,
            kind,
            position,
            progress: 0.0,
            wait_ticks: 0,
            route,
            cursor: 0,
        }
    }

    pub fn route(&self) -> &[GridPos] {
        &self.route
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn destination(&self) -> GridPos {
        *self.route.last().expect("routes are never empty")
    }

    /// The next cell on the route, if any remains
    pub fn next_waypoint(&self) -> Option<GridPos> {
        self.route.get(self.cursor + 1).copied()
    }

    /// Whether the vehicle sits on the final route cell
    pub fn at_destination(&self) -> bool {
        self.cursor + 1 >= self.route.len()
    }

    /// Direction of travel towards the next waypoint, defaulting to north
    /// when the route is exhausted
    pub fn heading(&self) -> Direction {
        match self.next_waypoint() {
            Some(next) => self.position.direction_to(&next),
            None => Direction::North,
        }
    }

    /// Advance one cell along the route, resetting the wait counter.
    /// Returns true when the destination has been reached.
    pub fn advance(&mut self) -> bool {
        if let Some(next) = self.next_waypoint() {
            self.cursor += 1;
            self.position = next;
            self.progress = 0.0;
            self.wait_ticks = 0;
        }
        self.at_destination()
    }

    /// Record one tick spent blocked in place
    pub fn hold(&mut self) {
        self.wait_ticks += 1;
    }

    /// Nudge the rendering-only progress fraction for this tick
    pub fn nudge_progress(&mut self) {
        self.progress = (self.progress + self.kind.speed()).min(1.0);
    }

    pub fn priority(&self) -> i32 {
        self.kind.priority(self.wait_ticks)
    }

    /// Read-only snapshot for observers and control policies
    pub fn state(&self) -> VehicleState {
        VehicleState {
            id: self.id,
            kind: self.kind,
            position: self.position,
            destination: self.destination(),
            direction: self.heading(),
            wait_ticks: self.wait_ticks,
            priority: self.priority(),
        }
    }
}

/// Read-only snapshot of one vehicle
#[derive(Debug, Clone, Copy)]
pub struct VehicleState {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub position: GridPos,
    pub destination: GridPos,
    pub direction: Direction,
    pub wait_ticks: i32,
    pub priority: i32,
}
