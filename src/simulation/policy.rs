//! Pluggable signal-control policies
//!
//! When the world runs in override mode, the autonomous signal update is
//! skipped and a [`ControlPolicy`] decides the commands for each tick
//! instead. These are thin stubs; the interesting controllers live outside
//! this crate.

use ordered_float::OrderedFloat;

use super::signal::{IntersectionDisplay, SignalCommand};
use super::types::{Axis, GridPos};
use super::vehicle::VehicleState;

/// A per-tick decision function over intersection and vehicle snapshots
///
/// Implementations return at most one command per intersection; omitted
/// intersections are left untouched for the tick.
pub trait ControlPolicy {
    fn decide(
        &mut self,
        intersections: &[IntersectionDisplay],
        vehicles: &[VehicleState],
    ) -> Vec<(GridPos, SignalCommand)>;
}

/// Leaves every signal untouched
#[derive(Debug, Default)]
pub struct HoldPolicy;

impl ControlPolicy for HoldPolicy {
    fn decide(
        &mut self,
        intersections: &[IntersectionDisplay],
        _vehicles: &[VehicleState],
    ) -> Vec<(GridPos, SignalCommand)> {
        intersections
            .iter()
            .map(|display| (display.position, SignalCommand::Hold))
            .collect()
    }
}

/// Grants green to the axis with the higher mean waiting-vehicle priority
///
/// A vehicle counts towards an intersection when that intersection is its
/// next waypoint. Ties and empty approaches hold the current state.
#[derive(Debug, Default)]
pub struct QueuePressurePolicy;

impl QueuePressurePolicy {
    fn axis_pressure(
        position: GridPos,
        axis: Axis,
        vehicles: &[VehicleState],
    ) -> Option<OrderedFloat<f32>> {
        let priorities: Vec<i32> = vehicles
            .iter()
            .filter(|v| v.direction.axis() == axis && Self::approaches(v, position))
            .map(|v| v.priority)
            .collect();
        if priorities.is_empty() {
            return None;
        }
        let total: i32 = priorities.iter().sum();
        Some(OrderedFloat(total as f32 / priorities.len() as f32))
    }

    fn approaches(vehicle: &VehicleState, position: GridPos) -> bool {
        vehicle.position.manhattan_distance(&position) == 1
    }
}

impl ControlPolicy for QueuePressurePolicy {
    fn decide(
        &mut self,
        intersections: &[IntersectionDisplay],
        vehicles: &[VehicleState],
    ) -> Vec<(GridPos, SignalCommand)> {
        intersections
            .iter()
            .map(|display| {
                let ns = Self::axis_pressure(display.position, Axis::NorthSouth, vehicles);
                let ew = Self::axis_pressure(display.position, Axis::EastWest, vehicles);
                let command = match (ns, ew) {
                    (Some(ns), Some(ew)) if ns > ew => SignalCommand::NsGreen,
                    (Some(ns), Some(ew)) if ew > ns => SignalCommand::EwGreen,
                    (Some(_), None) => SignalCommand::NsGreen,
                    (None, Some(_)) => SignalCommand::EwGreen,
                    _ => SignalCommand::Hold,
                };
                (display.position, command)
            })
            .collect()
    }
}
