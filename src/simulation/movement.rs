//! Discrete vehicle advancement and conflict resolution
//!
//! Runs once per tick after signals have updated. Each vehicle either moves
//! one cell along its route or holds in place, gated by a tick-scoped
//! occupancy map and by the signal of any intersection it is about to enter.

use std::collections::HashMap;

use log::debug;

use super::grid_map::GridMap;
use super::types::{Direction, GridPos, VehicleId};
use super::vehicle::Vehicle;

/// Advance every vehicle one tick, removing those that arrive.
/// Returns the number of arrivals this tick.
///
/// The occupancy map is keyed by `(cell, direction of travel)`: one vehicle
/// per approach direction per cell. It is rebuilt from scratch here each tick
/// and never retained, so it cannot go stale. Vehicles resolve in spawn
/// order; when two vehicles contest the same slot in the same tick, the
/// earlier-spawned one wins. That tie-break is a documented behavior, not a
/// fairness guarantee, and vehicle priority scores play no part in it.
pub fn advance_vehicles(vehicles: &mut Vec<Vehicle>, map: &GridMap) -> usize {
    let mut occupied: HashMap<(GridPos, Direction), VehicleId> = HashMap::new();
    for vehicle in vehicles.iter() {
        occupied.insert((vehicle.position, vehicle.heading()), vehicle.id);
    }

    let mut arrived = 0;
    let mut remaining = Vec::with_capacity(vehicles.len());

    for mut vehicle in vehicles.drain(..) {
        // A route already exhausted counts as arrived, covering the
        // start-equals-destination case on first evaluation
        let next_pos = match vehicle.next_waypoint() {
            Some(next) => next,
            None => {
                debug!("Vehicle {:?} arrived at {}", vehicle.id, vehicle.position);
                occupied.remove(&(vehicle.position, vehicle.heading()));
                arrived += 1;
                continue;
            }
        };

        let move_direction = vehicle.position.direction_to(&next_pos);

        // Slot check: blocked if a different vehicle already occupies the
        // candidate cell travelling in the same entry direction
        let mut can_move = match occupied.get(&(next_pos, move_direction)) {
            Some(&other) => other == vehicle.id,
            None => true,
        };

        // Signal check: entering an intersection requires a pass on the
        // movement's axis
        if can_move {
            if let Some(intersection) = map.intersection(next_pos) {
                can_move = intersection.can_pass(move_direction.axis());
            }
        }

        if can_move {
            occupied.remove(&(vehicle.position, move_direction));

            let reached = vehicle.advance();
            vehicle.nudge_progress();

            if reached {
                debug!("Vehicle {:?} arrived at {}", vehicle.id, vehicle.position);
                arrived += 1;
                continue;
            }
            occupied.insert((vehicle.position, move_direction), vehicle.id);
        } else {
            vehicle.hold();
        }

        remaining.push(vehicle);
    }

    *vehicles = remaining;
    arrived
}
