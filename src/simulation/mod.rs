//! Standalone traffic simulation module
//!
//! This module contains all the core traffic simulation logic: procedural
//! road-grid generation, shortest-path routing, traffic-light state machines
//! and discrete vehicle movement. Everything runs headless and is driven one
//! tick at a time via [`SimWorld`].

mod grid_map;
mod movement;
mod noise;
mod policy;
mod signal;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use grid_map::{GridCell, GridMap};
#[allow(unused_imports)]
pub use movement::advance_vehicles;
#[allow(unused_imports)]
pub use noise::PerlinNoise;
#[allow(unused_imports)]
pub use policy::{ControlPolicy, HoldPolicy, QueuePressurePolicy};
#[allow(unused_imports)]
pub use signal::{
    Intersection, IntersectionDisplay, LightDisplay, LightState, SignalCommand, TrafficLight,
    GREEN_TIME_MAX, GREEN_TIME_MIN, RED_TIME_SENTINEL, YELLOW_NO_PASS_THRESHOLD, YELLOW_TIME,
};
#[allow(unused_imports)]
pub use types::{Axis, Direction, GridPos, VehicleId};
#[allow(unused_imports)]
pub use vehicle::{Vehicle, VehicleKind, VehicleState, AMBULANCE_SPEED, CAR_SPEED};
#[allow(unused_imports)]
pub use world::{SimConfig, StepInfo, StepOutcome, WorldSummary};
pub use world::SimWorld;
