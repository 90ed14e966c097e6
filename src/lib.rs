//! Grid Traffic Simulation Library
//!
//! A seedable traffic simulation over a procedurally generated maze-like road
//! grid, with per-intersection traffic lights that can run autonomously or be
//! driven by an external controller.

pub mod simulation;
