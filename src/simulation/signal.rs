//! Traffic-light state machines
//!
//! Each intersection owns a pair of lights, one per traffic axis. In
//! autonomous mode the pair runs a coupled countdown cycle; in override mode
//! an external controller issues [`SignalCommand`]s instead.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Error};
use rand::rngs::StdRng;
use rand::Rng;

use super::types::{Axis, GridPos};

/// Green phase duration is drawn uniformly from this range, in ticks
pub const GREEN_TIME_MIN: i32 = 10;
pub const GREEN_TIME_MAX: i32 = 20;

/// Fixed yellow phase duration, in ticks
pub const YELLOW_TIME: i32 = 2;

/// Countdown assigned to a RED light; it never expires on its own because
/// the autonomous update only ticks the green/yellow axis
pub const RED_TIME_SENTINEL: i32 = 999;

/// A yellow light with this many ticks or fewer remaining no longer admits
/// vehicles (models "don't enter on late yellow")
pub const YELLOW_NO_PASS_THRESHOLD: i32 = 1;

/// Randomized desynchronization offset applied to freshly built intersections
const INITIAL_OFFSET_MAX: i32 = 20;

/// State of a single signal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Red,
    Yellow,
    Green,
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightState::Red => write!(f, "red"),
            LightState::Yellow => write!(f, "yellow"),
            LightState::Green => write!(f, "green"),
        }
    }
}

/// One axis of a traffic signal: a state plus a countdown in ticks
#[derive(Debug, Clone)]
pub struct TrafficLight {
    state: LightState,
    timer: i32,
}

impl TrafficLight {
    pub fn new(initial_state: LightState, rng: &mut StdRng) -> Self {
        let timer = Self::duration_for(initial_state, rng);
        Self {
            state: initial_state,
            timer,
        }
    }

    fn duration_for(state: LightState, rng: &mut StdRng) -> i32 {
        match state {
            LightState::Green => rng.random_range(GREEN_TIME_MIN..=GREEN_TIME_MAX),
            LightState::Yellow => YELLOW_TIME,
            LightState::Red => RED_TIME_SENTINEL,
        }
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn timer(&self) -> i32 {
        self.timer
    }

    pub fn is_green(&self) -> bool {
        self.state == LightState::Green
    }

    pub fn is_yellow(&self) -> bool {
        self.state == LightState::Yellow
    }

    pub fn is_red(&self) -> bool {
        self.state == LightState::Red
    }

    /// Whether a vehicle may currently enter on this axis
    pub fn can_pass(&self) -> bool {
        match self.state {
            LightState::Green => true,
            LightState::Yellow => self.timer > YELLOW_NO_PASS_THRESHOLD,
            LightState::Red => false,
        }
    }

    /// Enter a new state and start its countdown
    pub fn set_state(&mut self, new_state: LightState, rng: &mut StdRng) {
        self.state = new_state;
        self.timer = Self::duration_for(new_state, rng);
    }

    /// Used by the autonomous update to keep the RED axis's displayed
    /// countdown tracking its sibling
    fn pin_timer(&mut self, ticks: i32) {
        self.timer = ticks;
    }

    /// Decrement the countdown by one tick, advancing the state on expiry.
    /// Returns true when the state changed.
    pub fn tick(&mut self, rng: &mut StdRng) -> bool {
        self.timer -= 1;
        if self.timer <= 0 {
            let next = match self.state {
                LightState::Green => LightState::Yellow,
                LightState::Yellow => LightState::Red,
                LightState::Red => LightState::Green,
            };
            self.set_state(next, rng);
            return true;
        }
        false
    }

    pub fn display(&self) -> LightDisplay {
        LightDisplay {
            state: self.state,
            timer: self.timer,
            can_pass: self.can_pass(),
        }
    }
}

/// Read-only snapshot of one signal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightDisplay {
    pub state: LightState,
    pub timer: i32,
    pub can_pass: bool,
}

/// An override command for a single intersection
///
/// Issued by an external controller while the autonomous update is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCommand {
    /// Flip whichever axis holds green/yellow to red, green the other
    Toggle,
    NsGreen,
    EwGreen,
    NsYellow,
    EwYellow,
    /// Leave the signal untouched
    Hold,
}

impl FromStr for SignalCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toggle" => Ok(SignalCommand::Toggle),
            "ns_green" => Ok(SignalCommand::NsGreen),
            "ew_green" => Ok(SignalCommand::EwGreen),
            "ns_yellow" => Ok(SignalCommand::NsYellow),
            "ew_yellow" => Ok(SignalCommand::EwYellow),
            "hold" => Ok(SignalCommand::Hold),
            other => bail!("No such signal command: {:?}", other),
        }
    }
}

/// A signalized intersection: paired north-south and east-west lights
///
/// Invariant: outside the single tick where a hand-off occurs, at most one
/// axis is green or yellow while the other is red.
#[derive(Debug, Clone)]
pub struct Intersection {
    pub position: GridPos,
    light_ns: TrafficLight,
    light_ew: TrafficLight,
}

impl Intersection {
    /// Build an intersection with a randomized initial phase assignment and
    /// countdown offset, desynchronizing it from its neighbors
    pub fn new(position: GridPos, rng: &mut StdRng) -> Self {
        let (mut light_ns, mut light_ew) = if rng.random_bool(0.5) {
            (
                TrafficLight::new(LightState::Green, rng),
                TrafficLight::new(LightState::Red, rng),
            )
        } else {
            (
                TrafficLight::new(LightState::Red, rng),
                TrafficLight::new(LightState::Green, rng),
            )
        };

        let offset = rng.random_range(0..=INITIAL_OFFSET_MAX);
        light_ns.pin_timer((light_ns.timer - offset).max(1));
        light_ew.pin_timer((light_ew.timer - offset).max(1));

        Self {
            position,
            light_ns,
            light_ew,
        }
    }

    pub fn light(&self, axis: Axis) -> &TrafficLight {
        match axis {
            Axis::NorthSouth => &self.light_ns,
            Axis::EastWest => &self.light_ew,
        }
    }

    /// Whether a vehicle may currently enter this intersection on `axis`
    pub fn can_pass(&self, axis: Axis) -> bool {
        self.light(axis).can_pass()
    }

    /// Autonomous per-tick update
    ///
    /// The red axis's countdown is resynchronized to its sibling so its
    /// displayed time-to-green stays meaningful, then the green/yellow axis
    /// ticks down. When it drops to red, the sibling is granted green.
    pub fn update(&mut self, rng: &mut StdRng) {
        if self.light_ns.is_red() && self.light_ew.is_green() {
            self.light_ns.pin_timer(self.light_ew.timer + YELLOW_TIME);
        } else if self.light_ns.is_red() && self.light_ew.is_yellow() {
            self.light_ns.pin_timer(self.light_ew.timer);
        }
        if self.light_ew.is_red() && self.light_ns.is_green() {
            self.light_ew.pin_timer(self.light_ns.timer + YELLOW_TIME);
        } else if self.light_ew.is_red() && self.light_ns.is_yellow() {
            self.light_ew.pin_timer(self.light_ns.timer);
        }

        if !self.light_ns.is_red() {
            let changed = self.light_ns.tick(rng);
            if changed && self.light_ns.is_red() {
                self.light_ew.set_state(LightState::Green, rng);
            }
        } else if !self.light_ew.is_red() {
            let changed = self.light_ew.tick(rng);
            if changed && self.light_ew.is_red() {
                self.light_ns.set_state(LightState::Green, rng);
            }
        } else {
            // Both red, e.g. right after an external override; restart the cycle
            self.light_ns.set_state(LightState::Green, rng);
        }
    }

    /// Apply an override command, bypassing the autonomous cycle
    pub fn apply(&mut self, command: SignalCommand, rng: &mut StdRng) {
        match command {
            SignalCommand::Toggle => self.toggle(rng),
            SignalCommand::NsGreen => {
                self.light_ns.set_state(LightState::Green, rng);
                self.light_ew.set_state(LightState::Red, rng);
            }
            SignalCommand::EwGreen => {
                self.light_ns.set_state(LightState::Red, rng);
                self.light_ew.set_state(LightState::Green, rng);
            }
            SignalCommand::NsYellow => {
                self.light_ns.set_state(LightState::Yellow, rng);
                self.light_ew.set_state(LightState::Red, rng);
            }
            SignalCommand::EwYellow => {
                self.light_ns.set_state(LightState::Red, rng);
                self.light_ew.set_state(LightState::Yellow, rng);
            }
            SignalCommand::Hold => {}
        }
    }

    /// Flip whichever axis holds green/yellow to red and green the other
    fn toggle(&mut self, rng: &mut StdRng) {
        if !self.light_ns.is_red() {
            self.light_ns.set_state(LightState::Red, rng);
            self.light_ew.set_state(LightState::Green, rng);
        } else {
            self.light_ew.set_state(LightState::Red, rng);
            self.light_ns.set_state(LightState::Green, rng);
        }
    }

    /// Read-only snapshot of both axes for observers and controllers
    pub fn display(&self) -> IntersectionDisplay {
        IntersectionDisplay {
            position: self.position,
            ns: self.light_ns.display(),
            ew: self.light_ew.display(),
        }
    }
}

/// Read-only snapshot of an intersection's signal state
#[derive(Debug, Clone, Copy)]
pub struct IntersectionDisplay {
    pub position: GridPos,
    pub ns: LightDisplay,
    pub ew: LightDisplay,
}
