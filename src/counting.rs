//! Rules deciding when a track has crossed the counting lines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    direction::{Crossing, crossing},
    error::Error,
};

/// Which line crossings make an object count.
///
/// All crossings are evaluated in progress space, where the first line is the
/// one an object moving the expected way meets first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountingPolicy {
    /// A forward crossing of either line.
    AnyLine,
    /// A forward crossing of the first line.
    FirstLine,
    /// A forward crossing of the second line.
    SecondLine,
    /// A forward crossing of the second line after the first one was crossed
    /// forward. Crossing the first line backwards disarms the track again.
    #[default]
    BothLinesInOrder,
}

impl FromStr for CountingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any_line" => Ok(Self::AnyLine),
            "first_line" => Ok(Self::FirstLine),
            "second_line" => Ok(Self::SecondLine),
            "both_lines_in_order" => Ok(Self::BothLinesInOrder),
            other => Err(Error::InvalidConfig(format!(
                "unknown counting policy: {other}"
            ))),
        }
    }
}

/// Per-track progress through the counting lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CrossingState {
    passed_first: bool,
    pending: bool,
}

impl CrossingState {
    pub fn passed_first(&self) -> bool {
        self.passed_first
    }

    /// A completed crossing that has not been settled yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Feeds one movement from `previous` to `current` progress and returns
    /// whether it completes a crossing under `policy`.
    ///
    /// A completed crossing stays pending until [`CrossingState::settle`];
    /// crossing the first line backwards withdraws it.
    pub fn advance(
        &mut self,
        policy: CountingPolicy,
        lines: [f32; 2],
        previous: f32,
        current: f32,
    ) -> bool {
        let first = crossing(lines[0], previous, current);
        let second = crossing(lines[1], previous, current);

        match first {
            Some(Crossing::Forward) => self.passed_first = true,
            Some(Crossing::Backward) => {
                self.passed_first = false;
                self.pending = false;
            }
            None => {}
        }

        let first_forward = first == Some(Crossing::Forward);
        let second_forward = second == Some(Crossing::Forward);

        let completed = match policy {
            CountingPolicy::AnyLine => first_forward || second_forward,
            CountingPolicy::FirstLine => first_forward,
            CountingPolicy::SecondLine => second_forward,
            CountingPolicy::BothLinesInOrder => second_forward && self.passed_first,
        };
        self.pending |= completed;
        completed
    }

    pub fn settle(&mut self) {
        self.pending = false;
    }

    pub fn reset(&mut self) {
        self.passed_first = false;
        self.pending = false;
    }
}
