use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Axis-aligned direction objects are expected to move in when they cross
/// the counting lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountingDirection {
    #[default]
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
}

impl CountingDirection {
    /// Position along the direction of travel, in `[0, 1]` for on-screen points.
    ///
    /// Increases as an object moves the expected way.
    pub fn progress(&self, (x, y): (f32, f32)) -> f32 {
        match self {
            Self::TopToBottom => y,
            Self::BottomToTop => 1.0 - y,
            Self::LeftToRight => x,
            Self::RightToLeft => 1.0 - x,
        }
    }

    /// Splits a displacement into `(along, perpendicular)` components.
    ///
    /// `along` is positive when the displacement follows the direction.
    pub fn decompose(&self, (dx, dy): (f32, f32)) -> (f32, f32) {
        match self {
            Self::TopToBottom => (dy, dx),
            Self::BottomToTop => (-dy, dx),
            Self::LeftToRight => (dx, dy),
            Self::RightToLeft => (-dx, dy),
        }
    }

    /// Threshold positions mapped to progress space, first-met line first.
    pub fn ordered_lines(&self, thresholds: [f32; 2]) -> [f32; 2] {
        let a = self.line_progress(thresholds[0]);
        let b = self.line_progress(thresholds[1]);
        if a <= b { [a, b] } else { [b, a] }
    }

    fn line_progress(&self, threshold: f32) -> f32 {
        match self {
            Self::TopToBottom | Self::LeftToRight => threshold,
            Self::BottomToTop | Self::RightToLeft => 1.0 - threshold,
        }
    }
}

impl FromStr for CountingDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top_to_bottom" | "down" => Ok(Self::TopToBottom),
            "bottom_to_top" | "up" => Ok(Self::BottomToTop),
            "left_to_right" | "right" => Ok(Self::LeftToRight),
            "right_to_left" | "left" => Ok(Self::RightToLeft),
            other => Err(Error::InvalidConfig(format!(
                "unknown counting direction: {other}"
            ))),
        }
    }
}

/// Which way, if any, a line at progress `line` was crossed between two
/// progress values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    Forward,
    Backward,
}

pub fn crossing(line: f32, previous: f32, current: f32) -> Option<Crossing> {
    if previous < line && line <= current {
        Some(Crossing::Forward)
    } else if current < line && line <= previous {
        Some(Crossing::Backward)
    } else {
        None
    }
}
