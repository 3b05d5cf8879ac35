use std::fmt;

/// Longest distance the sensor reports, in millimeters. A raw distance of 0 ("no return")
/// is recorded as this value.
pub const MAX_RANGE_MM: u32 = 8000;

/// A single decoded measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Angle in degrees, in `[0, 360)`.
    pub angle: f32,
    /// Distance in millimeters.
    pub distance: u32,
}

impl Sample {
    /// Builds a sample from a decoded angle and raw distance.
    ///
    /// The angle is wrapped into `[0, 360)` and a raw distance of 0 becomes `MAX_RANGE_MM`.
    pub fn new(angle: f32, raw_distance: u32) -> Sample {
        let mut angle = angle.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        if angle >= 360.0 {
            angle = 0.0;
        }
        let distance = if raw_distance == 0 {
            MAX_RANGE_MM
        } else {
            raw_distance
        };
        Sample { angle, distance }
    }

    /// Whole-degree angle used for bucketing and zone membership.
    #[inline]
    pub fn whole_degrees(&self) -> u16 {
        self.angle as u16
    }
}

/// Samples decoded from one inbound chunk, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBatch {
    pub samples: Vec<Sample>,
}

impl SampleBatch {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Hazard level of one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum ObstacleState {
    /// Nothing within the warning distance.
    #[default]
    Clear = 0,
    /// Something inside the warning distance.
    Warning = 1,
    /// Something inside the stop distance.
    Stop = 2,
}

impl ObstacleState {
    /// Numeric level handed to avoidance handlers (0 clear, 1 warning, 2 stop).
    #[inline]
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ObstacleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObstacleState::Clear => write!(f, "clear"),
            ObstacleState::Warning => write!(f, "warning"),
            ObstacleState::Stop => write!(f, "stop"),
        }
    }
}

/// A zone changed state between two processing cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTransition {
    /// Index of the zone in the configured zone list.
    pub zone: usize,
    /// Direction label of the zone.
    pub direction: String,
    /// State before this cycle.
    pub previous: ObstacleState,
    /// State after this cycle.
    pub state: ObstacleState,
}
