//! Construction-time configuration: monitored zones, bucket resolution, pole exclusion and
//! decoder coverage.

use crate::answers::RPLIDAR_EXPRESS_CABIN_COUNT;
use crate::internals::*;
use crate::obstacle::HandlerId;

/// An angular arc in whole degrees. When `min > max` the arc wraps through 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleArc {
    pub min: u16,
    pub max: u16,
}

impl AngleArc {
    pub fn new(min: u16, max: u16) -> AngleArc {
        AngleArc { min, max }
    }

    /// `true` if the arc crosses 0°.
    #[inline]
    pub fn wraps(&self) -> bool {
        self.min > self.max
    }

    /// Closed-interval membership `[min, max]`, used for zones.
    pub fn contains(&self, angle: u16) -> bool {
        if self.wraps() {
            (angle < 360 && angle >= self.min) || angle <= self.max
        } else {
            angle >= self.min && angle <= self.max
        }
    }

    /// Half-open membership `[min, max)`, used for the pole exclusion.
    pub fn contains_half_open(&self, angle: f32) -> bool {
        let (min, max) = (self.min as f32, self.max as f32);
        if self.wraps() {
            angle >= min || angle < max
        } else {
            angle >= min && angle < max
        }
    }

    /// Arc length in degrees.
    pub fn span(&self) -> u16 {
        if self.wraps() {
            self.max + 360 - self.min
        } else {
            self.max - self.min
        }
    }
}

/// A monitored obstacle zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Direction label, e.g. "front".
    pub direction: String,
    /// Arc covered by the zone, both ends inclusive.
    pub arc: AngleArc,
    /// Anything closer than this (mm) stops.
    pub stop_distance: u32,
    /// Anything closer than this (mm) warns.
    pub warn_distance: u32,
    /// Handler invoked on state transitions.
    pub handler: Option<HandlerId>,
}

impl Zone {
    /// Creates a zone without a handler.
    pub fn new(
        direction: &str,
        theta_min: u16,
        theta_max: u16,
        stop_distance: u32,
        warn_distance: u32,
    ) -> Zone {
        Zone {
            direction: direction.to_owned(),
            arc: AngleArc::new(theta_min, theta_max),
            stop_distance,
            warn_distance,
            handler: None,
        }
    }

    /// Attaches the handler invoked on this zone's transitions.
    pub fn with_handler(mut self, handler: HandlerId) -> Zone {
        self.handler = Some(handler);
        self
    }

    /// Arc length in buckets of `1 << resolution_shift` degrees.
    pub fn bucket_span(&self, resolution_shift: u8) -> usize {
        self.arc.span().checked_shr(resolution_shift as u32).unwrap_or(0) as usize
    }
}

/// Configuration of a `LidarNode`.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarConfig {
    /// Serial port identifier. Opening the port is left to the caller; this is used for logging.
    pub port: String,
    /// Monitored zones, fixed for the node's lifetime.
    pub zones: Vec<Zone>,
    /// Buckets are `1 << resolution_shift` degrees wide.
    pub resolution_shift: u8,
    /// Arc hidden by the mounting pole; samples inside it are dropped.
    pub pole_exclusion: Option<AngleArc>,
    /// Invoke avoidance handlers on transitions.
    pub collision_stop: bool,
    /// Number of cabins decoded from each express payload.
    pub cabins_per_payload: usize,
    /// Capacity of the receive ring buffer in bytes.
    pub read_buffer_size: usize,
}

impl LidarConfig {
    /// Stock configuration for `port`: front and back zones, 4° buckets, collision stop on.
    pub fn with_port(port: &str) -> LidarConfig {
        LidarConfig {
            port: port.to_owned(),
            ..LidarConfig::default()
        }
    }

    /// Replaces the zone list.
    pub fn with_zones(mut self, zones: Vec<Zone>) -> LidarConfig {
        self.zones = zones;
        self
    }

    /// Sets the bucket width to `1 << resolution_shift` degrees, clamped to
    /// `0..=LIDAR_MAX_RESOLUTION_SHIFT`.
    pub fn with_resolution_shift(mut self, resolution_shift: u8) -> LidarConfig {
        self.resolution_shift = resolution_shift.min(LIDAR_MAX_RESOLUTION_SHIFT);
        self
    }

    /// Hides the half-open arc `[pole_min, pole_max)` from decoding and zone verification.
    pub fn with_pole_exclusion(mut self, pole_min: u16, pole_max: u16) -> LidarConfig {
        self.pole_exclusion = Some(AngleArc::new(pole_min, pole_max));
        self
    }

    /// Enables or disables avoidance handler invocation.
    pub fn with_collision_stop(mut self, enabled: bool) -> LidarConfig {
        self.collision_stop = enabled;
        self
    }

    /// Sets decoder coverage; clamped to `1..=16` cabins.
    pub fn with_cabins_per_payload(mut self, cabins: usize) -> LidarConfig {
        self.cabins_per_payload = cabins.clamp(1, RPLIDAR_EXPRESS_CABIN_COUNT);
        self
    }

    /// Sets the receive buffer capacity. `LidarNode` raises anything below two express
    /// payloads to that minimum.
    pub fn with_read_buffer_size(mut self, size: usize) -> LidarConfig {
        self.read_buffer_size = size;
        self
    }

    /// The zone layout used when none is given: front 155–205°, back 345–15°.
    pub fn default_zones() -> Vec<Zone> {
        vec![
            Zone::new("front", 155, 205, 750, 1250).with_handler(HandlerId::FrontStop),
            Zone::new("back", 345, 15, 850, 1350).with_handler(HandlerId::BackStop),
        ]
    }
}

impl Default for LidarConfig {
    fn default() -> LidarConfig {
        LidarConfig {
            port: LIDAR_DEFAULT_PORT.to_owned(),
            zones: LidarConfig::default_zones(),
            resolution_shift: LIDAR_DEFAULT_RESOLUTION_SHIFT,
            pole_exclusion: None,
            collision_stop: true,
            cabins_per_payload: LIDAR_DEFAULT_CABINS_PER_PAYLOAD,
            read_buffer_size: LIDAR_DEFAULT_READ_BUFFER_SIZE,
        }
    }
}
