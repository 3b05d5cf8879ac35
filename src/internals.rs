/// Port used when none is configured.
pub const LIDAR_DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default capacity of the receive ring buffer.
pub const LIDAR_DEFAULT_READ_BUFFER_SIZE: usize = 2048;

/// Smallest receive buffer accepted: two express payloads.
pub const LIDAR_MIN_READ_BUFFER_SIZE: usize = 2 * crate::answers::RPLIDAR_EXPRESS_CAPSULE_SIZE;

/// Default bucket width is `1 << 2` = 4 degrees.
pub const LIDAR_DEFAULT_RESOLUTION_SHIFT: u8 = 2;

/// Widest bucket accepted, `1 << 8` = 256 degrees: two buckets per revolution.
pub const LIDAR_MAX_RESOLUTION_SHIFT: u8 = 8;

/// Cabins decoded per express payload by default (the whole payload).
pub const LIDAR_DEFAULT_CABINS_PER_PAYLOAD: usize = crate::answers::RPLIDAR_EXPRESS_CABIN_COUNT;

/// PWM applied by `start_motor()`.
pub const LIDAR_DEFAULT_MOTOR_PWM: u16 = 660;

/// Capacity of the notification channel. Events are dropped, not queued, beyond it.
pub const LIDAR_EVENT_CHANNEL_CAPACITY: usize = 1024;
