use crate::answers::{
    AnswerDescriptor, RPLIDAR_ANS_TYPE_DEVHEALTH, RPLIDAR_ANS_TYPE_DEVINFO,
    RPLIDAR_ANS_TYPE_MEASUREMENT, RPLIDAR_ANS_TYPE_MEASUREMENT_CAPSULED,
    RPLIDAR_ANS_TYPE_SAMPLERATE, RPLIDAR_EXPRESS_CAPSULE_SIZE,
};
use byteorder::{ByteOrder, LittleEndian};

// Commands without payload and response

/// Command code to stop the measurement process of the LIDAR and enter idle state.
pub const RPLIDAR_CMD_STOP: u8 = 0x25;

/// Command code to start a scan in the legacy (slow, ~2k samples/s) mode.
pub const RPLIDAR_CMD_SCAN: u8 = 0x20;

/// Command code to start a forced scan, ignoring the rotation speed.
pub const RPLIDAR_CMD_FORCE_SCAN: u8 = 0x21;

/// Command code to reset the LIDAR core.
pub const RPLIDAR_CMD_RESET: u8 = 0x40;

// Commands without payload but have response

/// Command code to request device information (model, firmware, hardware, serial number).
pub const RPLIDAR_CMD_GET_DEVICE_INFO: u8 = 0x50;

/// Command code to request the device's health status.
pub const RPLIDAR_CMD_GET_DEVICE_HEALTH: u8 = 0x52;

/// Command code to request the sampling period of the scan modes.
pub const RPLIDAR_CMD_GET_SAMPLERATE: u8 = 0x59;

// Commands with payload

/// Command code to start an express scan (~4k samples/s, capsuled answers).
pub const RPLIDAR_CMD_EXPRESS_SCAN: u8 = 0x82;

/// Command code to set the motor PWM duty cycle. Payload is a u16 little-endian value.
pub const RPLIDAR_CMD_SET_MOTOR_PWM: u8 = 0xF0;

/// Highest duty cycle accepted by the motor controller (10-bit).
pub const RPLIDAR_MAX_MOTOR_PWM: u16 = 1023;

/// Payload structure for the `RPLIDAR_CMD_EXPRESS_SCAN` command.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RplidarPayloadExpressScan {
    /// The requested working mode ID. 0 is the legacy express mode.
    pub work_mode: u8,

    /// Reserved flags. Should be set to 0.
    pub work_flags: u16,

    /// Reserved parameter. Should be set to 0.
    pub param: u16,
}

impl RplidarPayloadExpressScan {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 5;

    /// Serializes the payload as it goes on the wire.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[0] = self.work_mode;
        LittleEndian::write_u16(&mut bytes[1..3], self.work_flags);
        LittleEndian::write_u16(&mut bytes[3..5], self.param);
        bytes
    }
}

/// Builds the 2-byte little-endian PWM payload, clamping the duty cycle to 10 bits.
pub fn motor_pwm_payload(pwm: u16) -> [u8; 2] {
    let mut payload = [0; 2];
    LittleEndian::write_u16(&mut payload, pwm.min(RPLIDAR_MAX_MOTOR_PWM));
    payload
}

/// Descriptor the device is expected to answer with for a given request.
///
/// Commands that never produce a descriptor (stop, reset, PWM) return `None`.
pub fn expected_descriptor(cmd: u8) -> Option<AnswerDescriptor> {
    let (payload_length, send_mode, data_type) = match cmd {
        RPLIDAR_CMD_SCAN | RPLIDAR_CMD_FORCE_SCAN => (5, 1, RPLIDAR_ANS_TYPE_MEASUREMENT),
        RPLIDAR_CMD_EXPRESS_SCAN => (
            RPLIDAR_EXPRESS_CAPSULE_SIZE as u32,
            1,
            RPLIDAR_ANS_TYPE_MEASUREMENT_CAPSULED,
        ),
        RPLIDAR_CMD_GET_DEVICE_INFO => (20, 0, RPLIDAR_ANS_TYPE_DEVINFO),
        RPLIDAR_CMD_GET_DEVICE_HEALTH => (3, 0, RPLIDAR_ANS_TYPE_DEVHEALTH),
        RPLIDAR_CMD_GET_SAMPLERATE => (4, 0, RPLIDAR_ANS_TYPE_SAMPLERATE),
        _ => return None,
    };
    Some(AnswerDescriptor {
        payload_length,
        send_mode,
        data_type,
    })
}
