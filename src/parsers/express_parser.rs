use crate::answers::*;
use crate::checksum::Checksum;
use crate::config::AngleArc;
use crate::types::Sample;
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

/// Outcome of validating one express payload window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapsuleCheck {
    Valid,
    BadSync,
    BadChecksum,
}

/// Validates the sync nibbles and split checksum of an express payload window.
///
/// Both high nibbles must match independently (0xA in byte 0, 0x5 in byte 1). The checksum
/// is stored in the low nibbles (byte 0 low, byte 1 high) and covers bytes `2..`.
pub fn check_sync_and_checksum(window: &[u8]) -> CapsuleCheck {
    if window.len() < RPLIDAR_EXPRESS_CABIN_OFFSET {
        return CapsuleCheck::BadSync;
    }

    let sync1 = window[0] >> 4;
    let sync2 = window[1] >> 4;
    if sync1 != RPLIDAR_RESP_MEASUREMENT_EXP_SYNC_1 || sync2 != RPLIDAR_RESP_MEASUREMENT_EXP_SYNC_2 {
        trace!("Miss sync: got {:X} {:X}", sync1, sync2);
        return CapsuleCheck::BadSync;
    }

    let recv_checksum = (window[0] & 0xf) | ((window[1] & 0xf) << 4);
    let calculated_checksum = Checksum::of(&window[2..]);
    if recv_checksum != calculated_checksum {
        trace!(
            "Checksum mismatch: received {:02X}, calculated {:02X}",
            recv_checksum,
            calculated_checksum
        );
        return CapsuleCheck::BadChecksum;
    }

    CapsuleCheck::Valid
}

/// Raw measurement pair stored in one cabin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedNode {
    /// Distance in millimeters (14 bits, 0 means no return).
    pub distance: u32,
    /// Angle compensation in degrees, signed.
    pub angle_offset: f32,
}

/// Decodes a signed Q3 angle compensation: 5-bit magnitude, bit 5 is the sign.
#[inline]
fn offset_q3_to_degrees(offset_q3: u8) -> f32 {
    let magnitude = (offset_q3 & 0x1f) as f32 / 8.0;
    if offset_q3 & 0x20 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

#[inline]
fn parse_cabin(cabin: &[u8]) -> [ParsedNode; 2] {
    let distance_angle_1 = LittleEndian::read_u16(&cabin[0..2]);
    let distance_angle_2 = LittleEndian::read_u16(&cabin[2..4]);
    let offset_angles_q3 = cabin[4];

    let angle_offset_q3_1 = (offset_angles_q3 & 0xf) | (((distance_angle_1 & 0x3) as u8) << 4);
    let angle_offset_q3_2 = (offset_angles_q3 >> 4) | (((distance_angle_2 & 0x3) as u8) << 4);

    [
        ParsedNode {
            distance: (distance_angle_1 >> 2) as u32,
            angle_offset: offset_q3_to_degrees(angle_offset_q3_1),
        },
        ParsedNode {
            distance: (distance_angle_2 >> 2) as u32,
            angle_offset: offset_q3_to_degrees(angle_offset_q3_2),
        },
    ]
}

/// Angle advanced by the start of cabin `cabin_index`, interpolated between the start angles
/// of two consecutive payloads.
#[inline]
pub fn angle_diff(omega: f32, next_omega: f32, cabin_index: usize) -> f32 {
    let delta = if omega <= next_omega {
        next_omega - omega
    } else {
        360.0 + next_omega - omega
    };
    delta * cabin_index as f32 / 32.0
}

/// Turns the stream of validated express capsules into samples.
///
/// A capsule only carries its own start angle; the true angle of each cabin needs the start
/// angle of the following capsule as well, so every capsule is held as the reference until
/// its successor arrives and is decoded then.
#[derive(Debug, Clone)]
pub struct CabinDecoder {
    reference: Option<ExpressCapsule>,
    cabins_per_payload: usize,
    pole_exclusion: Option<AngleArc>,
}

impl CabinDecoder {
    pub fn new(cabins_per_payload: usize, pole_exclusion: Option<AngleArc>) -> CabinDecoder {
        CabinDecoder {
            reference: None,
            cabins_per_payload,
            pole_exclusion,
        }
    }

    /// `true` once a capsule is waiting for its successor.
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Drops the reference capsule; the next capsule starts a fresh pair.
    pub fn reset(&mut self) {
        trace!("Dropping reference capsule");
        self.reference = None;
    }

    /// Accepts the next capsule and returns the samples of the previous one.
    pub fn push(&mut self, capsule: ExpressCapsule) -> Vec<Sample> {
        if capsule.is_start() {
            debug!(
                "Capsule flagged as start of scan (omega {:.3})",
                capsule.omega()
            );
        }

        let samples = match self.reference.take() {
            Some(prev) => self.decode_pair(&prev, capsule.omega()),
            None => {
                trace!("No reference capsule yet, caching current");
                Vec::new()
            }
        };
        self.reference = Some(capsule);
        samples
    }

    fn decode_pair(&self, prev: &ExpressCapsule, next_omega: f32) -> Vec<Sample> {
        let omega = prev.omega();
        let cabins = self.cabins_per_payload.min(prev.cabin_count());
        trace!(
            "Decoding {} cabins, omega {:.3} -> {:.3}",
            cabins,
            omega,
            next_omega
        );

        let mut samples = Vec::with_capacity(cabins * 2);
        for cabin_index in 0..cabins {
            let base_angle = omega + angle_diff(omega, next_omega, cabin_index);
            for node in parse_cabin(prev.cabin(cabin_index)).iter() {
                let sample = Sample::new(base_angle - node.angle_offset, node.distance);
                if let Some(pole) = self.pole_exclusion {
                    if pole.contains_half_open(sample.angle) {
                        continue;
                    }
                }
                samples.push(sample);
            }
        }
        samples
    }
}

/// Encodes one cabin from two distances and two signed Q3 angle compensations.
#[cfg(test)]
pub(crate) fn test_cabin(d1: u16, theta1_q3: u8, d2: u16, theta2_q3: u8) -> [u8; 5] {
    [
        (((d1 & 0x3f) as u8) << 2) | ((theta1_q3 >> 4) & 0x3),
        (d1 >> 6) as u8,
        (((d2 & 0x3f) as u8) << 2) | ((theta2_q3 >> 4) & 0x3),
        (d2 >> 6) as u8,
        (theta1_q3 & 0xf) | ((theta2_q3 & 0xf) << 4),
    ]
}

/// Builds a valid 84-byte express payload with the given cabins set (others zero).
#[cfg(test)]
pub(crate) fn test_capsule_with(
    start: bool,
    omega_q6: u16,
    cabins: &[(usize, [u8; 5])],
) -> [u8; RPLIDAR_EXPRESS_CAPSULE_SIZE] {
    let mut raw = [0u8; RPLIDAR_EXPRESS_CAPSULE_SIZE];
    let field = (omega_q6 & RPLIDAR_RESP_MEASUREMENT_EXP_ANGLE_MASK)
        | if start {
            RPLIDAR_RESP_MEASUREMENT_EXP_SYNCBIT
        } else {
            0
        };
    LittleEndian::write_u16(&mut raw[2..4], field);
    for (index, cabin) in cabins {
        let start = RPLIDAR_EXPRESS_CABIN_OFFSET + index * RPLIDAR_EXPRESS_CABIN_SIZE;
        raw[start..start + RPLIDAR_EXPRESS_CABIN_SIZE].copy_from_slice(cabin);
    }
    let checksum = Checksum::of(&raw[2..]);
    raw[0] = (RPLIDAR_RESP_MEASUREMENT_EXP_SYNC_1 << 4) | (checksum & 0xf);
    raw[1] = (RPLIDAR_RESP_MEASUREMENT_EXP_SYNC_2 << 4) | (checksum >> 4);
    raw
}

/// Like `test_capsule_with`, with zero angle compensation: `(cabin, d1, d2)`.
#[cfg(test)]
pub(crate) fn test_capsule(
    start: bool,
    omega_q6: u16,
    cabins: &[(usize, u16, u16)],
) -> [u8; RPLIDAR_EXPRESS_CAPSULE_SIZE] {
    let encoded: Vec<(usize, [u8; 5])> = cabins
        .iter()
        .map(|&(index, d1, d2)| (index, test_cabin(d1, 0, d2, 0)))
        .collect();
    test_capsule_with(start, omega_q6, &encoded)
}
