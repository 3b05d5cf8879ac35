use crate::base::Message;
use byteorder::{ByteOrder, LittleEndian};

/// Sync bytes opening every answer descriptor.
pub const RPLIDAR_ANS_SYNC_BYTES: [u8; 2] = [0xA5, 0x5A];

/// Size of an answer descriptor including the two sync bytes.
pub const RPLIDAR_ANS_DESCRIPTOR_SIZE: usize = 7;

/// Send mode of answers that keep streaming until stopped.
pub const RPLIDAR_ANS_SEND_MODE_LOOP: u8 = 0x1;

/// Response type identifier for legacy measurement data (one 5-byte node per response).
pub const RPLIDAR_ANS_TYPE_MEASUREMENT: u8 = 0x81;

/// Response type identifier for express (capsuled) measurement data.
pub const RPLIDAR_ANS_TYPE_MEASUREMENT_CAPSULED: u8 = 0x82;

/// Response type identifier for device information.
pub const RPLIDAR_ANS_TYPE_DEVINFO: u8 = 0x04;

/// Response type identifier for device health status.
pub const RPLIDAR_ANS_TYPE_DEVHEALTH: u8 = 0x06;

/// Response type identifier for the sample rate query.
pub const RPLIDAR_ANS_TYPE_SAMPLERATE: u8 = 0x15;

/// Size of one express capsule: 4 header bytes followed by 16 cabins.
pub const RPLIDAR_EXPRESS_CAPSULE_SIZE: usize = 84;

/// Offset of the first cabin inside an express capsule.
pub const RPLIDAR_EXPRESS_CABIN_OFFSET: usize = 4;

/// Size of one cabin record (two samples).
pub const RPLIDAR_EXPRESS_CABIN_SIZE: usize = 5;

/// Number of cabins in a full express capsule.
pub const RPLIDAR_EXPRESS_CABIN_COUNT: usize =
    (RPLIDAR_EXPRESS_CAPSULE_SIZE - RPLIDAR_EXPRESS_CABIN_OFFSET) / RPLIDAR_EXPRESS_CABIN_SIZE;

/// Expected value of the upper nibble of the first sync/checksum byte in express capsules.
pub const RPLIDAR_RESP_MEASUREMENT_EXP_SYNC_1: u8 = 0xA;
/// Expected value of the upper nibble of the second sync/checksum byte in express capsules.
pub const RPLIDAR_RESP_MEASUREMENT_EXP_SYNC_2: u8 = 0x5;

/// Start-of-scan flag in the high byte of the start angle field.
pub const RPLIDAR_RESP_MEASUREMENT_EXP_SYNCBIT: u16 = 0x8000;

/// Mask of the start angle (omega, Q6 degrees) field.
pub const RPLIDAR_RESP_MEASUREMENT_EXP_ANGLE_MASK: u16 = 0x7FFF;

const RPLIDAR_ANS_HEADER_SIZE_MASK: u32 = 0x3FFF_FFFF;
const RPLIDAR_ANS_HEADER_SUBTYPE_SHIFT: u32 = 30;

/// Answer descriptor announcing the type, length and send mode of the data that follows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AnswerDescriptor {
    /// Length of one data response in bytes (30 bits on the wire).
    pub payload_length: u32,
    /// 0 for a single response, 1 for a looping stream.
    pub send_mode: u8,
    /// Answer type identifier (`RPLIDAR_ANS_TYPE_*`).
    pub data_type: u8,
}

impl AnswerDescriptor {
    /// Parses the five bytes following the descriptor sync bytes.
    ///
    /// The first four bytes hold the payload length in the low 30 bits and the send mode in the
    /// top 2 bits, little-endian; the fifth byte is the data type.
    pub fn from_header(header: &[u8; 5]) -> AnswerDescriptor {
        let size_q30_subtype = LittleEndian::read_u32(&header[0..4]);
        AnswerDescriptor {
            payload_length: size_q30_subtype & RPLIDAR_ANS_HEADER_SIZE_MASK,
            send_mode: (size_q30_subtype >> RPLIDAR_ANS_HEADER_SUBTYPE_SHIFT) as u8,
            data_type: header[4],
        }
    }

    /// Serializes the descriptor the way the device sends it, sync bytes included.
    pub fn to_bytes(&self) -> [u8; RPLIDAR_ANS_DESCRIPTOR_SIZE] {
        let mut bytes = [0; RPLIDAR_ANS_DESCRIPTOR_SIZE];
        bytes[0..2].copy_from_slice(&RPLIDAR_ANS_SYNC_BYTES);
        LittleEndian::write_u32(
            &mut bytes[2..6],
            (self.payload_length & RPLIDAR_ANS_HEADER_SIZE_MASK)
                | ((self.send_mode as u32) << RPLIDAR_ANS_HEADER_SUBTYPE_SHIFT),
        );
        bytes[6] = self.data_type;
        bytes
    }

    /// Returns `true` if the device keeps streaming responses of this type.
    #[inline]
    pub fn is_loop(&self) -> bool {
        (self.send_mode & RPLIDAR_ANS_SEND_MODE_LOOP) == RPLIDAR_ANS_SEND_MODE_LOOP
    }
}

/// One validated express-scan payload.
///
/// Layout: bytes 0–1 carry the sync nibbles (high) and the split checksum (low), bytes 2–3 the
/// little-endian start angle in Q6 degrees with the start flag in bit 15, followed by 5-byte
/// cabins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressCapsule {
    raw: Vec<u8>,
}

impl ExpressCapsule {
    /// Wraps an already validated payload window.
    pub(crate) fn from_validated(raw: &[u8]) -> ExpressCapsule {
        ExpressCapsule { raw: raw.to_vec() }
    }

    /// Raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    fn start_angle_field(&self) -> u16 {
        LittleEndian::read_u16(&self.raw[2..4])
    }

    /// `true` if this payload opens a new scan session.
    #[inline]
    pub fn is_start(&self) -> bool {
        (self.start_angle_field() & RPLIDAR_RESP_MEASUREMENT_EXP_SYNCBIT) != 0
    }

    /// Start angle in Q6 fixed point.
    #[inline]
    pub fn omega_q6(&self) -> u16 {
        self.start_angle_field() & RPLIDAR_RESP_MEASUREMENT_EXP_ANGLE_MASK
    }

    /// Start angle (omega) in degrees.
    #[inline]
    pub fn omega(&self) -> f32 {
        self.omega_q6() as f32 / 64.0
    }

    /// Number of complete cabins in the payload.
    pub fn cabin_count(&self) -> usize {
        self.raw.len().saturating_sub(RPLIDAR_EXPRESS_CABIN_OFFSET) / RPLIDAR_EXPRESS_CABIN_SIZE
    }

    /// The 5 bytes of cabin `index`.
    pub fn cabin(&self, index: usize) -> &[u8] {
        let start = RPLIDAR_EXPRESS_CABIN_OFFSET + index * RPLIDAR_EXPRESS_CABIN_SIZE;
        &self.raw[start..start + RPLIDAR_EXPRESS_CABIN_SIZE]
    }
}

/// A frame recognised by the protocol decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Answer descriptor preceding a data response.
    Descriptor(AnswerDescriptor),
    /// Validated express-scan payload.
    ExpressCapsule(ExpressCapsule),
    /// Data response retired without interpretation, tagged with its answer type.
    Response(Message),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_header_bit_fields() {
        // 84 bytes, loop mode, express type
        let descriptor = AnswerDescriptor::from_header(&[0x54, 0x00, 0x00, 0x40, 0x82]);
        assert_eq!(descriptor.payload_length, 84);
        assert_eq!(descriptor.send_mode, 1);
        assert_eq!(descriptor.data_type, 0x82);
        assert!(descriptor.is_loop());
        assert_eq!(
            descriptor.to_bytes(),
            [0xA5, 0x5A, 0x54, 0x00, 0x00, 0x40, 0x82]
        );

        let wide = AnswerDescriptor::from_header(&[0xFF, 0xFF, 0xFF, 0xFF, 0x04]);
        assert_eq!(wide.payload_length, 0x3FFF_FFFF);
        assert_eq!(wide.send_mode, 3);
    }

    #[test]
    fn capsule_header_fields() {
        let mut raw = [0u8; RPLIDAR_EXPRESS_CAPSULE_SIZE];
        raw[2] = 0x40;
        raw[3] = 0x80 | 0x01;
        let capsule = ExpressCapsule::from_validated(&raw);
        assert!(capsule.is_start());
        assert_eq!(capsule.omega_q6(), 0x0140);
        assert_eq!(capsule.omega(), 5.0);
        assert_eq!(capsule.cabin_count(), RPLIDAR_EXPRESS_CABIN_COUNT);
        assert_eq!(capsule.cabin(15).len(), RPLIDAR_EXPRESS_CABIN_SIZE);
    }
}
