use crate::answers::*;
use crate::base::{Error, Message, ProtocolDecoder, ProtocolEncoder, Result};
use crate::checksum::Checksum;
use crate::cmds::expected_descriptor;
use crate::parsers::express_parser::{check_sync_and_checksum, CapsuleCheck};
use log::{debug, error, trace, warn};
use std::io::Write;

const RPLIDAR_CMD_SYNC_BYTE: u8 = 0xA5;

/// Bytes skipped when an express window fails its sync or checksum test.
const RPLIDAR_EXPRESS_RESYNC_STEP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DecodeStatus {
    /// Nothing requested, or the last single response has been retired.
    Idle,
    /// A request was sent and its descriptor has not been seen yet.
    WaitDescriptor,
    /// Data responses of the given descriptor are streaming in.
    ReceiveResponse(AnswerDescriptor),
}

/// The host side of the RPLIDAR serial protocol.
///
/// Encodes commands (`Message` -> bytes) and turns the inbound stream into `Answer` frames:
/// answer descriptors while a request is outstanding, then data responses tagged with the
/// descriptor's type. Express capsules are validated here and resynchronized locally on
/// corruption; other known answer types are retired as opaque responses.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarHostProtocol {
    status: DecodeStatus,
    expected_cmd: Option<u8>,
}

impl LidarHostProtocol {
    /// Creates a new `LidarHostProtocol` in its idle state.
    pub fn new() -> LidarHostProtocol {
        trace!("Creating new LidarHostProtocol");
        LidarHostProtocol {
            status: DecodeStatus::Idle,
            expected_cmd: None,
        }
    }

    /// Arms the decoder for the descriptor answering `cmd`.
    pub fn expect_response(&mut self, cmd: u8) {
        trace!("Decoder state -> WaitDescriptor (cmd {:02X})", cmd);
        self.expected_cmd = Some(cmd);
        self.status = DecodeStatus::WaitDescriptor;
    }

    /// `true` while a requested descriptor has not arrived.
    pub fn is_expecting_descriptor(&self) -> bool {
        self.status == DecodeStatus::WaitDescriptor
    }

    /// Descriptor of the data currently being received, if any.
    pub fn active_descriptor(&self) -> Option<AnswerDescriptor> {
        match self.status {
            DecodeStatus::ReceiveResponse(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    fn decode_descriptor(&mut self, buf: &[u8]) -> Result<(usize, Option<Answer>)> {
        if buf.len() < RPLIDAR_ANS_DESCRIPTOR_SIZE {
            trace!(
                "Need {} descriptor bytes, have {}",
                RPLIDAR_ANS_DESCRIPTOR_SIZE,
                buf.len()
            );
            return Ok((0, None));
        }

        if buf[0..2] != RPLIDAR_ANS_SYNC_BYTES {
            trace!(
                "Descriptor sync mismatch ({:02X} {:02X}), discarding {} bytes",
                buf[0],
                buf[1],
                RPLIDAR_ANS_DESCRIPTOR_SIZE
            );
            return Ok((RPLIDAR_ANS_DESCRIPTOR_SIZE, None));
        }

        let mut header = [0u8; 5];
        header.copy_from_slice(&buf[2..RPLIDAR_ANS_DESCRIPTOR_SIZE]);
        let descriptor = AnswerDescriptor::from_header(&header);
        debug!(
            "Received descriptor: len={}, send_mode={}, type={:02X}",
            descriptor.payload_length, descriptor.send_mode, descriptor.data_type
        );

        if let Some(cmd) = self.expected_cmd {
            match expected_descriptor(cmd) {
                Some(expected) if expected == descriptor => {
                    debug!("Descriptor matches request {:02X}", cmd);
                }
                Some(expected) => warn!(
                    "Descriptor mismatch for request {:02X}: expected {:?}, got {:?}",
                    cmd, expected, descriptor
                ),
                None => warn!("Request {:02X} does not expect a descriptor", cmd),
            }
        }

        trace!("Decoder state -> ReceiveResponse({:?})", descriptor);
        self.status = DecodeStatus::ReceiveResponse(descriptor);
        Ok((
            RPLIDAR_ANS_DESCRIPTOR_SIZE,
            Some(Answer::Descriptor(descriptor)),
        ))
    }

    fn decode_express(
        &mut self,
        descriptor: AnswerDescriptor,
        buf: &[u8],
    ) -> Result<(usize, Option<Answer>)> {
        let len = descriptor.payload_length as usize;
        if len <= RPLIDAR_EXPRESS_CABIN_OFFSET {
            trace!("Express payload length {} holds no cabins, waiting", len);
            return Ok((0, None));
        }

        let mut offset = 0;
        while buf.len() - offset >= len {
            let window = &buf[offset..offset + len];
            match check_sync_and_checksum(window) {
                CapsuleCheck::Valid => {
                    trace!("Express capsule valid after skipping {} bytes", offset);
                    return Ok((
                        offset + len,
                        Some(Answer::ExpressCapsule(ExpressCapsule::from_validated(
                            window,
                        ))),
                    ));
                }
                CapsuleCheck::BadSync | CapsuleCheck::BadChecksum => {
                    offset += RPLIDAR_EXPRESS_RESYNC_STEP;
                }
            }
        }

        if offset > 0 {
            warn!("Resynchronizing express stream, discarded {} bytes", offset);
        }
        Ok((offset, None))
    }

    fn decode_opaque(
        &mut self,
        descriptor: AnswerDescriptor,
        buf: &[u8],
    ) -> Result<(usize, Option<Answer>)> {
        let len = descriptor.payload_length as usize;
        if len == 0 || buf.len() < len {
            return Ok((0, None));
        }

        let msg = Message::with_data(descriptor.data_type, &buf[0..len]);
        if descriptor.is_loop() {
            trace!("Loop answer, staying in ReceiveResponse");
        } else {
            trace!("Single answer retired, decoder state -> Idle");
            self.status = DecodeStatus::Idle;
            self.expected_cmd = None;
        }
        Ok((len, Some(Answer::Response(msg))))
    }
}

impl Default for LidarHostProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolDecoder for LidarHostProtocol {
    /// Decodes at most one frame from the front of `buf`.
    ///
    /// Corrupt bytes are consumed in bounded steps (7 for descriptors, 2 for express
    /// capsules), so repeated calls always make progress until the buffer runs short.
    fn decode(&mut self, buf: &[u8]) -> Result<(usize, Option<Answer>)> {
        trace!(
            "decode called with {} bytes, current state: {:?}",
            buf.len(),
            self.status
        );
        if buf.is_empty() {
            return Ok((0, None));
        }

        match self.status {
            DecodeStatus::Idle => Ok((0, None)),
            DecodeStatus::WaitDescriptor => self.decode_descriptor(buf),
            DecodeStatus::ReceiveResponse(descriptor) => match descriptor.data_type {
                RPLIDAR_ANS_TYPE_MEASUREMENT_CAPSULED => self.decode_express(descriptor, buf),
                RPLIDAR_ANS_TYPE_MEASUREMENT
                | RPLIDAR_ANS_TYPE_DEVINFO
                | RPLIDAR_ANS_TYPE_DEVHEALTH
                | RPLIDAR_ANS_TYPE_SAMPLERATE => self.decode_opaque(descriptor, buf),
                other => {
                    trace!(
                        "Unrecognized answer type {:02X}, leaving {} bytes for a later descriptor",
                        other,
                        buf.len()
                    );
                    Ok((0, None))
                }
            },
        }
    }

    /// Forgets the outstanding request and any active answer type.
    fn reset_decoder(&mut self) {
        trace!("Resetting decoder state");
        self.status = DecodeStatus::Idle;
        self.expected_cmd = None;
    }
}

impl ProtocolEncoder for LidarHostProtocol {
    /// Encodes a command `Message` into the provided byte buffer.
    ///
    /// `A5 <cmd>` without payload, `A5 <cmd> <len> <payload…> <xor>` with one, where the
    /// checksum covers every preceding frame byte.
    fn encode(&mut self, msg: &Message, bytes: &mut [u8]) -> Result<usize> {
        trace!(
            "Encoding message: cmd={:02X}, data_len={}",
            msg.cmd,
            msg.data.len()
        );
        let estimated_encoded_size = self.estimate_encoded_size(msg)?;

        if estimated_encoded_size > bytes.len() {
            error!(
                "Buffer too small: required {}, available {}",
                estimated_encoded_size,
                bytes.len()
            );
            return Err(Error::BufferTooSmall);
        }

        bytes[0] = RPLIDAR_CMD_SYNC_BYTE;
        bytes[1] = msg.cmd;

        if msg.has_payload() {
            let payload_end = 3 + msg.data.len();
            bytes[2] = msg.data.len() as u8;
            bytes[3..payload_end].clone_from_slice(&msg.data);
            bytes[payload_end] = Checksum::of(&bytes[0..payload_end]);
            trace!(
                "Encoded frame with payload: {:?}",
                &bytes[0..payload_end + 1]
            );
            Ok(payload_end + 1)
        } else {
            Ok(2)
        }
    }

    fn estimate_encoded_size(&mut self, msg: &Message) -> Result<usize> {
        if msg.data.len() > 255 {
            error!("Payload too large: {} bytes (max 255)", msg.data.len());
            return Err(Error::OperationFail {
                description: "payload too big".to_owned(),
            });
        }

        if msg.has_payload() {
            Ok(4 + msg.data.len()) // Sync + Cmd + Len + Data + Checksum
        } else {
            Ok(2) // Sync + Cmd
        }
    }

    fn write_to(&mut self, msg: &Message, dest: &mut impl Write) -> Result<usize> {
        let estimated_encoded_size = self.estimate_encoded_size(msg)?;
        let mut buf = vec![0; estimated_encoded_size];
        let encoded_size = self.encode(msg, &mut buf)?;
        trace!("Writing {} bytes to destination stream", encoded_size);
        match dest.write_all(&buf[0..encoded_size]) {
            Ok(()) => Ok(encoded_size),
            Err(err) => {
                error!("IO error during write_all: {}", err);
                Err(err.into())
            }
        }
    }

    /// No encoder state to reset.
    fn reset_encoder(&mut self) {}
}
