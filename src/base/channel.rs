use crate::answers::Answer;
use crate::base::error::{Error, Result};
use crate::base::message::Message;
use crate::base::ring_byte_buffer::RingByteBuffer;
use crate::base::traits::{ProtocolDecoder, ProtocolEncoder};
use log::{error, trace, warn};
use std::io;

const DEFAULT_CHANNEL_READ_BUFFER_SIZE: usize = 2048;

/// Channel encodes commands with a protocol, writes them to a stream, and frames the bytes
/// coming back through a fixed-capacity receive buffer.
///
/// Inbound bytes either arrive pushed by the caller (`feed`) or are pulled from the stream
/// (`fill_from_stream`). Both paths end in `decode_pending`.
///
/// # Examples
/// ```ignore
/// let mut channel = Channel::new(LidarHostProtocol::new(), Box::new(serial_port));
///
/// channel.write(&Message::new(RPLIDAR_CMD_STOP)).unwrap();
/// ```
#[derive(Debug)]
pub struct Channel<P, T: ?Sized> {
    protocol: P,
    stream: Box<T>,
    read_buffer: RingByteBuffer,
}

impl<P, T: ?Sized> Channel<P, T>
where
    P: ProtocolDecoder + ProtocolEncoder,
    T: io::Read + io::Write,
{
    /// Create a new `Channel` with the default receive buffer
    pub fn new(protocol: P, stream: Box<T>) -> Channel<P, T> {
        Channel::with_read_buffer_size(protocol, stream, DEFAULT_CHANNEL_READ_BUFFER_SIZE)
    }

    /// Create a new `Channel` with non-default ring buffer capacity
    ///
    /// # Example
    /// ```ignore
    /// let channel = Channel::with_read_buffer_size(
    ///     LidarHostProtocol::new(),
    ///     Box::new(serial_port),
    ///     4096,
    /// );
    /// ```
    pub fn with_read_buffer_size(
        protocol: P,
        stream: Box<T>,
        read_buffer_size: usize,
    ) -> Channel<P, T> {
        trace!("Creating new Channel with buffer size {}", read_buffer_size);
        let mut chn = Channel {
            protocol,
            stream,
            read_buffer: RingByteBuffer::with_capacity(read_buffer_size),
        };

        chn.reset();
        chn
    }

    /// Reset protocol state and drop every buffered byte.
    ///
    /// Used when a scan session ends or the inbound stream can no longer be trusted.
    pub fn reset(&mut self) {
        trace!("Resetting Channel protocol and receive buffer");
        self.protocol.reset_encoder();
        self.protocol.reset_decoder();
        self.read_buffer.clear();
    }

    /// Drop buffered bytes without touching protocol state.
    pub fn clear_input(&mut self) {
        if !self.read_buffer.is_empty() {
            trace!("Dropping {} stale buffered bytes", self.read_buffer.len());
        }
        self.read_buffer.clear();
    }

    /// Protocol state, e.g. the descriptor currently being answered.
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Mutable protocol state, used to arm the decoder before a request.
    pub fn protocol_mut(&mut self) -> &mut P {
        &mut self.protocol
    }

    /// Underlying stream.
    pub fn stream(&self) -> &T {
        &self.stream
    }

    /// Mutable underlying stream.
    pub fn stream_mut(&mut self) -> &mut T {
        &mut self.stream
    }

    /// Bytes received but not yet attributed to a frame.
    pub fn buffered_len(&self) -> usize {
        self.read_buffer.len()
    }

    /// Capacity of the receive buffer in bytes.
    pub fn read_buffer_capacity(&self) -> usize {
        self.read_buffer.capacity()
    }

    /// Buffer a pushed chunk and decode it, in pieces no larger than the free space.
    ///
    /// A chunk larger than the buffer is fine as long as the decoder keeps retiring frames.
    /// Only a full buffer that the decoder cannot advance, with bytes of the chunk still left
    /// over, is an overflow.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Answer>> {
        let mut answers = Vec::new();
        let mut remaining = chunk;
        loop {
            let take = remaining.len().min(self.read_buffer.free_space());
            let written = io::Write::write(&mut self.read_buffer, &remaining[..take])?;
            remaining = &remaining[written..];
            trace!(
                "Buffered {} bytes (buffer len: {}, {} left in chunk)",
                written,
                self.read_buffer.len(),
                remaining.len()
            );

            if remaining.is_empty() {
                answers.extend(self.decode_pending()?);
                return Ok(answers);
            }

            self.drain_into(&mut answers)?;
            if self.read_buffer.free_space() == 0 {
                let capacity = self.read_buffer.capacity();
                let pending = self.read_buffer.len() + remaining.len();
                error!(
                    "Receive buffer overflow: {} bytes pending, capacity {}",
                    pending, capacity
                );
                self.protocol.reset_decoder();
                return Err(Error::BufferOverflow { capacity, pending });
            }
        }
    }

    /// Pull whatever the stream has ready into the receive buffer.
    pub fn fill_from_stream(&mut self) -> Result<usize> {
        match self.read_buffer.read_from(&mut self.stream) {
            Ok(bytes_read) => {
                trace!(
                    "Read {} bytes from stream (buffer len: {})",
                    bytes_read,
                    self.read_buffer.len()
                );
                Ok(bytes_read)
            }
            Err(e) => {
                error!("IO error reading from stream: {}", e);
                Err(e.into())
            }
        }
    }

    /// Decode every complete frame currently buffered, in arrival order.
    ///
    /// Stops when the decoder needs more bytes. A full buffer the decoder cannot make progress
    /// on is reported as a protocol error.
    pub fn decode_pending(&mut self) -> Result<Vec<Answer>> {
        let mut answers = Vec::new();
        self.drain_into(&mut answers)?;
        if !self.read_buffer.is_empty() && self.read_buffer.free_space() == 0 {
            error!("Buffer full and decode consumed 0 bytes. Resetting decoder.");
            self.protocol.reset_decoder();
            return Err(Error::ProtocolError {
                description: "decoder stalled on full buffer".to_owned(),
            });
        }
        Ok(answers)
    }

    /// Runs the decoder until it needs more bytes than are buffered.
    fn drain_into(&mut self, answers: &mut Vec<Answer>) -> Result<()> {
        loop {
            let (decoded_bytes, answer) = {
                let pending = self.read_buffer.make_contiguous();
                if pending.is_empty() {
                    return Ok(());
                }
                match self.protocol.decode(pending) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        error!("Protocol decode error: {:?}", e);
                        self.protocol.reset_decoder();
                        return Err(e);
                    }
                }
            };

            if decoded_bytes > 0 {
                self.read_buffer.skip_bytes(decoded_bytes);
            }

            match answer {
                Some(answer) => answers.push(answer),
                None if decoded_bytes == 0 => {
                    trace!(
                        "Decoder needs more data ({} bytes buffered)",
                        self.read_buffer.len()
                    );
                    return Ok(());
                }
                None => {}
            }
        }
    }

    /// Write message to channel and flush the stream
    ///
    /// # Example
    /// ```ignore
    /// channel.write(&Message::new(RPLIDAR_CMD_STOP)).unwrap();
    /// ```
    pub fn write(&mut self, msg: &Message) -> Result<usize> {
        trace!(
            "Channel write called: cmd={:02X}, data_len={}",
            msg.cmd,
            msg.data.len()
        );
        let written = self.protocol.write_to(msg, &mut self.stream)?;
        if let Err(e) = self.stream.flush() {
            warn!("Flushing stream after cmd {:02X} failed: {}", msg.cmd, e);
            return Err(e.into());
        }
        trace!("Stream flushed");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::*;
    use crate::cmds::*;
    use crate::parsers::express_parser::test_capsule;
    use crate::protocol::LidarHostProtocol;
    use std::io::Cursor;

    fn express_channel(size: usize) -> Channel<LidarHostProtocol, Cursor<Vec<u8>>> {
        let mut channel = Channel::with_read_buffer_size(
            LidarHostProtocol::new(),
            Box::new(Cursor::new(vec![])),
            size,
        );
        channel.protocol_mut().expect_response(RPLIDAR_CMD_EXPRESS_SCAN);
        channel
    }

    fn express_descriptor() -> [u8; RPLIDAR_ANS_DESCRIPTOR_SIZE] {
        expected_descriptor(RPLIDAR_CMD_EXPRESS_SCAN).unwrap().to_bytes()
    }

    #[test]
    fn fed_bytes_decode_across_chunks() {
        let mut channel = express_channel(512);
        let mut stream = express_descriptor().to_vec();
        stream.extend_from_slice(&test_capsule(true, 0, &[]));

        let answers = channel.feed(&stream[..40]).unwrap();
        assert_eq!(answers.len(), 1);
        assert!(matches!(answers[0], Answer::Descriptor(_)));
        assert_eq!(channel.buffered_len(), 33);

        let answers = channel.feed(&stream[40..]).unwrap();
        assert_eq!(answers.len(), 1);
        assert!(matches!(answers[0], Answer::ExpressCapsule(_)));
        assert_eq!(channel.buffered_len(), 0);
    }

    #[test]
    fn capsule_straddling_ring_end_is_decoded() {
        let mut channel = express_channel(200);
        channel.feed(&express_descriptor()).unwrap();
        channel.feed(&test_capsule(true, 0, &[])).unwrap();
        assert_eq!(channel.feed(&test_capsule(false, 64, &[])).unwrap().len(), 1);

        // 7 + 84 + 84 = 175 of 200 used: the next capsule wraps around the storage end
        let third = test_capsule(false, 128, &[(0, 1234, 0)]);
        let answers = channel.feed(&third).unwrap();
        match answers.as_slice() {
            [Answer::ExpressCapsule(capsule)] => assert_eq!(capsule.as_bytes(), &third[..]),
            other => panic!("unexpected answers {:?}", other),
        }
    }

    #[test]
    fn chunk_larger_than_buffer_is_decoded_piecewise() {
        let mut channel = express_channel(200);
        let mut chunk = express_descriptor().to_vec();
        for n in 0..6u16 {
            chunk.extend_from_slice(&test_capsule(n == 0, n * 64, &[]));
        }
        assert_eq!(chunk.len(), 511);

        let answers = channel.feed(&chunk).unwrap();
        assert_eq!(answers.len(), 7);
        assert!(matches!(answers[0], Answer::Descriptor(_)));
        assert!(answers[1..]
            .iter()
            .all(|a| matches!(a, Answer::ExpressCapsule(_))));
        assert_eq!(channel.buffered_len(), 0);
    }

    #[test]
    fn stalled_decoder_overflows_on_oversized_chunk() {
        let mut channel = express_channel(200);
        // idle: nothing is consumed
        channel.protocol_mut().reset_decoder();
        assert!(channel.feed(&[0u8; 150]).unwrap().is_empty());
        match channel.feed(&[0u8; 51]) {
            Err(Error::BufferOverflow { capacity, pending }) => {
                assert_eq!(capacity, 200);
                assert_eq!(pending, 201);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
        assert_eq!(channel.buffered_len(), 200);
    }

    #[test]
    fn full_buffer_without_progress_is_an_error() {
        let mut channel = express_channel(200);
        channel.protocol_mut().reset_decoder();
        assert!(matches!(
            channel.feed(&[0x11u8; 200]),
            Err(Error::ProtocolError { .. })
        ));
        assert!(channel.decode_pending().is_err());

        channel.clear_input();
        assert!(channel.decode_pending().unwrap().is_empty());
    }

    #[test]
    fn pulls_from_stream_and_writes_commands() {
        let mut inbound = express_descriptor().to_vec();
        inbound.extend_from_slice(&test_capsule(true, 0, &[]));
        let mut channel = Channel::with_read_buffer_size(
            LidarHostProtocol::new(),
            Box::new(Cursor::new(inbound)),
            512,
        );
        channel.protocol_mut().expect_response(RPLIDAR_CMD_EXPRESS_SCAN);

        assert_eq!(channel.fill_from_stream().unwrap(), 91);
        assert_eq!(channel.decode_pending().unwrap().len(), 2);

        // the cursor sits at the end of the inbound bytes, so the frame is appended there
        assert_eq!(channel.write(&Message::new(RPLIDAR_CMD_STOP)).unwrap(), 2);
        let written = channel.stream().get_ref();
        assert_eq!(&written[written.len() - 2..], &[0xA5, RPLIDAR_CMD_STOP]);
    }

    #[test]
    fn reset_drops_buffered_bytes() {
        let mut channel = express_channel(200);
        channel.feed(&[1, 2, 3]).unwrap();
        channel.reset();
        assert_eq!(channel.buffered_len(), 0);
        assert!(!channel.protocol().is_expecting_descriptor());
    }
}
