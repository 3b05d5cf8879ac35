use crate::answers::Answer;
use crate::base::error::Result;
use crate::base::message::Message;
use std::io;

/// Defines the behavior for decoding the inbound byte stream into `Answer` frames.
pub trait ProtocolDecoder {
    /// Attempts to decode one frame from the front of the provided buffer.
    ///
    /// Returns a `Result` containing a tuple:
    /// * The number of bytes consumed from the buffer (retired frames or discarded corrupt bytes).
    /// * An `Option<Answer>` which is `Some` if a complete frame was recognized.
    ///
    /// A return of `(0, None)` means the decoder cannot make progress until more bytes arrive
    /// (or, for unrecognized answer types, until a new descriptor is expected).
    ///
    /// # Arguments
    ///
    /// * `buf` - The byte slice containing the data to decode.
    fn decode(&mut self, buf: &[u8]) -> Result<(usize, Option<Answer>)>;

    /// Resets the internal state of the decoder.
    /// This is called when a scan session ends or the stream can no longer be trusted.
    fn reset_decoder(&mut self);
}

/// Defines the behavior for encoding command `Message`s into byte frames.
pub trait ProtocolEncoder {
    /// Encodes a `Message` into the provided byte buffer.
    ///
    /// Returns the number of bytes written to the buffer upon successful encoding.
    ///
    /// # Arguments
    ///
    /// * `msg` - The `Message` to encode.
    /// * `bytes` - The mutable byte slice to write the encoded message into.
    fn encode(&mut self, msg: &Message, bytes: &mut [u8]) -> Result<usize>;

    /// Estimates the maximum size in bytes required to encode the given `Message`.
    fn estimate_encoded_size(&mut self, msg: &Message) -> Result<usize>;

    /// Encodes a `Message` and writes it directly to a `Write` target (e.g., a serial port).
    ///
    /// Returns the number of bytes successfully written to the destination.
    fn write_to(&mut self, msg: &Message, dest: &mut impl io::Write) -> Result<usize>;

    /// Resets the internal state of the encoder.
    fn reset_encoder(&mut self);
}
