use std::cmp::min;
use std::io::{Read, Write};

/// Fixed-capacity receive buffer with explicit read (`head`) and write (`head + size`) cursors.
///
/// Bytes enter at the write cursor, either pushed with `Write` or pulled from a stream with
/// `read_from`, and leave the read cursor only through `skip_bytes`, once the frame parser has
/// attributed them to a frame or discarded them as corrupt. The buffer never grows: a writer
/// that hits the capacity gets a short write and has to treat that as an integrity failure.
///
/// # Example
///
/// ```rust
/// # use std::io::Write;
/// # use rplidar_guard::base::RingByteBuffer;
/// let mut buffer = RingByteBuffer::with_capacity(100);
/// buffer.write(&[0, 1, 2, 3]).unwrap();
/// assert_eq!(buffer.len(), 4 as usize);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RingByteBuffer {
    buf: Vec<u8>,
    head: usize,
    size: usize,
}

impl RingByteBuffer {
    /// Creates a new `RingByteBuffer` with the specified capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The maximum number of bytes the buffer can hold.
    pub fn with_capacity(capacity: usize) -> RingByteBuffer {
        RingByteBuffer {
            buf: vec![0; capacity],
            head: 0,
            size: 0,
        }
    }

    /// Returns the number of bytes currently stored in the buffer.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the buffer contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the total capacity of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the amount of free space available in the buffer in bytes.
    pub fn free_space(&self) -> usize {
        self.buf.len() - self.size
    }

    /// current tail index of the ring buffer
    fn tail(&self) -> usize {
        (self.head + self.size) % self.buf.len()
    }

    /// Returns the contiguous readable portion starting at the read cursor.
    ///
    /// When the stored bytes wrap around the end of the storage this is only the first part;
    /// use [`make_contiguous`](Self::make_contiguous) to see everything at once.
    pub fn current_read_slice(&self) -> &[u8] {
        let end = min(self.head + self.size, self.buf.len());
        &self.buf[self.head..end]
    }

    /// Rotates the storage so that all readable bytes form one slice, and returns it.
    ///
    /// Frame windows (84 bytes for express capsules) must be inspected whole, so the parser
    /// calls this before every decode pass.
    pub fn make_contiguous(&mut self) -> &[u8] {
        if self.head + self.size > self.buf.len() {
            self.buf.rotate_left(self.head);
            self.head = 0;
        }
        self.current_read_slice()
    }

    /// Removes the specified number of bytes from the beginning of the readable data.
    ///
    /// Returns the actual number of bytes skipped, which may be less than `bytes` if the buffer contains fewer bytes.
    pub fn skip_bytes(&mut self, bytes: usize) -> usize {
        let skipped = min(self.size, bytes);
        if self.buf.is_empty() {
            return 0;
        }
        self.head = (self.head + skipped) % self.buf.len();
        self.size -= skipped;
        skipped
    }

    /// Drops every buffered byte and rewinds both cursors.
    pub fn clear(&mut self) {
        self.head = 0;
        self.size = 0;
    }

    /// current write slice
    fn current_write_slice(&mut self) -> &mut [u8] {
        let current_end = self.tail();
        let write_buf_end = min(self.buf.len(), current_end + self.free_space());
        &mut self.buf[current_end..write_buf_end]
    }

    fn mark_bytes_as_written(&mut self, bytes: usize) {
        let written = min(self.free_space(), bytes);
        self.size += written;
    }

    fn partial_read_from(&mut self, upstream: &mut impl Read) -> std::io::Result<usize> {
        if self.free_space() == 0 || self.current_write_slice().is_empty() {
            return Ok(0);
        }

        match upstream.read(self.current_write_slice()) {
            Ok(read) => {
                self.mark_bytes_as_written(read);
                Ok(read)
            }
            Err(err) => {
                if err.kind() == std::io::ErrorKind::TimedOut
                    || err.kind() == std::io::ErrorKind::WouldBlock
                {
                    Ok(0)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Reads data from an upstream source (`Read` trait) into the free space of the buffer.
    ///
    /// Handles the wrap-around point by reading in at most two parts.
    /// Returns the total number of bytes read; never reads more than `free_space()`.
    pub fn read_from(&mut self, upstream: &mut impl Read) -> std::io::Result<usize> {
        let read = self.partial_read_from(upstream)?;
        if read == 0 {
            return Ok(0);
        }

        match self.partial_read_from(upstream) {
            Ok(latter_read) => Ok(read + latter_read),
            Err(err) => Err(err),
        }
    }
}

impl Write for RingByteBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.free_space() == 0 {
            return Ok(0);
        }

        let written = {
            let current_write_slice = self.current_write_slice();
            let written = min(current_write_slice.len(), buf.len());
            current_write_slice[0..written].clone_from_slice(&buf[0..written]);
            written
        };
        self.mark_bytes_as_written(written);

        if self.free_space() == 0 {
            return Ok(written);
        }

        let latter_written = {
            let current_write_slice = self.current_write_slice();
            let latter_written = min(current_write_slice.len(), buf.len() - written);
            current_write_slice[0..latter_written]
                .clone_from_slice(&buf[written..written + latter_written]);
            latter_written
        };
        self.mark_bytes_as_written(latter_written);

        Ok(written + latter_written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RingByteBuffer;
    use std::io::Write;

    #[test]
    fn write_is_bounded_by_capacity() {
        let mut buffer = RingByteBuffer::with_capacity(4);
        assert_eq!(buffer.write(&[1, 2, 3, 4, 5, 6]).unwrap(), 4);
        assert_eq!(buffer.free_space(), 0);
        assert_eq!(buffer.write(&[7]).unwrap(), 0);
        assert_eq!(buffer.current_read_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn make_contiguous_joins_wrapped_bytes() {
        let mut buffer = RingByteBuffer::with_capacity(8);
        buffer.write_all(&[0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(buffer.skip_bytes(5), 5);
        buffer.write_all(&[6, 7, 8, 9]).unwrap();

        // storage now holds [8, 9, _, _, _, 5, 6, 7]
        assert_eq!(buffer.current_read_slice(), &[5, 6, 7]);
        assert_eq!(buffer.make_contiguous(), &[5, 6, 7, 8, 9]);
        assert_eq!(buffer.len(), 5);

        buffer.write_all(&[10, 11, 12]).unwrap();
        assert_eq!(buffer.make_contiguous(), &[5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn read_from_fills_only_free_space() {
        let mut buffer = RingByteBuffer::with_capacity(3);
        let mut upstream: &[u8] = &[9, 8, 7, 6, 5];
        assert_eq!(buffer.read_from(&mut upstream).unwrap(), 3);
        assert_eq!(buffer.current_read_slice(), &[9, 8, 7]);
        assert_eq!(buffer.read_from(&mut upstream).unwrap(), 0);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.read_from(&mut upstream).unwrap(), 2);
        assert_eq!(buffer.current_read_slice(), &[6, 5]);
    }
}
