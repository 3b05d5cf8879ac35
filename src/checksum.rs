/// Calculates the 8-bit XOR checksum used by command frames and express capsules.
#[derive(Debug, Default, Clone, Copy)]
pub struct Checksum {
    current: u8,
}

impl Checksum {
    /// Creates a new `Checksum` instance, initialized to 0.
    #[inline]
    pub fn new() -> Checksum {
        Checksum { current: 0 }
    }

    /// Includes a slice of bytes in the checksum calculation.
    #[inline]
    pub fn push_slice(&mut self, data: &[u8]) {
        for d in data {
            self.current ^= d;
        }
    }

    /// Returns the calculated checksum value.
    #[inline]
    pub fn checksum(&self) -> u8 {
        self.current
    }

    /// XOR of every byte in `data`.
    #[inline]
    pub fn of(data: &[u8]) -> u8 {
        let mut checksum = Checksum::new();
        checksum.push_slice(data);
        checksum.checksum()
    }
}
