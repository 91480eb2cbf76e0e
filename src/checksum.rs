const CRC32_POLYNOMIAL: u32 = 0x04C1_1DB7;
const CRC32_INIT_VALUE: u32 = 0xFFFF_FFFF;
const CRC32_XOR_VALUE: u32 = 0x0000_0000;

/// Calculates the CRC-32 used to stamp and verify Tau protocol frames.
///
/// This is the word-oriented, non-reflected variant the camera firmware
/// computes: every byte is XORed into the low bits of the accumulator and
/// then the whole 32-bit word is shifted out MSB first. It does not match
/// the table-driven IEEE CRC-32.
pub struct Crc32 {
    current: u32,
}

impl Crc32 {
    /// Creates a new `Crc32` instance, initialized to the seed value.
    #[inline]
    pub fn new() -> Crc32 {
        Crc32 {
            current: CRC32_INIT_VALUE,
        }
    }

    /// Includes a slice of bytes in the checksum calculation.
    ///
    /// # Arguments
    ///
    /// * `data` - The byte slice to fold into the current checksum.
    #[inline]
    pub fn push_slice(&mut self, data: &[u8]) {
        for &d in data {
            self.current ^= d as u32;
            for _ in 0..32 {
                if self.current & 0x8000_0000 != 0 {
                    self.current = (self.current << 1) ^ CRC32_POLYNOMIAL;
                } else {
                    self.current <<= 1;
                }
            }
        }
    }

    /// Returns the calculated checksum value.
    #[inline]
    pub fn checksum(&self) -> u32 {
        self.current ^ CRC32_XOR_VALUE
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the checksum over the first `length` bytes of `buffer`.
///
/// `length` is clamped to the buffer size.
pub fn checksum(buffer: &[u8], length: usize) -> u32 {
    let mut crc = Crc32::new();
    crc.push_slice(&buffer[..length.min(buffer.len())]);
    crc.checksum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_yields_seed() {
        assert_eq!(checksum(&[], 0), 0xFFFF_FFFF);
    }

    #[test]
    fn single_zero_byte_matches_word_crc() {
        // 0xFFFFFFFF shifted through 32 rounds of the MPEG-2 polynomial
        // (STM32 hardware CRC of the word 0x00000000).
        assert_eq!(checksum(&[0x00], 1), 0xC704_DD7B);
    }

    #[test]
    fn length_limits_the_covered_prefix() {
        let data = [0xF5, 0x29, 0x01, 0x00, 0xAA, 0xBB];
        assert_eq!(checksum(&data, 3), checksum(&data[..3], 3));
        assert_ne!(checksum(&data, 3), checksum(&data, 4));
    }

    #[test]
    fn length_past_end_is_clamped() {
        let data = [1u8, 2, 3];
        assert_eq!(checksum(&data, 100), checksum(&data, 3));
    }

    #[test]
    fn incremental_matches_one_shot() {
        let data: Vec<u8> = (0u8..40).collect();
        let mut crc = Crc32::new();
        crc.push_slice(&data[..17]);
        crc.push_slice(&data[17..]);
        assert_eq!(crc.checksum(), checksum(&data, data.len()));
    }

    proptest! {
        #[test]
        fn checksum_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(checksum(&data, data.len()), checksum(&data.clone(), data.len()));
        }
    }
}
