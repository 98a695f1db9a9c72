//! Wire-level codec for the async boot path: the
//! byte encoding of one 18-bit word, and the bit-level expansion of one
//! byte into UART-shaped intervals. Pure data transforms — nothing here
//! touches a `Cpu`.

use crate::word::WORD_MASK;

/// Encodes one word as the three inverted RS-232 bytes the boot stream
/// carries. `0x2D` in the low six bits of `b0` doubles as an
/// auto-baud calibration pattern on real hardware.
pub fn encode_word(value: u32) -> [u8; 3] {
    let value = value & WORD_MASK;
    let b0 = ((((value << 6) & 0xC0) | 0x2D) as u8) ^ 0xFF;
    let b1 = (((value >> 2) & 0xFF) as u8) ^ 0xFF;
    let b2 = (((value >> 10) & 0xFF) as u8) ^ 0xFF;
    [b0, b1, b2]
}

/// Inverse of [`encode_word`].
pub fn decode_word(bytes: [u8; 3]) -> u32 {
    let b0 = bytes[0] ^ 0xFF;
    let b1 = bytes[1] ^ 0xFF;
    let b2 = bytes[2] ^ 0xFF;
    let low2 = ((b0 >> 6) & 0x3) as u32;
    let mid8 = b1 as u32;
    let hi8 = b2 as u32;
    low2 | (mid8 << 2) | (hi8 << 10)
}

/// Decodes a full byte stream (3 bytes per word) into words. `None` if the
/// length is not a multiple of 3.
pub fn decode_words(bytes: &[u8]) -> Option<Vec<u32>> {
    if bytes.len() % 3 != 0 {
        return None;
    }
    Some(bytes.chunks_exact(3).map(|c| decode_word([c[0], c[1], c[2]])).collect())
}

/// One pin-level interval: asserted value held for `duration` step units.
pub type BitSegment = (bool, u32);

/// Expands one byte into its 10 UART-shaped intervals: start (low), 8 data
/// bits LSB-first, stop (high).
pub fn expand_byte_to_bits(byte: u8, bit_period: u32) -> Vec<BitSegment> {
    let mut segments = Vec::with_capacity(10);
    segments.push((false, bit_period));
    for i in 0..8 {
        segments.push((byte & (1 << i) != 0, bit_period));
    }
    segments.push((true, bit_period));
    segments
}

/// Inverse of repeated [`expand_byte_to_bits`], given a leading idle
/// segment followed by 10-segment groups. Only the asserted `value` of each data-bit
/// segment is consulted; durations are not re-validated against a baud
/// rate, since the decoder here has no independent clock to check them
/// against.
pub fn decode_bits_to_bytes(bits: &[BitSegment]) -> Vec<u8> {
    if bits.is_empty() {
        return Vec::new();
    }
    let framed = &bits[1..];
    framed
        .chunks_exact(10)
        .map(|group| {
            let mut byte = 0u8;
            for (i, &(value, _)) in group[1..9].iter().enumerate() {
                if value {
                    byte |= 1 << i;
                }
            }
            byte
        })
        .collect()
}
