//! LEB128 variable-length integer encoding/decoding.

use crate::error::DecodeError;

/// Integers that can be encoded as a LEB128 varint.
///
/// Protobuf varints carry 7 bits per byte, least significant group first,
/// with the high bit of each byte marking a continuation.
pub trait LebCodec: Sized {
    /// Maximum number of bytes a canonical encoding of `Self` occupies.
    const MAX_LEB_BYTES: usize;

    /// Decode a LEB128 varint from the front of `data`.
    ///
    /// Returns the decoded value and the number of bytes it occupied.
    ///
    /// # Errors
    ///
    /// * [`DecodeError::TruncatedInput`] if `data` ends while the
    ///   continuation bit is still set.
    /// * [`DecodeError::MalformedVarint`] if the encoding is longer than
    ///   [`LebCodec::MAX_LEB_BYTES`] or overflows `Self`.
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError>;

    /// Decode a LEB128 varint from a [`bytes::Buf`], advancing past it.
    fn decode_leb128_buf<B: bytes::Buf>(buf: &mut B) -> Result<Self, DecodeError> {
        let chunk = buf.chunk();

        // Fast path: the buffer is contiguous, e.g. `Bytes` or `&[u8]`.
        if chunk.len() == buf.remaining() {
            let (value, bytes_read) = Self::decode_leb128(chunk)?;
            buf.advance(bytes_read);
            return Ok(value);
        }

        // Slow path: the varint may straddle chunks, gather it byte by byte.
        let mut scratch = [0u8; 16];
        let mut len = 0;
        while len < Self::MAX_LEB_BYTES && buf.has_remaining() {
            let byte = buf.get_u8();
            scratch[len] = byte;
            len += 1;
            if byte < 0x80 {
                break;
            }
        }
        Self::decode_leb128(&scratch[..len]).map(|(value, _)| value)
    }

    /// Encode `self` as a LEB128 varint, returning the number of bytes written.
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) -> usize;

    /// The number of bytes required to encode this integer.
    fn encoded_leb128_len(self) -> usize;
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: usize = 10;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut value = 0u64;
        for (idx, &byte) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
            // The 10th byte only contributes the most significant bit.
            if idx == Self::MAX_LEB_BYTES - 1 && byte > 0x01 {
                return Err(DecodeError::malformed_varint());
            }
            value |= u64::from(byte & 0x7f) << (idx * 7);
            if byte < 0x80 {
                return Ok((value, idx + 1));
            }
        }

        if data.len() >= Self::MAX_LEB_BYTES {
            Err(DecodeError::malformed_varint())
        } else {
            Err(DecodeError::truncated())
        }
    }

    #[inline]
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) -> usize {
        let mut value = self;
        let mut written = 1;
        while value >= 0x80 {
            buf.put_u8((value & 0x7f) as u8 | 0x80);
            value >>= 7;
            written += 1;
        }
        buf.put_u8(value as u8);
        written
    }

    /// LEB128 encodes 7 bits per byte, so the length is
    /// `ceil(significant_bits / 7)` with a minimum of 1 byte for zero.
    #[inline]
    fn encoded_leb128_len(self) -> usize {
        let significant_bits = (u64::BITS - self.leading_zeros()).max(1);
        (significant_bits as usize + 6) / 7
    }
}
