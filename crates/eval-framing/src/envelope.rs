use crate::error::FramingError;

/// Reserved tag value signalling termination. All valid eval_ids are >= 1,
/// so 0 is never a legitimate tag (§4.4).
pub const TERMINATION_TAG: u32 = 0;

/// A length-prefixed, tagged byte buffer. `tag` carries the eval_id the
/// payload belongs to (or `TERMINATION_TAG` for a zero-length termination
/// signal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub tag: u32,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(tag: u32, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }

    pub fn termination() -> Self {
        Self {
            tag: TERMINATION_TAG,
            payload: Vec::new(),
        }
    }

    pub fn is_termination(&self) -> bool {
        self.tag == TERMINATION_TAG && self.payload.is_empty()
    }

    /// Emits `u32 body_len | u32 tag | payload`, little-endian.
    pub fn pack(&self) -> Vec<u8> {
        let body_len = 4 + self.payload.len() as u32;
        let mut out = Vec::with_capacity(4 + body_len as usize);
        out.extend_from_slice(&body_len.to_le_bytes());
        out.extend_from_slice(&self.tag.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Consumes one length-prefixed record from the front of `bytes`,
    /// returning the envelope and the number of bytes consumed.
    pub fn unpack(bytes: &[u8]) -> Result<(Self, usize), FramingError> {
        if bytes.len() < 4 {
            return Err(FramingError::BufferTooSmall {
                needed: 4,
                available: bytes.len(),
            });
        }
        let body_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let total = 4 + body_len;
        if bytes.len() < total {
            return Err(FramingError::BufferTooSmall {
                needed: total,
                available: bytes.len(),
            });
        }
        if body_len < 4 {
            return Err(FramingError::Decode(format!(
                "envelope body_len {body_len} shorter than tag field"
            )));
        }
        let tag = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let payload = bytes[8..total].to_vec();
        Ok((Envelope { tag, payload }, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trips() {
        let env = Envelope::new(42, vec![1, 2, 3, 4, 5]);
        let bytes = env.pack();
        let (restored, consumed) = Envelope::unpack(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(restored, env);
    }

    #[test]
    fn termination_is_zero_length_with_tag_zero() {
        let env = Envelope::termination();
        assert!(env.is_termination());
        let bytes = env.pack();
        assert_eq!(bytes.len(), 8);
    }

    #[test]
    fn unpack_reports_short_buffer() {
        let bytes = [0u8, 0, 0]; // fewer than 4 bytes
        assert!(matches!(
            Envelope::unpack(&bytes),
            Err(FramingError::BufferTooSmall { .. })
        ));
    }
}
