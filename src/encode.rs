//! Binary φ Codec & Fingerprint
//!
//! Two wire contracts consumed by external collaborators:
//!
//! - **Raw dump** (renderer): contiguous little-endian `f32`, `nx·ny·4`
//!   bytes, no header. [`phi_to_le_bytes`] / [`phi_from_le_bytes`] are the
//!   strict encoder/decoder pair.
//! - **Fingerprint** (project files): a 32-bit FNV-1a over the field,
//!   computed by absorbing the 4-byte little-endian element count followed
//!   by each value as little-endian `f32` bytes, rendered as 8 lowercase
//!   hex digits. The hash covers φ only, never metadata.

#![forbid(unsafe_code)]

use crate::Real;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Errors produced by the strict decoder.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The byte length is not a whole number of `f32` values.
    #[error("byte length {0} is not a multiple of 4")]
    RaggedLength(usize),
}

/// Encode φ as the renderer wire format: contiguous little-endian `f32`.
pub fn phi_to_le_bytes(phi: &[Real]) -> Vec<u8> {
    let mut out = Vec::with_capacity(phi.len() * 4);
    for v in phi {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Strict inverse of [`phi_to_le_bytes`].
pub fn phi_from_le_bytes(bytes: &[u8]) -> Result<Vec<Real>, DecodeError> {
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::RaggedLength(bytes.len()));
    }
    let mut out = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        out.push(Real::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(out)
}

#[inline]
fn fnv1a_absorb(mut hash: u32, bytes: &[u8]) -> u32 {
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// 32-bit FNV-1a fingerprint of the field: length prefix, then values.
pub fn phi_fingerprint(phi: &[Real]) -> u32 {
    let mut hash = fnv1a_absorb(FNV_OFFSET_BASIS, &(phi.len() as u32).to_le_bytes());
    for v in phi {
        hash = fnv1a_absorb(hash, &v.to_le_bytes());
    }
    hash
}

/// The fingerprint as the 8-hex-digit string persisted in project files.
pub fn phi_fingerprint_hex(phi: &[Real]) -> String {
    format!("{:08x}", phi_fingerprint(phi))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_layout_is_contiguous_little_endian() {
        let phi = [1.0f32, -2.5, 0.0];
        let bytes = phi_to_le_bytes(&phi);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &(-2.5f32).to_le_bytes());
        assert_eq!(&bytes[8..12], &0.0f32.to_le_bytes());
    }

    #[test]
    fn decoder_round_trips_and_rejects_ragged_input() {
        let phi: Vec<Real> = (0..64).map(|k| (k as Real) * 0.125 - 3.0).collect();
        let bytes = phi_to_le_bytes(&phi);
        let back = phi_from_le_bytes(&bytes).unwrap();
        assert_eq!(phi, back);

        assert!(matches!(phi_from_le_bytes(&bytes[..7]), Err(DecodeError::RaggedLength(7))));
    }

    #[test]
    fn fingerprint_known_vectors() {
        // FNV-1a of the bare 4-byte zero length prefix (empty field).
        let mut expect = FNV_OFFSET_BASIS;
        for _ in 0..4 {
            expect = expect.wrapping_mul(FNV_PRIME);
        }
        assert_eq!(phi_fingerprint(&[]), expect);
        assert_eq!(phi_fingerprint_hex(&[]).len(), 8);
    }

    #[test]
    fn fingerprint_is_length_and_content_sensitive() {
        let a = [0.0f32; 4];
        let b = [0.0f32; 5];
        assert_ne!(phi_fingerprint(&a), phi_fingerprint(&b));

        let mut c = [0.0f32; 4];
        c[2] = 1.0e-20;
        assert_ne!(phi_fingerprint(&a), phi_fingerprint(&c));
    }

    #[test]
    fn fingerprint_hex_is_lowercase_zero_padded() {
        // Any field whose hash has a high nibble of zero still renders
        // eight digits; spot-check formatting properties.
        let s = phi_fingerprint_hex(&[1.0, 2.0, 3.0]);
        assert_eq!(s.len(), 8);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
