//! Detached signature verification.

use crate::error::{GpgError, GpgResult};
use crate::key::KeyRing;
use pgp::{Deserializable, StandaloneSignature};

/// Parse a detached signature, armored or binary.
fn parse_signature(signature: &[u8]) -> GpgResult<StandaloneSignature> {
    if let Ok(text) = std::str::from_utf8(signature)
        && text.contains("-----BEGIN PGP SIGNATURE-----")
    {
        let (sig, _headers) = StandaloneSignature::from_string(text)
            .map_err(|e| GpgError::InvalidSignature(e.to_string()))?;
        return Ok(sig);
    }
    StandaloneSignature::from_bytes(signature)
        .map_err(|e| GpgError::InvalidSignature(e.to_string()))
}

/// Verify `signature` over `data` with any primary key or subkey in `ring`.
pub fn verify_detached(ring: &KeyRing, data: &[u8], signature: &[u8]) -> GpgResult<()> {
    let sig = parse_signature(signature)?;

    for key in ring.keys() {
        if sig.verify(key, data).is_ok() {
            return Ok(());
        }
        if key
            .public_subkeys
            .iter()
            .any(|subkey| sig.verify(subkey, data).is_ok())
        {
            return Ok(());
        }
    }

    Err(GpgError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNING_KEY: &str = include_str!("../tests/fixtures/signing_key.asc");
    const OTHER_KEY: &str = include_str!("../tests/fixtures/other_key.asc");
    const REPOMD: &[u8] = include_bytes!("../tests/fixtures/repomd.xml");
    const REPOMD_SIG: &[u8] = include_bytes!("../tests/fixtures/repomd.xml.asc");

    #[test]
    fn test_valid_signature() {
        let ring = KeyRing::from_armored(SIGNING_KEY).unwrap();
        verify_detached(&ring, REPOMD, REPOMD_SIG).unwrap();
    }

    #[test]
    fn test_signature_found_in_multi_key_ring() {
        let ring = KeyRing::from_armored(&format!("{OTHER_KEY}{SIGNING_KEY}")).unwrap();
        verify_detached(&ring, REPOMD, REPOMD_SIG).unwrap();
    }

    #[test]
    fn test_wrong_key_fails() {
        let ring = KeyRing::from_armored(OTHER_KEY).unwrap();
        let err = verify_detached(&ring, REPOMD, REPOMD_SIG).unwrap_err();
        assert!(matches!(err, GpgError::VerificationFailed));
    }

    #[test]
    fn test_tampered_data_fails() {
        let ring = KeyRing::from_armored(SIGNING_KEY).unwrap();
        let mut tampered = REPOMD.to_vec();
        tampered.extend_from_slice(b"<!-- extra -->");
        assert!(verify_detached(&ring, &tampered, REPOMD_SIG).is_err());
    }

    #[test]
    fn test_garbage_signature() {
        let ring = KeyRing::from_armored(SIGNING_KEY).unwrap();
        let err = verify_detached(&ring, REPOMD, b"\x00\x01garbage").unwrap_err();
        assert!(matches!(err, GpgError::InvalidSignature(_)));
    }
}
