//! Armored public key rings.

use crate::error::{GpgError, GpgResult};
use pgp::types::PublicKeyTrait;
use pgp::{Deserializable, SignedPublicKey};
use std::fmt;

const END_PUBLIC_KEY_BLOCK: &str = "-----END PGP PUBLIC KEY BLOCK-----";

/// Split text holding one or more concatenated armored public keys into
/// individual armored blocks. Text after the last end marker is ignored.
pub fn split_armored_keys(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(end) = rest.find(END_PUBLIC_KEY_BLOCK) {
        let (block, tail) = rest.split_at(end + END_PUBLIC_KEY_BLOCK.len());
        let block = block.trim();
        if !block.is_empty() {
            blocks.push(format!("{block}\n"));
        }
        rest = tail;
    }
    blocks
}

/// The public keys loaded from a repository's configured GPG key text.
#[derive(Clone)]
pub struct KeyRing {
    keys: Vec<SignedPublicKey>,
}

impl KeyRing {
    /// Parse every armored public key in `text`.
    ///
    /// Fails if the text holds no key or if any block does not parse.
    pub fn from_armored(text: &str) -> GpgResult<Self> {
        let blocks = split_armored_keys(text);
        if blocks.is_empty() {
            return Err(GpgError::NoKeys);
        }

        let mut keys = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let (key, _headers) = SignedPublicKey::from_string(block)
                .map_err(|e| GpgError::KeyParsing(e.to_string()))?;
            key.verify()
                .map_err(|e| GpgError::KeyParsing(format!("invalid self-signature: {e}")))?;
            keys.push(key);
        }

        tracing::debug!(keys = keys.len(), "Loaded GPG key ring");
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn keys(&self) -> &[SignedPublicKey] {
        &self.keys
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self
            .keys
            .iter()
            .map(|key| format!("{:?}", key.key_id()))
            .collect();
        f.debug_struct("KeyRing").field("keys", &ids).finish()
    }
}
