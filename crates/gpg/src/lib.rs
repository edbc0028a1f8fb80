//! GPG support for repository metadata validation.
//!
//! This crate provides:
//! - Loading armored public keys, including several concatenated keys in one text
//! - Verifying a detached `repomd.xml.asc` signature against a key ring

pub mod error;
pub mod key;
pub mod verify;

pub use error::{GpgError, GpgResult};
pub use key::KeyRing;
pub use verify::verify_detached;
