//! Tenant storage-domain names.

use rand::Rng;

/// Length of a generated storage-domain name.
pub const DOMAIN_NAME_LEN: usize = 8;

const DOMAIN_NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random candidate domain name.
///
/// Names start with a letter so they are usable as path segments and
/// identifiers in downstream services.
pub fn generate_domain_name() -> String {
    let mut rng = rand::rng();
    let mut name = String::with_capacity(DOMAIN_NAME_LEN);
    name.push(char::from(DOMAIN_NAME_ALPHABET[rng.random_range(0..26)]));
    for _ in 1..DOMAIN_NAME_LEN {
        let idx = rng.random_range(0..DOMAIN_NAME_ALPHABET.len());
        name.push(char::from(DOMAIN_NAME_ALPHABET[idx]));
    }
    name
}
