//! Small helpers shared across layers: short-code generation, URL and
//! code validation, IP hashing and user-agent classification.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use xxhash_rust::xxh64::xxh64;

use crate::models::Device;

// =====================================
// Constants
// =====================================

/// Alphabet for generated codes. Alphanumeric only, so codes survive
/// copy-paste, QR scanning and case-preserving file systems.
pub const CODE_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of freshly generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Shortest acceptable code.
pub const MIN_CODE_LENGTH: usize = 6;

/// Widest the generator will go when retrying after collisions.
pub const MAX_CODE_LENGTH: usize = 8;

/// Longest accepted destination URL.
pub const MAX_URL_LENGTH: usize = 2048;

/// Seed for the click-event IP hash. Fixed so the same visitor hashes
/// identically across restarts; the hash is one-way either way.
const IP_HASH_SEED: u64 = 0x536d_6172_744c_6b73;

static VALID_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{6,8}$").expect("invalid code regex"));

// =====================================
// Short codes
// =====================================

/// Generate a random short code of the default length.
#[must_use]
pub fn generate_code() -> String {
    generate_code_with_length(DEFAULT_CODE_LENGTH)
}

/// Generate a random short code of the given length.
///
/// ```rust
/// use smartlinks::utils::generate_code_with_length;
///
/// let code = generate_code_with_length(8);
/// assert_eq!(code.len(), 8);
/// ```
#[must_use]
pub fn generate_code_with_length(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Whether a string is a well-formed short code (6-8 alphanumerics).
#[must_use]
pub fn is_valid_code(code: &str) -> bool {
    VALID_CODE.is_match(code)
}

// =====================================
// URL validation
// =====================================

/// Whether a destination URL is acceptable: parseable, http(s) scheme,
/// within the length cap.
#[must_use]
pub fn is_valid_url(url_str: &str) -> bool {
    if url_str.len() > MAX_URL_LENGTH {
        return false;
    }

    match url::Url::parse(url_str) {
        Ok(url) => {
            let scheme = url.scheme();
            scheme == "http" || scheme == "https"
        }
        Err(_) => false,
    }
}

// =====================================
// Click-event helpers
// =====================================

/// One-way hash of a visitor IP. Raw addresses are never persisted.
#[must_use]
pub fn hash_ip(ip: &str) -> String {
    format!("{:016x}", xxh64(ip.as_bytes(), IP_HASH_SEED))
}

/// Coarse device classification from a User-Agent header.
#[must_use]
pub fn classify_device(user_agent: Option<&str>) -> Device {
    match user_agent {
        Some(ua) if ua.contains("Mobi") || ua.contains("Android") => Device::Mobile,
        _ => Device::Desktop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_has_default_length() {
        let code = generate_code();
        assert_eq!(code.len(), DEFAULT_CODE_LENGTH);
        assert!(is_valid_code(&code));
    }

    #[test]
    fn generated_codes_are_alphanumeric() {
        for len in [6, 7, 8] {
            let code = generate_code_with_length(len);
            assert_eq!(code.len(), len);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn code_validation() {
        assert!(is_valid_code("aZ3kq1"));
        assert!(is_valid_code("aZ3kq1xY"));
        assert!(!is_valid_code("abc"));            // too short
        assert!(!is_valid_code("abcdefghi"));      // too long
        assert!(!is_valid_code("aZ3-q1"));         // punctuation
        assert!(!is_valid_code("aZ3 q1"));         // whitespace
    }

    #[test]
    fn url_validation() {
        assert!(is_valid_url("https://zillow.com/home/123"));
        assert!(is_valid_url("http://example.com/path?q=1"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url(""));

        let oversized = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(!is_valid_url(&oversized));
    }

    #[test]
    fn ip_hash_is_stable_and_opaque() {
        let a = hash_ip("203.0.113.7");
        let b = hash_ip("203.0.113.7");
        let c = hash_ip("203.0.113.8");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(!a.contains("203"));
    }

    #[test]
    fn device_classification() {
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Mobile/15E148")),
            Device::Mobile
        );
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (Linux; Android 14) Chrome/120")),
            Device::Mobile
        );
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0")),
            Device::Desktop
        );
        assert_eq!(classify_device(None), Device::Desktop);
    }
}
