use md5::{Digest, Md5};

pub fn md5_hex(data: &[u8]) -> String {
    format!("{:X}", Md5::digest(data))
}

/// Compares a client supplied digest against the body, ignoring hex case.
pub fn verify(data: &[u8], expected: &str) -> bool {
    md5_hex(data).eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod checksum_tests {
    use super::*;

    #[test]
    fn digest_of_known_input() {
        assert_eq!(md5_hex(b""), "D41D8CD98F00B204E9800998ECF8427E");
        assert_eq!(md5_hex(b"hello"), "5D41402ABC4B2A76B9719D911017C592");
    }

    #[test]
    fn verify_is_case_insensitive() {
        assert!(verify(b"hello", "5d41402abc4b2a76b9719d911017c592"));
        assert!(!verify(b"hello!", "5d41402abc4b2a76b9719d911017c592"));
    }
}
