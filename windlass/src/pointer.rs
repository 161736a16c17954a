//! Pointer-descriptor parsing.
//!
//! Large-file hosts publish a small plain-text pointer document alongside
//! each stored binary. The line `oid sha256:<64 hex chars>` declares the
//! expected content digest. This module derives the pointer URL from the
//! content URL and extracts the declared digest as a typed result, so the
//! parsing can be tested without any network access.

/// Line prefix that marks the authoritative digest line.
const POINTER_MARKER: &str = "oid sha256:";

/// Length of a hex-encoded SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

/// Derive the pointer-descriptor URL from a content URL.
///
/// The hosting convention replaces the `resolve` path segment (content
/// bytes) with `raw` (pointer text) and drops any query string.
pub fn pointer_url_for(content_url: &str) -> String {
    let without_query = match content_url.split_once('?') {
        Some((base, _)) => base,
        None => content_url,
    };
    without_query.replacen("/resolve/", "/raw/", 1)
}

/// Extract the expected SHA-256 digest from a pointer descriptor.
///
/// Scans line-by-line for the first line beginning with `oid sha256:` and
/// returns the trailing hex token, normalized to lowercase. Returns `None`
/// when no such line exists or the token is not a well-formed digest;
/// an absent digest never compares equal to any computed one.
pub fn expected_sha256(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let line = text
        .lines()
        .find(|line| line.starts_with(POINTER_MARKER))?;

    let token = line[POINTER_MARKER.len()..].trim();
    if token.len() != SHA256_HEX_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    Some(token.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_pointer_url_replaces_resolve_and_strips_query() {
        let url = "https://host.example/datasets/acme/bulk/resolve/main/part00.zip?download=true";
        assert_eq!(
            pointer_url_for(url),
            "https://host.example/datasets/acme/bulk/raw/main/part00.zip"
        );
    }

    #[test]
    fn test_pointer_url_without_resolve_segment() {
        let url = "https://host.example/files/part00.zip";
        assert_eq!(pointer_url_for(url), url);
    }

    #[test]
    fn test_pointer_url_only_first_resolve_replaced() {
        let url = "https://host.example/resolve/a/resolve/b";
        assert_eq!(pointer_url_for(url), "https://host.example/raw/a/resolve/b");
    }

    #[test]
    fn test_expected_sha256_from_full_pointer() {
        let pointer = format!(
            "version https://git-lfs.github.com/spec/v1\noid sha256:{}\nsize 10000\n",
            DIGEST
        );
        assert_eq!(expected_sha256(pointer.as_bytes()), Some(DIGEST.to_string()));
    }

    #[test]
    fn test_expected_sha256_normalizes_case() {
        let pointer = format!("oid sha256:{}\n", DIGEST.to_ascii_uppercase());
        assert_eq!(expected_sha256(pointer.as_bytes()), Some(DIGEST.to_string()));
    }

    #[test]
    fn test_expected_sha256_absent() {
        assert_eq!(expected_sha256(b"version 1\nsize 10000\n"), None);
        assert_eq!(expected_sha256(b""), None);
    }

    #[test]
    fn test_expected_sha256_rejects_malformed_token() {
        // Too short.
        assert_eq!(expected_sha256(b"oid sha256:abc123\n"), None);
        // Right length, not hex.
        let bad = format!("oid sha256:{}\n", "z".repeat(64));
        assert_eq!(expected_sha256(bad.as_bytes()), None);
    }

    #[test]
    fn test_expected_sha256_first_line_is_authoritative() {
        let pointer = format!("oid sha256:not-a-digest\noid sha256:{}\n", DIGEST);
        // The first marker line is malformed; later lines are not consulted.
        assert_eq!(expected_sha256(pointer.as_bytes()), None);
    }
}
