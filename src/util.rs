//! Small helpers shared across the diagnostic pipeline.

/// Prefix a URL with `https://` when the operator supplied a bare host.
///
/// Matches the platform dashboards, which hand out `name.workers.dev`
/// without a scheme.
pub fn ensure_https(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Canonical callback URL: the base with a single `/webhook` suffix.
///
/// Suffix matching is exact. A trailing slash or query string does not
/// count as already-canonical and gains a fresh `/webhook` segment.
pub fn canonical_webhook_url(base: &str) -> String {
    let base = ensure_https(base);
    if base.ends_with("/webhook") {
        base
    } else {
        format!("{}/webhook", base.trim_end_matches('/'))
    }
}

/// Truncate a string to at most `max_chars` characters, appending "..."
/// if truncated. Uses character boundaries, so multi-byte input is safe.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", s[..idx].trim_end()),
        None => s.to_string(),
    }
}

/// Mask a credential for display: first 8 characters, then `...`.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 8 {
        let prefix: String = secret.chars().take(8).collect();
        format!("{prefix}...")
    } else {
        secret.to_string()
    }
}
