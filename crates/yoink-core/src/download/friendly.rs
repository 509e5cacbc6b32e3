//! Raw fetcher error text to user-facing message lookup.
//!
//! Pure presentation helper. The scheduler forwards raw text untouched;
//! only UIs call into this.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Messages longer than this are truncated when no pattern matches.
const MAX_RAW_LEN: usize = 120;

/// Ordered pattern table; the first match wins.
const PATTERNS: &[(&str, &str)] = &[
    (
        r"Sign in to confirm you.re not a bot",
        "YouTube is requesting bot verification. Try again later or use a different IP.",
    ),
    (r"(private video|video is private)", "This video is private."),
    (
        r"(video unavailable|video has been removed)",
        "This video is unavailable or has been removed.",
    ),
    (
        r"(age.restricted|age.gate|confirm your age)",
        "This video is age-restricted.",
    ),
    (
        r"HTTP Error 429",
        "Rate limited by YouTube. Wait a minute and try again.",
    ),
    (
        r"HTTP Error 403",
        "Access denied (403). The video may be region-locked.",
    ),
    (r"HTTP Error 404", "Video not found (404). Check the URL."),
    (
        r"(ffmpeg|ffprobe).*(not found|is not recognized)",
        "ffmpeg is not installed. Install it to merge video+audio.",
    ),
    (
        r"(No space left on device|disk full|ENOSPC)",
        "Disk full. Free up space and try again.",
    ),
    (
        r"(timed? ?out|TimeoutError|Read timed out)",
        "Connection timed out. Check your internet and try again.",
    ),
    (
        r"(network|connection|ConnectionError|URLError)",
        "Network error. Check your internet connection.",
    ),
    (
        r"Unsupported URL",
        "Unsupported URL. Only YouTube links are supported.",
    ),
    (
        r"is not a valid URL",
        "Invalid URL. Paste a valid YouTube link.",
    ),
    (
        r"live event will begin",
        "This is an upcoming live stream that hasn't started yet.",
    ),
    (
        r"(members.only|premium)",
        "This video requires a membership or YouTube Premium.",
    ),
];

/// Patterns for failures worth retrying later.
const TRANSIENT: &[&str] = &[
    r"HTTP Error 429",
    r"(timed? ?out|TimeoutError|Read timed out)",
    r"(network|connection|ConnectionError|URLError)",
];

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

static COMPILED: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .map(|(pattern, message)| (compile(pattern), *message))
        .collect()
});

static COMPILED_TRANSIENT: LazyLock<Vec<Regex>> =
    LazyLock::new(|| TRANSIENT.iter().map(|p| compile(p)).collect());

/// Map raw error text to a short user-facing message.
///
/// Unrecognized text is passed through, truncated to 120 characters.
#[must_use]
pub fn friendly_message(raw: &str) -> String {
    if let Some((_, message)) = COMPILED.iter().find(|(re, _)| re.is_match(raw)) {
        return (*message).to_string();
    }
    if raw.chars().count() > MAX_RAW_LEN {
        let head: String = raw.chars().take(MAX_RAW_LEN - 3).collect();
        return format!("{head}...");
    }
    raw.to_string()
}

/// Whether the raw text describes a rate limit, timeout or network failure.
#[must_use]
pub fn is_transient(raw: &str) -> bool {
    COMPILED_TRANSIENT.iter().any(|re| re.is_match(raw))
}
