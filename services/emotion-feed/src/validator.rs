// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Input governance for visitor-supplied text.
//!
//! Implements the checks applied before anything reaches the backend:
//! - Emotion label validation (exact match against the eight labels)
//! - Message validation (length cap plus a denylist of script-like content)
//! - Pattern-based sanitization of markup and script constructs
//! - IP literal format validation
//!
//! The denylist is defense-in-depth, not a sound sanitizer. Anything rendered
//! as HTML must also go through [`escape_html`].

use crate::models::Emotion;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 280;

lazy_static! {
    /// Constructs removed by [`sanitize_input`], applied in order.
    static ref STRIP_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?is)<script\b.*?</script>").unwrap(),
        Regex::new(r"(?is)<iframe\b.*?</iframe>").unwrap(),
        Regex::new(r"(?is)<object\b.*?</object>").unwrap(),
        Regex::new(r"(?is)<embed\b.*?</embed>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)on\w+\s*=").unwrap(),
    ];

    /// Content that makes a message invalid, with a short name for logging.
    static ref SUSPICIOUS_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("script tag", Regex::new(r"(?i)<script").unwrap()),
        ("javascript scheme", Regex::new(r"(?i)javascript:").unwrap()),
        ("event handler", Regex::new(r"(?i)on\w+\s*=").unwrap()),
        ("iframe tag", Regex::new(r"(?i)<iframe").unwrap()),
        ("object tag", Regex::new(r"(?i)<object").unwrap()),
        ("embed tag", Regex::new(r"(?i)<embed").unwrap()),
        ("eval call", Regex::new(r"(?i)eval\s*\(").unwrap()),
        ("document reference", Regex::new(r"(?i)document\.").unwrap()),
        ("window reference", Regex::new(r"(?i)window\.").unwrap()),
        ("location reference", Regex::new(r"(?i)location\.").unwrap()),
        ("alert call", Regex::new(r"(?i)alert\s*\(").unwrap()),
        ("confirm call", Regex::new(r"(?i)confirm\s*\(").unwrap()),
        ("prompt call", Regex::new(r"(?i)prompt\s*\(").unwrap()),
    ];

    static ref IPV4: Regex = Regex::new(
        r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$"
    )
    .unwrap();

    // Full form only; compressed literals such as `::1` are rejected.
    static ref IPV6: Regex = Regex::new(r"^(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}$").unwrap();
}

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown emotion label: {0:?}")]
    UnknownEmotion(String),

    #[error("Message too long: {chars} characters (max {max})", max = MAX_MESSAGE_CHARS)]
    MessageTooLong { chars: usize },

    #[error("Message contains suspicious content: {0}")]
    SuspiciousContent(&'static str),

    #[error("Invalid IP address format: {0:?}")]
    InvalidIp(String),
}

/// Result of validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Input is valid
    Valid,
    /// Input is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Kind of input passed to [`process_user_input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Emotion,
    Message,
    Ip,
    #[default]
    Text,
}

/// Check an emotion label. Case-sensitive, no trimming.
pub fn check_emotion(value: &str) -> ValidationResult {
    match value.parse::<Emotion>() {
        Ok(_) => ValidationResult::Valid,
        Err(()) => ValidationResult::Invalid(ValidationError::UnknownEmotion(value.to_string())),
    }
}

pub fn validate_emotion(value: &str) -> bool {
    check_emotion(value).is_valid()
}

/// Check a message. An empty message is valid.
pub fn check_message(value: &str) -> ValidationResult {
    if value.is_empty() {
        return ValidationResult::Valid;
    }

    let chars = value.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        debug!(chars, "Message too long");
        return ValidationResult::Invalid(ValidationError::MessageTooLong { chars });
    }

    if let Some((name, _)) = SUSPICIOUS_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(value))
    {
        debug!(pattern = *name, "Suspicious message content");
        return ValidationResult::Invalid(ValidationError::SuspiciousContent(*name));
    }

    ValidationResult::Valid
}

pub fn validate_message(value: &str) -> bool {
    check_message(value).is_valid()
}

/// Check that a value is an IPv4 dotted quad or a full IPv6 literal.
///
/// A format gate only: it says nothing about who is behind the address.
pub fn check_ip(value: &str) -> ValidationResult {
    if IPV4.is_match(value) || IPV6.is_match(value) {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(ValidationError::InvalidIp(value.to_string()))
    }
}

pub fn validate_ip(value: &str) -> bool {
    check_ip(value).is_valid()
}

/// Strip script-like markup and trim surrounding whitespace.
///
/// Pattern removal, not a parser. Absent values are the caller's to map to
/// an empty string.
pub fn sanitize_input(value: &str) -> String {
    let mut cleaned = value.to_string();
    for pattern in STRIP_PATTERNS.iter() {
        if let std::borrow::Cow::Owned(replaced) = pattern.replace_all(&cleaned, "") {
            cleaned = replaced;
        }
    }
    cleaned.trim().to_string()
}

/// Sanitize, then gate on the validator matching `kind`.
///
/// Returns the sanitized value when it validates and an empty string
/// otherwise. [`InputKind::Text`] has no gate.
pub fn process_user_input(value: &str, kind: InputKind) -> String {
    if value.is_empty() {
        return String::new();
    }

    let sanitized = sanitize_input(value);
    let accepted = match kind {
        InputKind::Emotion => validate_emotion(&sanitized),
        InputKind::Message => validate_message(&sanitized),
        InputKind::Ip => validate_ip(&sanitized),
        InputKind::Text => true,
    };

    if accepted {
        sanitized
    } else {
        debug!(?kind, "Input rejected after sanitization");
        String::new()
    }
}

/// Escape text for placement inside HTML element content or attributes.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_labels_valid() {
        for label in [
            "Happy", "Sad", "Excited", "Calm", "Anxious", "Grateful", "Frustrated", "Hopeful",
        ] {
            assert!(validate_emotion(label), "{label} should be valid");
        }
    }

    #[test]
    fn test_other_labels_rejected() {
        for label in ["", "happy", "HAPPY", " Happy", "Happy ", "Angry", "Happy\n"] {
            assert!(!validate_emotion(label), "{label:?} should be rejected");
        }
        assert!(matches!(
            check_emotion("Angry").error(),
            Some(ValidationError::UnknownEmotion(label)) if label == "Angry"
        ));
    }

    #[test]
    fn test_clean_messages_valid() {
        assert!(validate_message(""));
        assert!(validate_message("Finally finished my thesis!"));
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS)));
        // Counted in characters, not bytes.
        assert!(validate_message(&"é".repeat(MAX_MESSAGE_CHARS)));
    }

    #[test]
    fn test_long_message_rejected() {
        let result = check_message(&"a".repeat(MAX_MESSAGE_CHARS + 1));
        assert_eq!(
            result.error(),
            Some(&ValidationError::MessageTooLong { chars: 281 })
        );
    }

    #[test]
    fn test_blocklisted_content_rejected() {
        for message in [
            "hi <script>alert(1)</script>",
            "click javascript:void(0)",
            "<img src=x onerror=steal()>",
            "<IFRAME src=//evil>",
            "<object data=x>",
            "<embed src=x>",
            "eval (payload)",
            "document.cookie",
            "window.open",
            "location.href",
            "ALERT(1)",
            "confirm(1)",
            "prompt (1)",
        ] {
            assert!(!validate_message(message), "{message:?} should be rejected");
        }
    }

    #[test]
    fn test_event_handler_anywhere_in_word() {
        assert!(!validate_message("abconerror=x"));
        assert!(!validate_message("x onload = y"));
        assert!(validate_message("the reason = simple"));
        assert_eq!(sanitize_input("conditions=1"), "c1");
    }

    #[test]
    fn test_sanitize_strips_script_block() {
        assert_eq!(sanitize_input("<script>alert(1)</script>hello"), "hello");
        assert_eq!(
            sanitize_input("a<SCRIPT type=\"x\">\nbad()\n</SCRIPT>b"),
            "ab"
        );
    }

    #[test]
    fn test_sanitize_strips_other_constructs() {
        assert_eq!(sanitize_input("<iframe src=x></iframe>ok"), "ok");
        assert_eq!(sanitize_input("<object></object>ok<embed></embed>"), "ok");
        assert_eq!(sanitize_input("go JavaScript:run"), "go run");
        assert_eq!(sanitize_input("<b onclick=x>"), "<b x>");
        assert_eq!(sanitize_input("   padded  "), "padded");
    }

    #[test]
    fn test_sanitized_value_can_still_fail_validation() {
        // The handler is stripped, the call is not.
        let sanitized = sanitize_input("<a onclick=alert(1)>");
        assert_eq!(sanitized, "<a alert(1)>");
        assert!(!validate_message(&sanitized));
        assert_eq!(process_user_input("<a onclick=alert(1)>", InputKind::Message), "");
    }

    #[test]
    fn test_process_trims_before_emotion_check() {
        assert_eq!(process_user_input(" Happy ", InputKind::Emotion), "Happy");
        assert_eq!(process_user_input("happy", InputKind::Emotion), "");
        assert_eq!(process_user_input("", InputKind::Emotion), "");
    }

    #[test]
    fn test_process_text_is_ungated() {
        assert_eq!(process_user_input("  document.title ", InputKind::Text), "document.title");
        assert_eq!(InputKind::default(), InputKind::Text);
    }

    #[test]
    fn test_process_message() {
        assert_eq!(
            process_user_input("  feeling good  ", InputKind::Message),
            "feeling good"
        );
        assert_eq!(
            process_user_input("<script>x</script>feeling good", InputKind::Message),
            "feeling good"
        );
        assert_eq!(process_user_input("see window.name", InputKind::Message), "");
    }

    #[test]
    fn test_ip_validation() {
        assert!(validate_ip("192.168.1.1"));
        assert!(validate_ip("0.0.0.0"));
        assert!(validate_ip("255.255.255.255"));
        assert!(validate_ip("2001:0db8:85a3:0000:0000:8a2e:0370:7334"));
        assert!(!validate_ip("256.1.1.1"));
        assert!(!validate_ip("1.2.3"));
        assert!(!validate_ip("unknown"));
        assert!(!validate_ip(""));
        assert!(!validate_ip("::1"));
        assert!(!validate_ip("2001:db8::1"));
    }

    #[test]
    fn test_process_ip() {
        assert_eq!(process_user_input(" 203.0.113.9\n", InputKind::Ip), "203.0.113.9");
        assert_eq!(process_user_input("unknown", InputKind::Ip), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b class="x">Tom & Jerry's</b>"#),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
