//! Sensitive data masking for logs.
//!
//! Masks API keys, secrets, auth answers and request signatures before they
//! reach a log line.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

struct SensitivePattern {
    regex: Regex,
    group: usize,
}

static PATTERNS: LazyLock<Vec<SensitivePattern>> = LazyLock::new(|| {
    [
        (
            r#"(?i)(api[_-]?key|apikey|"key")["\s:=]+["']?([A-Za-z0-9_\-]{8,128})["']?"#,
            2,
        ),
        (
            r#"(?i)(secret[_-]?key|api[_-]?secret|secret)["\s:=]+["']?([A-Za-z0-9+/=_\-]{8,256})["']?"#,
            2,
        ),
        (r#"(?i)("answer")["\s:=]+["']?([a-f0-9]{16,128})["']?"#, 2),
        (r"(?i)(ddx-signature)[\s:=]+([a-f0-9]{16,128})", 2),
        (r"(?i)(ddx-key)[\s:=]+([A-Za-z0-9_\-]{8,128})", 2),
    ]
    .into_iter()
    .filter_map(|(pattern, group)| {
        Regex::new(pattern)
            .ok()
            .map(|regex| SensitivePattern { regex, group })
    })
    .collect()
});

/// Masks sensitive data in strings.
#[derive(Debug, Clone)]
pub struct SensitiveDataMasker {
    min_length: usize,
    show_start: usize,
    show_end: usize,
}

impl Default for SensitiveDataMasker {
    fn default() -> Self {
        Self::new()
    }
}

impl SensitiveDataMasker {
    /// Create a new masker with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_length: 8,
            show_start: 3,
            show_end: 3,
        }
    }

    /// Mask a known sensitive value.
    ///
    /// ```
    /// use duedex_telemetry::masking::SensitiveDataMasker;
    ///
    /// let masker = SensitiveDataMasker::new();
    /// assert_eq!(masker.mask_value("abcdefghijklmnop"), "abc***nop");
    /// assert_eq!(masker.mask_value("short"), "*****");
    /// ```
    #[must_use]
    pub fn mask_value(&self, value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        if chars.len() < self.min_length {
            return "*".repeat(chars.len().max(3));
        }
        let start: String = chars[..self.show_start].iter().collect();
        let end: String = chars[chars.len() - self.show_end..].iter().collect();
        format!("{start}***{end}")
    }

    /// Mask sensitive data in a string using pattern detection.
    ///
    /// ```
    /// use duedex_telemetry::masking::SensitiveDataMasker;
    ///
    /// let masker = SensitiveDataMasker::new();
    /// let masked = masker.mask_string(r#"{"type":"auth","key":"abcdefghijklmnop","answer":"0123456789abcdef0123"}"#);
    /// assert!(!masked.contains("abcdefghijklmnop"));
    /// assert!(!masked.contains("0123456789abcdef0123"));
    /// ```
    #[must_use]
    pub fn mask_string<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut result = Cow::Borrowed(input);

        for pattern in PATTERNS.iter() {
            let replaced = pattern
                .regex
                .replace_all(&result, |caps: &regex::Captures<'_>| {
                    let whole = &caps[0];
                    caps.get(pattern.group).map_or_else(
                        || whole.to_string(),
                        |secret| whole.replace(secret.as_str(), &self.mask_value(secret.as_str())),
                    )
                })
                .into_owned();
            if replaced != result {
                result = Cow::Owned(replaced);
            }
        }

        result
    }

    /// Check if a string contains sensitive patterns.
    #[must_use]
    pub fn contains_sensitive(&self, input: &str) -> bool {
        PATTERNS.iter().any(|p| p.regex.is_match(input))
    }
}
