use std::fmt;

/// Upper bound (in bytes) of a runner display name.
pub const MAX_IDENTITY_LEN: usize = 64;

/// Inputs of the runner name, in priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameConfig {
    /// Full-name override. When non-empty it wins outright.
    pub full_name: Option<String>,
    /// Name prefix; `github-runner` when unset.
    pub prefix: Option<String>,
    /// Optional disambiguator placed between prefix and suffix.
    pub fragment: Option<String>,
    /// Machine host identifier used as suffix when present.
    pub host_id: Option<String>,
}

/// Display name of the runner instance.
///
/// Never empty and never longer than [`MAX_IDENTITY_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunnerIdentity(String);

impl RunnerIdentity {
    /// Build an identity, truncating overlong input.
    ///
    /// Returns `None` for empty (or whitespace-only) input.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self(truncate_to(name, MAX_IDENTITY_LEN).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RunnerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RunnerIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Cut `s` to at most `max` bytes without splitting a UTF-8 character.
pub fn truncate_to(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rejects_empty() {
        assert!(RunnerIdentity::new("").is_none());
        assert!(RunnerIdentity::new("   ").is_none());
    }

    #[test]
    fn identity_truncates_to_bound() {
        let id = RunnerIdentity::new("x".repeat(100)).unwrap();
        assert_eq!(id.as_str().len(), MAX_IDENTITY_LEN);
    }

    #[test]
    fn truncate_keeps_char_boundary() {
        // 'é' is two bytes; 33 of them are 66 bytes.
        let s = "é".repeat(33);
        let cut = truncate_to(&s, MAX_IDENTITY_LEN);
        assert_eq!(cut.len(), 64);
        assert_eq!(cut.chars().count(), 32);

        let s = format!("a{}", "é".repeat(40));
        let cut = truncate_to(&s, MAX_IDENTITY_LEN);
        assert_eq!(cut.len(), 63);
    }

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate_to("runner-1", 64), "runner-1");
    }
}
