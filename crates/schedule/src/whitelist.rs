//! Phone-number whitelist used for per-user test overrides.
//!
//! Entries and caller numbers are compared on their last ten digits, so
//! `+91 98765-43210` and `9876543210` identify the same person.

/// Strip every non-digit and keep at most the trailing ten digits.
pub fn normalize_phone_last_10(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(10);
    digits[start..].iter().collect()
}

/// Parsed list of whitelisted phone suffixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneWhitelist {
    entries: Vec<String>,
}

impl PhoneWhitelist {
    /// Parse a comma-separated list. Blank items are ignored.
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(normalize_phone_last_10)
            .filter(|digits| !digits.is_empty())
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the caller's phone number matches any entry.
    pub fn contains(&self, phone: Option<&str>) -> bool {
        let Some(phone) = phone else {
            return false;
        };
        if self.entries.is_empty() {
            return false;
        }
        let normalized = normalize_phone_last_10(phone);
        if normalized.is_empty() {
            return false;
        }
        self.entries.iter().any(|entry| *entry == normalized)
    }
}
