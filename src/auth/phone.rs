//! Phone number canonicalisation.
//!
//! Every phone key that reaches the OTP store or the user directory is first
//! reduced to E.164 (`+<country><national>`). `legacy_variants` produces the
//! alternate spellings older writers used so lookups can still reconcile them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

const NATIONAL_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("Phone number is empty")]
    Empty,

    #[error("Phone number contains invalid characters: {0}")]
    InvalidCharacters(String),

    #[error("Phone number has an invalid length: {0}")]
    InvalidLength(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber {
    country_code: String,
    national: String,
}

impl PhoneNumber {
    /// Parse `raw`, assuming `default_cc` when no country code is present.
    pub fn parse(raw: &str, default_cc: &str) -> Result<Self, PhoneError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let has_plus = trimmed.starts_with('+');
        let body = trimmed.trim_start_matches('+');
        let mut digits = String::with_capacity(body.len());
        for c in body.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '(' | ')' | '.' => {}
                _ => return Err(PhoneError::InvalidCharacters(raw.to_string())),
            }
        }
        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let default_cc = default_cc.trim_start_matches('+');
        let international = if has_plus {
            Some(digits.clone())
        } else if let Some(rest) = digits.strip_prefix("00") {
            Some(rest.to_string())
        } else {
            None
        };

        let (country_code, national) = match international {
            Some(full) => split_international(&full, default_cc)
                .ok_or_else(|| PhoneError::InvalidLength(raw.to_string()))?,
            None => {
                if digits.len() == NATIONAL_LEN {
                    (default_cc.to_string(), digits)
                } else if digits.len() == NATIONAL_LEN + 1 && digits.starts_with('0') {
                    (default_cc.to_string(), digits[1..].to_string())
                } else if digits.len() == default_cc.len() + NATIONAL_LEN
                    && digits.starts_with(default_cc)
                {
                    (default_cc.to_string(), digits[default_cc.len()..].to_string())
                } else {
                    return Err(PhoneError::InvalidLength(raw.to_string()));
                }
            }
        };

        let total = country_code.len() + national.len();
        if !(8..=15).contains(&total) {
            return Err(PhoneError::InvalidLength(raw.to_string()));
        }

        Ok(Self {
            country_code,
            national,
        })
    }

    /// `+919000000000`
    pub fn e164(&self) -> String {
        format!("+{}{}", self.country_code, self.national)
    }

    /// National significant number, the form users type and the directory stores.
    pub fn national(&self) -> &str {
        &self.national
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Log-safe rendering: only the last four digits are kept.
    pub fn masked(&self) -> String {
        mask(&self.national)
    }

    /// Stable correlation id for logs without exposing the number.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.e164().as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        hash[..12].to_string()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.e164())
    }
}

fn split_international(full: &str, default_cc: &str) -> Option<(String, String)> {
    // Prefer the configured country code; otherwise assume a ten digit
    // national part and treat the remaining prefix as the country code.
    if let Some(national) = full.strip_prefix(default_cc) {
        if national.len() == NATIONAL_LEN {
            return Some((default_cc.to_string(), national.to_string()));
        }
    }
    if full.len() > NATIONAL_LEN && full.len() <= NATIONAL_LEN + 3 {
        let split = full.len() - NATIONAL_LEN;
        return Some((full[..split].to_string(), full[split..].to_string()));
    }
    None
}

/// Mask any phone-ish string for logging.
pub fn mask(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("******{}", tail)
}

/// Alternate spellings of a phone key: with and without `+<cc>`, `<cc>` and a
/// trunk `0`. The input itself is not included.
pub fn legacy_variants(raw: &str, default_cc: &str) -> Vec<String> {
    let raw = raw.trim();
    let default_cc = default_cc.trim_start_matches('+');
    let plus_cc = format!("+{}", default_cc);

    let candidates = [
        match raw.strip_prefix(plus_cc.as_str()) {
            Some(rest) => rest.to_string(),
            None => format!("{}{}", plus_cc, raw),
        },
        match raw.strip_prefix(default_cc) {
            Some(rest) => rest.to_string(),
            None => format!("{}{}", default_cc, raw),
        },
        match raw.strip_prefix('0') {
            Some(rest) => rest.to_string(),
            None => format!("0{}", raw),
        },
    ];

    let mut variants = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_empty() && candidate != raw && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}
