use chrono::{Datelike, Utc};
use serde::Deserialize;

use super::domain::BatchKey;
use super::repository::{ApplicationRepository, RepositoryError};

/// Batch used when the submission does not name one.
pub const DEFAULT_BATCH: &str = "Wave 1";

const DEFAULT_NUMBER_PREFIX: &str = "PPDB";
const MAX_SEQUENCE_RETRIES: u64 = 5;

/// Raw period/batch/gender fields as submitted by the request layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRegistrationFields {
    pub gender: Option<String>,
    pub period: Option<String>,
    pub batch: Option<String>,
}

/// Canonical field set produced by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFields {
    pub gender: Option<String>,
    pub period: String,
    pub batch: String,
}

/// Canonicalize gender and fill the default period and batch when absent.
pub fn normalize(raw: RawRegistrationFields) -> NormalizedFields {
    NormalizedFields {
        gender: raw.gender.map(|value| normalize_gender(&value)),
        period: raw
            .period
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(current_academic_period),
        batch: raw
            .batch
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BATCH.to_string()),
    }
}

/// Map gender free text onto the canonical `L`/`P` codes. Unrecognized
/// values pass through untouched.
pub fn normalize_gender(value: &str) -> String {
    match value.trim().to_ascii_lowercase().as_str() {
        "male" | "l" | "laki-laki" => "L".to_string(),
        "female" | "p" | "perempuan" => "P".to_string(),
        _ => value.to_string(),
    }
}

/// The `YYYY/YYYY+1` span covering today.
pub fn current_academic_period() -> String {
    let year = Utc::now().year();
    format!("{}/{}", year, year + 1)
}

/// Mints human-readable registration numbers of the form
/// `PREFIX + YYYY + BATCHCODE + NNNN`, unique within one (period, batch).
///
/// The sequence starts at the current registered count plus one. Uniqueness
/// is enforced by the repository reservation; a `Conflict` from a concurrent
/// registration bumps the sequence and retries, so two simultaneous
/// submissions can never mint the same number.
#[derive(Debug, Clone)]
pub struct RegistrationNumberGenerator {
    prefix: String,
}

impl Default for RegistrationNumberGenerator {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_NUMBER_PREFIX)
    }
}

impl RegistrationNumberGenerator {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn generate<R>(&self, repository: &R, key: &BatchKey) -> Result<String, RepositoryError>
    where
        R: ApplicationRepository + ?Sized,
    {
        let year = period_year(&key.period).unwrap_or_else(|| Utc::now().year());
        let code = batch_code(&key.batch);

        let mut sequence = repository.count_registered(key)? + 1;
        for _ in 0..MAX_SEQUENCE_RETRIES {
            let number = format!("{}{:04}{}{:04}", self.prefix, year, code, sequence);
            match repository.reserve_registration_number(key, &number) {
                Ok(()) => return Ok(number),
                Err(RepositoryError::Conflict) => sequence += 1,
                Err(error) => return Err(error),
            }
        }

        Err(RepositoryError::Conflict)
    }
}

/// First four-digit run in the period string, e.g. `2026/2027` -> 2026.
fn period_year(period: &str) -> Option<i32> {
    let digits: String = period
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() < 4 {
        return None;
    }
    digits[..4].parse().ok()
}

/// Three-letter uppercase code derived from the batch name, padded with `X`
/// when the name is short on letters.
fn batch_code(batch: &str) -> String {
    let mut code: String = batch
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while code.len() < 3 {
        code.push('X');
    }
    code
}
