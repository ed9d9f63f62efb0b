//! CSV candidate import used by the selection dry-run command.
//!
//! The roster format is the minimal slice a selection run needs:
//! `name,major,path,score,created_at`. Score and path may be blank; a blank
//! `created_at` keeps file order as the tie-break.

use std::io::Read;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{
    AdmissionPath, ApplicantIdentity, Application, ApplicationId, ApplicationStatus, GuardianIdentity,
};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unknown admission path '{value}'")]
    UnknownPath { row: usize, value: String },
    #[error("row {row}: invalid score '{value}'")]
    InvalidScore { row: usize, value: String },
    #[error("row {row}: invalid timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },
}

/// Parse dry-run candidates into draft applications for one (period, batch).
pub fn parse_candidates<R: Read>(
    reader: R,
    period: &str,
    batch: &str,
) -> Result<Vec<Application>, RosterError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let base = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single().unwrap_or_default();
    let mut candidates = Vec::new();

    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let row = record?;
        let row_number = index + 1;

        let admission_path = match row.path.as_deref() {
            Some(value) => Some(AdmissionPath::parse(value).ok_or_else(|| {
                RosterError::UnknownPath {
                    row: row_number,
                    value: value.to_string(),
                }
            })?),
            None => None,
        };

        let total_score = match row.score.as_deref() {
            Some(value) => {
                let parsed = value
                    .parse::<f64>()
                    .map_err(|_| RosterError::InvalidScore {
                        row: row_number,
                        value: value.to_string(),
                    })?;
                // "NaN" and "inf" parse, but ranking needs finite scores.
                if !parsed.is_finite() {
                    return Err(RosterError::InvalidScore {
                        row: row_number,
                        value: value.to_string(),
                    });
                }
                Some(parsed)
            }
            None => None,
        };

        let created_at = match row.created_at.as_deref() {
            Some(value) => parse_timestamp(value).ok_or_else(|| RosterError::InvalidTimestamp {
                row: row_number,
                value: value.to_string(),
            })?,
            // File order becomes submission order.
            None => base + Duration::seconds(index as i64),
        };

        candidates.push(Application {
            id: ApplicationId(format!("roster-{row_number:04}")),
            registration_number: None,
            applicant: ApplicantIdentity {
                full_name: row.name,
                gender: None,
                birth_place: String::new(),
                birth_date: chrono::NaiveDate::default(),
                phone: None,
                email: None,
            },
            guardian: GuardianIdentity {
                name: String::new(),
                phone: None,
            },
            major_choice: Some(row.major),
            admission_path,
            period: period.to_string(),
            batch: batch.to_string(),
            status: ApplicationStatus::Pending,
            revision: 0,
            total_score,
            announcement_date: None,
            photo: None,
            certificate: None,
            family_registry: None,
            additional_documents: Vec::new(),
            profile: None,
            created_at,
        });
    }

    Ok(candidates)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    major: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    path: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    score: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
