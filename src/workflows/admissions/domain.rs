use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for admission applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Admission channel an applicant competes through. Quotas may be configured
/// per path, so the set is closed and ordered for use as a map key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPath {
    Zonasi,
    Affirmative,
    Transfer,
    Achievement,
    Academic,
}

impl AdmissionPath {
    pub const fn label(self) -> &'static str {
        match self {
            AdmissionPath::Zonasi => "zonasi",
            AdmissionPath::Affirmative => "affirmative",
            AdmissionPath::Transfer => "transfer",
            AdmissionPath::Achievement => "achievement",
            AdmissionPath::Academic => "academic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zonasi" => Some(AdmissionPath::Zonasi),
            "affirmative" | "afirmasi" => Some(AdmissionPath::Affirmative),
            "transfer" | "perpindahan" => Some(AdmissionPath::Transfer),
            "achievement" | "prestasi" => Some(AdmissionPath::Achievement),
            "academic" | "akademik" => Some(AdmissionPath::Academic),
            _ => None,
        }
    }
}

/// Lifecycle status of an application. `Pending` and `RevisionRequired`
/// remain editable; `Accepted` and `Rejected` are terminal and locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    RevisionRequired,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::RevisionRequired => "revision_required",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn can_edit(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::RevisionRequired
        )
    }

    pub const fn is_locked(self) -> bool {
        !self.can_edit()
    }
}

/// Category of an uploaded admission document. The category drives the size
/// limit, the allowed content types, and the storage name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Photo,
    Certificate,
    FamilyRegistry,
    Additional,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Photo => "photo",
            DocumentKind::Certificate => "certificate",
            DocumentKind::FamilyRegistry => "family_registry",
            DocumentKind::Additional => "additional",
        }
    }
}

/// Reference to a durably stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub path: String,
    pub size_bytes: u64,
}

/// Extended address detail owned 1:1 by an application. Every field must be
/// present before the application can be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressProfile {
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub street: Option<String>,
}

/// Applicant identity captured at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantIdentity {
    pub full_name: String,
    /// Canonical gender code after intake normalization (`L` or `P`).
    pub gender: Option<String>,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Guardian identity and contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianIdentity {
    pub name: String,
    pub phone: Option<String>,
}

/// The (academic period, admission wave) pair scoping registration numbering
/// and selection runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchKey {
    pub period: String,
    pub batch: String,
}

impl BatchKey {
    pub fn new(period: impl Into<String>, batch: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            batch: batch.into(),
        }
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.period, self.batch)
    }
}

/// One admission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    /// Unique within the (period, batch); assigned by registration intake.
    pub registration_number: Option<String>,
    pub applicant: ApplicantIdentity,
    pub guardian: GuardianIdentity,
    pub major_choice: Option<String>,
    pub admission_path: Option<AdmissionPath>,
    pub period: String,
    pub batch: String,
    pub status: ApplicationStatus,
    /// Optimistic-concurrency counter. The repository rejects an `update`
    /// whose revision does not match the stored row and bumps it on every
    /// successful write, so a stale copy can never overwrite a newer one.
    #[serde(default)]
    pub revision: u64,
    /// Supplied by the external scoring process, never computed here. NaN is
    /// not a valid input.
    pub total_score: Option<f64>,
    pub announcement_date: Option<DateTime<Utc>>,
    pub photo: Option<StoredDocument>,
    pub certificate: Option<StoredDocument>,
    pub family_registry: Option<StoredDocument>,
    pub additional_documents: Vec<StoredDocument>,
    pub profile: Option<AddressProfile>,
    /// Submission timestamp, used as the deterministic tie-break.
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn batch_key(&self) -> BatchKey {
        BatchKey::new(self.period.clone(), self.batch.clone())
    }

    /// Read the mandatory-document slot for a kind. `Additional` documents
    /// live in their own list and have no single slot.
    pub fn document(&self, kind: DocumentKind) -> Option<&StoredDocument> {
        match kind {
            DocumentKind::Photo => self.photo.as_ref(),
            DocumentKind::Certificate => self.certificate.as_ref(),
            DocumentKind::FamilyRegistry => self.family_registry.as_ref(),
            DocumentKind::Additional => None,
        }
    }

    pub fn set_document(&mut self, kind: DocumentKind, document: StoredDocument) {
        match kind {
            DocumentKind::Photo => self.photo = Some(document),
            DocumentKind::Certificate => self.certificate = Some(document),
            DocumentKind::FamilyRegistry => self.family_registry = Some(document),
            DocumentKind::Additional => self.additional_documents.push(document),
        }
    }
}
