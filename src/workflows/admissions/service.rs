use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::completeness::{ensure_editable, submission_checklist, ApplicationLocked, UnmetRequirement};
use super::documents::{DocumentIntake, UploadError, UploadedFile};
use super::domain::{
    AddressProfile, AdmissionPath, ApplicantIdentity, Application, ApplicationId,
    ApplicationStatus, BatchKey, DocumentKind, GuardianIdentity,
};
use super::intake::{normalize, RawRegistrationFields, RegistrationNumberGenerator};
use super::repository::{ApplicationRepository, DocumentStorage, RepositoryError};
use super::selection::{SelectionConfig, SelectionEngine};

/// Registration payload as accepted from the request layer, before
/// normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationSubmission {
    pub full_name: String,
    #[serde(default)]
    pub gender: Option<String>,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub guardian_name: String,
    #[serde(default)]
    pub guardian_phone: Option<String>,
    #[serde(default)]
    pub major_choice: Option<String>,
    #[serde(default)]
    pub admission_path: Option<AdmissionPath>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub profile: Option<AddressProfile>,
}

/// Result of a committed selection run: both id partitions plus the
/// announcement timestamp stamped on every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionOutcome {
    pub accepted_ids: Vec<ApplicationId>,
    pub rejected_ids: Vec<ApplicationId>,
    pub announced_at: DateTime<Utc>,
}

// Random ids survive restarts and multiple service instances sharing one
// repository, unlike a process-local counter.
fn next_application_id() -> ApplicationId {
    ApplicationId(format!("adm-{}", Uuid::new_v4().simple()))
}

/// Facade composing registration intake, document intake, the completeness
/// gate, and the selection engine over one repository and one blob storage.
pub struct AdmissionsService<R, S> {
    repository: Arc<R>,
    documents: DocumentIntake<S>,
    numbers: RegistrationNumberGenerator,
}

impl<R, S> AdmissionsService<R, S>
where
    R: ApplicationRepository + 'static,
    S: DocumentStorage + 'static,
{
    pub fn new(repository: Arc<R>, storage: Arc<S>, documents_root: impl Into<String>) -> Self {
        Self {
            repository,
            documents: DocumentIntake::new(storage, documents_root),
            numbers: RegistrationNumberGenerator::default(),
        }
    }

    /// Register a new application: normalize the raw fields, mint a
    /// registration number for the (period, batch), and persist the draft.
    pub fn register(
        &self,
        submission: RegistrationSubmission,
    ) -> Result<Application, AdmissionsServiceError> {
        let fields = normalize(RawRegistrationFields {
            gender: submission.gender,
            period: submission.period,
            batch: submission.batch,
        });
        let key = BatchKey::new(fields.period.clone(), fields.batch.clone());
        let registration_number = self.numbers.generate(self.repository.as_ref(), &key)?;

        let application = Application {
            id: next_application_id(),
            registration_number: Some(registration_number.clone()),
            applicant: ApplicantIdentity {
                full_name: submission.full_name,
                gender: fields.gender,
                birth_place: submission.birth_place,
                birth_date: submission.birth_date,
                phone: submission.phone,
                email: submission.email,
            },
            guardian: GuardianIdentity {
                name: submission.guardian_name,
                phone: submission.guardian_phone,
            },
            major_choice: submission.major_choice,
            admission_path: submission.admission_path,
            period: fields.period,
            batch: fields.batch,
            status: ApplicationStatus::Pending,
            revision: 0,
            total_score: None,
            announcement_date: None,
            photo: None,
            certificate: None,
            family_registry: None,
            additional_documents: Vec::new(),
            profile: submission.profile,
            created_at: Utc::now(),
        };

        let stored = match self.repository.insert(application) {
            Ok(stored) => stored,
            Err(error) => {
                // The reservation must not outlive a failed insert, or the
                // number is lost and the registered count drifts.
                if let Err(release_error) = self
                    .repository
                    .release_registration_number(&key, &registration_number)
                {
                    tracing::warn!(
                        number = %registration_number,
                        batch = %key,
                        %release_error,
                        "failed to release registration number after insert error"
                    );
                }
                return Err(error.into());
            }
        };
        tracing::info!(
            application_id = %stored.id.0,
            registration_number = stored.registration_number.as_deref().unwrap_or_default(),
            batch = %key,
            "application registered"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<Application, AdmissionsServiceError> {
        let application = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(application)
    }

    /// Attach or replace the applicant photo.
    pub fn attach_photo(
        &self,
        id: &ApplicationId,
        file: &UploadedFile,
    ) -> Result<Application, AdmissionsServiceError> {
        self.attach_document(id, DocumentKind::Photo, file)
    }

    /// Attach or replace one mandatory document slot.
    pub fn attach_document(
        &self,
        id: &ApplicationId,
        kind: DocumentKind,
        file: &UploadedFile,
    ) -> Result<Application, AdmissionsServiceError> {
        let mut application = self.get(id)?;
        ensure_editable(&application)?;

        let previous = application.document(kind).map(|doc| doc.path.clone());
        let stored = self
            .documents
            .upload_document(file, kind, previous.as_deref())?;
        application.set_document(kind, stored);

        self.repository.update(application.clone())?;
        application.revision += 1;
        Ok(application)
    }

    /// Attach a batch of additional documents, bounded jointly with the ones
    /// already attached.
    pub fn attach_additional(
        &self,
        id: &ApplicationId,
        files: &[UploadedFile],
    ) -> Result<Application, AdmissionsServiceError> {
        let mut application = self.get(id)?;
        ensure_editable(&application)?;

        let stored = self
            .documents
            .upload_additional(files, &application.additional_documents)?;
        application.additional_documents.extend(stored);

        self.repository.update(application.clone())?;
        application.revision += 1;
        Ok(application)
    }

    /// Everything still blocking submission, in checklist order. Empty means
    /// submit-ready.
    pub fn submission_checklist(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<UnmetRequirement>, AdmissionsServiceError> {
        let application = self.get(id)?;
        Ok(submission_checklist(&application))
    }

    /// Run selection for the configured (period, batch): load the pool, plan
    /// the partition, and commit both status sets atomically under one
    /// announcement timestamp.
    ///
    /// The run recomputes from current rows, so retrying after a failed
    /// commit (or re-running after data corrections) is always safe.
    pub fn run_selection(
        &self,
        config: &SelectionConfig,
    ) -> Result<SelectionOutcome, AdmissionsServiceError> {
        let key = config.key();
        let applications = self.repository.list_batch(&key)?;
        let plan = SelectionEngine::plan(config, &applications);

        let announced_at = Utc::now();
        self.repository
            .commit_selection(&key, &plan.accepted, &plan.rejected, announced_at)?;

        tracing::info!(
            batch = %key,
            accepted = plan.accepted.len(),
            rejected = plan.rejected.len(),
            "selection committed"
        );

        Ok(SelectionOutcome {
            accepted_ids: plan.accepted,
            rejected_ids: plan.rejected,
            announced_at,
        })
    }
}

/// Error raised by the admissions service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionsServiceError {
    #[error(transparent)]
    Locked(#[from] ApplicationLocked),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
