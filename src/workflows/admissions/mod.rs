//! Admissions (PPDB) processing pipeline: registration intake, validated
//! document upload, the completeness/lock state machine, and the
//! quota-constrained selection engine.
//!
//! The pipeline is invoked as library-level operations by the surrounding
//! request layer; the router here is a thin JSON surface over the service
//! facade.

pub mod completeness;
pub mod documents;
pub mod domain;
pub mod intake;
pub mod memory;
pub mod repository;
pub mod roster;
pub mod router;
pub mod selection;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use completeness::{ensure_editable, submission_checklist, ApplicationLocked, UnmetRequirement};
pub use documents::{
    DocumentIntake, UploadError, UploadRejection, UploadedFile, ADDITIONAL_MAX_AGGREGATE_BYTES,
    ADDITIONAL_MAX_COUNT, DOCUMENT_MAX_BYTES, PHOTO_MAX_BYTES,
};
pub use domain::{
    AddressProfile, AdmissionPath, ApplicantIdentity, Application, ApplicationId,
    ApplicationStatus, BatchKey, DocumentKind, GuardianIdentity, StoredDocument,
};
pub use intake::{normalize, normalize_gender, RawRegistrationFields, RegistrationNumberGenerator};
pub use memory::MemoryRepository;
pub use repository::{
    ApplicationRepository, ApplicationStatusView, DocumentStorage, RepositoryError, StorageError,
};
pub use roster::{parse_candidates, RosterError};
pub use router::admissions_router;
pub use selection::{QuotaRule, SelectionConfig, SelectionEngine, SelectionPlan};
pub use service::{
    AdmissionsService, AdmissionsServiceError, RegistrationSubmission, SelectionOutcome,
};
pub use storage::DiskStorage;
