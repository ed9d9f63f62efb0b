use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::workflows::admissions::domain::{
    AddressProfile, AdmissionPath, ApplicantIdentity, Application, ApplicationId,
    ApplicationStatus, GuardianIdentity, StoredDocument,
};
use crate::workflows::admissions::memory::MemoryRepository;
use crate::workflows::admissions::repository::{
    ApplicationRepository, DocumentStorage, RepositoryError, StorageError,
};
use crate::workflows::admissions::service::{AdmissionsService, RegistrationSubmission};
use crate::workflows::admissions::UploadedFile;

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn submission() -> RegistrationSubmission {
    RegistrationSubmission {
        full_name: "Ani Wijaya".to_string(),
        gender: Some("female".to_string()),
        birth_place: "Bandung".to_string(),
        birth_date: NaiveDate::from_ymd_opt(2011, 3, 14).expect("valid date"),
        phone: Some("+62-812-0001".to_string()),
        email: None,
        guardian_name: "Dewi Wijaya".to_string(),
        guardian_phone: Some("+62-812-0002".to_string()),
        major_choice: Some("Science".to_string()),
        admission_path: Some(AdmissionPath::Zonasi),
        period: Some("2026/2027".to_string()),
        batch: Some("Wave 1".to_string()),
        profile: Some(full_profile()),
    }
}

pub(super) fn full_profile() -> AddressProfile {
    AddressProfile {
        province: Some("Jawa Barat".to_string()),
        city: Some("Bandung".to_string()),
        district: Some("Coblong".to_string()),
        village: Some("Dago".to_string()),
        street: Some("Jl. Merdeka 1".to_string()),
    }
}

/// Candidate builder for engine-level tests: id, program, path, score, and a
/// submission offset in minutes that drives the tie-break.
pub(super) fn candidate(
    id: &str,
    major: &str,
    path: Option<AdmissionPath>,
    score: Option<f64>,
    submitted_minute: i64,
) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        registration_number: Some(format!("PPDB2026WAV{id}")),
        applicant: ApplicantIdentity {
            full_name: id.to_string(),
            gender: Some("P".to_string()),
            birth_place: "Bandung".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2011, 1, 1).expect("valid date"),
            phone: Some("+62-812-0000".to_string()),
            email: None,
        },
        guardian: GuardianIdentity {
            name: "guardian".to_string(),
            phone: None,
        },
        major_choice: Some(major.to_string()),
        admission_path: path,
        period: "2026/2027".to_string(),
        batch: "Wave 1".to_string(),
        status: ApplicationStatus::Pending,
        revision: 0,
        total_score: score,
        announcement_date: None,
        photo: Some(stored_document("photo", 100_000)),
        certificate: Some(stored_document("certificate", 200_000)),
        family_registry: Some(stored_document("family_registry", 200_000)),
        additional_documents: Vec::new(),
        profile: Some(full_profile()),
        created_at: base_time() + Duration::minutes(submitted_minute),
    }
}

pub(super) fn stored_document(prefix: &str, size_bytes: u64) -> StoredDocument {
    StoredDocument {
        path: format!("applications/{prefix}-existing.pdf"),
        size_bytes,
    }
}

pub(super) fn jpeg_file(name: &str, size_bytes: usize) -> UploadedFile {
    let mut bytes = vec![0u8; size_bytes.max(4)];
    bytes[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
    UploadedFile::new(name, bytes)
}

pub(super) fn png_file(name: &str, size_bytes: usize) -> UploadedFile {
    let mut bytes = vec![0u8; size_bytes.max(8)];
    bytes[..8].copy_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    UploadedFile::new(name, bytes)
}

pub(super) fn pdf_file(name: &str, size_bytes: usize) -> UploadedFile {
    let mut bytes = vec![0u8; size_bytes.max(5)];
    bytes[..5].copy_from_slice(b"%PDF-");
    UploadedFile::new(name, bytes)
}

/// In-memory blob storage double recording every write and delete.
#[derive(Default)]
pub(super) struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deletes: Mutex<Vec<String>>,
}

impl MemoryStorage {
    pub(super) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .expect("storage mutex poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub(super) fn deleted(&self) -> Vec<String> {
        self.deletes.lock().expect("storage mutex poisoned").clone()
    }

    pub(super) fn object_count(&self) -> usize {
        self.objects.lock().expect("storage mutex poisoned").len()
    }
}

impl DocumentStorage for MemoryStorage {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self
            .objects
            .lock()
            .expect("storage mutex poisoned")
            .contains_key(path))
    }

    fn size(&self, path: &str) -> Result<u64, StorageError> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        let removed = self
            .objects
            .lock()
            .expect("storage mutex poisoned")
            .remove(path);
        if removed.is_none() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        self.deletes
            .lock()
            .expect("storage mutex poisoned")
            .push(path.to_string());
        Ok(())
    }
}

/// Storage double that fails every write, for batch-rollback coverage.
pub(super) struct BrokenStorage;

impl DocumentStorage for BrokenStorage {
    fn exists(&self, _path: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    fn size(&self, path: &str) -> Result<u64, StorageError> {
        Err(StorageError::NotFound(path.to_string()))
    }

    fn write(&self, _path: &str, _bytes: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Backend("disk full".to_string()))
    }

    fn delete(&self, _path: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Repository double that is never reachable.
pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_batch(
        &self,
        _key: &crate::workflows::admissions::BatchKey,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count_registered(
        &self,
        _key: &crate::workflows::admissions::BatchKey,
    ) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn reserve_registration_number(
        &self,
        _key: &crate::workflows::admissions::BatchKey,
        _number: &str,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn release_registration_number(
        &self,
        _key: &crate::workflows::admissions::BatchKey,
        _number: &str,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_selection(
        &self,
        _key: &crate::workflows::admissions::BatchKey,
        _accepted: &[ApplicationId],
        _rejected: &[ApplicationId],
        _announced_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn build_service() -> (
    AdmissionsService<MemoryRepository, MemoryStorage>,
    Arc<MemoryRepository>,
    Arc<MemoryStorage>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let storage = Arc::new(MemoryStorage::default());
    let service = AdmissionsService::new(repository.clone(), storage.clone(), "applications");
    (service, repository, storage)
}
