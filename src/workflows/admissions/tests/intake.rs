use super::common::*;
use chrono::{DateTime, Utc};

use crate::workflows::admissions::domain::{Application, ApplicationId, BatchKey};
use crate::workflows::admissions::intake::RegistrationNumberGenerator;
use crate::workflows::admissions::memory::MemoryRepository;
use crate::workflows::admissions::repository::{ApplicationRepository, RepositoryError};

fn key() -> BatchKey {
    BatchKey::new("2026/2027", "Wave 1")
}

#[test]
fn first_number_encodes_year_batch_and_sequence() {
    let repository = MemoryRepository::default();
    let generator = RegistrationNumberGenerator::default();

    let number = generator.generate(&repository, &key()).expect("number");
    assert_eq!(number, "PPDB2026WAV0001");
}

#[test]
fn sequence_follows_the_registered_count() {
    let repository = MemoryRepository::default();
    let generator = RegistrationNumberGenerator::default();

    let first = generator.generate(&repository, &key()).expect("first");
    let second = generator.generate(&repository, &key()).expect("second");

    assert_eq!(first, "PPDB2026WAV0001");
    assert_eq!(second, "PPDB2026WAV0002");
}

#[test]
fn batches_number_independently() {
    let repository = MemoryRepository::default();
    let generator = RegistrationNumberGenerator::default();
    let wave_two = BatchKey::new("2026/2027", "Wave 2");

    generator.generate(&repository, &key()).expect("wave 1");
    let number = generator.generate(&repository, &wave_two).expect("wave 2");

    assert_eq!(number, "PPDB2026WAV0001", "each batch has its own sequence");
}

#[test]
fn reservation_conflict_bumps_the_sequence() {
    let repository = MemoryRepository::default();
    let generator = RegistrationNumberGenerator::default();

    // A concurrent registration already holds the number this generator
    // would mint next.
    repository
        .reserve_registration_number(&key(), "PPDB2026WAV0002")
        .expect("pre-reservation");

    let number = generator.generate(&repository, &key()).expect("number");
    assert_eq!(number, "PPDB2026WAV0003");
}

#[test]
fn custom_prefix_is_applied() {
    let repository = MemoryRepository::default();
    let generator = RegistrationNumberGenerator::with_prefix("SMAN1");

    let number = generator.generate(&repository, &key()).expect("number");
    assert_eq!(number, "SMAN12026WAV0001");
}

/// Repository whose reservations always collide, to exhaust the retry loop.
struct AlwaysConflicting;

impl ApplicationRepository for AlwaysConflicting {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        Ok(application)
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(None)
    }

    fn list_batch(&self, _key: &BatchKey) -> Result<Vec<Application>, RepositoryError> {
        Ok(Vec::new())
    }

    fn count_registered(&self, _key: &BatchKey) -> Result<u64, RepositoryError> {
        Ok(0)
    }

    fn reserve_registration_number(
        &self,
        _key: &BatchKey,
        _number: &str,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn release_registration_number(
        &self,
        _key: &BatchKey,
        _number: &str,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn commit_selection(
        &self,
        _key: &BatchKey,
        _accepted: &[ApplicationId],
        _rejected: &[ApplicationId],
        _announced_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[test]
fn retries_are_bounded() {
    let generator = RegistrationNumberGenerator::default();

    let error = generator.generate(&AlwaysConflicting, &key()).unwrap_err();
    assert!(matches!(error, RepositoryError::Conflict));
}

#[test]
fn backend_failure_is_not_retried_as_conflict() {
    let generator = RegistrationNumberGenerator::default();

    let error = generator
        .generate(&UnavailableRepository, &key())
        .unwrap_err();
    assert!(matches!(error, RepositoryError::Unavailable(_)));
}
