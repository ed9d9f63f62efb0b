use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::domain::{Application, ApplicationId, ApplicationStatus, BatchKey};
use super::repository::{ApplicationRepository, RepositoryError};

/// In-memory reference implementation of [`ApplicationRepository`].
///
/// One mutex guards all state, so every operation observes a consistent
/// snapshot and `commit_selection` is genuinely all-or-nothing. Updates are
/// guarded by the row revision, so a copy fetched before a selection commit
/// cannot overwrite the decision. Deployments are expected to supply a
/// database-backed implementation with the same guarantees.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<ApplicationId, Application>,
    reserved_numbers: HashSet<(BatchKey, String)>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut inner = self.inner.lock().expect("repository mutex poisoned");
        if inner.records.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        inner
            .records
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, mut application: Application) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("repository mutex poisoned");
        let stored = inner
            .records
            .get(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != application.revision {
            return Err(RepositoryError::Conflict);
        }
        application.revision += 1;
        inner.records.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let inner = self.inner.lock().expect("repository mutex poisoned");
        Ok(inner.records.get(id).cloned())
    }

    fn list_batch(&self, key: &BatchKey) -> Result<Vec<Application>, RepositoryError> {
        let inner = self.inner.lock().expect("repository mutex poisoned");
        Ok(inner
            .records
            .values()
            .filter(|application| application.period == key.period && application.batch == key.batch)
            .cloned()
            .collect())
    }

    fn count_registered(&self, key: &BatchKey) -> Result<u64, RepositoryError> {
        let inner = self.inner.lock().expect("repository mutex poisoned");
        let reserved = inner
            .reserved_numbers
            .iter()
            .filter(|(reserved_key, _)| reserved_key == key)
            .count();
        Ok(reserved as u64)
    }

    fn reserve_registration_number(
        &self,
        key: &BatchKey,
        number: &str,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("repository mutex poisoned");
        let entry = (key.clone(), number.to_string());
        if !inner.reserved_numbers.insert(entry) {
            return Err(RepositoryError::Conflict);
        }
        Ok(())
    }

    fn release_registration_number(
        &self,
        key: &BatchKey,
        number: &str,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("repository mutex poisoned");
        inner
            .reserved_numbers
            .remove(&(key.clone(), number.to_string()));
        Ok(())
    }

    fn commit_selection(
        &self,
        key: &BatchKey,
        accepted: &[ApplicationId],
        rejected: &[ApplicationId],
        announced_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("repository mutex poisoned");

        // Validate the whole write before touching a single row.
        for id in accepted.iter().chain(rejected) {
            let in_batch = inner
                .records
                .get(id)
                .map(|application| {
                    application.period == key.period && application.batch == key.batch
                })
                .unwrap_or(false);
            if !in_batch {
                return Err(RepositoryError::TransactionAborted(format!(
                    "application '{}' is not part of batch {key}",
                    id.0
                )));
            }
        }

        // Decisions bump the revision too: an edit fetched before the commit
        // can no longer overwrite the decided row.
        for id in accepted {
            if let Some(application) = inner.records.get_mut(id) {
                application.status = ApplicationStatus::Accepted;
                application.announcement_date = Some(announced_at);
                application.revision += 1;
            }
        }
        for id in rejected {
            if let Some(application) = inner.records.get_mut(id) {
                application.status = ApplicationStatus::Rejected;
                application.announcement_date = Some(announced_at);
                application.revision += 1;
            }
        }

        Ok(())
    }
}
