use serde::Serialize;

use super::domain::{Application, ApplicationStatus};

/// Raised when a mutation targets an application in a terminal status.
#[derive(Debug, Clone, thiserror::Error)]
#[error("application is locked in status '{}'", status.label())]
pub struct ApplicationLocked {
    pub status: ApplicationStatus,
}

/// Gate every edit behind the lifecycle state machine: pending and
/// revision-required applications stay editable, accepted and rejected ones
/// are terminal.
pub fn ensure_editable(application: &Application) -> Result<(), ApplicationLocked> {
    if application.status.is_locked() {
        return Err(ApplicationLocked {
            status: application.status,
        });
    }
    Ok(())
}

/// One requirement still blocking submission. The checklist returns every
/// unmet entry so callers can surface all problems in a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmetRequirement {
    #[error("program choice is missing")]
    MissingMajorChoice,
    #[error("admission path is missing")]
    MissingAdmissionPath,
    #[error("address profile has not been filled in")]
    MissingProfile,
    #[error("province is missing from the address profile")]
    MissingProvince,
    #[error("city is missing from the address profile")]
    MissingCity,
    #[error("district is missing from the address profile")]
    MissingDistrict,
    #[error("village is missing from the address profile")]
    MissingVillage,
    #[error("street is missing from the address profile")]
    MissingStreet,
    #[error("at least one contact channel (phone or email) is required")]
    MissingContact,
    #[error("photo document is missing")]
    MissingPhoto,
    #[error("certificate document is missing")]
    MissingCertificate,
    #[error("family registry document is missing")]
    MissingFamilyRegistry,
}

/// Evaluate everything submission needs, in a fixed order. An empty list
/// means the application is submit-ready; the transition into the reviewable
/// pool is the caller's responsibility.
pub fn submission_checklist(application: &Application) -> Vec<UnmetRequirement> {
    let mut unmet = Vec::new();

    if blank(application.major_choice.as_deref()) {
        unmet.push(UnmetRequirement::MissingMajorChoice);
    }
    if application.admission_path.is_none() {
        unmet.push(UnmetRequirement::MissingAdmissionPath);
    }

    match &application.profile {
        None => unmet.push(UnmetRequirement::MissingProfile),
        Some(profile) => {
            if blank(profile.province.as_deref()) {
                unmet.push(UnmetRequirement::MissingProvince);
            }
            if blank(profile.city.as_deref()) {
                unmet.push(UnmetRequirement::MissingCity);
            }
            if blank(profile.district.as_deref()) {
                unmet.push(UnmetRequirement::MissingDistrict);
            }
            if blank(profile.village.as_deref()) {
                unmet.push(UnmetRequirement::MissingVillage);
            }
            if blank(profile.street.as_deref()) {
                unmet.push(UnmetRequirement::MissingStreet);
            }
        }
    }

    if blank(application.applicant.phone.as_deref()) && blank(application.applicant.email.as_deref())
    {
        unmet.push(UnmetRequirement::MissingContact);
    }

    if application.photo.is_none() {
        unmet.push(UnmetRequirement::MissingPhoto);
    }
    if application.certificate.is_none() {
        unmet.push(UnmetRequirement::MissingCertificate);
    }
    if application.family_registry.is_none() {
        unmet.push(UnmetRequirement::MissingFamilyRegistry);
    }

    unmet
}

fn blank(value: Option<&str>) -> bool {
    value.map(str::trim).unwrap_or_default().is_empty()
}
