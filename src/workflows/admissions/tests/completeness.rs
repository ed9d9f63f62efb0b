use super::common::*;

use crate::workflows::admissions::completeness::{
    ensure_editable, submission_checklist, UnmetRequirement,
};
use crate::workflows::admissions::domain::{AdmissionPath, ApplicationStatus};

#[test]
fn complete_application_is_submit_ready() {
    let application = candidate("adm-1", "Science", Some(AdmissionPath::Zonasi), None, 0);
    assert!(submission_checklist(&application).is_empty());
}

#[test]
fn bare_draft_lists_every_requirement_in_order() {
    let mut application = candidate("adm-1", "Science", None, None, 0);
    application.major_choice = None;
    application.profile = None;
    application.applicant.phone = None;
    application.applicant.email = None;
    application.photo = None;
    application.certificate = None;
    application.family_registry = None;

    assert_eq!(
        submission_checklist(&application),
        vec![
            UnmetRequirement::MissingMajorChoice,
            UnmetRequirement::MissingAdmissionPath,
            UnmetRequirement::MissingProfile,
            UnmetRequirement::MissingContact,
            UnmetRequirement::MissingPhoto,
            UnmetRequirement::MissingCertificate,
            UnmetRequirement::MissingFamilyRegistry,
        ]
    );
}

#[test]
fn single_missing_document_is_the_only_entry() {
    let mut application = candidate("adm-1", "Science", Some(AdmissionPath::Zonasi), None, 0);
    application.family_registry = None;

    assert_eq!(
        submission_checklist(&application),
        vec![UnmetRequirement::MissingFamilyRegistry]
    );
}

#[test]
fn blank_profile_fields_are_reported_individually() {
    let mut application = candidate("adm-1", "Science", Some(AdmissionPath::Zonasi), None, 0);
    let profile = application.profile.as_mut().expect("builder sets profile");
    profile.district = Some("   ".to_string());
    profile.street = None;

    assert_eq!(
        submission_checklist(&application),
        vec![
            UnmetRequirement::MissingDistrict,
            UnmetRequirement::MissingStreet,
        ]
    );
}

#[test]
fn whitespace_major_choice_counts_as_missing() {
    let mut application = candidate("adm-1", "Science", Some(AdmissionPath::Zonasi), None, 0);
    application.major_choice = Some("  ".to_string());

    assert_eq!(
        submission_checklist(&application),
        vec![UnmetRequirement::MissingMajorChoice]
    );
}

#[test]
fn one_contact_channel_is_enough() {
    let mut application = candidate("adm-1", "Science", Some(AdmissionPath::Zonasi), None, 0);
    application.applicant.phone = None;
    application.applicant.email = Some("ani@example.com".to_string());

    assert!(submission_checklist(&application).is_empty());
}

#[test]
fn editable_statuses_pass_the_gate() {
    for status in [ApplicationStatus::Pending, ApplicationStatus::RevisionRequired] {
        let mut application = candidate("adm-1", "Science", Some(AdmissionPath::Zonasi), None, 0);
        application.status = status;
        assert!(ensure_editable(&application).is_ok(), "{status:?}");
    }
}

#[test]
fn terminal_statuses_are_locked() {
    for status in [ApplicationStatus::Accepted, ApplicationStatus::Rejected] {
        let mut application = candidate("adm-1", "Science", Some(AdmissionPath::Zonasi), None, 0);
        application.status = status;

        let error = ensure_editable(&application).unwrap_err();
        assert_eq!(error.status, status);
        assert!(error.to_string().contains(status.label()));
    }
}
