use chrono::{Duration, TimeZone, Utc};

use super::common::registration;
use crate::workflows::recruitment::domain::VerificationStatus;
use crate::workflows::recruitment::validation::{
    parse_candidate_id, require_dossier_link, require_reason, RegistrationGuard, ValidationError,
};

#[test]
fn candidate_ids_follow_the_slug_grammar() {
    assert_eq!(
        parse_candidate_id("  cand-mcd-si-2024-001 ")
            .expect("valid id")
            .as_str(),
        "cand-mcd-si-2024-001"
    );

    for raw in [
        "",
        "cand-",
        "mcd-si-2024-001",
        "cand-MCD",
        "cand-mcd/si",
        "cand-mcd'; DROP TABLE candidates;--",
    ] {
        assert!(
            matches!(
                parse_candidate_id(raw),
                Err(ValidationError::MalformedCandidateId(_))
            ),
            "{raw:?} should be refused"
        );
    }

    let too_long = format!("cand-{}", "a".repeat(64));
    assert!(parse_candidate_id(&too_long).is_err());
}

#[test]
fn reasons_are_trimmed_and_required() {
    assert_eq!(
        require_reason("  Signature missing\n").expect("reason"),
        "Signature missing"
    );
    assert_eq!(require_reason("\t "), Err(ValidationError::MissingReason));
}

#[test]
fn dossier_links_must_be_web_urls() {
    assert!(require_dossier_link("https://drive.example.in/d/abc").is_ok());
    assert!(require_dossier_link("http://10.0.0.4/dossier.pdf").is_ok());

    assert_eq!(
        require_dossier_link(""),
        Err(ValidationError::MissingField("dossierUrl"))
    );
    for raw in [
        "drive.example.in/d/abc",
        "https://",
        "https:///path-only",
        "javascript:alert(1)",
        "https://drive.example.in/my dossier.pdf",
    ] {
        assert!(
            matches!(
                require_dossier_link(raw),
                Err(ValidationError::InvalidDossierLink(_))
            ),
            "{raw:?} should be refused"
        );
    }
}

#[test]
fn registration_guard_builds_pending_candidate() {
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap();
    let candidate = RegistrationGuard
        .candidate_from(registration(" MCD/SI/2024/401 "), now)
        .expect("valid registration");

    assert_eq!(
        candidate.id,
        crate::workflows::recruitment::domain::CandidateId::for_enrollment("MCD/SI/2024/401")
    );
    assert!(parse_candidate_id(candidate.id.as_str()).is_ok());
    assert_eq!(candidate.enrollment_number, "MCD/SI/2024/401");
    assert_eq!(candidate.verification_status, VerificationStatus::Pending);
    assert_eq!(candidate.registered_at, now);
    assert_eq!(candidate.updated_at, now);
    assert!(candidate.submitted_at.is_none());
    assert!(candidate.is_consistent());
}

#[test]
fn registration_guard_rejects_bad_identity_fields() {
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap();
    let guard = RegistrationGuard;

    let mut nameless = registration("MCD/SI/2024/402");
    nameless.full_name = "   ".to_string();
    assert_eq!(
        guard.candidate_from(nameless, now),
        Err(ValidationError::MissingField("fullName"))
    );

    let mut bad_email = registration("MCD/SI/2024/403");
    bad_email.email = "priya.example.in".to_string();
    assert!(matches!(
        guard.candidate_from(bad_email, now),
        Err(ValidationError::InvalidEmail(_))
    ));

    let mut unborn = registration("MCD/SI/2024/404");
    unborn.date_of_birth = (now + Duration::days(1)).date_naive();
    assert_eq!(
        guard.candidate_from(unborn, now),
        Err(ValidationError::DateOfBirthInFuture)
    );
}
