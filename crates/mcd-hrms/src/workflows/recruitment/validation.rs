use chrono::{DateTime, Utc};

use super::domain::{Candidate, CandidateId, CandidateRegistration, VerificationStatus};

/// Request problems detected before any storage access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("malformed candidateId '{0}'")]
    MalformedCandidateId(String),
    #[error("email address '{0}' is not valid")]
    InvalidEmail(String),
    #[error("date of birth cannot be in the future")]
    DateOfBirthInFuture,
    #[error("zone is required")]
    MissingZone,
    #[error("unknown zone '{0}'")]
    UnknownZone(String),
    #[error("ward '{ward}' does not belong to zone '{zone}'")]
    WardOutsideZone { zone: String, ward: String },
    #[error("zone '{0}' has no wards to assign")]
    ZoneWithoutWards(String),
    #[error("a rejection reason is required")]
    MissingReason,
    #[error("dossier link must be an http(s) URL, found '{0}'")]
    InvalidDossierLink(String),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Parses a caller-supplied id, refusing anything outside the `cand-[a-z0-9-]+` grammar.
pub fn parse_candidate_id(raw: &str) -> Result<CandidateId, ValidationError> {
    let trimmed = raw.trim();
    let valid = trimmed.len() <= CandidateId::MAX_LEN
        && trimmed
            .strip_prefix(CandidateId::PREFIX)
            .is_some_and(|slug| {
                !slug.is_empty()
                    && slug
                        .chars()
                        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
            });

    if valid {
        Ok(CandidateId(trimmed.to_string()))
    } else {
        Err(ValidationError::MalformedCandidateId(raw.to_string()))
    }
}

pub fn require_reason(reason: &str) -> Result<String, ValidationError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ValidationError::MissingReason);
    }
    Ok(reason.to_string())
}

/// The dossier is an opaque external link; only its scheme is checked.
pub fn require_dossier_link(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::MissingField("dossierUrl"));
    }

    let has_host = ["https://", "http://"]
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
        .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'));

    if has_host && !url.chars().any(char::is_whitespace) {
        Ok(url.to_string())
    } else {
        Err(ValidationError::InvalidDossierLink(url.to_string()))
    }
}

/// Turns registrations into `Pending` candidate records.
#[derive(Debug, Clone, Default)]
pub struct RegistrationGuard;

impl RegistrationGuard {
    pub fn candidate_from(
        &self,
        registration: CandidateRegistration,
        now: DateTime<Utc>,
    ) -> Result<Candidate, ValidationError> {
        let CandidateRegistration {
            full_name,
            email,
            date_of_birth,
            exam_id,
            enrollment_number,
        } = registration;

        let full_name = required("fullName", &full_name)?;
        let exam_id = required("examId", &exam_id)?;
        let enrollment_number = required("enrollmentNumber", &enrollment_number)?;
        let email = validate_email(&email)?;

        if date_of_birth > now.date_naive() {
            return Err(ValidationError::DateOfBirthInFuture);
        }

        Ok(Candidate {
            id: CandidateId::for_enrollment(&enrollment_number),
            full_name,
            email,
            date_of_birth,
            exam_id,
            enrollment_number,
            verification_status: VerificationStatus::Pending,
            dossier_url: None,
            rejection_reason: None,
            assignment: None,
            registered_at: now,
            submitted_at: None,
            updated_at: now,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingField("email"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email.to_string())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}
