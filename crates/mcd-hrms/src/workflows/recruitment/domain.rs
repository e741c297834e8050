use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered candidates (`cand-<enrollment slug>-<digest>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub const PREFIX: &'static str = "cand-";
    pub const MAX_LEN: usize = 64;
    const SLUG_LEN: usize = 45;
    const DIGEST_LEN: usize = 12;
    const DIGEST_DOMAIN: &'static [u8] = b"mcd-hrms:candidate_id:v1\n";

    /// Derives the stable id for an enrollment number.
    ///
    /// The slug keeps ids readable; the digest over the exact (trimmed) enrollment
    /// number keeps punctuation variants and long shared prefixes distinct.
    pub fn for_enrollment(enrollment_number: &str) -> Self {
        let enrollment = enrollment_number.trim();
        let slug: String = enrollment
            .chars()
            .take(Self::SLUG_LEN)
            .map(|ch| {
                if ch.is_ascii_alphanumeric() {
                    ch.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();

        let mut hasher = blake3::Hasher::new();
        hasher.update(Self::DIGEST_DOMAIN);
        hasher.update(enrollment.as_bytes());
        let digest = hasher.finalize().to_hex();

        Self(format!(
            "{}{}-{}",
            Self::PREFIX,
            slug,
            &digest.as_str()[..Self::DIGEST_LEN]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application state of a candidate as tracked by the onboarding workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Submitted,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 5] = [
        VerificationStatus::Pending,
        VerificationStatus::Verified,
        VerificationStatus::Submitted,
        VerificationStatus::Approved,
        VerificationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "Pending",
            VerificationStatus::Verified => "Verified",
            VerificationStatus::Submitted => "Submitted",
            VerificationStatus::Approved => "Approved",
            VerificationStatus::Rejected => "Rejected",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(raw.trim()))
    }

    /// Only submitted candidates sit in the first-come-first-serve pool.
    pub const fn is_claimable(self) -> bool {
        matches!(self, VerificationStatus::Submitted)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Placement recorded by the zone that won the claim. All four fields travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub assigned_zone: String,
    pub assigned_ward: String,
    pub hired_at: DateTime<Utc>,
    pub hired_by: String,
}

/// Identity details captured when exam results produce a new candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRegistration {
    pub full_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub exam_id: String,
    pub enrollment_number: String,
}

/// Candidate record as persisted by the repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CandidateRecord")]
pub struct Candidate {
    pub id: CandidateId,
    pub full_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub exam_id: String,
    pub enrollment_number: String,
    pub verification_status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dossier_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(flatten)]
    pub assignment: Option<Assignment>,
    pub registered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape of [`Candidate`] with the assignment columns still loose.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateRecord {
    id: CandidateId,
    full_name: String,
    email: String,
    date_of_birth: NaiveDate,
    exam_id: String,
    enrollment_number: String,
    verification_status: VerificationStatus,
    #[serde(default)]
    dossier_url: Option<String>,
    #[serde(default)]
    rejection_reason: Option<String>,
    #[serde(default)]
    assigned_zone: Option<String>,
    #[serde(default)]
    assigned_ward: Option<String>,
    #[serde(default)]
    hired_at: Option<DateTime<Utc>>,
    #[serde(default)]
    hired_by: Option<String>,
    registered_at: DateTime<Utc>,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("assignment fields must be all present or all absent")]
pub struct PartialAssignment;

impl TryFrom<CandidateRecord> for Candidate {
    type Error = PartialAssignment;

    fn try_from(record: CandidateRecord) -> Result<Self, Self::Error> {
        let assignment = match (
            record.assigned_zone,
            record.assigned_ward,
            record.hired_at,
            record.hired_by,
        ) {
            (Some(assigned_zone), Some(assigned_ward), Some(hired_at), Some(hired_by)) => {
                Some(Assignment {
                    assigned_zone,
                    assigned_ward,
                    hired_at,
                    hired_by,
                })
            }
            (None, None, None, None) => None,
            _ => return Err(PartialAssignment),
        };

        Ok(Self {
            id: record.id,
            full_name: record.full_name,
            email: record.email,
            date_of_birth: record.date_of_birth,
            exam_id: record.exam_id,
            enrollment_number: record.enrollment_number,
            verification_status: record.verification_status,
            dossier_url: record.dossier_url,
            rejection_reason: record.rejection_reason,
            assignment,
            registered_at: record.registered_at,
            submitted_at: record.submitted_at,
            updated_at: record.updated_at,
        })
    }
}

impl Candidate {
    pub fn assigned_zone(&self) -> Option<&str> {
        self.assignment
            .as_ref()
            .map(|assignment| assignment.assigned_zone.as_str())
    }

    /// Status and assignment agree: an assignment exists exactly when approved.
    pub fn is_consistent(&self) -> bool {
        (self.verification_status == VerificationStatus::Approved) == self.assignment.is_some()
    }

    /// Produces the record a successful compare-and-set would store.
    pub fn apply(&self, transition: &StatusTransition) -> Candidate {
        let mut next = self.clone();
        next.verification_status = transition.target();
        next.updated_at = transition.at();

        match transition {
            StatusTransition::Verify { .. } => {}
            StatusTransition::SubmitDocuments { dossier_url, at } => {
                next.dossier_url = Some(dossier_url.clone());
                next.submitted_at = Some(*at);
                next.rejection_reason = None;
            }
            StatusTransition::Hire(assignment) => {
                next.assignment = Some(assignment.clone());
                next.rejection_reason = None;
            }
            StatusTransition::Reject { reason, .. } => {
                next.rejection_reason = Some(reason.clone());
                next.assignment = None;
            }
        }

        next
    }
}

/// Conditional state change applied atomically by a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    Verify { at: DateTime<Utc> },
    SubmitDocuments { dossier_url: String, at: DateTime<Utc> },
    Hire(Assignment),
    Reject { reason: String, at: DateTime<Utc> },
}

impl StatusTransition {
    /// Statuses the stored record must still hold for the transition to commit.
    pub const fn accepted_from(&self) -> &'static [VerificationStatus] {
        match self {
            StatusTransition::Verify { .. } => &[VerificationStatus::Pending],
            StatusTransition::SubmitDocuments { .. } => &[
                VerificationStatus::Pending,
                VerificationStatus::Verified,
                VerificationStatus::Rejected,
            ],
            StatusTransition::Hire(_) => &[VerificationStatus::Submitted],
            StatusTransition::Reject { .. } => &[
                VerificationStatus::Pending,
                VerificationStatus::Verified,
                VerificationStatus::Submitted,
            ],
        }
    }

    pub const fn target(&self) -> VerificationStatus {
        match self {
            StatusTransition::Verify { .. } => VerificationStatus::Verified,
            StatusTransition::SubmitDocuments { .. } => VerificationStatus::Submitted,
            StatusTransition::Hire(_) => VerificationStatus::Approved,
            StatusTransition::Reject { .. } => VerificationStatus::Rejected,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            StatusTransition::Verify { at }
            | StatusTransition::SubmitDocuments { at, .. }
            | StatusTransition::Reject { at, .. } => *at,
            StatusTransition::Hire(assignment) => assignment.hired_at,
        }
    }

    pub fn permits(&self, current: VerificationStatus) -> bool {
        self.accepted_from().contains(&current)
    }

    /// Verb used in logs and error messages.
    pub const fn action(&self) -> &'static str {
        match self {
            StatusTransition::Verify { .. } => "verified",
            StatusTransition::SubmitDocuments { .. } => "submitted",
            StatusTransition::Hire(_) => "hired",
            StatusTransition::Reject { .. } => "rejected",
        }
    }
}
