//! Enrollment request and result payloads

use crate::types::{ActorId, Guardian, GuardianId, NewGuardian, NewStudent, RecordStatus, Student, StudentProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Guardian sub-object of an enrollment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profession_ref: Option<i64>,
    #[serde(default)]
    pub workplace: Option<String>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

impl GuardianInput {
    /// Guardian with only a name set
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
            email: None,
            profession_ref: None,
            workplace: None,
            status: None,
        }
    }

    /// Build the insert payload owned by `actor_id`
    #[must_use]
    pub fn to_new_guardian(&self, actor_id: ActorId, now: DateTime<Utc>) -> NewGuardian {
        NewGuardian {
            name: self.name.trim().to_string(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            profession_ref: self.profession_ref,
            workplace: self.workplace.clone(),
            status: self.status.unwrap_or_default(),
            actor_id,
            created_at: now,
        }
    }
}

/// Caller payload: a `guardian` object plus the student's own fields at top level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    pub guardian: GuardianInput,
    #[serde(flatten)]
    pub student: StudentProfile,
}

impl EnrollmentRequest {
    /// Create request from its two halves
    #[inline]
    #[must_use]
    pub fn new(guardian: GuardianInput, student: StudentProfile) -> Self {
        Self { guardian, student }
    }

    /// Parse from JSON text
    ///
    /// # Errors
    /// Returns the `serde_json` error when the payload is malformed or
    /// lacks `guardian` / `name`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build the student insert payload linked to `guardian_id`
    #[must_use]
    pub fn to_new_student(
        &self,
        guardian_id: GuardianId,
        actor_id: ActorId,
        now: DateTime<Utc>,
    ) -> NewStudent {
        let mut profile = self.student.clone();
        profile.name = profile.name.trim().to_string();
        NewStudent {
            profile,
            guardian_id,
            actor_id,
            created_at: now,
        }
    }
}

/// Guardian and student created by a successful enrollment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledPair {
    pub student: Student,
    pub guardian: Guardian,
}

/// Success payload returned to the caller
///
/// The provisioned account is intentionally absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentResult {
    pub success: bool,
    pub data: EnrolledPair,
    pub message: String,
}

impl EnrollmentResult {
    /// Confirmation message attached to every success
    pub const MESSAGE: &'static str = "Student created successfully";

    /// Wrap a created pair
    #[inline]
    #[must_use]
    pub fn created(student: Student, guardian: Guardian) -> Self {
        Self {
            success: true,
            data: EnrolledPair { student, guardian },
            message: Self::MESSAGE.to_string(),
        }
    }
}
