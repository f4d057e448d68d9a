//! Core types for enrollment
//!
//! Defines the persisted entities touched by an enrollment:
//! - Actors (the authenticated caller, read-only)
//! - Guardians and the students that depend on them
//! - Accounts provisioned for students
//! - The account-type catalog

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;
use uuid::Uuid;

/// Identifier of the authenticated actor performing an operation
///
/// Actors come from the identity provider, so the id is an opaque UUID
/// rather than a store-allocated ULID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Generate a random actor ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ActorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a new ID
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Unique guardian identifier (ULID for insertion order)
    GuardianId
);
record_id!(
    /// Unique student identifier
    StudentId
);
record_id!(
    /// Unique account identifier
    AccountId
);
record_id!(
    /// Account-type catalog identifier
    AccountTypeId
);

/// Active/inactive flag carried by guardian records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Record is in use
    #[default]
    Active,
    /// Record is kept for history only
    Inactive,
}

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account may log in
    #[default]
    Active,
    /// Account is blocked
    Suspended,
}

/// Whether the account currently holds a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginState {
    /// No active session
    #[default]
    LoggedOut,
    /// Session open
    LoggedIn,
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
}

impl Actor {
    /// Create an actor with a fresh ID
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
        }
    }
}

/// Entry of the account-type catalog (e.g. "Student", "Staff")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountType {
    pub id: AccountTypeId,
    pub designation: String,
}

impl AccountType {
    /// Create a catalog entry with a fresh ID
    #[inline]
    #[must_use]
    pub fn new(designation: impl Into<String>) -> Self {
        Self {
            id: AccountTypeId::new(),
            designation: designation.into(),
        }
    }
}

/// Responsible party linked to a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guardian {
    pub id: GuardianId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub profession_ref: Option<i64>,
    pub workplace: Option<String>,
    pub status: RecordStatus,
    pub actor_id: ActorId,
    pub created_at: DateTime<Utc>,
}

/// Guardian-independent student attributes
///
/// Fields the caller sends that are not modelled here are kept verbatim in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality_ref: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status_ref: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commune_ref: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type_ref: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_ref: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StudentProfile {
    /// Profile with only a name set
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Enrolled person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub guardian_id: GuardianId,
    pub actor_id: ActorId,
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Display name used for the account and username
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

/// Login credential provisioned for a student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub display_name: String,
    pub username: String,
    pub password_hash: String,
    pub account_type_id: AccountTypeId,
    pub status: AccountStatus,
    pub login_state: LoginState,
    pub student_id: Option<StudentId>,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
}

/// Guardian insert payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewGuardian {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub profession_ref: Option<i64>,
    pub workplace: Option<String>,
    pub status: RecordStatus,
    pub actor_id: ActorId,
    pub created_at: DateTime<Utc>,
}

/// Student insert payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub profile: StudentProfile,
    pub guardian_id: GuardianId,
    pub actor_id: ActorId,
    pub created_at: DateTime<Utc>,
}

/// Account insert payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub display_name: String,
    pub username: String,
    pub password_hash: String,
    pub account_type_id: AccountTypeId,
    pub status: AccountStatus,
    pub login_state: LoginState,
    pub student_id: Option<StudentId>,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    /// Materialize with a fresh ID
    #[must_use]
    pub fn into_account(self) -> Account {
        Account {
            id: AccountId::new(),
            display_name: self.display_name,
            username: self.username,
            password_hash: self.password_hash,
            account_type_id: self.account_type_id,
            status: self.status,
            login_state: self.login_state,
            student_id: self.student_id,
            must_change_password: self.must_change_password,
            created_at: self.created_at,
        }
    }
}

impl NewGuardian {
    /// Materialize with a fresh ID
    #[must_use]
    pub fn into_guardian(self) -> Guardian {
        Guardian {
            id: GuardianId::new(),
            name: self.name,
            phone: self.phone,
            email: self.email,
            profession_ref: self.profession_ref,
            workplace: self.workplace,
            status: self.status,
            actor_id: self.actor_id,
            created_at: self.created_at,
        }
    }
}

impl NewStudent {
    /// Materialize with a fresh ID
    #[must_use]
    pub fn into_student(self) -> Student {
        Student {
            id: StudentId::new(),
            profile: self.profile,
            guardian_id: self.guardian_id,
            actor_id: self.actor_id,
            created_at: self.created_at,
        }
    }
}
