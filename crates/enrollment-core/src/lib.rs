//! Enrollment Core
//!
//! Domain model for enrolling a student together with a guardian:
//! - Typed identifiers and persisted entities
//! - Request and result payloads
//! - Username derivation from display names
//! - Configuration
//! - Error taxonomy and caller-facing error mapping
//!
//! # Example
//!
//! ```rust
//! use enrollment_core::username::{base_username, Candidates};
//!
//! let base = base_username("João da Silva").unwrap();
//! assert_eq!(base, "joao.da");
//!
//! let second: Vec<String> = Candidates::new(base).take(2).collect();
//! assert_eq!(second, ["joao.da", "joao.da1"]);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod request;
pub mod types;
pub mod username;

pub use config::{EnrollmentConfig, DEFAULT_PASSWORD_HASH};
pub use error::{ConfigError, Constraint, EnrollmentError, ErrorKind, ErrorResponse, StoreError};
pub use request::{EnrolledPair, EnrollmentRequest, EnrollmentResult, GuardianInput};
pub use types::{
    Account, AccountId, AccountStatus, AccountType, AccountTypeId, Actor, ActorId, Guardian,
    GuardianId, LoginState, NewAccount, NewGuardian, NewStudent, RecordStatus, Student, StudentId,
    StudentProfile,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
