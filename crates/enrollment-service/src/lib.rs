//! Enrollment Service
//!
//! Atomically enrolls a student with a new guardian and provisions the
//! student's login account.
//!
//! # Example
//!
//! ```rust,ignore
//! use enrollment_core::{EnrollmentConfig, EnrollmentRequest};
//! use enrollment_service::EnrollmentService;
//! use enrollment_store::InMemoryStore;
//!
//! # async fn example(actor_id: enrollment_core::ActorId) -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryStore::new();
//! store.add_account_type("Student");
//! let service = EnrollmentService::new(store, EnrollmentConfig::new());
//!
//! let request = EnrollmentRequest::from_json(r#"{
//!     "name": "João da Silva",
//!     "guardian": { "name": "Maria Santos" }
//! }"#)?;
//! let result = service.create_student_with_guardian(&request, actor_id).await?;
//! println!("created student {}", result.data.student.id);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod service;
pub mod telemetry;

pub use service::EnrollmentService;
pub use telemetry::{init_tracing, LogFormat};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running enrollments
    pub use crate::EnrollmentService;
    pub use enrollment_core::{
        ActorId, EnrollmentConfig, EnrollmentError, EnrollmentRequest, EnrollmentResult,
        ErrorResponse,
    };
    pub use enrollment_store::{EnrollmentStore, InMemoryStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
