//! Enrollment Store
//!
//! Transactional persistence for enrollments:
//! - [`EnrollmentStore`] / [`StoreTransaction`] traits the workflow runs against
//! - [`InMemoryStore`], a buffered-write backend with commit-time constraint checks
//! - [`SeedData`] for loading reference data from TOML

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod memory;
pub mod seed;
pub mod store;

pub use memory::{Fault, InMemoryStore, MemoryTransaction, StoreCounts};
pub use seed::{SeedAccount, SeedData, SeedError};
pub use store::{EnrollmentStore, StoreTransaction};
