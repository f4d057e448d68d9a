//! Persistence seam
//!
//! The enrollment workflow talks to storage only through these two traits:
//! [`EnrollmentStore`] for reads outside a transaction and for opening one,
//! [`StoreTransaction`] for everything that must commit or roll back together.

use async_trait::async_trait;
use enrollment_core::{
    Account, AccountType, Actor, ActorId, Guardian, NewAccount, NewGuardian, NewStudent,
    StoreError, Student,
};

/// Backend holding actors, the account-type catalog and enrollment records
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Transaction handle produced by [`Self::begin`]
    type Tx: StoreTransaction;

    /// Look up an actor by ID
    async fn find_actor(&self, id: ActorId) -> Result<Option<Actor>, StoreError>;

    /// Open a transaction
    ///
    /// Writes made through the handle are invisible to other transactions
    /// until [`StoreTransaction::commit`] succeeds. Dropping the handle
    /// without committing discards them.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// Unit of work spanning guardian, student and account inserts
#[async_trait]
pub trait StoreTransaction: Send {
    /// Insert a guardian
    ///
    /// # Errors
    /// `StoreError::ForeignKeyViolation` if the owning actor does not exist.
    async fn insert_guardian(&mut self, guardian: NewGuardian) -> Result<Guardian, StoreError>;

    /// Insert a student
    ///
    /// # Errors
    /// `StoreError::ForeignKeyViolation` if the guardian or actor does not exist.
    async fn insert_student(&mut self, student: NewStudent) -> Result<Student, StoreError>;

    /// Find an account by exact username, including this transaction's writes
    async fn find_account_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Find a catalog entry by exact designation
    async fn find_account_type(
        &mut self,
        designation: &str,
    ) -> Result<Option<AccountType>, StoreError>;

    /// Insert an account
    ///
    /// # Errors
    /// - `StoreError::UniqueViolation` on a taken username or a student that
    ///   already has an account
    /// - `StoreError::ForeignKeyViolation` on an unknown student or account type
    async fn insert_account(&mut self, account: NewAccount) -> Result<Account, StoreError>;

    /// Make every write of this transaction visible at once
    ///
    /// # Errors
    /// Constraint violations caused by transactions that committed after
    /// this one read; nothing is applied in that case.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discard every write of this transaction
    async fn rollback(self) -> Result<(), StoreError>;
}
