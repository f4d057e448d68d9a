//! In-memory transactional store
//!
//! Committed rows live in one [`Tables`] value behind a `RwLock`; each
//! transaction buffers its inserts and applies them under a single write lock
//! on commit, re-checking every constraint against whatever other
//! transactions committed in the meantime. Actors are read-only reference
//! data and sit in a `DashMap` outside the transactional tables.

use crate::store::{EnrollmentStore, StoreTransaction};
use async_trait::async_trait;
use dashmap::DashMap;
use enrollment_core::{
    Account, AccountId, AccountType, AccountTypeId, Actor, ActorId, Constraint, Guardian,
    GuardianId, NewAccount, NewGuardian, NewStudent, StoreError, Student, StudentId,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One-shot failure injected into the next matching store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `insert_guardian` fails with `Unavailable`
    GuardianInsert,
    /// `insert_student` fails with `Unavailable`
    StudentInsert,
    /// `insert_account` fails with `Unavailable`
    AccountInsert,
    /// `insert_account` fails with a username `UniqueViolation`, as if the
    /// name was claimed after the caller checked it
    AccountUsernameTaken,
    /// `commit` fails with a username `UniqueViolation`, as if another
    /// transaction won the race
    CommitConflict,
    /// `commit` fails with `Unavailable`
    Commit,
}

/// Row counts of the transactional tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub guardians: usize,
    pub students: usize,
    pub accounts: usize,
}

/// Committed state
#[derive(Debug, Default)]
struct Tables {
    account_types: BTreeMap<AccountTypeId, AccountType>,
    guardians: BTreeMap<GuardianId, Guardian>,
    students: BTreeMap<StudentId, Student>,
    accounts: BTreeMap<AccountId, Account>,
    usernames: HashMap<String, AccountId>,
    student_accounts: HashMap<StudentId, AccountId>,
}

impl Tables {
    fn account_by_username(&self, username: &str) -> Option<&Account> {
        self.usernames
            .get(username)
            .and_then(|id| self.accounts.get(id))
    }

    fn apply(&mut self, pending: PendingWrites) {
        for guardian in pending.guardians {
            self.guardians.insert(guardian.id, guardian);
        }
        for student in pending.students {
            self.students.insert(student.id, student);
        }
        for account in pending.accounts {
            self.insert_account(account);
        }
    }

    fn insert_account(&mut self, account: Account) {
        self.usernames.insert(account.username.clone(), account.id);
        if let Some(student_id) = account.student_id {
            self.student_accounts.insert(student_id, account.id);
        }
        self.accounts.insert(account.id, account);
    }
}

/// Inserts made by an open transaction, in insertion order
#[derive(Debug, Default)]
struct PendingWrites {
    guardians: Vec<Guardian>,
    students: Vec<Student>,
    accounts: Vec<Account>,
}

impl PendingWrites {
    fn has_guardian(&self, id: GuardianId) -> bool {
        self.guardians.iter().any(|g| g.id == id)
    }

    fn has_student(&self, id: StudentId) -> bool {
        self.students.iter().any(|s| s.id == id)
    }

    fn account_by_username(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username == username)
    }

    fn has_student_account(&self, id: StudentId) -> bool {
        self.accounts.iter().any(|a| a.student_id == Some(id))
    }

    fn is_empty(&self) -> bool {
        self.guardians.is_empty() && self.students.is_empty() && self.accounts.is_empty()
    }
}

#[derive(Debug, Default)]
struct Shared {
    actors: DashMap<ActorId, Actor>,
    tables: RwLock<Tables>,
    faults: Mutex<Vec<Fault>>,
}

impl Shared {
    fn take_fault(&self, fault: Fault) -> bool {
        let mut faults = self.faults.lock();
        match faults.iter().position(|f| *f == fault) {
            Some(idx) => {
                faults.remove(idx);
                true
            }
            None => false,
        }
    }

    fn check_actor(&self, id: ActorId) -> Result<(), StoreError> {
        if self.actors.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation {
                relation: "actor",
                key: id.to_string(),
            })
        }
    }
}

/// Cloneable handle to a shared in-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

impl InMemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor
    pub fn add_actor(&self, actor: Actor) -> ActorId {
        let id = actor.id;
        self.shared.actors.insert(id, actor);
        id
    }

    /// Add a catalog entry, returning the existing one if the designation is taken
    pub fn add_account_type(&self, designation: impl Into<String>) -> AccountType {
        let designation = designation.into();
        let mut tables = self.shared.tables.write();
        if let Some(existing) = tables
            .account_types
            .values()
            .find(|t| t.designation == designation)
        {
            return existing.clone();
        }
        let account_type = AccountType::new(designation);
        tables
            .account_types
            .insert(account_type.id, account_type.clone());
        account_type
    }

    /// Insert a committed account that is not linked to any student
    ///
    /// # Errors
    /// - `StoreError::UniqueViolation` if the username is taken
    /// - `StoreError::ForeignKeyViolation` if the account type is unknown
    pub fn seed_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.shared.tables.write();
        if tables.usernames.contains_key(&account.username) {
            return Err(StoreError::UniqueViolation {
                constraint: Constraint::AccountUsername,
                value: account.username,
            });
        }
        if !tables.account_types.contains_key(&account.account_type_id) {
            return Err(StoreError::ForeignKeyViolation {
                relation: "account_type",
                key: account.account_type_id.to_string(),
            });
        }
        let account = Account {
            student_id: None,
            ..account.into_account()
        };
        tables.insert_account(account.clone());
        Ok(account)
    }

    /// Arm a one-shot fault
    pub fn inject_fault(&self, fault: Fault) {
        self.shared.faults.lock().push(fault);
    }

    /// Committed guardians, oldest first
    #[must_use]
    pub fn guardians(&self) -> Vec<Guardian> {
        self.shared.tables.read().guardians.values().cloned().collect()
    }

    /// Committed students, oldest first
    #[must_use]
    pub fn students(&self) -> Vec<Student> {
        self.shared.tables.read().students.values().cloned().collect()
    }

    /// Committed accounts, oldest first
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        self.shared.tables.read().accounts.values().cloned().collect()
    }

    /// Committed account linked to `student_id`
    #[must_use]
    pub fn account_for_student(&self, student_id: StudentId) -> Option<Account> {
        let tables = self.shared.tables.read();
        tables
            .student_accounts
            .get(&student_id)
            .and_then(|id| tables.accounts.get(id))
            .cloned()
    }

    /// Committed account with `username`
    #[must_use]
    pub fn account_by_username(&self, username: &str) -> Option<Account> {
        self.shared
            .tables
            .read()
            .account_by_username(username)
            .cloned()
    }

    /// Row counts of committed data
    #[must_use]
    pub fn counts(&self) -> StoreCounts {
        let tables = self.shared.tables.read();
        StoreCounts {
            guardians: tables.guardians.len(),
            students: tables.students.len(),
            accounts: tables.accounts.len(),
        }
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryStore {
    type Tx = MemoryTransaction;

    async fn find_actor(&self, id: ActorId) -> Result<Option<Actor>, StoreError> {
        Ok(self.shared.actors.get(&id).map(|a| a.value().clone()))
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            pending: PendingWrites::default(),
        })
    }
}

/// Open transaction on an [`InMemoryStore`]
#[derive(Debug)]
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    pending: PendingWrites,
}

impl MemoryTransaction {
    fn injected(&self, fault: Fault) -> Result<(), StoreError> {
        if self.shared.take_fault(fault) {
            Err(StoreError::Unavailable(format!("injected fault: {fault:?}")))
        } else {
            Ok(())
        }
    }

    /// Check pending writes against committed rows
    fn validate(&self, tables: &Tables) -> Result<(), StoreError> {
        for guardian in &self.pending.guardians {
            self.shared.check_actor(guardian.actor_id)?;
        }
        for student in &self.pending.students {
            self.shared.check_actor(student.actor_id)?;
            if !self.pending.has_guardian(student.guardian_id)
                && !tables.guardians.contains_key(&student.guardian_id)
            {
                return Err(StoreError::ForeignKeyViolation {
                    relation: "guardian",
                    key: student.guardian_id.to_string(),
                });
            }
        }
        for account in &self.pending.accounts {
            if tables.usernames.contains_key(&account.username) {
                return Err(StoreError::UniqueViolation {
                    constraint: Constraint::AccountUsername,
                    value: account.username.clone(),
                });
            }
            if !tables.account_types.contains_key(&account.account_type_id) {
                return Err(StoreError::ForeignKeyViolation {
                    relation: "account_type",
                    key: account.account_type_id.to_string(),
                });
            }
            if let Some(student_id) = account.student_id {
                if tables.student_accounts.contains_key(&student_id) {
                    return Err(StoreError::UniqueViolation {
                        constraint: Constraint::AccountStudent,
                        value: student_id.to_string(),
                    });
                }
                if !self.pending.has_student(student_id)
                    && !tables.students.contains_key(&student_id)
                {
                    return Err(StoreError::ForeignKeyViolation {
                        relation: "student",
                        key: student_id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_guardian(&mut self, guardian: NewGuardian) -> Result<Guardian, StoreError> {
        self.injected(Fault::GuardianInsert)?;
        self.shared.check_actor(guardian.actor_id)?;

        let guardian = guardian.into_guardian();
        self.pending.guardians.push(guardian.clone());
        Ok(guardian)
    }

    async fn insert_student(&mut self, student: NewStudent) -> Result<Student, StoreError> {
        self.injected(Fault::StudentInsert)?;
        self.shared.check_actor(student.actor_id)?;

        let guardian_known = self.pending.has_guardian(student.guardian_id)
            || self
                .shared
                .tables
                .read()
                .guardians
                .contains_key(&student.guardian_id);
        if !guardian_known {
            return Err(StoreError::ForeignKeyViolation {
                relation: "guardian",
                key: student.guardian_id.to_string(),
            });
        }

        let student = student.into_student();
        self.pending.students.push(student.clone());
        Ok(student)
    }

    async fn find_account_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        if let Some(account) = self.pending.account_by_username(username) {
            return Ok(Some(account.clone()));
        }
        Ok(self
            .shared
            .tables
            .read()
            .account_by_username(username)
            .cloned())
    }

    async fn find_account_type(
        &mut self,
        designation: &str,
    ) -> Result<Option<AccountType>, StoreError> {
        Ok(self
            .shared
            .tables
            .read()
            .account_types
            .values()
            .find(|t| t.designation == designation)
            .cloned())
    }

    async fn insert_account(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        self.injected(Fault::AccountInsert)?;
        if self.shared.take_fault(Fault::AccountUsernameTaken) {
            return Err(StoreError::UniqueViolation {
                constraint: Constraint::AccountUsername,
                value: account.username,
            });
        }

        {
            let tables = self.shared.tables.read();
            if self.pending.account_by_username(&account.username).is_some()
                || tables.usernames.contains_key(&account.username)
            {
                return Err(StoreError::UniqueViolation {
                    constraint: Constraint::AccountUsername,
                    value: account.username,
                });
            }
            if !tables.account_types.contains_key(&account.account_type_id) {
                return Err(StoreError::ForeignKeyViolation {
                    relation: "account_type",
                    key: account.account_type_id.to_string(),
                });
            }
            if let Some(student_id) = account.student_id {
                if self.pending.has_student_account(student_id)
                    || tables.student_accounts.contains_key(&student_id)
                {
                    return Err(StoreError::UniqueViolation {
                        constraint: Constraint::AccountStudent,
                        value: student_id.to_string(),
                    });
                }
                if !self.pending.has_student(student_id)
                    && !tables.students.contains_key(&student_id)
                {
                    return Err(StoreError::ForeignKeyViolation {
                        relation: "student",
                        key: student_id.to_string(),
                    });
                }
            }
        }

        let account = account.into_account();
        self.pending.accounts.push(account.clone());
        Ok(account)
    }

    async fn commit(self) -> Result<(), StoreError> {
        if self.shared.take_fault(Fault::CommitConflict) {
            let value = self
                .pending
                .accounts
                .first()
                .map_or_else(String::new, |a| a.username.clone());
            tracing::debug!(username = %value, "injected commit conflict");
            return Err(StoreError::UniqueViolation {
                constraint: Constraint::AccountUsername,
                value,
            });
        }
        self.injected(Fault::Commit)?;

        let mut tables = self.shared.tables.write();
        self.validate(&tables)?;

        let counts = (
            self.pending.guardians.len(),
            self.pending.students.len(),
            self.pending.accounts.len(),
        );
        tables.apply(self.pending);
        tracing::debug!(
            guardians = counts.0,
            students = counts.1,
            accounts = counts.2,
            "transaction committed"
        );
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        if !self.pending.is_empty() {
            tracing::debug!(
                guardians = self.pending.guardians.len(),
                students = self.pending.students.len(),
                accounts = self.pending.accounts.len(),
                "transaction rolled back"
            );
        }
        Ok(())
    }
}
