//! Enrollment Transaction
//!
//! Creates a guardian, the student that depends on it and the student's login
//! account as one unit of work:
//! - Verifies the acting identity before touching the store
//! - Writes guardian → student → account inside one transaction
//! - Derives a unique username from the student's name
//! - Retries the whole unit once more when a commit loses a username race

use chrono::Utc;
use enrollment_core::username::{base_username, Candidates};
use enrollment_core::{
    Account, AccountStatus, AccountTypeId, ActorId, EnrollmentConfig, EnrollmentError, EnrollmentRequest,
    EnrollmentResult, LoginState, NewAccount, Student,
};
use enrollment_store::{EnrollmentStore, StoreTransaction};

/// Everything written by one successful transaction
#[derive(Debug, Clone)]
struct Enrolled {
    result: EnrollmentResult,
    account: Account,
}

/// Enrollment workflow bound to a store
#[derive(Debug, Clone)]
pub struct EnrollmentService<S> {
    store: S,
    config: EnrollmentConfig,
}

impl<S: EnrollmentStore> EnrollmentService<S> {
    /// Create service over `store`
    #[inline]
    #[must_use]
    pub fn new(store: S, config: EnrollmentConfig) -> Self {
        Self { store, config }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EnrollmentConfig {
        &self.config
    }

    /// Get store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enroll a student together with a new guardian and provision the
    /// student's account
    ///
    /// # Workflow
    /// 1. Check that `actor_id` exists (before any transaction)
    /// 2. Insert guardian, then the student linked to it
    /// 3. Pick the first free username among `base`, `base1`, `base2`, ...
    /// 4. Resolve the student account type and insert the account
    /// 5. Commit; nothing persists unless every step succeeded
    ///
    /// # Errors
    /// - `EnrollmentError::ActorNotFound` for an unknown actor
    /// - `EnrollmentError::InvalidRequest` for blank names or a name with no
    ///   usable characters
    /// - `EnrollmentError::AccountTypeMissing` if the catalog lacks the
    ///   configured student type
    /// - `EnrollmentError::UsernameExhausted` / `EnrollmentError::Store` for
    ///   anything else
    #[tracing::instrument(name = "enrollment", skip_all, fields(actor = %actor_id))]
    pub async fn create_student_with_guardian(
        &self,
        request: &EnrollmentRequest,
        actor_id: ActorId,
    ) -> Result<EnrollmentResult, EnrollmentError> {
        match self.enroll(request, actor_id).await {
            Ok(enrolled) => {
                tracing::info!(
                    student = %enrolled.result.data.student.id,
                    guardian = %enrolled.result.data.guardian.id,
                    username = %enrolled.account.username,
                    "student enrolled with guardian"
                );
                if enrolled.account.must_change_password {
                    tracing::info!(
                        username = %enrolled.account.username,
                        "default credential assigned; password change required on first login"
                    );
                } else {
                    tracing::info!(username = %enrolled.account.username, "default credential assigned");
                }
                Ok(enrolled.result)
            }
            Err(e) => {
                match &e {
                    EnrollmentError::ActorNotFound(_) | EnrollmentError::InvalidRequest(_) => {
                        tracing::warn!(error = %e, "enrollment rejected");
                    }
                    _ => tracing::error!(error = %e, "failed to create student with guardian"),
                }
                Err(e)
            }
        }
    }

    async fn enroll(
        &self,
        request: &EnrollmentRequest,
        actor_id: ActorId,
    ) -> Result<Enrolled, EnrollmentError> {
        if self.store.find_actor(actor_id).await?.is_none() {
            return Err(EnrollmentError::ActorNotFound(actor_id));
        }
        validate(request)?;

        let mut attempt = 1;
        loop {
            match self.run_transaction(request, actor_id).await {
                Err(EnrollmentError::Store(e))
                    if e.is_username_conflict() && attempt < self.config.commit_attempts =>
                {
                    tracing::warn!(attempt, error = %e, "commit lost a username race; retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn run_transaction(
        &self,
        request: &EnrollmentRequest,
        actor_id: ActorId,
    ) -> Result<Enrolled, EnrollmentError> {
        let mut tx = self.store.begin().await?;
        match self.write_all(&mut tx, request, actor_id).await {
            Ok(enrolled) => {
                tx.commit().await?;
                Ok(enrolled)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn write_all(
        &self,
        tx: &mut S::Tx,
        request: &EnrollmentRequest,
        actor_id: ActorId,
    ) -> Result<Enrolled, EnrollmentError> {
        let now = Utc::now();

        let guardian = tx
            .insert_guardian(request.guardian.to_new_guardian(actor_id, now))
            .await?;
        tracing::debug!(guardian = %guardian.id, "guardian created");

        let student = tx
            .insert_student(request.to_new_student(guardian.id, actor_id, now))
            .await?;
        tracing::debug!(student = %student.id, "student created");

        let base = base_username(student.name()).ok_or_else(|| unusable_name(student.name()))?;
        let mut candidates = Candidates::new(base);
        let mut username = self.next_free_username(tx, &mut candidates).await?;

        let designation = &self.config.student_account_type;
        let account_type = tx
            .find_account_type(designation)
            .await?
            .ok_or_else(|| EnrollmentError::AccountTypeMissing {
                designation: designation.clone(),
            })?;

        let account = loop {
            match tx
                .insert_account(self.new_account(&student, username.clone(), account_type.id))
                .await
            {
                Ok(account) => break account,
                Err(e) if e.is_username_conflict() => {
                    tracing::warn!(%username, "username claimed concurrently; trying next candidate");
                    username = self.next_free_username(tx, &mut candidates).await?;
                }
                Err(e) => return Err(e.into()),
            }
        };
        tracing::debug!(account = %account.id, username = %account.username, "account created");

        Ok(Enrolled {
            result: EnrollmentResult::created(student, guardian),
            account,
        })
    }

    /// Advance `candidates` to the first username with no account
    async fn next_free_username(
        &self,
        tx: &mut S::Tx,
        candidates: &mut Candidates,
    ) -> Result<String, EnrollmentError> {
        while candidates.attempts() < self.config.max_username_attempts {
            let Some(candidate) = candidates.next() else {
                break;
            };
            if tx.find_account_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            tracing::debug!(%candidate, "username taken");
        }
        Err(EnrollmentError::UsernameExhausted {
            base: candidates.base().to_string(),
            attempts: candidates.attempts(),
        })
    }

    fn new_account(
        &self,
        student: &Student,
        username: String,
        account_type_id: AccountTypeId,
    ) -> NewAccount {
        NewAccount {
            display_name: student.name().to_string(),
            username,
            password_hash: self.config.default_password_hash.clone(),
            account_type_id,
            status: AccountStatus::Active,
            login_state: LoginState::LoggedOut,
            student_id: Some(student.id),
            must_change_password: self.config.require_password_reset,
            created_at: Utc::now(),
        }
    }
}

/// Reject payloads that cannot produce a guardian, a student and a username
fn validate(request: &EnrollmentRequest) -> Result<(), EnrollmentError> {
    if request.guardian.name.trim().is_empty() {
        return Err(EnrollmentError::InvalidRequest(
            "guardian name is blank".to_string(),
        ));
    }
    let name = request.student.name.trim();
    if name.is_empty() {
        return Err(EnrollmentError::InvalidRequest(
            "student name is blank".to_string(),
        ));
    }
    if base_username(name).is_none() {
        return Err(unusable_name(name));
    }
    Ok(())
}

fn unusable_name(name: &str) -> EnrollmentError {
    EnrollmentError::InvalidRequest(format!(
        "student name '{name}' has no characters usable in a username"
    ))
}
