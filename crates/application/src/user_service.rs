//! User account ports and application service.
//!
//! Owns registration and password authentication. Follows OWASP guidelines
//! for generic error messages and timing-safe failure paths.

use std::sync::Arc;

use async_trait::async_trait;
use pitchside_core::{AppError, AppResult, UserId};
use pitchside_domain::{EmailAddress, validate_password};

/// User record returned by repository queries.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Canonical email address.
    pub email: String,
    /// Display name shown in the UI.
    pub display_name: String,
    /// Argon2id password hash.
    pub password_hash: String,
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by their unique identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Creates a new user record. Returns the assigned user ID.
    async fn create(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> AppResult<UserId>;
}

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password using Argon2id.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    /// Must run in constant time regardless of validity.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Result of a login attempt.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Authentication succeeded. Session can be established.
    Authenticated(UserRecord),
    /// Authentication failed. Generic message prevents enumeration.
    Failed,
}

/// Parameters for user registration.
pub struct RegisterParams {
    /// Email address for the new account.
    pub email: String,
    /// Plaintext password (validated against OWASP rules).
    pub password: String,
    /// Display name for the account.
    pub display_name: String,
}

/// Application service for user authentication and registration.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
        }
    }

    /// Registers a new user with email and password.
    pub async fn register(&self, params: RegisterParams) -> AppResult<UserId> {
        let email_address = EmailAddress::new(&params.email)?;
        validate_password(&params.password)?;

        if params.display_name.trim().is_empty() {
            return Err(AppError::Validation(
                "display name must not be empty".to_owned(),
            ));
        }

        let existing = self
            .user_repository
            .find_by_email(email_address.as_str())
            .await?;

        if existing.is_some() {
            // OWASP: do not reveal that the account exists.
            // Still hash the password to prevent timing side-channels.
            let _ = self.password_hasher.hash_password(&params.password);
            return Err(AppError::Conflict(
                "an account with this email may already exist".to_owned(),
            ));
        }

        let password_hash = self.password_hasher.hash_password(&params.password)?;
        self.user_repository
            .create(
                email_address.as_str(),
                params.display_name.trim(),
                &password_hash,
            )
            .await
    }

    /// Authenticates a user with email and password.
    ///
    /// Returns [`AuthOutcome::Failed`] for any failure (unknown email, wrong
    /// password) to prevent enumeration.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthOutcome> {
        let user = self.user_repository.find_by_email(email).await?;

        let Some(user) = user else {
            // OWASP: always hash to prevent timing attacks even when user not found.
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        let password_valid = self
            .password_hasher
            .verify_password(password, &user.password_hash)?;

        if !password_valid {
            return Ok(AuthOutcome::Failed);
        }

        Ok(AuthOutcome::Authenticated(user))
    }

    /// Returns a user record by ID, if it exists.
    pub async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        self.user_repository.find_by_id(user_id).await
    }

    /// Returns a user record by email, if it exists.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        self.user_repository.find_by_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use pitchside_core::{AppError, AppResult, UserId};
    use tokio::sync::Mutex;

    use super::{
        AuthOutcome, PasswordHasher, RegisterParams, UserRecord, UserRepository, UserService,
    };

    #[derive(Default)]
    struct FakeUserRepository {
        users: Mutex<Vec<UserRecord>>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.email == email)
                .cloned())
        }

        async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.id == user_id)
                .cloned())
        }

        async fn create(
            &self,
            email: &str,
            display_name: &str,
            password_hash: &str,
        ) -> AppResult<UserId> {
            let user_id = UserId::new();
            self.users.lock().await.push(UserRecord {
                id: user_id,
                email: email.to_owned(),
                display_name: display_name.to_owned(),
                password_hash: password_hash.to_owned(),
            });
            Ok(user_id)
        }
    }

    struct FakePasswordHasher;

    impl PasswordHasher for FakePasswordHasher {
        fn hash_password(&self, password: &str) -> AppResult<String> {
            Ok(format!("hashed:{password}"))
        }

        fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
            Ok(hash == format!("hashed:{password}"))
        }
    }

    fn service() -> (UserService, Arc<FakeUserRepository>) {
        let repository = Arc::new(FakeUserRepository::default());
        (
            UserService::new(repository.clone(), Arc::new(FakePasswordHasher)),
            repository,
        )
    }

    #[tokio::test]
    async fn register_and_login_round_trip() {
        let (service, _) = service();

        let user_id = service
            .register(RegisterParams {
                email: "keeper@example.com".to_owned(),
                password: "a-reasonable-passphrase".to_owned(),
                display_name: "Keeper".to_owned(),
            })
            .await;
        assert!(user_id.is_ok());

        let outcome = service
            .login("keeper@example.com", "a-reasonable-passphrase")
            .await;
        assert!(matches!(outcome, Ok(AuthOutcome::Authenticated(_))));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_generically() {
        let (service, _) = service();

        let first = service
            .register(RegisterParams {
                email: "keeper@example.com".to_owned(),
                password: "a-reasonable-passphrase".to_owned(),
                display_name: "Keeper".to_owned(),
            })
            .await;
        assert!(first.is_ok());

        let second = service
            .register(RegisterParams {
                email: "keeper@example.com".to_owned(),
                password: "another-fine-passphrase".to_owned(),
                display_name: "Keeper Again".to_owned(),
            })
            .await;
        let Err(AppError::Conflict(message)) = second else {
            panic!("expected conflict");
        };
        // OWASP: the message must not confirm the account exists.
        assert!(message.contains("may already exist"));
    }

    #[tokio::test]
    async fn wrong_password_fails_generically() {
        let (service, _) = service();

        let registered = service
            .register(RegisterParams {
                email: "keeper@example.com".to_owned(),
                password: "a-reasonable-passphrase".to_owned(),
                display_name: "Keeper".to_owned(),
            })
            .await;
        assert!(registered.is_ok());

        let outcome = service.login("keeper@example.com", "wrong-password!").await;
        assert!(matches!(outcome, Ok(AuthOutcome::Failed)));
    }

    #[tokio::test]
    async fn unknown_email_fails_generically() {
        let (service, _) = service();

        let outcome = service.login("ghost@example.com", "whatever-here").await;
        assert!(matches!(outcome, Ok(AuthOutcome::Failed)));
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let (service, repository) = service();

        let result = service
            .register(RegisterParams {
                email: "keeper@example.com".to_owned(),
                password: "password123".to_owned(),
                display_name: "Keeper".to_owned(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(repository.users.lock().await.is_empty());
    }
}
