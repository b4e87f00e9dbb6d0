use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::account::{FormErrors, LoginForm, NewUser, RegisterForm, Session, User};
use crate::domain::errors::DomainError;
use crate::domain::order::{Customer, OrderWithLines};
use crate::domain::ports::{AccountRepository, CustomerRepository, OrderRepository};

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// What the profile page shows: the customer record and its order history.
#[derive(Debug, Clone)]
pub struct Profile {
    pub customer: Customer,
    pub orders: Vec<OrderWithLines>,
}

pub struct AccountService<R: ?Sized> {
    repo: Arc<R>,
    session_ttl: Duration,
}

impl<R: ?Sized> Clone for AccountService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            session_ttl: self.session_ttl,
        }
    }
}

impl<R> AccountService<R>
where
    R: AccountRepository + CustomerRepository + OrderRepository + ?Sized,
{
    pub fn new(repo: Arc<R>, session_ttl: Duration) -> Self {
        Self { repo, session_ttl }
    }

    /// Create the user and its customer profile, then sign them in.
    pub fn register(&self, form: &RegisterForm) -> Result<(User, Session), DomainError> {
        let mut errors = form.validate();
        let username = form.username.trim();
        let email = form.email.trim();

        if !errors.has_field("username") && self.repo.username_taken(username)? {
            errors.add("username", "A user with that username already exists.");
        }
        if !errors.has_field("email") && self.repo.email_taken(email)? {
            errors.add("email", "This email is already registered.");
        }
        errors.into_result().map_err(DomainError::Validation)?;

        let user = self.repo.create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(&form.password1)?,
        })?;
        self.repo.get_or_create_customer(&user)?;
        log::info!("Registered user {}", user.username);

        let session = self.open_session(&user)?;
        Ok((user, session))
    }

    pub fn login(&self, form: &LoginForm) -> Result<(User, Session), DomainError> {
        form.validate()
            .into_result()
            .map_err(DomainError::Validation)?;

        let credentials = self.repo.find_credentials(form.username.trim())?;
        let user = match credentials {
            Some((user, hash)) if verify_password(&form.password, &hash)? => user,
            _ => {
                log::warn!("Failed login attempt for {}", form.username.trim());
                return Err(DomainError::Validation(FormErrors::non_field(
                    INVALID_CREDENTIALS,
                )));
            }
        };

        let session = self.open_session(&user)?;
        log::info!("User {} logged in", user.username);
        Ok((user, session))
    }

    pub fn logout(&self, token: &str) -> Result<(), DomainError> {
        self.repo.delete_session(token)
    }

    /// Resolve a session token to its user. Expired sessions are purged and
    /// treated as anonymous.
    pub fn current_user(&self, token: &str) -> Result<Option<User>, DomainError> {
        let Some((session, user)) = self.repo.find_session(token)? else {
            return Ok(None);
        };
        let now = Utc::now();
        if session.is_expired(now) {
            let purged = self.repo.delete_expired_sessions(now)?;
            log::debug!("Purged {purged} expired session(s)");
            return Ok(None);
        }
        Ok(Some(user))
    }

    pub fn profile(&self, user: &User) -> Result<Profile, DomainError> {
        let customer = self.repo.get_or_create_customer(user)?;
        let orders = self.repo.orders_for_customer(customer.id)?;
        Ok(Profile { customer, orders })
    }

    fn open_session(&self, user: &User) -> Result<Session, DomainError> {
        let session = Session {
            token: new_session_token(),
            user_id: user.id,
            expires_at: Utc::now() + self.session_ttl,
        };
        self.repo.create_session(&session)?;
        Ok(session)
    }
}

fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, DomainError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| DomainError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
