pub mod password;

pub use password::{hash_password, verify_password};

use sqlx::{Pool, Sqlite};

use crate::db::models::User;
use crate::db::{SessionRepository, UserRepository};
use crate::error::AppError;

/// Validate and sanitize username
fn validate_username(username: &str) -> Result<String, AppError> {
    let trimmed = username.trim();

    if trimmed.len() < 3 || trimmed.len() > 32 {
        return Err(AppError::Validation(
            "Username must be 3-32 characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();

    if trimmed.is_empty() || !trimmed.contains('@') || trimmed.contains(char::is_whitespace) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    // Emails are the login key; compare case-insensitively by storing lowercase
    Ok(trimmed.to_lowercase())
}

pub struct AuthService;

impl AuthService {
    /// Register a new account and issue a session for the registering address.
    pub async fn register(
        pool: &Pool<Sqlite>,
        username: &str,
        email: &str,
        password: &str,
        ip_address: &str,
    ) -> Result<User, AppError> {
        let username = validate_username(username)?;
        let email = validate_email(email)?;

        if password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let password_hash = password::hash_password(password)?;

        let user = UserRepository::create(pool, &username, &email, &password_hash)
            .await
            .map_err(|e| e.conflict_on_unique("An account with this email already exists"))?;

        SessionRepository::issue(pool, &user.id, ip_address).await?;

        Ok(user)
    }

    /// Verify credentials and issue a session for the caller's address.
    pub async fn login(
        pool: &Pool<Sqlite>,
        email: &str,
        password: &str,
        ip_address: &str,
    ) -> Result<User, AppError> {
        let email = validate_email(email)?;

        let user = UserRepository::get_by_email(pool, &email)
            .await?
            .ok_or_else(|| AppError::Auth("Invalid email or password".to_string()))?;

        if !password::verify_password(password, &user.password_hash)? {
            return Err(AppError::Auth("Invalid email or password".to_string()));
        }

        SessionRepository::issue(pool, &user.id, ip_address).await?;

        Ok(user)
    }
}
