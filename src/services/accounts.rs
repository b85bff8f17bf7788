// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in and registration against the remote auth subsystem.
//!
//! The auth subsystem only knows accounts; the role comes from the
//! account's row in `users`.

use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::db::{tables, AuthService, AuthSession, DataService};
use crate::error::AppError;
use crate::models::{Identity, Role};
use crate::services::profiles;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 200, message = "full name is required"))]
    pub full_name: String,
}

/// Outcome of a successful sign-in or registration.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub identity: Identity,
    pub access_token: Option<String>,
}

/// Authenticate and resolve the account's role.
pub async fn sign_in(
    db: &dyn DataService,
    auth: &dyn AuthService,
    form: LoginForm,
) -> Result<SignedIn, AppError> {
    form.validate()?;

    let session = auth.sign_in(&form.email, &form.password).await?;
    let Some(profile) = profiles::get_profile(db, &session.user.id).await? else {
        tracing::warn!(user_id = %session.user.id, "Account has no users profile");
        revoke(auth, &session).await;
        return Err(AppError::Unauthorized);
    };

    let identity = Identity {
        id: session.user.id.clone(),
        email: session
            .user
            .email
            .clone()
            .or(profile.email)
            .unwrap_or(form.email),
        role: profile.role,
    };

    tracing::info!(user_id = %identity.id, role = ?identity.role, "Signed in");
    Ok(SignedIn {
        identity,
        access_token: session.access_token,
    })
}

/// Create an account and its member profile.
pub async fn register(
    db: &dyn DataService,
    auth: &dyn AuthService,
    form: RegisterForm,
) -> Result<SignedIn, AppError> {
    form.validate()?;

    let session = auth.sign_up(&form.email, &form.password).await?;

    let profile = db
        .insert(
            tables::USERS,
            json!({
                "id": session.user.id,
                "email": form.email,
                "full_name": form.full_name,
                "role": Role::Member,
            }),
        )
        .await;
    if let Err(e) = profile {
        tracing::error!(error = %e, user_id = %session.user.id, "Failed to create users profile");
        revoke(auth, &session).await;
        return Err(e);
    }

    tracing::info!(user_id = %session.user.id, "Registered new member");
    Ok(SignedIn {
        identity: Identity {
            id: session.user.id,
            email: form.email,
            role: Role::Member,
        },
        access_token: session.access_token,
    })
}

async fn revoke(auth: &dyn AuthService, session: &AuthSession) {
    if let Some(token) = &session.access_token {
        if let Err(e) = auth.sign_out(token).await {
            tracing::warn!(error = %e, "Failed to revoke remote session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;

    fn login(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_resolves_role() {
        let backend = MemoryBackend::new();
        backend.seed_account("boss@example.com", "secret1", "Boss", Role::Admin);

        let signed_in = sign_in(&backend, &backend, login("Boss@Example.com", "secret1"))
            .await
            .unwrap();
        assert!(signed_in.identity.is_admin());
        assert_eq!(signed_in.identity.email, "boss@example.com");
        assert!(signed_in.access_token.is_some());
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let backend = MemoryBackend::new();
        backend.seed_account("ana@example.com", "secret1", "Ana", Role::Member);
        assert!(matches!(
            sign_in(&backend, &backend, login("ana@example.com", "nope")).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_malformed_email() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            sign_in(&backend, &backend, login("not-an-email", "x")).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_register_creates_member_profile() {
        let backend = MemoryBackend::new();
        let form = RegisterForm {
            email: "new@example.com".to_string(),
            password: "secret1".to_string(),
            full_name: "New Member".to_string(),
        };

        let signed_in = register(&backend, &backend, form).await.unwrap();
        assert_eq!(signed_in.identity.role, Role::Member);

        let users = backend.rows(tables::USERS);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["id"], signed_in.identity.id.as_str());
        assert_eq!(users[0]["role"], "member");

        // The new account can sign in straight away.
        let again = sign_in(&backend, &backend, login("new@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(again.identity.id, signed_in.identity.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let backend = MemoryBackend::new();
        backend.seed_account("ana@example.com", "secret1", "Ana", Role::Member);
        let form = RegisterForm {
            email: "ana@example.com".to_string(),
            password: "secret2".to_string(),
            full_name: "Other Ana".to_string(),
        };
        assert!(matches!(
            register(&backend, &backend, form).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
