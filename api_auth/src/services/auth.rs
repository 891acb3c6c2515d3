use common::{
    error::{AppError, Res},
    validators::{validate_email, validate_password},
};
use db::{
    Store,
    dtos::{audit_log::AuditTrail, user::UserCreateRequest},
    models::user::User,
};

use once_cell::sync::Lazy;

use crate::{
    dtos::auth::{LoginRequest, RegisterRequest},
    services::password,
};

/// Verified against when the username is unknown.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    password::hash_password("subtrack-dummy-password").unwrap_or_else(|e| {
        log::error!("Failed to prepare dummy password hash: {}", e);
        String::new()
    })
});

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 80;
const MAX_EMAIL_LEN: usize = 120;

/// Validates and persists a new user.
///
/// Every field is checked and all problems are reported together; the
/// uniqueness lookups only run for a field that is otherwise well-formed.
pub async fn register_user(
    store: &dyn Store,
    req: &RegisterRequest,
    trail: AuditTrail,
) -> Res<User> {
    let username = req.username.trim();
    let email = req.email.trim();
    let mut errors = Vec::new();

    if username.is_empty() {
        errors.push("Username is required".to_string());
    } else if username.chars().count() < MIN_USERNAME_LEN {
        errors.push("Username must be at least 3 characters long".to_string());
    } else if username.chars().count() > MAX_USERNAME_LEN {
        errors.push("Username is too long (max 80 characters)".to_string());
    } else if store.exists_user_by_username(username).await? {
        errors.push("A user with this username already exists".to_string());
    }

    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !validate_email(email) {
        errors.push("Invalid email address".to_string());
    } else if email.chars().count() > MAX_EMAIL_LEN {
        errors.push("Email is too long (max 120 characters)".to_string());
    } else if store.exists_user_by_email(email).await? {
        errors.push("A user with this email already exists".to_string());
    }

    let (password_ok, reason) = validate_password(&req.password);
    if !password_ok {
        errors.push(reason.to_string());
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = store
        .insert_user(
            UserCreateRequest {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            },
            trail,
        )
        .await?;

    log::info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

/// Authenticates existing user.
/// Unknown usernames and wrong passwords fail identically.
pub async fn authenticate_user(store: &dyn Store, login_data: &LoginRequest) -> Res<User> {
    let username = login_data.username.trim();
    if username.is_empty() || login_data.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

    let Some(user) = store.get_user_by_username(username).await? else {
        // same Argon2 cost as a wrong password
        password::verify_password(&DUMMY_HASH, &login_data.password);
        return Err(invalid());
    };
    if !password::verify_password(&user.password_hash, &login_data.password) {
        return Err(invalid());
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::MemoryStore;

    fn register(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    async fn errors_for(store: &MemoryStore, req: RegisterRequest) -> Vec<String> {
        match register_user(store, &req, AuditTrail::default()).await {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn registration_stores_a_hash_and_trims_input() {
        let store = MemoryStore::new();
        let user = register_user(
            &store,
            &register("  alice ", " alice@x.com ", "secret1"),
            AuditTrail::default(),
        )
        .await
        .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");
        assert_ne!(user.password_hash, "secret1");
        assert!(password::verify_password(&user.password_hash, "secret1"));
        assert!(!password::verify_password(&user.password_hash, "secret2"));
    }

    #[tokio::test]
    async fn registration_collects_every_error() {
        let store = MemoryStore::new();
        let errors = errors_for(&store, register("al", "not-an-email", "123")).await;
        assert_eq!(
            errors,
            vec![
                "Username must be at least 3 characters long",
                "Invalid email address",
                "Password must be at least 6 characters long",
            ]
        );

        let errors = errors_for(&store, RegisterRequest::default()).await;
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], "Username is required");
        assert_eq!(errors[1], "Email is required");
    }

    #[tokio::test]
    async fn registration_rejects_duplicates() {
        let store = MemoryStore::new();
        register_user(&store, &register("alice", "alice@x.com", "secret1"), AuditTrail::default())
            .await
            .unwrap();

        let errors = errors_for(&store, register("alice", "other@x.com", "secret1")).await;
        assert_eq!(errors, vec!["A user with this username already exists"]);

        let errors = errors_for(&store, register("alice2", "alice@x.com", "secret1")).await;
        assert_eq!(errors, vec!["A user with this email already exists"]);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        register_user(&store, &register("alice", "alice@x.com", "secret1"), AuditTrail::default())
            .await
            .unwrap();

        let wrong_password = authenticate_user(
            &store,
            &LoginRequest {
                username: "alice".to_string(),
                password: "nope123".to_string(),
            },
        )
        .await
        .unwrap_err();
        let unknown_user = authenticate_user(
            &store,
            &LoginRequest {
                username: "mallory".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[test]
    fn dummy_hash_is_a_real_argon2_hash() {
        assert!(DUMMY_HASH.starts_with("$argon2id$"));
        assert!(password::verify_password(&DUMMY_HASH, "subtrack-dummy-password"));
    }

    #[tokio::test]
    async fn unknown_user_pays_for_a_hash_check() {
        let store = MemoryStore::new();
        // force the lazy hash so its one-off creation is not part of the timing
        Lazy::force(&DUMMY_HASH);

        let started = std::time::Instant::now();
        let err = authenticate_user(
            &store,
            &LoginRequest {
                username: "mallory".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await
        .unwrap_err();
        let unknown_elapsed = started.elapsed();

        let started = std::time::Instant::now();
        password::verify_password(&DUMMY_HASH, "secret1");
        let verify_elapsed = started.elapsed();

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(unknown_elapsed * 4 >= verify_elapsed);
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let store = MemoryStore::new();
        let err = authenticate_user(&store, &LoginRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
