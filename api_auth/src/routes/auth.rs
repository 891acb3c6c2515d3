use std::sync::Arc;

use actix_session::Session;
use actix_web::{HttpMessage, HttpRequest, Responder, get, post, web};
use common::{
    error::{AppError, Res},
    http::Success,
    session::{SESSION_USER_KEY, SessionUser},
};
use db::{Store, models::user::User};

use crate::dtos::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services;

/// Binds the session to `user` and exposes it to the access log.
fn start_session(req: &HttpRequest, session: &Session, user: &User) -> Res<()> {
    session.renew();
    session
        .insert(SESSION_USER_KEY, user.id)
        .map_err(|e| AppError::Internal(format!("Failed to write session: {}", e)))?;
    req.extensions_mut().insert(SessionUser::from(user));
    Ok(())
}

/// Registers a new user with username, email and password.
///
/// # Input
/// - `body`: JSON payload with `username`, `email` and `password`
/// - `store`: Data store handle
/// - `session`: Session cookie, populated on success
///
/// # Output
/// - Success: 201 Created with `{message, user_id}`; the caller is logged in
/// - Error: 400 Bad Request with `{errors: [...]}` listing every invalid field
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/register', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     username: 'alice',
///     email: 'alice@example.com',
///     password: 'secret1'
///   })
/// });
/// ```
#[post("/register")]
pub async fn post_register(
    req: HttpRequest,
    body: web::Json<RegisterRequest>,
    store: web::Data<Arc<dyn Store>>,
    session: Session,
) -> Res<impl Responder> {
    let trail = logger::audit::trail(&req, None);
    let user = services::auth::register_user(store.get_ref().as_ref(), &body, trail).await?;
    start_session(&req, &session, &user)?;

    Success::created(AuthResponse {
        message: "User created successfully".to_string(),
        user_id: user.id,
    })
}

/// Authenticates a user with username and password.
///
/// # Input
/// - `login_data`: JSON payload with `username` and `password`
/// - `store`: Data store handle
/// - `session`: Session cookie, populated on success
///
/// # Output
/// - Success: 200 OK with `{message, user_id}` and a remembered session cookie
/// - Error: 400 Bad Request when a field is missing,
///   401 Unauthorized for any credential mismatch
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/login', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({ username: 'alice', password: 'secret1' })
/// });
/// ```
#[post("/login")]
pub async fn post_login(
    req: HttpRequest,
    login_data: web::Json<LoginRequest>,
    store: web::Data<Arc<dyn Store>>,
    session: Session,
) -> Res<impl Responder> {
    let user = services::auth::authenticate_user(store.get_ref().as_ref(), &login_data).await?;
    start_session(&req, &session, &user)?;
    log::info!("User {} logged in", user.id);

    Success::ok(AuthResponse {
        message: "Logged in successfully".to_string(),
        user_id: user.id,
    })
}

/// Ends the current session, if any, and redirects to the landing page.
#[get("/logout")]
pub async fn get_logout(session: Session) -> Res<impl Responder> {
    session.purge();
    Success::redirect("/")
}
