use actix_session::{SessionMiddleware, config::PersistentSession, storage::CookieSessionStore};
use actix_web::{
    cookie::{Key, SameSite, time::Duration},
    web,
};
use middleware::auth::AuthMiddleware;

pub mod dtos {
    pub mod auth;
}
pub mod middleware {
    pub mod auth;
}
pub mod routes {
    pub mod auth;
}
mod services {
    pub(crate) mod auth;
    pub(crate) mod password;
}

pub const SESSION_COOKIE_NAME: &str = "session";

pub fn mount_auth(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::auth::post_register)
        .service(routes::auth::post_login)
        .service(routes::auth::get_logout);
}

/// Encrypted cookie session that survives browser restarts for `ttl_days`.
///
/// # Panics
///
/// Panics if `secret` is shorter than 64 bytes.
pub fn session_middleware(
    cookie_secure: bool,
    secret: &[u8],
    ttl_days: i64,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::from(secret))
        .cookie_name(SESSION_COOKIE_NAME.to_string())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::days(ttl_days)))
        .build()
}

pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware::new()
}
