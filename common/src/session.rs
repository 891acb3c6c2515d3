use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Session key holding the authenticated user's id.
pub const SESSION_USER_KEY: &str = "user_id";

/// Anything that can stand in as the authenticated actor of a request.
pub trait Principal {
    fn principal_id(&self) -> i64;
}

/// The actor resolved from a session cookie for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i64,
}

impl Principal for SessionUser {
    fn principal_id(&self) -> i64 {
        self.user_id
    }
}

/// Reads the principal the extractor middleware left in request extensions.
pub fn get_session_user(req: &ServiceRequest) -> Option<SessionUser> {
    req.extensions().get::<SessionUser>().copied()
}

pub fn get_session_user_or_error(req: &ServiceRequest) -> Result<SessionUser, HttpResponse> {
    get_session_user(req).ok_or_else(|| {
        AppError::Unauthorized("Authentication required".to_string()).to_http_response()
    })
}
