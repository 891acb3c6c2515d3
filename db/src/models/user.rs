use chrono::NaiveDateTime;
use common::session::{Principal, SessionUser};
use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser { user_id: user.id }
    }
}

impl Principal for User {
    fn principal_id(&self) -> i64 {
        self.id
    }
}
