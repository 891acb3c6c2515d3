pub struct UserCreateRequest {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
