//! DTOs for users_sea adapter.

/// DTO for inserting a user row. `password_hash` is already a PHC string.
#[derive(Clone)]
pub struct UserCreate {
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl UserCreate {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            role: "user".to_string(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}

impl std::fmt::Debug for UserCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCreate")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
