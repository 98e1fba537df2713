use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::Authenticator;
use crate::error::AppError;

/// Application state shared by all workers
#[derive(Clone)]
pub struct AppState {
    /// Database connection (absent when running against in-memory stores)
    db: Option<Arc<DatabaseConnection>>,
    auth: Arc<Authenticator>,
    project_name: Arc<str>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, auth: Authenticator) -> Self {
        Self {
            db: Some(db),
            auth: Arc::new(auth),
            project_name: Arc::from("Profile Doctor"),
        }
    }

    pub fn without_db(auth: Authenticator) -> Self {
        Self {
            db: None,
            auth: Arc::new(auth),
            project_name: Arc::from("Profile Doctor"),
        }
    }

    pub fn with_project_name(mut self, name: impl AsRef<str>) -> Self {
        self.project_name = Arc::from(name.as_ref());
        self
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_deref()
    }

    /// Database handle for routes that cannot work without one.
    pub fn require_db(&self) -> Result<&DatabaseConnection, AppError> {
        self.db
            .as_deref()
            .ok_or_else(|| AppError::dependency_unavailable("Database not configured"))
    }

    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }
}
