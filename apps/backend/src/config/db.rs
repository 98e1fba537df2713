use std::env;

use crate::error::AppError;

/// Which database the process should talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbProfile {
    /// `DATABASE_URL`
    Prod,
    /// `TEST_DATABASE_URL`; the database name must end in `_test`
    Test,
}

/// Resolve the connection URL for `profile` from the process environment.
pub fn db_url(profile: DbProfile) -> Result<String, AppError> {
    db_url_from(profile, |name| env::var(name).ok())
}

pub fn db_url_from<F>(profile: DbProfile, lookup: F) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match profile {
        DbProfile::Prod => must_var(&lookup, "DATABASE_URL"),
        DbProfile::Test => {
            let url = must_var(&lookup, "TEST_DATABASE_URL")?;
            let db_name = database_name(&url);
            if !db_name.ends_with("_test") {
                return Err(AppError::config(format!(
                    "Test profile requires database name to end with '_test', but got: '{db_name}'"
                )));
            }
            Ok(url)
        }
    }
}

/// Last path segment of a connection URL, without query string.
fn database_name(url: &str) -> &str {
    let without_query = url.split('?').next().unwrap_or(url);
    without_query.rsplit('/').next().unwrap_or("")
}

fn must_var<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::config(format!("Required environment variable '{name}' is not set")))
}
