//! Unique fixture values so tests sharing a process never collide on
//! identifiers (the credential store keys on e-mail, the limiter on username).

use ulid::Ulid;

/// Generate a unique string in the format `{prefix}-{ulid}`.
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Generate a unique, lower-case e-mail address in the format
/// `{prefix}-{ulid}@example.test`.
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_email;
///
/// let email1 = unique_email("test");
/// let email2 = unique_email("test");
/// assert_ne!(email1, email2);
/// assert!(email1.ends_with("@example.test"));
/// assert_eq!(email1, email1.to_lowercase());
/// ```
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Ulid::new()).to_lowercase()
}
