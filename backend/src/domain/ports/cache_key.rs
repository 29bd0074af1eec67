//! Deterministic cache keys of the form `<entity-type>-<id>`.

/// Key under which one entity is cached.
///
/// # Examples
/// ```
/// use social_backend::domain::ports::CacheKey;
///
/// assert_eq!(CacheKey::entity("post", 42).as_str(), "post-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for entity `kind` with identifier `id`.
    pub fn entity(kind: &'static str, id: i64) -> Self {
        Self(format!("{kind}-{id}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
