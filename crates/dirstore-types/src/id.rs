/// Source of opaque entity ids.
///
/// Implementations only promise "sufficiently unique" tokens. Owners that
/// create storage check the target collection and ask again on collision.
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    /// Produce a fresh id token. Must never return an empty string.
    fn create_id(&self) -> String;
}

/// Default generator: time-ordered UUID v7 strings with an optional prefix.
#[derive(Clone, Debug, Default)]
pub struct UuidGenerator {
    prefix: Option<String>,
}

impl UuidGenerator {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Prepend `prefix` and a `-` to every generated id.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: if prefix.is_empty() { None } else { Some(prefix) },
        }
    }
}

impl IdGenerator for UuidGenerator {
    fn create_id(&self) -> String {
        let uuid = uuid::Uuid::now_v7();
        match &self.prefix {
            Some(prefix) => format!("{prefix}-{uuid}"),
            None => uuid.to_string(),
        }
    }
}
