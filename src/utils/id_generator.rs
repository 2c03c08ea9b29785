//! Session id generation.

use uuid::Uuid;

/// Generates unique, human-scannable session ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }

    /// New id of the form `session-<uuid>`.
    pub fn generate_session_id(&self) -> String {
        format!("session-{}", Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let generator = IdGenerator::new();
        let a = generator.generate_session_id();
        let b = generator.generate_session_id();
        assert_ne!(a, b);
        assert!(a.starts_with("session-"));
    }
}
