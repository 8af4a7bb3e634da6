//! Record identifier generation.

use crate::models::{RecordId, RecordType};
use uuid::Uuid;

/// Supplies a fresh identifier for every record a writer emits.
pub trait RecordIdGenerator: Send + Sync {
    fn generate(&self, kind: RecordType) -> RecordId;

    /// An identifier for a record grouped under `key` = `value`, for example
    /// the warcinfo record of a particular file.
    fn generate_qualified(&self, key: &str, value: &str) -> RecordId;
}

/// Generates random `urn:uuid:` identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl UuidGenerator {
    fn next(&self) -> RecordId {
        RecordId::new(Uuid::new_v4().urn().to_string())
    }
}

impl RecordIdGenerator for UuidGenerator {
    fn generate(&self, _kind: RecordType) -> RecordId {
        self.next()
    }

    // Random identifiers are already unique, so qualifiers add nothing.
    fn generate_qualified(&self, _key: &str, _value: &str) -> RecordId {
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_urns_are_unique() {
        let generator = UuidGenerator;
        let ids: HashSet<_> = (0..100).map(|_| generator.generate(RecordType::Resource)).collect();
        assert_eq!(ids.len(), 100);
        let id = generator.generate_qualified("type", "warcinfo");
        assert!(id.as_str().starts_with("urn:uuid:"));
        assert_eq!(id.as_str().len(), "urn:uuid:".len() + 36);
    }
}
