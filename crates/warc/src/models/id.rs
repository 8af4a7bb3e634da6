use std::fmt::{Display, Formatter, Result as FmtResult};

/// A record identifier: a URI, conventionally a `urn:uuid:` URN.
///
/// Stored without the angle brackets that surround it on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);
impl RecordId {
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        match uri.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
            Some(inner) => Self(inner.to_string()),
            None => Self(uri),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as written in a named field.
    pub fn bracketed(&self) -> String {
        format!("<{}>", self.0)
    }
}
impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}
impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("urn:uuid:1234", "urn:uuid:1234")]
    #[case("<urn:uuid:1234>", "urn:uuid:1234")]
    #[case("<urn:uuid:1234", "<urn:uuid:1234")]
    fn test_new(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(RecordId::new(input).as_str(), expected);
    }

    #[test]
    fn test_bracketed() {
        assert_eq!(RecordId::new("urn:uuid:1234").bracketed(), "<urn:uuid:1234>");
    }
}
