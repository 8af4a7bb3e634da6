use crate::error::{Error, ErrorKind};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// The closed set of record types a container may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    /// File-level metadata; always the first record of a container.
    Warcinfo,
    Response,
    Resource,
    Request,
    Metadata,
    /// Content already captured earlier; the body may be withheld.
    Revisit,
    Conversion,
    Continuation,
}
impl RecordType {
    pub const ALL: [RecordType; 8] = [
        RecordType::Warcinfo,
        RecordType::Response,
        RecordType::Resource,
        RecordType::Request,
        RecordType::Metadata,
        RecordType::Revisit,
        RecordType::Conversion,
        RecordType::Continuation,
    ];

    /// Returns the value written in the `WARC-Type` field.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Warcinfo => "warcinfo",
            RecordType::Response => "response",
            RecordType::Resource => "resource",
            RecordType::Request => "request",
            RecordType::Metadata => "metadata",
            RecordType::Revisit => "revisit",
            RecordType::Conversion => "conversion",
            RecordType::Continuation => "continuation",
        }
    }

    /// Whether writers require the full declared body for this type.
    ///
    /// Revisit records may deliberately withhold their body.
    #[inline]
    #[must_use]
    pub fn enforces_length(&self) -> bool {
        !matches!(self, RecordType::Revisit)
    }
}
impl FromStr for RecordType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::from(ErrorKind::UnknownRecordType(s.to_string())))
    }
}
impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
