use crate::models::{NamedFields, RecordId, RecordType};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::Read;

/// A record to be written, consumed exactly once by a writer.
///
/// # Examples
///
/// ```
/// use harc_warc::{RecordInfo, RecordType};
///
/// let body = b"hello";
/// let info = RecordInfo::from_bytes(RecordType::Resource, body)
///     .url("http://example.com/hello.txt")
///     .mimetype("text/plain");
/// assert_eq!(info.content_length(), 5);
/// ```
pub struct RecordInfo<'a> {
    pub(crate) kind: RecordType,
    pub(crate) url: Option<String>,
    pub(crate) date: Option<String>,
    pub(crate) mimetype: Option<String>,
    pub(crate) record_id: Option<RecordId>,
    pub(crate) extra_fields: NamedFields,
    pub(crate) content: Box<dyn Read + 'a>,
    pub(crate) content_length: u64,
    pub(crate) enforce_length: bool,
}
impl<'a> RecordInfo<'a> {
    /// A record whose body is the first `content_length` bytes of `content`.
    pub fn new(kind: RecordType, content: impl Read + 'a, content_length: u64) -> Self {
        Self {
            kind,
            url: None,
            date: None,
            mimetype: None,
            record_id: None,
            extra_fields: NamedFields::new(),
            content: Box::new(content),
            content_length,
            enforce_length: kind.enforces_length(),
        }
    }

    pub fn from_bytes(kind: RecordType, content: &'a [u8]) -> Self {
        Self::new(kind, content, content.len() as u64)
    }

    /// A record without a body. It must carry at least one extra field to be
    /// accepted by a writer.
    pub fn without_content(kind: RecordType) -> Self {
        Self::new(kind, std::io::empty(), 0)
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Creation date as 14 digits (`YYYYMMDDhhmmss`, UTC). Defaults to the
    /// time of the write.
    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    #[must_use]
    pub fn mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Use a specific identifier instead of generating one.
    #[must_use]
    pub fn record_id(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_fields.add(name, value);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: NamedFields) -> Self {
        for (name, value) in fields.iter() {
            self.extra_fields.add(name, value);
        }
        self
    }

    /// Whether a content stream shorter than the declared length fails the
    /// write. Defaults to `true` for every type but `revisit`.
    #[must_use]
    pub fn enforce_length(mut self, enforce: bool) -> Self {
        self.enforce_length = enforce;
        self
    }

    #[must_use]
    pub(crate) fn with_kind(mut self, kind: RecordType) -> Self {
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> RecordType {
        self.kind
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn extra_fields(&self) -> &NamedFields {
        &self.extra_fields
    }
}
impl Debug for RecordInfo<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RecordInfo")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("date", &self.date)
            .field("mimetype", &self.mimetype)
            .field("record_id", &self.record_id)
            .field("extra_fields", &self.extra_fields)
            .field("content_length", &self.content_length)
            .field("enforce_length", &self.enforce_length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforce_length_defaults_by_type() {
        assert!(RecordInfo::from_bytes(RecordType::Resource, b"x").enforce_length);
        assert!(!RecordInfo::from_bytes(RecordType::Revisit, b"x").enforce_length);
        assert!(!RecordInfo::from_bytes(RecordType::Resource, b"x").enforce_length(false).enforce_length);
    }

    #[test]
    fn builder_collects_fields() {
        let info = RecordInfo::without_content(RecordType::Metadata)
            .field("via", "http://example.com/")
            .fields(NamedFields::new().with("outlink", "http://example.com/a"));
        assert_eq!(info.content_length(), 0);
        assert_eq!(info.extra_fields().len(), 2);
        assert_eq!(info.kind(), RecordType::Metadata);
    }
}
