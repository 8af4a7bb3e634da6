use crate::consts::*;
use crate::error::{ErrorKind, Result};
use crate::models::{NamedFields, RecordId, RecordType};
use exn::OptionExt;

/// The parsed header block of one record.
///
/// Built once by the header codec and immutable afterwards. Besides the
/// named fields it carries where the record was found: its absolute offset
/// within the container and an identifier for the container itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    version: String,
    fields: NamedFields,
    content_length: u64,
    header_length: u64,
    offset: u64,
    reader_identifier: String,
    digest: Option<String>,
}
impl RecordHeader {
    pub(crate) fn new(
        version: String,
        fields: NamedFields,
        content_length: u64,
        header_length: u64,
        offset: u64,
        reader_identifier: String,
    ) -> Self {
        Self { version, fields, content_length, header_length, offset, reader_identifier, digest: None }
    }

    pub(crate) fn with_digest(mut self, digest: Option<String>) -> Self {
        self.digest = digest;
        self
    }

    /// Version from the magic line, e.g. `1.0`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn fields(&self) -> &NamedFields {
        &self.fields
    }

    /// First value of an arbitrary named field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    pub fn record_type(&self) -> Result<RecordType> {
        let value = self
            .field(HEADER_KEY_TYPE)
            .ok_or_raise(|| ErrorKind::MalformedContainer(format!("record at offset {} has no type", self.offset)))?;
        value.parse()
    }

    /// Target URL; absent for `warcinfo` records.
    pub fn url(&self) -> Option<&str> {
        self.field(HEADER_KEY_URI)
    }

    pub fn date(&self) -> Option<&str> {
        self.field(HEADER_KEY_DATE)
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.field(HEADER_KEY_ID).map(RecordId::new)
    }

    pub fn mimetype(&self) -> Option<&str> {
        self.field(CONTENT_TYPE)
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.field(HEADER_KEY_IP)
    }

    pub fn truncated(&self) -> Option<&str> {
        self.field(HEADER_KEY_TRUNCATED)
    }

    pub fn profile(&self) -> Option<&str> {
        self.field(HEADER_KEY_PROFILE)
    }

    pub fn filename(&self) -> Option<&str> {
        self.field(HEADER_KEY_FILENAME)
    }

    pub fn etag(&self) -> Option<&str> {
        self.field(HEADER_KEY_ETAG)
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.field(HEADER_KEY_LAST_MODIFIED)
    }

    pub fn concurrent_to(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.fields.get_all(HEADER_KEY_CONCURRENT_TO).map(RecordId::new)
    }

    /// Block digest computed while the body was read, as `sha256:<hex>`.
    ///
    /// Always `None` straight after parsing: a `WARC-Block-Digest` field in
    /// the header is never taken on trust. See
    /// [`Record::finish`](crate::Record::finish).
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Declared size of the body in bytes.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Size in bytes of the header block, including its closing blank line.
    /// The body begins this many bytes after the start of the record.
    pub fn header_length(&self) -> u64 {
        self.header_length
    }

    /// Declared content length plus header block length.
    pub fn length(&self) -> u64 {
        self.content_length + self.header_length
    }

    /// Absolute offset of the record within its container. For compressed
    /// containers this is the offset of the gzip member holding it.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Identifies the container this header was read from.
    pub fn reader_identifier(&self) -> &str {
        &self.reader_identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(fields: NamedFields) -> RecordHeader {
        RecordHeader::new("1.0".to_string(), fields, 120, 230, 4096, "crawl.warc".to_string())
    }

    #[test]
    fn well_known_accessors() {
        let header = header(
            NamedFields::new()
                .with(HEADER_KEY_TYPE, "response")
                .with(HEADER_KEY_URI, "http://example.com/")
                .with(HEADER_KEY_DATE, "20240101120000")
                .with(HEADER_KEY_ID, "<urn:uuid:1234>")
                .with(HEADER_KEY_CONCURRENT_TO, "<urn:uuid:a>")
                .with(HEADER_KEY_CONCURRENT_TO, "<urn:uuid:b>")
                .with(CONTENT_TYPE, HTTP_RESPONSE_MIMETYPE)
                .with(CONTENT_LENGTH, "120"),
        );
        assert_eq!(header.record_type().unwrap(), RecordType::Response);
        assert_eq!(header.url(), Some("http://example.com/"));
        assert_eq!(header.date(), Some("20240101120000"));
        assert_eq!(header.record_id(), Some(RecordId::new("urn:uuid:1234")));
        assert_eq!(header.mimetype(), Some(HTTP_RESPONSE_MIMETYPE));
        assert_eq!(header.concurrent_to().count(), 2);
        assert_eq!(header.ip_address(), None);
        assert_eq!(header.digest(), None);
    }

    #[test]
    fn lengths_are_kept_apart() {
        let header = header(NamedFields::new());
        assert_eq!(header.content_length(), 120);
        assert_eq!(header.header_length(), 230);
        assert_eq!(header.length(), 350);
        assert_eq!(header.offset(), 4096);
        assert_eq!(header.reader_identifier(), "crawl.warc");
    }

    #[test]
    fn missing_or_unknown_type() {
        assert!(matches!(*header(NamedFields::new()).record_type().unwrap_err(), ErrorKind::MalformedContainer(_)));
        let unknown = header(NamedFields::new().with(HEADER_KEY_TYPE, "screenshot"));
        assert!(matches!(*unknown.record_type().unwrap_err(), ErrorKind::UnknownRecordType(_)));
    }
}
