//! Wire-format constants.

/// Leading literal of every record's first line.
pub const MAGIC: &str = "WARC/";
/// Version written by this crate.
pub const VERSION: &str = "1.0";
/// Complete first line of a written record, without its terminator.
pub const WARC_ID: &str = "WARC/1.0";

pub const CRLF: &[u8; 2] = b"\r\n";
/// Two blank lines end every record.
pub const RECORD_TERMINATOR: &[u8; 4] = b"\r\n\r\n";
pub const COLON_SPACE: &str = ": ";

/// Longest header line accepted when parsing.
pub const MAX_LINE_LENGTH: u64 = 100 * 1024;

/// Container file extension, without a leading dot.
pub const EXTENSION: &str = "warc";
/// Suffix carried by a container file while it is still being written.
pub const OCCUPIED_SUFFIX: &str = ".open";
/// Suffix given to a container file that was abandoned as unusable.
pub const INVALID_SUFFIX: &str = ".invalid";

// Named fields.
pub const HEADER_KEY_TYPE: &str = "WARC-Type";
pub const HEADER_KEY_URI: &str = "WARC-Target-URI";
pub const HEADER_KEY_DATE: &str = "WARC-Date";
pub const HEADER_KEY_ID: &str = "WARC-Record-ID";
pub const HEADER_KEY_IP: &str = "WARC-IP-Address";
pub const HEADER_KEY_BLOCK_DIGEST: &str = "WARC-Block-Digest";
pub const HEADER_KEY_PAYLOAD_DIGEST: &str = "WARC-Payload-Digest";
pub const HEADER_KEY_CONCURRENT_TO: &str = "WARC-Concurrent-To";
pub const HEADER_KEY_TRUNCATED: &str = "WARC-Truncated";
pub const HEADER_KEY_PROFILE: &str = "WARC-Profile";
pub const HEADER_KEY_FILENAME: &str = "WARC-Filename";
pub const HEADER_KEY_ETAG: &str = "WARC-Etag";
pub const HEADER_KEY_LAST_MODIFIED: &str = "WARC-Last-Modified";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_DESCRIPTION: &str = "Content-Description";

// Mimetypes.
pub const WARC_FIELDS_TYPE: &str = "application/warc-fields";
pub const HTTP_REQUEST_MIMETYPE: &str = "application/http; msgtype=request";
pub const HTTP_RESPONSE_MIMETYPE: &str = "application/http; msgtype=response";

// Revisit profiles.
pub const PROFILE_REVISIT_IDENTICAL_DIGEST: &str = "http://netpreserve.org/warc/1.0/revisit/identical-payload-digest";
pub const PROFILE_REVISIT_NOT_MODIFIED: &str = "http://netpreserve.org/warc/1.0/revisit/server-not-modified";

// `WARC-Truncated` values.
pub const TRUNCATED_VALUE_TIME: &str = "time";
pub const TRUNCATED_VALUE_LENGTH: &str = "length";
pub const TRUNCATED_VALUE_HEAD: &str = "long-headers";
pub const TRUNCATED_VALUE_UNSPECIFIED: &str = "unspecified";
