//! WARC container engine.
//!
//! A container is a sequence of records, each a header block of named fields
//! followed by an opaque body of declared length:
//!
//! ```text
//! WARC/1.0 CRLF
//! (name ": " value CRLF)*
//! CRLF
//! <content-length bytes>
//! CRLF CRLF
//! ```
//!
//! Containers are either plain or a concatenation of gzip members holding one
//! record each. This crate provides:
//!
//! - **The record model**: [`RecordHeader`], [`RecordInfo`], [`RecordType`]
//! - **The header [`codec`]**: encoding and validating header blocks, parsing
//!   them back
//! - **[`WarcWriter`]**: appends records to an output, staging each one so a
//!   failing record leaves nothing behind, and tallies what was written in a
//!   [`StatTally`]
//! - **Readers**: [`WarcReader`] over [`PlainReader`] or [`CompressedReader`],
//!   both able to jump straight to a record by the offset found in its header
//! - **The reader [`factory`]**: picks a reader variant from a path or stream

pub mod codec;
pub mod consts;
pub mod date;
pub mod error;
pub mod factory;
mod id;
mod models;
mod reader;
mod stats;
mod writer;

pub use crate::id::{RecordIdGenerator, UuidGenerator};
pub use crate::models::{NamedFields, RecordHeader, RecordId, RecordInfo, RecordType};
pub use crate::reader::{CompressedReader, Headers, PlainReader, Record, WarcReader};
pub use crate::stats::{Counters, StatTally, StatsAggregator, TOTALS};
pub use crate::writer::{DEFAULT_SPOOL_MEMORY, WarcWriter, Warcinfo};
