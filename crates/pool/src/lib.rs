//! Writer pool over rotating container files.
//!
//! - [`Pool`] is a generic bounded pool driven by a [`MemberFactory`];
//!   checkouts are exclusive and returned through an RAII [`Checkout`] guard.
//! - [`WarcFile`] is one container being written, bootstrapped with its
//!   `warcinfo` record and renamed from its in-progress name when closed.
//! - [`FileNamer`] hands out unique container paths under a shared serial
//!   number, rotating through output directories.
//! - [`WriterPool`] ties them together: producers check out a writer, and
//!   containers that grow past the size limit are closed and replaced.

pub mod error;
mod member;
mod naming;
mod pool;
mod writers;

pub use crate::member::WarcFile;
pub use crate::naming::FileNamer;
pub use crate::pool::{Checkout, MemberFactory, Pool};
pub use crate::writers::{WarcFileFactory, WriterHandle, WriterPool};
