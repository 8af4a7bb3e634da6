mod fields;
mod header;
mod id;
mod info;
mod kind;

pub use self::fields::NamedFields;
pub use self::header::RecordHeader;
pub use self::id::RecordId;
pub use self::info::RecordInfo;
pub use self::kind::RecordType;
