//! Command-line compression flag.

use crate::Compression;
use crate::error::Error;
use std::str::FromStr;

/// `--compress[=FORMAT]` as parsed by clap: absent, bare, or with a value.
pub type Flag = Option<Option<String>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Preference {
    /// Compression format was specified on the command-line
    Explicit(Compression),
    /// Compression flag was given without a format
    Implicit,
    /// Compression was omitted from the command-line
    NotSpecified,
}
impl TryFrom<Flag> for Preference {
    type Error = Error;
    fn try_from(value: Flag) -> Result<Self, Self::Error> {
        match value {
            Some(Some(s)) if s.is_empty() => Ok(Self::Implicit),
            Some(Some(s)) => Ok(Self::Explicit(Compression::from_str(&s)?)),
            Some(None) => Ok(Self::Implicit),
            None => Ok(Self::NotSpecified),
        }
    }
}
impl Preference {
    /// A bare flag asks for gzip. Without the flag the configured format wins.
    pub fn resolve(&self, configured: Compression) -> Compression {
        match self {
            Self::Explicit(c) => *c,
            Self::Implicit => Compression::Gzip,
            Self::NotSpecified => configured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Preference::NotSpecified)]
    #[case(Some(None), Preference::Implicit)]
    #[case(Some(Some(String::new())), Preference::Implicit)]
    #[case(Some(Some("gz".to_string())), Preference::Explicit(Compression::Gzip))]
    #[case(Some(Some("none".to_string())), Preference::Explicit(Compression::None))]
    fn from_flag(#[case] flag: Flag, #[case] expected: Preference) {
        let preference: Preference = flag.try_into().unwrap();
        assert_eq!(preference, expected);
    }

    #[test]
    fn unknown_format() {
        let preference: Result<Preference, Error> = Some(Some("bz2".to_string())).try_into();
        assert!(preference.is_err());
    }

    #[rstest]
    #[case(Preference::Explicit(Compression::None), Compression::Gzip, Compression::None)]
    #[case(Preference::Explicit(Compression::Gzip), Compression::None, Compression::Gzip)]
    #[case(Preference::Implicit, Compression::None, Compression::Gzip)]
    #[case(Preference::NotSpecified, Compression::None, Compression::None)]
    #[case(Preference::NotSpecified, Compression::Gzip, Compression::Gzip)]
    fn resolve(#[case] preference: Preference, #[case] configured: Compression, #[case] expected: Compression) {
        assert_eq!(preference.resolve(configured), expected);
    }
}
