//! HTTP method as a typed enum.
//!
//! Only the methods a route may be registered under are represented. Any other
//! method string arriving at dispatch time (`HEAD`, `CONNECT`, WebDAV verbs,
//! garbage) simply has no route and is answered by the router's
//! `on_not_allowed` handler.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A method a [`Route`](crate::Route) can be registered under.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Trace,
}

impl Method {
    /// Every supported method, in the order they are listed in `Allow` headers.
    pub const ALL: [Method; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
        Self::Options,
        Self::Trace,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get     => "GET",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Delete  => "DELETE",
            Self::Patch   => "PATCH",
            Self::Options => "OPTIONS",
            Self::Trace   => "TRACE",
        }
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET"     => Ok(Self::Get),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "DELETE"  => Ok(Self::Delete),
            "PATCH"   => Ok(Self::Patch),
            "OPTIONS" => Ok(Self::Options),
            "TRACE"   => Ok(Self::Trace),
            _         => Err(ConfigError::UnsupportedMethod(s.to_owned())),
        }
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_method() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>(), Ok(method));
        }
    }

    #[test]
    fn rejects_lowercase_and_unknown_methods() {
        assert_eq!(
            "get".parse::<Method>(),
            Err(ConfigError::UnsupportedMethod("get".into()))
        );
        assert!("HEAD".parse::<Method>().is_err());
        assert!("FOO".parse::<Method>().is_err());
    }
}
