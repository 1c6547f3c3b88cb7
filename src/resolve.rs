//! Tag resolution: the closed set of recognized tags and the implicit
//! resolver for plain scalars.
//!
//! The `Tag` enum is the allow-list boundary: construction dispatches on it
//! exhaustively, and `Tag::Other` — anything outside the fixed set — is
//! refused there. No tag can fall through to arbitrary instantiation.

use crate::scalars;
use crate::timestamp;

const CANONICAL_PREFIX: &str = "tag:yaml.org,2002:";

/// A resolved tag. One variant per allow-listed shape, plus the merge-key
/// marker and a catch-all for everything the safe constructor refuses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    Null,
    Bool,
    Int,
    Float,
    Binary,
    Timestamp,
    Omap,
    Pairs,
    Set,
    Str,
    Seq,
    Map,
    /// The `<<` merge key; consumed during mapping flattening, never
    /// constructed as a value.
    Merge,
    /// Any tag outside the allow-list. Kept verbatim for error reporting.
    Other(Box<str>),
}

impl Tag {
    /// Map a fully resolved tag URI onto the closed set.
    pub fn from_uri(uri: &str) -> Tag {
        let Some(suffix) = uri.strip_prefix(CANONICAL_PREFIX) else {
            return Tag::Other(uri.into());
        };
        match suffix {
            "null" => Tag::Null,
            "bool" => Tag::Bool,
            "int" => Tag::Int,
            "float" => Tag::Float,
            "binary" => Tag::Binary,
            "timestamp" => Tag::Timestamp,
            "omap" => Tag::Omap,
            "pairs" => Tag::Pairs,
            "set" => Tag::Set,
            "str" => Tag::Str,
            "seq" => Tag::Seq,
            "map" => Tag::Map,
            "merge" => Tag::Merge,
            _ => Tag::Other(uri.into()),
        }
    }

    /// The tag URI, for diagnostics.
    pub fn uri(&self) -> &str {
        match self {
            Tag::Null => "tag:yaml.org,2002:null",
            Tag::Bool => "tag:yaml.org,2002:bool",
            Tag::Int => "tag:yaml.org,2002:int",
            Tag::Float => "tag:yaml.org,2002:float",
            Tag::Binary => "tag:yaml.org,2002:binary",
            Tag::Timestamp => "tag:yaml.org,2002:timestamp",
            Tag::Omap => "tag:yaml.org,2002:omap",
            Tag::Pairs => "tag:yaml.org,2002:pairs",
            Tag::Set => "tag:yaml.org,2002:set",
            Tag::Str => "tag:yaml.org,2002:str",
            Tag::Seq => "tag:yaml.org,2002:seq",
            Tag::Map => "tag:yaml.org,2002:map",
            Tag::Merge => "tag:yaml.org,2002:merge",
            Tag::Other(uri) => uri,
        }
    }
}

/// Resolve the implicit tag of a plain scalar.
///
/// Quoted and block scalars are always strings; this is only consulted for
/// plain style without an explicit tag.
pub fn resolve_plain(value: &str) -> Tag {
    if scalars::looks_like_null(value) {
        Tag::Null
    } else if scalars::looks_like_bool(value) {
        Tag::Bool
    } else if scalars::looks_like_int(value) {
        Tag::Int
    } else if scalars::looks_like_float(value) {
        Tag::Float
    } else if timestamp::looks_like_timestamp(value) {
        Tag::Timestamp
    } else if value == "<<" {
        Tag::Merge
    } else {
        Tag::Str
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_uris_map_to_variants() {
        assert_eq!(Tag::from_uri("tag:yaml.org,2002:int"), Tag::Int);
        assert_eq!(Tag::from_uri("tag:yaml.org,2002:omap"), Tag::Omap);
        assert_eq!(
            Tag::from_uri("tag:yaml.org,2002:python/object"),
            Tag::Other("tag:yaml.org,2002:python/object".into())
        );
        assert_eq!(
            Tag::from_uri("!mytype"),
            Tag::Other("!mytype".into())
        );
    }

    #[test]
    fn plain_scalars_resolve() {
        assert_eq!(resolve_plain(""), Tag::Null);
        assert_eq!(resolve_plain("~"), Tag::Null);
        assert_eq!(resolve_plain("no"), Tag::Bool);
        assert_eq!(resolve_plain("42"), Tag::Int);
        assert_eq!(resolve_plain("-0x1F"), Tag::Int);
        assert_eq!(resolve_plain("3.14"), Tag::Float);
        assert_eq!(resolve_plain(".inf"), Tag::Float);
        assert_eq!(resolve_plain("2001-12-14"), Tag::Timestamp);
        assert_eq!(resolve_plain("<<"), Tag::Merge);
        assert_eq!(resolve_plain("hello"), Tag::Str);
        assert_eq!(resolve_plain("12 monkeys"), Tag::Str);
    }
}
