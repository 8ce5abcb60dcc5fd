//! Typed integer ids for compile-time type safety.
//!
//! `Id<T>` wraps the `BIGSERIAL` primary key of a record and carries the
//! entity it belongs to as a phantom type, so a `VoteId` can never be passed
//! where a `FictionId` is expected.
//!
//! Ids are plain integers (not UUIDs) because citizens mention fictions in
//! free text as `~<digits>`.
//!
//! # Example
//!
//! ```rust
//! use fictions_core::common::id::Id;
//!
//! pub struct Fiction;
//! pub struct Vote;
//!
//! let fiction_id: Id<Fiction> = Id::new(42);
//! let vote_id: Id<Vote> = Id::new(42);
//! assert_eq!(fiction_id.get(), vote_id.get());
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::ParseIntError;
use std::str::FromStr;

#[repr(transparent)]
pub struct Id<T>(i64, PhantomData<fn() -> T>);

impl<T> Id<T> {
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw, PhantomData)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parses an id from its decimal string form (GraphQL `ID` inputs, path
    /// segments, mention digits).
    #[inline]
    pub fn parse(s: &str) -> Result<Self, ParseIntError> {
        s.trim().parse::<i64>().map(Self::new)
    }

    /// Converts to an id of another entity type.
    ///
    /// Only for records that share a primary key space (an emendation is a
    /// fiction).
    #[inline]
    pub const fn cast<U>(self) -> Id<U> {
        Id::new(self.0)
    }
}

impl<T> Clone for Id<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("?");
        write!(f, "Id<{}>({})", name, self.0)
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for Id<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Id<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> From<i64> for Id<T> {
    #[inline]
    fn from(raw: i64) -> Self {
        Self::new(raw)
    }
}

impl<T> From<Id<T>> for i64 {
    #[inline]
    fn from(id: Id<T>) -> Self {
        id.0
    }
}

impl<T> FromStr for Id<T> {
    type Err = ParseIntError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgHasArrayType, PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type};

impl<T> Type<Postgres> for Id<T> {
    fn type_info() -> PgTypeInfo {
        <i64 as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <i64 as Type<Postgres>>::compatible(ty)
    }
}

impl<T> PgHasArrayType for Id<T> {
    fn array_type_info() -> PgTypeInfo {
        <i64 as PgHasArrayType>::array_type_info()
    }
}

impl<T> Encode<'_, Postgres> for Id<T> {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <i64 as Encode<Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<T> Decode<'_, Postgres> for Id<T> {
    fn decode(value: PgValueRef<'_>) -> Result<Self, BoxDynError> {
        <i64 as Decode<Postgres>>::decode(value).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fiction;

    type FictionId = Id<Fiction>;

    #[test]
    fn test_parse_and_display_roundtrip() {
        let id = FictionId::new(1234);
        let parsed = FictionId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(FictionId::parse("12a").is_err());
        assert!(FictionId::parse("").is_err());
    }

    #[test]
    fn test_serde_is_a_bare_integer() {
        let id = FictionId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let parsed: FictionId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_hash_map_key() {
        use std::collections::HashMap;
        let mut map: HashMap<FictionId, &str> = HashMap::new();
        map.insert(FictionId::new(3), "three");
        assert_eq!(map.get(&FictionId::new(3)), Some(&"three"));
    }

    #[test]
    fn test_debug_includes_type_name() {
        let debug = format!("{:?}", FictionId::new(9));
        assert_eq!(debug, "Id<Fiction>(9)");
    }
}
