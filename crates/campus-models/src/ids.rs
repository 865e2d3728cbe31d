//! Strongly-typed ID newtypes for domain entities.
//!
//! Each entity gets its own wrapper around `Uuid`, so a `NoticeId` cannot be passed
//! where a `UserId` is expected.
//!
//! # Example
//!
//! ```ignore
//! use campus_models::ids::{UserId, NoticeId};
//!
//! fn load_profile(id: UserId) { /* ... */ }
//!
//! let user_id = UserId::new();
//! load_profile(user_id);
//! // load_profile(NoticeId::new()); // Compile error! Type mismatch.
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Macro to define a strongly-typed ID newtype.
///
/// Generates serde (transparent UUID), sqlx (Postgres `uuid`) and OpenAPI support.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Create an ID from a u128 value (useful for fixtures).
            #[inline]
            pub const fn from_u128(v: u128) -> Self {
                Self(Uuid::from_u128(v))
            }

            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }

            #[inline]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            #[inline]
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <Uuid as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <Uuid as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <Uuid as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <Uuid as Decode<'r, sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <Uuid as PgHasArrayType>::array_type_info()
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Uuid::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_id!(
    /// Identity of an account, as issued by the identity service.
    UserId
);

define_id!(
    /// Strongly-typed ID for notices.
    NoticeId
);

define_id!(
    /// Strongly-typed ID for bonafide certificate requests.
    BonafideRequestId
);

define_id!(
    /// Strongly-typed ID for fee receipts.
    FeeReceiptId
);

define_id!(
    /// Strongly-typed ID for audit log rows.
    AuditLogId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(id.into_inner(), uuid);
    }

    #[test]
    fn test_id_debug_and_display() {
        let id = UserId::from_u128(0x12345678_1234_1234_1234_123456789abc);
        assert_eq!(
            format!("{:?}", id),
            "UserId(12345678-1234-1234-1234-123456789abc)"
        );
        assert_eq!(id.to_string(), "12345678-1234-1234-1234-123456789abc");
    }

    #[test]
    fn test_id_parse() {
        let id: NoticeId = "12345678-1234-1234-1234-123456789abc".parse().unwrap();
        assert_eq!(id, NoticeId::from_u128(0x12345678_1234_1234_1234_123456789abc));
        assert!("not-a-uuid".parse::<NoticeId>().is_err());
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = FeeReceiptId::from_u128(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""00000000-0000-0000-0000-000000000001""#);
        let back: FeeReceiptId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
