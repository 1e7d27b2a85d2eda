//! Presence-tagged partial records.
//!
//! Each mutable entity has a companion `*Update` type whose non-key fields are
//! `Option<T>`: `None` means the message did not carry the field. Both types are
//! generated from one field list by [`entity_patch!`](crate::entity_patch) so they
//! cannot drift apart.

use crate::error::DataError;
use std::fmt::Debug;
use std::hash::Hash;

/// A record stored under a unique key.
pub trait Keyed {
    /// Key type identifying one record.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Returns this record's key.
    fn key(&self) -> Self::Key;
}

/// A partial update for an entity of type `Self::Entity`.
pub trait Patch: Keyed<Key = <Self::Entity as Keyed>::Key> {
    /// The full record this patch applies to.
    type Entity: Keyed + Clone;

    /// Overwrites every field this patch carries; absent fields are left untouched.
    fn apply_to(self, entity: &mut Self::Entity);

    /// Builds a fresh record; fails if any mandatory field is absent.
    fn into_entity(self) -> Result<Self::Entity, DataError>;
}

/// Declares an entity struct together with its presence-tagged update struct.
///
/// Fields are split into three groups:
/// - `key`: identity fields, always present in both types
/// - `required`: plain `T` on the entity, `Option<T>` on the update
/// - `optional`: `Option<T>` on both; an update can set but never clear them
#[macro_export]
macro_rules! entity_patch {
    (
        $(#[$emeta:meta])*
        pub struct $entity:ident;
        $(#[$pmeta:meta])*
        pub struct $patch:ident;
        key $keyty:ty = |$this:ident| $keyexpr:expr;
        key_fields {
            $( $(#[$kmeta:meta])* $kfield:ident : $kty:ty ),+ $(,)?
        }
        required {
            $( $(#[$rmeta:meta])* $rfield:ident : $rty:ty ),* $(,)?
        }
        optional {
            $( $(#[$ometa:meta])* $ofield:ident : $oty:ty ),* $(,)?
        }
    ) => {
        $(#[$emeta])*
        #[derive(Debug, Clone, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $entity {
            $( $(#[$kmeta])* pub $kfield: $kty, )+
            $( $(#[$rmeta])* pub $rfield: $rty, )*
            $( $(#[$ometa])* #[serde(default)] pub $ofield: Option<$oty>, )*
        }

        $(#[$pmeta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $patch {
            $( $(#[$kmeta])* pub $kfield: $kty, )+
            $(
                $(#[$rmeta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $rfield: Option<$rty>,
            )*
            $(
                $(#[$ometa])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $ofield: Option<$oty>,
            )*
        }

        impl $crate::models::Keyed for $entity {
            type Key = $keyty;

            fn key(&self) -> Self::Key {
                let $this = self;
                $keyexpr
            }
        }

        impl $crate::models::Keyed for $patch {
            type Key = $keyty;

            fn key(&self) -> Self::Key {
                let $this = self;
                $keyexpr
            }
        }

        impl $crate::models::Patch for $patch {
            type Entity = $entity;

            fn apply_to(self, entity: &mut $entity) {
                $( if let Some(value) = self.$rfield { entity.$rfield = value; } )*
                $( if self.$ofield.is_some() { entity.$ofield = self.$ofield; } )*
            }

            fn into_entity(self) -> Result<$entity, $crate::error::DataError> {
                Ok($entity {
                    $( $kfield: self.$kfield, )+
                    $(
                        $rfield: self.$rfield.ok_or_else(|| {
                            $crate::error::DataError::missing_field(
                                stringify!($entity),
                                stringify!($rfield),
                            )
                        })?,
                    )*
                    $( $ofield: self.$ofield, )*
                })
            }
        }
    };
}
