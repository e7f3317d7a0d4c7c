//! Stable identities for tables, rows and columns.
//!
//! Ids are opaque strings handed out by the backing store (or minted
//! client-side for optimistic creates). They never change when a row or
//! column moves, which is what lets coordinate maps be rebuilt freely.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Mint a fresh random id (UUID v4).
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Identifies a table in the backing store.
    TableId
);
string_id!(
    /// Identifies a row. Stable across sorting and position changes.
    RowId
);
string_id!(
    /// Identifies a column. Stable across reordering.
    ColumnId
);
