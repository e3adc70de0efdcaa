//! Type-safe identifier wrappers for ledger entities.
//!
//! Addresses and transaction hashes are caller-supplied opaque strings.
//! Wrapping them in distinct newtypes prevents accidental mixing of the
//! two at compile time. No normalization is applied: case sensitivity
//! is the caller's responsibility, and two addresses differing only in
//! case are two different registry keys.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around an owned string with standard derives.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub const fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Consume the wrapper and return the inner [`String`].
            pub fn into_inner(self) -> String {
                let Self(inner) = self;
                inner
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.into_inner()
            }
        }
    };
}

define_key! {
    /// Ledger address of a tracked entity. Used as the registry key.
    Address
}

define_key! {
    /// Unique hash identifying one transaction on the ledger.
    TxHash
}
