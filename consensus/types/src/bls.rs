use crate::serde_utils::{hex_decode, hex_encode};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The byte-length of a compressed BLS public key.
pub const PUBLIC_KEY_BYTES_LEN: usize = 48;

/// The byte-length of a compressed BLS signature.
pub const SIGNATURE_BYTES_LEN: usize = 96;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input did not have the length required by the type.
    InvalidByteLength { got: usize, expected: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidByteLength { got, expected } => {
                write!(f, "invalid byte length, got {} expected {}", got, expected)
            }
        }
    }
}

macro_rules! bytes_struct {
    ($name: ident, $byte_len: expr, $doc: literal) => {
        #[doc = $doc]
        ///
        /// The bytes are carried as-is; no curve-point validation is performed
        /// here, signing and verification live elsewhere.
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            bytes: [u8; $byte_len],
        }

        impl $name {
            /// Wrap `bytes`, failing unless the length is exactly right.
            pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
                let bytes: [u8; $byte_len] =
                    bytes.try_into().map_err(|_| Error::InvalidByteLength {
                        got: bytes.len(),
                        expected: $byte_len,
                    })?;
                Ok(Self { bytes })
            }

            /// Instantiate `Self` with all-zeros.
            pub fn empty() -> Self {
                Self {
                    bytes: [0; $byte_len],
                }
            }

            pub fn serialize(&self) -> [u8; $byte_len] {
                self.bytes
            }

            pub fn as_serialized(&self) -> &[u8] {
                &self.bytes
            }
        }

        impl From<[u8; $byte_len]> for $name {
            fn from(bytes: [u8; $byte_len]) -> Self {
                Self { bytes }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex_encode(self.bytes))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex_encode(self.bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex_encode(self.bytes))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let string = String::deserialize(deserializer)?;
                let bytes = hex_decode(&string).map_err(D::Error::custom)?;
                Self::deserialize(&bytes).map_err(|e| D::Error::custom(format!("{}", e)))
            }
        }
    };
}

bytes_struct!(
    BlsPublicKey,
    PUBLIC_KEY_BYTES_LEN,
    "A BLS public key in compressed form, uniquely identifying a validator."
);

bytes_struct!(
    BlsSignature,
    SIGNATURE_BYTES_LEN,
    "A BLS signature in compressed form, e.g. a RANDAO reveal."
);
