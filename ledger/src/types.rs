//! Fixed-width values the ledger stores and compares but never interprets.
//!
//! All of them render as `0x`-prefixed lowercase big-endian hex. Parsing accepts the prefix
//! optionally and left-pads short input, the way a `bytes32` is padded.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseHexError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("value too long: expected at most {max} bytes, got {got}")]
    TooLong { max: usize, got: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let padded;
    let digits = if digits.len() % 2 == 1 {
        padded = format!("0{digits}");
        padded.as_str()
    } else {
        digits
    };

    let bytes = hex::decode(digits)?;
    if bytes.len() > N {
        return Err(ParseHexError::TooLong { max: N, got: bytes.len() });
    }

    let mut out = [0u8; N];
    out[N - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

macro_rules! fixed_width {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Width in bytes.
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn zero() -> Self {
                Self([0u8; $len])
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_bytes(self) -> [u8; $len] {
                self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

fixed_width!(
    /// One element of the proof system's scalar field, carried as 32 opaque bytes.
    ///
    /// Commitments, nullifiers, request ids and nonces are all `Field`s. Whether a value is a
    /// canonical field element is the verifier's concern, not the ledger's.
    Field,
    32
);

fixed_width!(
    /// Identity of a caller, shaped like an account address.
    Identity,
    20
);

fixed_width!(
    /// Reference to a verifier gateway instance. The all-zero id is the null reference.
    VerifierId,
    32
);

impl Field {
    /// Encode an integer big-endian in the low bytes.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_hex_is_prefixed_and_padded() {
        let f = Field::from_u64(0xabcd);
        let s = f.to_string();
        assert_eq!(s.len(), 2 + 64);
        assert!(s.starts_with("0x"));
        assert!(s.ends_with("abcd"));
        assert_eq!(s.parse::<Field>().unwrap(), f);
    }

    #[test]
    fn short_and_odd_hex_is_left_padded() {
        assert_eq!("0xabc".parse::<Field>().unwrap(), Field::from_u64(0xabc));
        assert_eq!("1".parse::<Field>().unwrap(), Field::from_u64(1));
        assert_eq!("0x".parse::<Field>().unwrap(), Field::zero());
    }

    #[test]
    fn overlong_hex_is_rejected() {
        let too_long = format!("0x{}", "11".repeat(33));
        assert_eq!(
            too_long.parse::<Field>().unwrap_err(),
            ParseHexError::TooLong { max: 32, got: 33 }
        );
        assert!(matches!("0xzz".parse::<Identity>(), Err(ParseHexError::Hex(_))));
    }

    #[test]
    fn serde_uses_hex_strings() {
        let id = Identity::new([0x11; 20]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(20)));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn zero_reference_is_detected() {
        assert!(VerifierId::zero().is_zero());
        assert!(!VerifierId::new([1; 32]).is_zero());
    }
}
