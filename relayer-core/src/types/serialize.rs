//! Serde helpers for integer fields that clients send either as JSON
//! numbers, decimal strings or `0x`-prefixed hex strings.

use std::fmt;

use ethers_core::types::U256;
use serde::{
    de::{self, Visitor},
    Deserializer, Serializer,
};

/// Parse a `U256` from a decimal or `0x`-prefixed hex string.
pub fn parse_u256(value: &str) -> Result<U256, String> {
    let value = value.trim();
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        U256::from_str_radix(hex, 16).map_err(|e| format!("invalid hex integer {value}: {e}"))
    } else {
        U256::from_dec_str(value).map_err(|e| format!("invalid decimal integer {value}: {e}"))
    }
}

/// Serialize as a decimal string.
pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// Deserialize from a number, a decimal string or a hex string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    deserializer.deserialize_any(U256Visitor)
}

struct U256Visitor;

impl<'de> Visitor<'de> for U256Visitor {
    type Value = U256;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an unsigned integer, a decimal string or a 0x-prefixed hex string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
        u64::try_from(v)
            .map(U256::from)
            .map_err(|_| E::custom(format!("negative integer {v}")))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
        parse_u256(v).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Amount {
        #[serde(with = "super")]
        value: U256,
    }

    #[test]
    fn accepts_numbers_and_strings() {
        for raw in [r#"{"value":255}"#, r#"{"value":"255"}"#, r#"{"value":"0xff"}"#] {
            let parsed: Amount = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed.value, U256::from(255));
        }
        assert!(serde_json::from_str::<Amount>(r#"{"value":-1}"#).is_err());
        assert!(serde_json::from_str::<Amount>(r#"{"value":"twelve"}"#).is_err());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Amount {
            value: U256::from(1_000_000u64),
        })
        .unwrap();
        assert_eq!(json, r#"{"value":"1000000"}"#);
    }
}
