use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

const LEN: usize = 20;

/// Identifies the transfer (torrent) a piece belongs to. In practice this is the v1 info hash.
///
/// Ordering is plain lexical byte order. The scheduler only falls back to it when two
/// pieces tie on everything else.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TransferId(pub [u8; LEN]);

impl TransferId {
    pub const fn new(from: [u8; LEN]) -> TransferId {
        TransferId(from)
    }

    pub fn as_string(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl FromStr for TransferId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != LEN * 2 {
            return Err(Error::TransferIdWrongLength {
                expected: LEN * 2,
                actual: s.len(),
            });
        }
        let mut out = [0u8; LEN];
        hex::decode_to_slice(s, &mut out)?;
        Ok(TransferId(out))
    }
}

impl Serialize for TransferId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for TransferId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        TransferId::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_from_str_roundtrips_through_display() {
        let s = "cab507494d02ebb1178b38f2e9d7be299c86b862";
        let id = TransferId::from_str(s).unwrap();
        assert_eq!(id.to_string(), s);
        assert_eq!(format!("{id:?}"), s);
    }

    #[test]
    fn test_from_str_rejects_bad_input() {
        assert!(matches!(
            TransferId::from_str("abcd"),
            Err(Error::TransferIdWrongLength {
                expected: 40,
                actual: 4
            })
        ));
        assert!(matches!(
            TransferId::from_str(&"zz".repeat(20)),
            Err(Error::InvalidTransferId(_))
        ));
    }

    #[test]
    fn test_ordering_is_lexical() {
        let mut a = [0u8; 20];
        let mut b = [0u8; 20];
        a[0] = 1;
        b[19] = 0xff;
        assert!(TransferId::new(b) < TransferId::new(a));
        assert!(TransferId::new([7; 20]) == TransferId::new([7; 20]));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = TransferId::new([0xab; 20]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(20)));
        let back: TransferId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
