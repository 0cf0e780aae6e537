//! CBOR codec built on `ciborium`.

use crate::error::{CodecError, CodecResult};
use crate::Codec;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A [`Codec`] that stores values as CBOR.
///
/// Structs and enums go through their serde derives. Encoding is
/// deterministic for a given value as long as the value's own `Serialize`
/// implementation is; avoid `HashMap` inside key types, since its iteration
/// order varies between instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        Ok(buf)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> CodecResult<T> {
        let mut rest = bytes;
        let value = ciborium::from_reader(&mut rest)
            .map_err(|e| CodecError::decoding_failed::<T>(e.to_string()))?;

        // One value per byte string; anything after it is corruption
        if !rest.is_empty() {
            return Err(CodecError::decoding_failed::<T>(format!(
                "{} trailing bytes after value",
                rest.len()
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: u64,
        customer: String,
        lines: Vec<(String, u32)>,
        note: Option<String>,
    }

    #[test]
    fn roundtrip_string() {
        let codec = CborCodec;
        let bytes = codec.encode("test1").unwrap();
        let decoded: String = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, "test1");
    }

    #[test]
    fn roundtrip_integer() {
        let codec = CborCodec;
        let bytes = codec.encode(&10_i32).unwrap();
        let decoded: i32 = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, 10);
    }

    #[test]
    fn roundtrip_struct() {
        let codec = CborCodec;
        let order = Order {
            id: 7,
            customer: "alice".into(),
            lines: vec![("apple".into(), 3), ("pear".into(), 1)],
            note: None,
        };
        let bytes = codec.encode(&order).unwrap();
        let decoded: Order = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, order);
    }

    #[test]
    fn btree_map_encoding_is_deterministic() {
        let codec = CborCodec;
        let mut a = BTreeMap::new();
        a.insert("b", 2);
        a.insert("a", 1);
        let mut b = BTreeMap::new();
        b.insert("a", 1);
        b.insert("b", 2);
        assert_eq!(codec.encode(&a).unwrap(), codec.encode(&b).unwrap());
    }

    #[test]
    fn decode_wrong_type_fails() {
        let codec = CborCodec;
        let bytes = codec.encode("not a number").unwrap();
        let result: CodecResult<u64> = codec.decode(&bytes);
        assert!(matches!(
            result,
            Err(CodecError::DecodingFailed { type_name: "u64", .. })
        ));
    }

    #[test]
    fn decode_truncated_input_fails() {
        let codec = CborCodec;
        let bytes = codec.encode("a longer string value").unwrap();
        let result: CodecResult<String> = codec.decode(&bytes[..4]);
        assert!(result.is_err());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let codec = CborCodec;
        let mut bytes = codec.encode("value").unwrap();
        bytes.push(0x00);

        let result: CodecResult<String> = codec.decode(&bytes);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn decode_rejects_concatenated_values() {
        let codec = CborCodec;
        let mut bytes = codec.encode(&1_u32).unwrap();
        bytes.extend(codec.encode(&2_u32).unwrap());

        let result: CodecResult<u32> = codec.decode(&bytes);
        assert!(matches!(
            result,
            Err(CodecError::DecodingFailed { type_name: "u32", .. })
        ));
    }

    #[test]
    fn decode_empty_input_fails() {
        let codec = CborCodec;
        let result: CodecResult<String> = codec.decode(&[]);
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_values(
            id in any::<u64>(),
            customer in ".*",
            lines in proptest::collection::vec((".{0,8}", any::<u32>()), 0..8),
            note in proptest::option::of(".{0,16}"),
        ) {
            let codec = CborCodec;
            let order = Order { id, customer, lines, note };
            let bytes = codec.encode(&order).unwrap();
            let decoded: Order = codec.decode(&bytes).unwrap();
            prop_assert_eq!(decoded, order);
        }

        #[test]
        fn equal_values_encode_identically(key in ".*", n in any::<i64>()) {
            let codec = CborCodec;
            let first = codec.encode(&(key.clone(), n)).unwrap();
            let second = codec.encode(&(key, n)).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
