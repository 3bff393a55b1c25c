//! Codec Module
//!
//! Byte encoding of cached values. The cache is generic over a [`Codec`] so the
//! on-disk format can be swapped without touching the engine.

use std::fmt::Display;

use serde::ser::{self, Serializer};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

// == Codec Error ==
/// Failure raised by a codec while encoding or decoding.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON has no representation for NaN or infinity
    #[error("json: non-finite float cannot be encoded")]
    NonFiniteFloat,
}

// == Codec Trait ==
/// Converts values to bytes and back.
///
/// Implementations must round trip: `decode(encode(v)) == v` for every value
/// the codec supports.
pub trait Codec: Send + Sync {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

// == JSON Codec ==
/// Self-describing JSON encoding. Default codec; handles `serde_json::Value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        // serde_json writes NaN and infinity as `null`, which never decodes back
        check_finite(value)?;
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// == Bincode Codec ==
/// Compact binary encoding.
///
/// Bincode is not self-describing, so it cannot decode types that rely on
/// `deserialize_any` such as `serde_json::Value`. Use it with concrete types;
/// `DynamicCache` and the typed `set_as`/`get_as` accessors are JSON only.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// == Finite Check ==
/// Fails with [`CodecError::NonFiniteFloat`] if `value` contains a NaN or
/// infinite float anywhere.
///
/// Other serialization failures are left for the real encoder to report.
pub(crate) fn check_finite<T: Serialize + ?Sized>(value: &T) -> Result<(), CodecError> {
    match value.serialize(FiniteCheck) {
        Err(WalkError::NonFinite) => Err(CodecError::NonFiniteFloat),
        Ok(()) | Err(WalkError::Custom) => Ok(()),
    }
}

#[derive(Error, Debug)]
enum WalkError {
    #[error("non-finite float")]
    NonFinite,
    #[error("serialization failed")]
    Custom,
}

impl ser::Error for WalkError {
    fn custom<M: Display>(_msg: M) -> Self {
        WalkError::Custom
    }
}

/// Serializer that produces nothing and only inspects floats.
#[derive(Clone, Copy)]
struct FiniteCheck;

impl FiniteCheck {
    fn float(value: f64) -> Result<(), WalkError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(WalkError::NonFinite)
        }
    }
}

impl Serializer for FiniteCheck {
    type Ok = ();
    type Error = WalkError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_f32(self, v: f32) -> Result<(), WalkError> {
        Self::float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), WalkError> {
        Self::float(v)
    }

    fn serialize_bool(self, _v: bool) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_i8(self, _v: i8) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_i16(self, _v: i16) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_i32(self, _v: i32) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_i64(self, _v: i64) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_i128(self, _v: i128) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_u8(self, _v: u8) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_u16(self, _v: u16) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_u32(self, _v: u32) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_u64(self, _v: u64) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_u128(self, _v: u128) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_char(self, _v: char) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_str(self, _v: &str) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_none(self) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), WalkError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<(), WalkError> {
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), WalkError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), WalkError> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, WalkError> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, WalkError> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, WalkError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, WalkError> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self, WalkError> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, WalkError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, WalkError> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = WalkError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WalkError> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = WalkError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WalkError> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = WalkError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WalkError> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = WalkError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WalkError> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = WalkError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), WalkError> {
        key.serialize(FiniteCheck)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WalkError> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = WalkError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), WalkError> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = WalkError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), WalkError> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        tags: Vec<String>,
        score: i32,
    }

    fn record() -> Record {
        Record {
            name: "widget".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            score: -7,
        }
    }

    #[test]
    fn test_json_codec_record() {
        let bytes = JsonCodec.encode(&record()).unwrap();
        let decoded: Record = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, record());
    }

    #[test]
    fn test_json_codec_dynamic_value() {
        let value = serde_json::json!({"a": [1, 2, 3], "b": null});
        let bytes = JsonCodec.encode(&value).unwrap();
        let decoded: serde_json::Value = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_bincode_codec_map() {
        let mut map = HashMap::new();
        map.insert("one".to_string(), record());

        let bytes = BincodeCodec.encode(&map).unwrap();
        let decoded: HashMap<String, Record> = BincodeCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let result: Result<Record, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(CodecError::Json(_))));
    }

    #[test]
    fn test_bincode_codec_rejects_truncated_input() {
        let bytes = BincodeCodec.encode(&record()).unwrap();
        let result: Result<Record, _> = BincodeCodec.decode(&bytes[..3]);
        assert!(matches!(result, Err(CodecError::Bincode(_))));
    }

    #[test]
    fn test_json_codec_rejects_non_finite_floats() {
        assert!(matches!(
            JsonCodec.encode(&f64::NAN),
            Err(CodecError::NonFiniteFloat)
        ));
        assert!(matches!(
            JsonCodec.encode(&vec![1.0f32, f32::INFINITY]),
            Err(CodecError::NonFiniteFloat)
        ));

        let mut nested = HashMap::new();
        nested.insert("score".to_string(), Some(f64::NEG_INFINITY));
        assert!(matches!(
            JsonCodec.encode(&nested),
            Err(CodecError::NonFiniteFloat)
        ));
    }

    #[test]
    fn test_finite_check_passes_ordinary_values() {
        assert!(check_finite(&record()).is_ok());
        assert!(check_finite(&(1.5f64, -0.0f32, u128::MAX, i128::MIN)).is_ok());

        let bytes = JsonCodec.encode(&2.5f64).unwrap();
        let decoded: f64 = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, 2.5);
    }

    #[test]
    fn test_bincode_codec_keeps_nan() {
        let bytes = BincodeCodec.encode(&f64::NAN).unwrap();
        let decoded: f64 = BincodeCodec.decode(&bytes).unwrap();
        assert!(decoded.is_nan());
    }
}
