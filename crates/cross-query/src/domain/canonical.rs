//! # Canonical Encoding
//!
//! Deterministic byte encoding used for request equality and for the
//! endorsement digest. Client and endorsers must produce identical bytes for
//! identical content, so the format is fixed here rather than delegated to a
//! serialization library:
//!
//! | Value | Encoding |
//! |-------|----------|
//! | `i32` / `i64` / `u32` | fixed-width big-endian |
//! | string, bytes | `u32` BE length, then the bytes |
//! | sequence | `u32` BE count, then each element |
//! | map | `u32` BE count, then `(key, value)` in ascending key order |
//! | enum | one tag byte, then the variant body |
//!
//! Struct fields are written in declaration order. Decoding is strict:
//! unknown tags, truncation, invalid UTF-8, unsorted or duplicate map keys
//! and trailing bytes are all rejected, so a decoded value always re-encodes
//! to the bytes it came from.

use super::entities::{
    ContractResponse, CrossQueryRequest, CrossQueryResponse, InvokeRequest, QueryRequest,
    QueryResponse, TxRecord, TxStatusRequest,
};
use std::collections::BTreeMap;
use thiserror::Error;

const TAG_CROSS_QUERY: u8 = 0x01;
const TAG_TX: u8 = 0x02;

/// Canonical decoding errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before the value was complete.
    #[error("Unexpected end of input: need {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes requested
        needed: usize,
        /// Bytes left
        remaining: usize,
    },

    /// Enum tag not recognized.
    #[error("Unknown tag 0x{0:02x}")]
    UnknownTag(u8),

    /// String field is not UTF-8.
    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    /// Map keys are not strictly ascending.
    #[error("Map keys not in canonical order")]
    NonCanonicalMap,

    /// Bytes remain after the value.
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
}

/// Append-only canonical writer.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a tag byte.
    pub fn put_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Write a `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write an `i32`.
    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write an `i64`.
    pub fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a length-prefixed byte string.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_len(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn put_str(&mut self, value: &str) {
        self.put_bytes(value.as_bytes());
    }

    /// Write a sequence of strings.
    pub fn put_str_seq(&mut self, values: &[String]) {
        self.put_len(values.len());
        for value in values {
            self.put_str(value);
        }
    }

    /// Write a map; `BTreeMap` iteration is already in ascending key order.
    pub fn put_bytes_map(&mut self, map: &BTreeMap<String, Vec<u8>>) {
        self.put_len(map.len());
        for (key, value) in map {
            self.put_str(key);
            self.put_bytes(value);
        }
    }

    // Lengths above u32::MAX cannot come from a decodable message.
    fn put_len(&mut self, len: usize) {
        self.put_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    /// Finish and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Strict canonical reader.
#[derive(Debug)]
pub struct CanonicalDecoder<'a> {
    input: &'a [u8],
}

impl<'a> CanonicalDecoder<'a> {
    /// Read from `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CodecError> {
        if self.input.len() < needed {
            return Err(CodecError::Truncated {
                needed,
                remaining: self.input.len(),
            });
        }
        let (head, rest) = self.input.split_at(needed);
        self.input = rest;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a tag byte.
    pub fn tag(&mut self) -> Result<u8, CodecError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Read a `u32`.
    pub fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    /// Read an `i32`.
    pub fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    /// Read an `i64`.
    pub fn i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    /// Read a length-prefixed byte string.
    pub fn bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn string(&mut self) -> Result<String, CodecError> {
        String::from_utf8(self.bytes()?).map_err(|_| CodecError::InvalidUtf8)
    }

    /// Read a sequence of strings.
    pub fn str_seq(&mut self) -> Result<Vec<String>, CodecError> {
        let count = self.u32()? as usize;
        // Every element needs at least its 4-byte length prefix.
        let mut values = Vec::with_capacity(count.min(self.input.len() / 4));
        for _ in 0..count {
            values.push(self.string()?);
        }
        Ok(values)
    }

    /// Read a map, requiring strictly ascending keys.
    pub fn bytes_map(&mut self) -> Result<BTreeMap<String, Vec<u8>>, CodecError> {
        let count = self.u32()? as usize;
        let mut map = BTreeMap::new();
        let mut previous: Option<String> = None;
        for _ in 0..count {
            let key = self.string()?;
            if previous.as_ref().is_some_and(|p| *p >= key) {
                return Err(CodecError::NonCanonicalMap);
            }
            let value = self.bytes()?;
            previous = Some(key.clone());
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Require that the whole input was consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes(self.input.len()))
        }
    }
}

/// Types with a canonical byte encoding.
pub trait CanonicalEncode {
    /// Append the canonical encoding of `self`.
    fn encode_canonical(&self, enc: &mut CanonicalEncoder);

    /// Canonical bytes of `self`.
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut enc = CanonicalEncoder::new();
        self.encode_canonical(&mut enc);
        enc.into_bytes()
    }
}

/// Types decodable from their canonical encoding.
pub trait CanonicalDecode: Sized {
    /// Read one value.
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError>;

    /// Decode a complete buffer, rejecting trailing bytes.
    fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut dec = CanonicalDecoder::new(bytes);
        let value = Self::decode_canonical(&mut dec)?;
        dec.finish()?;
        Ok(value)
    }
}

impl CanonicalEncode for InvokeRequest {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_str(&self.module_name);
        enc.put_str(&self.contract_name);
        enc.put_str(&self.method_name);
        enc.put_bytes_map(&self.args);
    }
}

impl CanonicalDecode for InvokeRequest {
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            module_name: dec.string()?,
            contract_name: dec.string()?,
            method_name: dec.string()?,
            args: dec.bytes_map()?,
        })
    }
}

impl CanonicalEncode for CrossQueryRequest {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_str(&self.bcname);
        enc.put_i64(self.timestamp);
        enc.put_str(&self.initiator);
        enc.put_str_seq(&self.auth_require);
        self.request.encode_canonical(enc);
    }
}

impl CanonicalDecode for CrossQueryRequest {
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            bcname: dec.string()?,
            timestamp: dec.i64()?,
            initiator: dec.string()?,
            auth_require: dec.str_seq()?,
            request: InvokeRequest::decode_canonical(dec)?,
        })
    }
}

impl CanonicalEncode for TxStatusRequest {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_str(&self.bcname);
        enc.put_bytes(&self.txid);
    }
}

impl CanonicalDecode for TxStatusRequest {
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            bcname: dec.string()?,
            txid: dec.bytes()?,
        })
    }
}

impl CanonicalEncode for QueryRequest {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        match self {
            QueryRequest::CrossQuery(req) => {
                enc.put_tag(TAG_CROSS_QUERY);
                req.encode_canonical(enc);
            }
            QueryRequest::TxStatus(req) => {
                enc.put_tag(TAG_TX);
                req.encode_canonical(enc);
            }
        }
    }
}

impl CanonicalDecode for QueryRequest {
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError> {
        match dec.tag()? {
            TAG_CROSS_QUERY => Ok(QueryRequest::CrossQuery(CrossQueryRequest::decode_canonical(dec)?)),
            TAG_TX => Ok(QueryRequest::TxStatus(TxStatusRequest::decode_canonical(dec)?)),
            other => Err(CodecError::UnknownTag(other)),
        }
    }
}

impl CanonicalEncode for ContractResponse {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_i32(self.status);
        enc.put_str(&self.message);
        enc.put_bytes(&self.body);
    }
}

impl CanonicalDecode for ContractResponse {
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            status: dec.i32()?,
            message: dec.string()?,
            body: dec.bytes()?,
        })
    }
}

impl CanonicalEncode for CrossQueryResponse {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        self.response.encode_canonical(enc);
    }
}

impl CanonicalDecode for CrossQueryResponse {
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            response: ContractResponse::decode_canonical(dec)?,
        })
    }
}

impl CanonicalEncode for TxRecord {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_bytes(&self.txid);
        enc.put_bytes(&self.blockid);
        enc.put_str(&self.initiator);
        enc.put_i64(self.timestamp);
        enc.put_bytes(&self.desc);
        enc.put_bytes(&self.body);
    }
}

impl CanonicalDecode for TxRecord {
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            txid: dec.bytes()?,
            blockid: dec.bytes()?,
            initiator: dec.string()?,
            timestamp: dec.i64()?,
            desc: dec.bytes()?,
            body: dec.bytes()?,
        })
    }
}

impl CanonicalEncode for QueryResponse {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        match self {
            QueryResponse::CrossQuery(res) => {
                enc.put_tag(TAG_CROSS_QUERY);
                res.encode_canonical(enc);
            }
            QueryResponse::Transaction(tx) => {
                enc.put_tag(TAG_TX);
                tx.encode_canonical(enc);
            }
        }
    }
}

impl CanonicalDecode for QueryResponse {
    fn decode_canonical(dec: &mut CanonicalDecoder<'_>) -> Result<Self, CodecError> {
        match dec.tag()? {
            TAG_CROSS_QUERY => Ok(QueryResponse::CrossQuery(CrossQueryResponse::decode_canonical(dec)?)),
            TAG_TX => Ok(QueryResponse::Transaction(TxRecord::decode_canonical(dec)?)),
            other => Err(CodecError::UnknownTag(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross_request(args: &[(&str, &str)]) -> QueryRequest {
        QueryRequest::CrossQuery(CrossQueryRequest {
            bcname: "xuper".to_string(),
            timestamp: 1_700_000_000_123,
            initiator: "initiator".to_string(),
            auth_require: vec!["a".to_string(), "b".to_string()],
            request: InvokeRequest::wasm("counter", "get", args.iter().copied()),
        })
    }

    fn tx_response() -> QueryResponse {
        QueryResponse::Transaction(TxRecord {
            txid: vec![0xcf, 0x20, 0xb2],
            blockid: vec![0x01; 32],
            initiator: "WwLgfAatHyKx2mCJruRaML4oVf7Chzp42".to_string(),
            timestamp: -5,
            desc: b"transfer".to_vec(),
            body: vec![],
        })
    }

    fn assert_reencodes<T: CanonicalEncode + CanonicalDecode>(value: &T) {
        let encoded = value.to_canonical_bytes();
        let decoded = T::from_canonical_bytes(&encoded).unwrap();
        assert_eq!(decoded.to_canonical_bytes(), encoded);
    }

    #[test]
    fn test_every_variant_reencodes() {
        assert_reencodes(&cross_request(&[("key", "a")]));
        assert_reencodes(&QueryRequest::TxStatus(TxStatusRequest {
            bcname: "xuper".to_string(),
            txid: vec![0xde, 0xad],
        }));
        assert_reencodes(&QueryResponse::CrossQuery(CrossQueryResponse {
            response: ContractResponse {
                status: 0,
                message: "ok".to_string(),
                body: b"42".to_vec(),
            },
        }));
        assert_reencodes(&tx_response());
    }

    #[test]
    fn test_argument_insertion_order_irrelevant() {
        let forward = cross_request(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let backward = cross_request(&[("c", "3"), ("b", "2"), ("a", "1")]);
        assert_eq!(forward.to_canonical_bytes(), backward.to_canonical_bytes());
    }

    #[test]
    fn test_contract_response_layout() {
        let response = ContractResponse {
            status: 1,
            message: "ok".to_string(),
            body: vec![0xff],
        };
        assert_eq!(
            response.to_canonical_bytes(),
            vec![0, 0, 0, 1, 0, 0, 0, 2, b'o', b'k', 0, 0, 0, 1, 0xff]
        );
    }

    #[test]
    fn test_length_prefix_prevents_field_shifting() {
        let a = TxStatusRequest {
            bcname: "ab".to_string(),
            txid: b"c".to_vec(),
        };
        let b = TxStatusRequest {
            bcname: "a".to_string(),
            txid: b"bc".to_vec(),
        };
        assert_ne!(a.to_canonical_bytes(), b.to_canonical_bytes());
    }

    #[test]
    fn test_request_and_response_tags_distinct_kinds() {
        let tx_req = QueryRequest::TxStatus(TxStatusRequest {
            bcname: "xuper".to_string(),
            txid: vec![],
        });
        assert_eq!(tx_req.to_canonical_bytes()[0], TAG_TX);
        assert_eq!(cross_request(&[]).to_canonical_bytes()[0], TAG_CROSS_QUERY);
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = tx_response().to_canonical_bytes();
        bytes.push(0);
        assert_eq!(
            QueryResponse::from_canonical_bytes(&bytes),
            Err(CodecError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_rejects_truncation() {
        let bytes = cross_request(&[("key", "a")]).to_canonical_bytes();
        let result = QueryRequest::from_canonical_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_rejects_unknown_tag() {
        assert_eq!(
            QueryRequest::from_canonical_bytes(&[0x7f]),
            Err(CodecError::UnknownTag(0x7f))
        );
    }

    #[test]
    fn test_rejects_unsorted_map() {
        let mut enc = CanonicalEncoder::new();
        enc.put_str("wasm");
        enc.put_str("counter");
        enc.put_str("get");
        enc.put_u32(2);
        enc.put_str("b");
        enc.put_bytes(b"1");
        enc.put_str("a");
        enc.put_bytes(b"2");
        let result = InvokeRequest::from_canonical_bytes(&enc.into_bytes());
        assert_eq!(result, Err(CodecError::NonCanonicalMap));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let mut enc = CanonicalEncoder::new();
        enc.put_bytes(&[0xff, 0xfe]);
        enc.put_bytes(b"tx");
        assert_eq!(
            TxStatusRequest::from_canonical_bytes(&enc.into_bytes()),
            Err(CodecError::InvalidUtf8)
        );
    }
}
