//! Conversion between application values and raw cell bytes.
//!
//! Row keys, family names and qualifiers are always UTF-8 text. Values use
//! [`ToBytes`]: strings as UTF-8, integers and floats big-endian, and any
//! other serde type through the [`Json`] wrapper.

use bytes::Bytes;
use serde::Serialize;

use crate::util::Status;

pub trait ToBytes {
    fn to_bytes(&self) -> Result<Bytes, Status>;
}

pub trait FromBytes: Sized {
    fn from_bytes(data: &[u8]) -> Result<Self, Status>;
}

/// Serializes the wrapped value as JSON.
#[derive(Debug, Clone, Copy)]
pub struct Json<T>(pub T);

impl ToBytes for str {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        Ok(Bytes::copy_from_slice(self.as_bytes()))
    }
}

impl ToBytes for String {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        self.as_str().to_bytes()
    }
}

impl ToBytes for [u8] {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        Ok(Bytes::copy_from_slice(self))
    }
}

impl<const N: usize> ToBytes for [u8; N] {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        self.as_slice().to_bytes()
    }
}

impl ToBytes for Vec<u8> {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        self.as_slice().to_bytes()
    }
}

impl ToBytes for Bytes {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        Ok(self.clone())
    }
}

impl ToBytes for i64 {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        Ok(Bytes::copy_from_slice(&self.to_be_bytes()))
    }
}

impl ToBytes for i32 {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        Ok(Bytes::copy_from_slice(&self.to_be_bytes()))
    }
}

impl ToBytes for f64 {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        Ok(Bytes::copy_from_slice(&self.to_bits().to_be_bytes()))
    }
}

impl ToBytes for bool {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        Ok(Bytes::from_static(if *self { &[0xff] } else { &[0x00] }))
    }
}

impl<T: ToBytes + ?Sized> ToBytes for &T {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        (**self).to_bytes()
    }
}

impl<T: Serialize> ToBytes for Json<T> {
    fn to_bytes(&self) -> Result<Bytes, Status> {
        Ok(Bytes::from(serde_json::to_vec(&self.0)?))
    }
}

impl FromBytes for Vec<u8> {
    fn from_bytes(data: &[u8]) -> Result<Self, Status> {
        Ok(data.to_vec())
    }
}

impl FromBytes for Bytes {
    fn from_bytes(data: &[u8]) -> Result<Self, Status> {
        Ok(Bytes::copy_from_slice(data))
    }
}

impl FromBytes for String {
    fn from_bytes(data: &[u8]) -> Result<Self, Status> {
        String::from_utf8(data.to_vec())
            .map_err(|e| Status::corruption(format!("value is not UTF-8: {e}")))
    }
}

impl FromBytes for i64 {
    fn from_bytes(data: &[u8]) -> Result<Self, Status> {
        let raw: [u8; 8] = data
            .try_into()
            .map_err(|_| Status::corruption(format!("expected 8 bytes, got {}", data.len())))?;
        Ok(i64::from_be_bytes(raw))
    }
}

/// Encode an identifier (row key, family, qualifier) as UTF-8.
#[inline]
pub fn identifier(name: &str) -> Bytes {
    Bytes::copy_from_slice(name.as_bytes())
}
