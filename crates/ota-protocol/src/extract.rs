//! Field extraction from OTA job documents.
//!
//! Two copy strategies sit on top of the lookup: a fixed-length copy into a
//! caller-owned buffer, and a variable-length copy into a freshly allocated,
//! NUL-terminated [`ParamValue`] whose ownership passes to the caller.

use std::fmt;
use std::str::Utf8Error;

use serde::{Serialize, Serializer};

use crate::alloc::{BufferAllocator, HeapAllocator};
use crate::error::{OtaError, Result};
use crate::lookup::{JsonLookup, MemberScanner};

/// Owned copy of a document value, always followed by a NUL byte.
#[derive(Clone, PartialEq, Eq)]
pub struct ParamValue {
    // Invariant: non-empty, last byte is 0.
    buf: Vec<u8>,
}

impl ParamValue {
    /// Value bytes without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.buf.len() - 1]
    }

    /// Value bytes including the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the value as UTF-8 text.
    pub fn to_str(&self) -> std::result::Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    /// Release the underlying buffer, terminator included.
    pub fn into_bytes_with_nul(self) -> Vec<u8> {
        self.buf
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParamValue")
            .field(&String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl PartialEq<str> for ParamValue {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for ParamValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

/// Looks up keys in a job document and copies their values out.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor<L = MemberScanner, A = HeapAllocator> {
    lookup: L,
    alloc: A,
}

impl FieldExtractor {
    /// Extractor using the top-level member scanner and the global heap.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: JsonLookup, A: BufferAllocator> FieldExtractor<L, A> {
    /// Extractor built from an explicit lookup and allocator.
    pub fn with_parts(lookup: L, alloc: A) -> Self {
        Self { lookup, alloc }
    }

    /// Raw value bytes of `key`, borrowed from the document.
    pub fn value_of<'d>(&self, document: &'d [u8], key: &str) -> Result<&'d [u8]> {
        self.lookup
            .value_of(document, key)
            .ok_or_else(|| OtaError::key_not_found(key))
    }

    /// Copy the value of `key` into `dest` and return the number of bytes copied.
    ///
    /// No terminator is written and bytes of `dest` past the value are left
    /// as they were. On failure `dest` is not touched.
    pub fn extract_fixed(&self, document: &[u8], key: &str, dest: &mut [u8]) -> Result<usize> {
        let value = self.value_of(document, key)?;
        if value.len() > dest.len() {
            return Err(OtaError::ValueTooLarge {
                key: key.to_string(),
                len: value.len(),
                capacity: dest.len(),
            });
        }

        dest[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    /// Copy the value of `key` into a new NUL-terminated buffer.
    pub fn extract_owned(&self, document: &[u8], key: &str) -> Result<ParamValue> {
        let value = self.value_of(document, key)?;
        let len = value
            .len()
            .checked_add(1)
            .ok_or(OtaError::AllocationFailure { len: usize::MAX })?;

        let mut buf = self
            .alloc
            .allocate(len)
            .ok_or(OtaError::AllocationFailure { len })?;
        buf.extend_from_slice(value);
        buf.push(0);

        Ok(ParamValue { buf })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::BudgetAllocator;
    use crate::error::ErrorCode;

    const DOC: &[u8] = br#"{"version":"v1.0.2","md5":"0123456789abcdef0123456789abcdef"}"#;

    #[test]
    fn test_fixed_copy_leaves_tail_untouched() {
        let extractor = FieldExtractor::new();
        let mut dest = [b'#'; 10];

        let copied = extractor.extract_fixed(DOC, "version", &mut dest).unwrap();

        assert_eq!(copied, 6);
        assert_eq!(&dest, b"v1.0.2####");
    }

    #[test]
    fn test_fixed_copy_exact_fit() {
        let extractor = FieldExtractor::new();
        let mut dest = [0u8; 32];

        let copied = extractor.extract_fixed(DOC, "md5", &mut dest).unwrap();

        assert_eq!(copied, 32);
        assert_eq!(&dest, b"0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_fixed_copy_too_large_leaves_dest_unmodified() {
        let extractor = FieldExtractor::new();
        let mut dest = [b'#'; 5];

        let err = extractor.extract_fixed(DOC, "version", &mut dest).unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValueTooLarge);
        assert_eq!(
            err,
            OtaError::ValueTooLarge {
                key: "version".to_string(),
                len: 6,
                capacity: 5
            }
        );
        assert_eq!(&dest, b"#####");
    }

    #[test]
    fn test_missing_key() {
        let extractor = FieldExtractor::new();
        let mut dest = [0u8; 8];

        let err = extractor.extract_fixed(DOC, "url", &mut dest).unwrap_err();
        assert_eq!(err.code(), ErrorCode::KeyNotFound);

        let err = extractor.extract_owned(DOC, "url").unwrap_err();
        assert_eq!(err.code(), ErrorCode::KeyNotFound);
    }

    #[test]
    fn test_owned_copy_is_nul_terminated() {
        let value = FieldExtractor::new().extract_owned(DOC, "version").unwrap();

        assert_eq!(value.as_bytes(), b"v1.0.2");
        assert_eq!(value.as_bytes_with_nul(), b"v1.0.2\0");
        assert_eq!(value.len(), 6);
        assert_eq!(value.to_str().unwrap(), "v1.0.2");
        assert_eq!(value, "v1.0.2");
    }

    #[test]
    fn test_owned_copy_of_empty_value() {
        let value = FieldExtractor::new()
            .extract_owned(br#"{"version":""}"#, "version")
            .unwrap();

        assert!(value.is_empty());
        assert_eq!(value.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn test_owned_copy_allocation_failure() {
        let alloc = BudgetAllocator::new(6);
        let extractor = FieldExtractor::with_parts(MemberScanner, &alloc);

        let err = extractor.extract_owned(DOC, "version").unwrap_err();

        assert_eq!(err, OtaError::AllocationFailure { len: 7 });
        assert_eq!(alloc.allocations(), 0);
    }

    #[test]
    fn test_owned_value_serializes_as_string() {
        let value = FieldExtractor::new().extract_owned(DOC, "version").unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), r#""v1.0.2""#);
    }
}
