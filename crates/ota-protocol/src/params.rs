//! Firmware descriptor parsing.

use serde::{Deserialize, Serialize};

use crate::alloc::BufferAllocator;
use crate::error::{OtaError, Result};
use crate::extract::{FieldExtractor, ParamValue};
use crate::lookup::JsonLookup;

/// Length of the md5 checksum as hex text.
pub const MD5_HEX_LEN: usize = 32;

/// Longest `size` value accepted, in characters.
pub const FILE_SIZE_TEXT_LEN: usize = 16;

/// How the textual `size` field is turned into a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeParsing {
    /// Leading digits are used and anything unparsable reads as zero.
    #[default]
    Lenient,
    /// The whole text must be a decimal number that fits in 32 bits.
    Strict,
}

/// Firmware metadata taken from an OTA job document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareDescriptor {
    pub version: ParamValue,
    pub url: ParamValue,
    /// Checksum text; bytes past `md5_len` are zero.
    pub md5: [u8; MD5_HEX_LEN],
    pub md5_len: usize,
    pub file_size: u32,
}

impl FirmwareDescriptor {
    /// Checksum text as copied from the document.
    pub fn md5_hex(&self) -> &[u8] {
        &self.md5[..self.md5_len]
    }

    /// Decode the checksum into its 16 raw bytes.
    pub fn md5_digest(&self) -> Result<[u8; MD5_HEX_LEN / 2]> {
        let mut digest = [0u8; MD5_HEX_LEN / 2];
        hex::decode_to_slice(self.md5_hex(), &mut digest).map_err(|e| {
            OtaError::InvalidDigest(format!(
                "{:?}: {}",
                String::from_utf8_lossy(self.md5_hex()),
                e
            ))
        })?;
        Ok(digest)
    }
}

impl Serialize for FirmwareDescriptor {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FirmwareDescriptor", 4)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("md5", &String::from_utf8_lossy(self.md5_hex()))?;
        state.serialize_field("size", &self.file_size)?;
        state.end()
    }
}

/// Pulls a [`FirmwareDescriptor`] out of a job document.
#[derive(Debug, Clone, Default)]
pub struct ParamParser<L, A> {
    extractor: FieldExtractor<L, A>,
    size_parsing: SizeParsing,
}

impl<L: JsonLookup, A: BufferAllocator> ParamParser<L, A> {
    pub fn new(extractor: FieldExtractor<L, A>) -> Self {
        Self {
            extractor,
            size_parsing: SizeParsing::default(),
        }
    }

    pub fn with_size_parsing(mut self, size_parsing: SizeParsing) -> Self {
        self.size_parsing = size_parsing;
        self
    }

    /// Extract `version`, `url`, `md5` and `size`, in that order.
    ///
    /// The first failing field aborts the parse. Values extracted before the
    /// failure are dropped with the error, releasing their buffers.
    pub fn parse(&self, document: &[u8]) -> Result<FirmwareDescriptor> {
        let version = self.extractor.extract_owned(document, "version")?;
        log::debug!("OTA version: {}", version);

        let url = self.extractor.extract_owned(document, "url")?;
        log::debug!("OTA url: {}", url);

        let mut md5 = [0u8; MD5_HEX_LEN];
        let md5_len = self.extractor.extract_fixed(document, "md5", &mut md5)?;

        let mut size_text = [0u8; FILE_SIZE_TEXT_LEN];
        let size_len = self
            .extractor
            .extract_fixed(document, "size", &mut size_text)?;
        let file_size = parse_size(&size_text[..size_len], self.size_parsing)?;
        log::debug!("OTA size: {}", file_size);

        Ok(FirmwareDescriptor {
            version,
            url,
            md5,
            md5_len,
            file_size,
        })
    }
}

/// Parse a firmware descriptor with the default lookup, heap and lenient size rule.
pub fn parse_firmware_descriptor(document: &[u8]) -> Result<FirmwareDescriptor> {
    ParamParser::new(FieldExtractor::new()).parse(document)
}

fn parse_size(text: &[u8], policy: SizeParsing) -> Result<u32> {
    match policy {
        SizeParsing::Lenient => Ok(parse_size_lenient(text)),
        SizeParsing::Strict => std::str::from_utf8(text)
            .ok()
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| OtaError::InvalidSize(String::from_utf8_lossy(text).into_owned())),
    }
}

/// `atoi`-style parse: skip leading whitespace, accept one sign, then read
/// digits until the first non-digit. Negative values and overflow saturate.
fn parse_size_lenient(text: &[u8]) -> u32 {
    let mut rest = text;
    while let [b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c', tail @ ..] = rest {
        rest = tail;
    }

    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits != rest.len() {
        log::warn!(
            "OTA size {:?} is not a plain number, using leading digits",
            String::from_utf8_lossy(text)
        );
    }

    let value = rest[..digits].iter().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    });

    if negative {
        0
    } else {
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}
