//! Outbound OTA messages.
//!
//! Messages are rendered as compact JSON straight into a caller-supplied
//! buffer:
//!
//! ```text
//! {"id":<id>,"params":{"version":"<version>"}}
//! {"id":<id>,"params":{"step":"<progress>"}}
//! {"id":<id>,"params":{"step":"<progress>","desc":"<description>"}}
//! ```
//!
//! A message succeeds only if it fits together with a trailing NUL, so the
//! rendered length is always strictly less than the buffer length. Strings are
//! JSON-escaped by the serializer; inputs without quotes, backslashes or
//! control characters render byte-for-byte as written.

use std::fmt::Display;
use std::io;

use serde::{Serialize, Serializer};

use crate::error::{OtaError, Result};

/// Firmware-info request announcing the running version.
#[derive(Debug, Clone, Serialize)]
pub struct InfoRequest<'a> {
    pub id: u32,
    pub params: InfoParams<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoParams<'a> {
    pub version: &'a str,
}

/// Upgrade progress report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMessage<'a> {
    pub id: u32,
    pub params: ReportParams<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportParams<'a> {
    /// Progress code, sent as a decimal string.
    #[serde(serialize_with = "as_decimal_string")]
    pub step: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<&'a str>,
}

fn as_decimal_string<T: Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl<'a> InfoRequest<'a> {
    pub fn new(id: u32, version: &'a str) -> Self {
        Self {
            id,
            params: InfoParams { version },
        }
    }

    /// Render into `buf`, returning the message length without terminator.
    pub fn render(&self, buf: &mut [u8]) -> Result<usize> {
        render(buf, self)
    }
}

impl<'a> ReportMessage<'a> {
    pub fn new(id: u32, step: i32, desc: Option<&'a str>) -> Self {
        Self {
            id,
            params: ReportParams { step, desc },
        }
    }

    /// Render into `buf`, returning the message length without terminator.
    pub fn render(&self, buf: &mut [u8]) -> Result<usize> {
        render(buf, self)
    }
}

/// Write the firmware-info request for `version` into `buf`.
pub fn build_info_request(buf: &mut [u8], id: u32, version: &str) -> Result<usize> {
    InfoRequest::new(id, version).render(buf)
}

/// Write a progress report into `buf`, with `description` when present.
pub fn build_report_message(
    buf: &mut [u8],
    id: u32,
    progress: i32,
    description: Option<&str>,
) -> Result<usize> {
    ReportMessage::new(id, progress, description).render(buf)
}

fn render<T: Serialize>(buf: &mut [u8], message: &T) -> Result<usize> {
    let mut writer = BoundedWriter::new(buf);
    serde_json::to_writer(&mut writer, message)?;
    let len = writer.finish()?;
    log::debug!("rendered {} byte OTA message", len);
    Ok(len)
}

/// `io::Write` sink over a fixed buffer that keeps counting past the end.
///
/// Bytes that fit are copied; the rest are dropped but still counted, so the
/// caller learns how large the buffer would have had to be.
#[derive(Debug)]
pub struct BoundedWriter<'b> {
    buf: &'b mut [u8],
    written: usize,
}

impl<'b> BoundedWriter<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, written: 0 }
    }

    /// Bytes written or that would have been written.
    pub fn written(&self) -> usize {
        self.written
    }

    /// NUL-terminate the output and return its length.
    ///
    /// Fails when the output plus terminator does not fit.
    pub fn finish(self) -> Result<usize> {
        if self.written >= self.buf.len() {
            return Err(OtaError::MessageTooLong {
                needed: self.written,
                capacity: self.buf.len(),
            });
        }
        self.buf[self.written] = 0;
        Ok(self.written)
    }
}

impl io::Write for BoundedWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.written < self.buf.len() {
            let n = data.len().min(self.buf.len() - self.written);
            self.buf[self.written..self.written + n].copy_from_slice(&data[..n]);
        }
        self.written = self.written.saturating_add(data.len());
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
