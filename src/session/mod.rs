//! OTA job session
//!
//! Ties configuration, job documents and outbound messages together for a
//! single update attempt: accepts a job, keeps the resulting firmware
//! descriptor, and renders info/report messages with increasing ids.

use std::path::{Path, PathBuf};

use ota_protocol::{
    FieldExtractor, FirmwareDescriptor, InfoRequest, JsonLookup, MemberScanner, OtaError,
    ParamParser, ReportMessage,
};

use crate::config::AgentConfig;

/// Status text carried by a notification that delivers a job.
pub const NOTIFICATION_SUCCESS: &str = "success";

/// Errors raised while handling an OTA job
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to read job document {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Protocol(#[from] OtaError),

    #[error("OTA notification rejected by server: {0}")]
    Rejected(String),
}

/// Raw OTA job document bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDocument {
    bytes: Vec<u8>,
}

impl JobDocument {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Read a job document from disk.
    pub fn from_file(path: &Path) -> Result<Self, JobError> {
        let bytes = std::fs::read(path).map_err(|source| JobError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Unwrap the job carried in an upgrade notification.
    ///
    /// Notifications look like `{"code":"1000","data":{...},"message":"success"}`;
    /// anything other than a `success` message is rejected and the job lives
    /// in `data`.
    pub fn from_notification(payload: &[u8]) -> Result<Self, JobError> {
        let extractor = FieldExtractor::new();
        let message = extractor.value_of(payload, "message")?;
        if message != NOTIFICATION_SUCCESS.as_bytes() {
            return Err(JobError::Rejected(
                String::from_utf8_lossy(message).into_owned(),
            ));
        }

        let data = extractor.value_of(payload, "data")?;
        Ok(Self::from_bytes(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// State for one OTA update attempt.
#[derive(Debug)]
pub struct OtaSession {
    config: AgentConfig,
    next_id: u32,
    firmware: Option<FirmwareDescriptor>,
}

impl OtaSession {
    pub fn new(config: AgentConfig) -> Self {
        let next_id = config.messages.next_id;
        Self {
            config,
            next_id,
            firmware: None,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Id the next rendered message will carry.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Firmware of the accepted job, if any.
    pub fn firmware(&self) -> Option<&FirmwareDescriptor> {
        self.firmware.as_ref()
    }

    /// Zeroed buffer of the configured message capacity.
    pub fn message_buffer(&self) -> Vec<u8> {
        vec![0; self.config.messages.capacity]
    }

    /// Parse `document` and keep its firmware descriptor.
    ///
    /// A failed parse leaves any previously accepted job in place.
    pub fn accept_job(&mut self, document: &JobDocument) -> Result<&FirmwareDescriptor, JobError> {
        self.accept_job_with(MemberScanner, document)
    }

    /// Like [`accept_job`](Self::accept_job) with a custom lookup.
    pub fn accept_job_with<L: JsonLookup>(
        &mut self,
        lookup: L,
        document: &JobDocument,
    ) -> Result<&FirmwareDescriptor, JobError> {
        let parser = ParamParser::new(FieldExtractor::with_parts(
            lookup,
            ota_protocol::HeapAllocator,
        ))
        .with_size_parsing(self.config.parser.size_parsing);

        let firmware = parser.parse(document.as_bytes())?;
        log::info!(
            "accepted OTA job: version {}, {} bytes",
            firmware.version,
            firmware.file_size
        );
        Ok(self.firmware.insert(firmware))
    }

    /// Render a firmware-info request into `buf`.
    pub fn info_request(&mut self, buf: &mut [u8], version: &str) -> Result<usize, JobError> {
        let len = InfoRequest::new(self.next_id, version).render(buf)?;
        self.advance();
        Ok(len)
    }

    /// Render a progress report into `buf`.
    pub fn report(
        &mut self,
        buf: &mut [u8],
        step: impl Into<i32>,
        desc: Option<&str>,
    ) -> Result<usize, JobError> {
        let len = ReportMessage::new(self.next_id, step.into(), desc).render(buf)?;
        self.advance();
        Ok(len)
    }

    fn advance(&mut self) {
        self.next_id = self.next_id.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_protocol::{ErrorCode, ProgressStep, SizeParsing};

    const JOB: &str = r#"{"size":"2048","version":"1.4.0","url":"https://ota.example.com/1.4.0.bin","md5":"d41d8cd98f00b204e9800998ecf8427e"}"#;

    fn text(buf: &[u8], len: usize) -> &str {
        std::str::from_utf8(&buf[..len]).unwrap()
    }

    #[test]
    fn test_accept_job() {
        let mut session = OtaSession::new(AgentConfig::default());
        let firmware = session.accept_job(&JobDocument::from_bytes(JOB)).unwrap();

        assert_eq!(firmware.version, "1.4.0");
        assert_eq!(firmware.file_size, 2048);
        assert!(session.firmware().is_some());
    }

    #[test]
    fn test_failed_job_keeps_previous() {
        let mut session = OtaSession::new(AgentConfig::default());
        session.accept_job(&JobDocument::from_bytes(JOB)).unwrap();

        let err = session
            .accept_job(&JobDocument::from_bytes(r#"{"version":"2.0"}"#))
            .unwrap_err();

        assert!(matches!(err, JobError::Protocol(ref e) if e.code() == ErrorCode::KeyNotFound));
        assert_eq!(session.firmware().unwrap().version, "1.4.0");
    }

    #[test]
    fn test_strict_size_from_config() {
        let mut config = AgentConfig::default();
        config.parser.size_parsing = SizeParsing::Strict;
        let mut session = OtaSession::new(config);

        let job = JOB.replace("\"2048\"", "\"2k\"");
        let err = session.accept_job(&JobDocument::from_bytes(job)).unwrap_err();

        assert!(matches!(err, JobError::Protocol(OtaError::InvalidSize(_))));
    }

    #[test]
    fn test_message_ids_increment() {
        let mut config = AgentConfig::default();
        config.messages.next_id = 10;
        let mut session = OtaSession::new(config);
        let mut buf = session.message_buffer();

        let len = session.info_request(&mut buf, "1.3.9").unwrap();
        assert_eq!(text(&buf, len), r#"{"id":10,"params":{"version":"1.3.9"}}"#);

        let len = session.report(&mut buf, ProgressStep::Percent(25), None).unwrap();
        assert_eq!(text(&buf, len), r#"{"id":11,"params":{"step":"25"}}"#);

        let len = session
            .report(&mut buf, ProgressStep::CheckFailed, Some("md5 mismatch"))
            .unwrap();
        assert_eq!(
            text(&buf, len),
            r#"{"id":12,"params":{"step":"-3","desc":"md5 mismatch"}}"#
        );
        assert_eq!(session.next_id(), 13);
    }

    #[test]
    fn test_failed_render_does_not_consume_id() {
        let mut session = OtaSession::new(AgentConfig::default());
        let mut small = [0u8; 8];

        let err = session.report(&mut small, 50, None).unwrap_err();

        assert!(matches!(
            err,
            JobError::Protocol(OtaError::MessageTooLong { .. })
        ));
        assert_eq!(session.next_id(), 1);
    }

    #[test]
    fn test_notification_unwraps_data() {
        let payload = format!(r#"{{"code":"1000","data":{},"id":1,"message":"success"}}"#, JOB);
        let document = JobDocument::from_notification(payload.as_bytes()).unwrap();

        assert_eq!(document.as_bytes(), JOB.as_bytes());
    }

    #[test]
    fn test_notification_rejected() {
        let payload = r#"{"code":"9000","message":"no upgrade","data":{}}"#;
        let err = JobDocument::from_notification(payload.as_bytes()).unwrap_err();

        assert!(matches!(err, JobError::Rejected(ref m) if m == "no upgrade"));
    }

    #[test]
    fn test_missing_job_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = JobDocument::from_file(&dir.path().join("job.json")).unwrap_err();
        assert!(matches!(err, JobError::Io { .. }));
    }
}
