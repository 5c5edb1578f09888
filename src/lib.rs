//! OTA Agent - job intake and status reporting
//!
//! This crate wires the `ota-protocol` extractor and message assembler into
//! an update agent: it loads configuration, accepts OTA job documents, and
//! renders the info/report messages handed to the transport.

pub mod config;
pub mod session;

pub use config::{AgentConfig, ConfigError};
pub use ota_protocol::{FirmwareDescriptor, OtaError, ProgressStep};
pub use session::{JobDocument, JobError, OtaSession};
