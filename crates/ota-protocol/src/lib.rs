//! OTA Protocol Types
//!
//! Pulls firmware metadata out of OTA job documents and renders the
//! firmware-info and progress-report messages an update agent publishes.
//! Everything here is synchronous and works on caller-supplied buffers.

pub mod alloc;
pub mod error;
pub mod extract;
pub mod lookup;
pub mod message;
pub mod params;
pub mod progress;

pub use alloc::{BudgetAllocator, BufferAllocator, HeapAllocator};
pub use error::{ErrorCode, OtaError, Result};
pub use extract::{FieldExtractor, ParamValue};
pub use lookup::{JsonLookup, MemberScanner};
pub use message::{build_info_request, build_report_message, InfoRequest, ReportMessage};
pub use params::{
    parse_firmware_descriptor, FirmwareDescriptor, ParamParser, SizeParsing, FILE_SIZE_TEXT_LEN,
    MD5_HEX_LEN,
};
pub use progress::ProgressStep;
