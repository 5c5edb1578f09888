//! Progress step codes carried in report messages.

use std::fmt;

/// Lowest percentage a download can report.
pub const PERCENT_MIN: i32 = 0;

/// Highest percentage a download can report.
pub const PERCENT_MAX: i32 = 100;

/// Upgrade step reported to the cloud in the `step` field.
///
/// Non-negative steps are download percentages; negative steps are failure
/// codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    /// Writing the image to flash failed.
    BurnFailed,
    /// The downloaded image did not pass verification.
    CheckFailed,
    /// The image could not be fetched.
    FetchFailed,
    /// Any other failure.
    GeneralFailed,
    /// Download progress, 0 through 100.
    Percent(u8),
}

impl ProgressStep {
    /// Progress step for `percent`, clamped to 100.
    pub fn percent(percent: u8) -> Self {
        ProgressStep::Percent(percent.min(PERCENT_MAX as u8))
    }

    /// Wire code of this step.
    pub fn code(&self) -> i32 {
        match self {
            ProgressStep::BurnFailed => -4,
            ProgressStep::CheckFailed => -3,
            ProgressStep::FetchFailed => -2,
            ProgressStep::GeneralFailed => -1,
            ProgressStep::Percent(p) => i32::from(*p),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.code() < PERCENT_MIN
    }
}

impl TryFrom<i32> for ProgressStep {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -4 => Ok(ProgressStep::BurnFailed),
            -3 => Ok(ProgressStep::CheckFailed),
            -2 => Ok(ProgressStep::FetchFailed),
            -1 => Ok(ProgressStep::GeneralFailed),
            PERCENT_MIN..=PERCENT_MAX => Ok(ProgressStep::Percent(code as u8)),
            other => Err(other),
        }
    }
}

impl From<ProgressStep> for i32 {
    fn from(step: ProgressStep) -> Self {
        step.code()
    }
}

impl fmt::Display for ProgressStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
