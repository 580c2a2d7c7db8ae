//! Timecodes and time spans shared by the `SubRip` and `WebVTT` models.
//!
//! A timecode is textually `[HH:]MM:SS,mmm` (or with a `.` fractional
//! separator) and is stored as a signed count of milliseconds.

mod time_point;
mod time_span;

pub use time_point::TimePoint;
pub use time_span::TimeSpan;

use thiserror::Error;

use crate::util::NomError;

/// Error for timecode handling.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The text does not match the `[HH:]MM:SS,mmm` pattern.
    #[error("Invalid timecode: '{text}'")]
    InvalidTimecode {
        /// Text that failed to parse.
        text: String,
        /// Error reported by the timecode grammar.
        #[source]
        source: NomError,
    },
}
