//! Custom error types.

use thiserror::Error;

/// A type representing errors that are specific to `subtext`. Each module
/// returns its own error type; this one can hold any of them, which is handy
/// for tools working on both formats.
#[derive(Debug, Error)]
pub enum SubtextError {
    /// Error with a timecode
    #[error("Error with timecode")]
    Time(#[from] crate::time::TimeError),

    /// Error with `SubRip`
    #[error("Error with SubRip")]
    Srt(#[from] crate::srt::SrtError),

    /// Error with `WebVTT`
    #[error("Error with WebVTT")]
    WebVtt(#[from] crate::webvtt::VttError),

    /// Error with a filter pattern
    #[error("Error with filter pattern")]
    Pattern(#[from] crate::filter::PatternError),
}
