//! This crate provides utilities to parse, filter, time-shift and rewrite text
//! subtitles in `SubRip` (`.srt`) and `WebVTT` (`.vtt`) formats.
//!
//! Documents are parsed in memory, modified, then written back. Writing keeps
//! the order of the entries and lets the caller choose the line ending and
//! whether a byte-order mark is written.
//!
//! ## Example code
//!
//! ```
//! use subtext::{filter::{Filterable, Pattern}, srt::SubripText, LineEnding};
//!
//! let mut srt = SubripText::parse("1\n00:00:01,000 --> 00:00:02,000\n[door slams]\n\n\
//!                                  2\n00:00:03,000 --> 00:00:04,000\nHello").unwrap();
//! let removed = srt.filter(&Pattern::annotations());
//! assert_eq!(removed.len(), 1);
//! srt.offset(1000);
//! assert_eq!(
//!     srt.to_text(LineEnding::Lf, false),
//!     "2\n00:00:04,000 --> 00:00:05,000\nHello\n\n"
//! );
//! ```

mod errors;
pub mod filter;
pub mod srt;
pub mod time;
mod util;
pub mod webvtt;

pub use errors::SubtextError;
pub use util::{LineEnding, NomError, BOM};
