//! `SubRip`/Srt functionality
//!
//! A document is a list of subtitles separated by blank lines:
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:02,000
//! Hello
//! ```
//!
//! Each subtitle is stored under its declared index. Duplicated indices overwrite
//! the previous subtitle, and missing indices are simply absent from the output.

use log::{debug, trace};
use regex::Regex;
use std::{collections::BTreeMap, fmt, str::FromStr, sync::LazyLock};
use thiserror::Error;

use crate::{
    filter::Filterable,
    time::{TimeError, TimePoint, TimeSpan},
    util::{convert_newlines, normalize_newlines, split_blocks, trim_input, LineEnding, BOM},
};

/// Error for `SubRip` parsing.
#[derive(Debug, Error)]
pub enum SrtError {
    /// The first line of a subtitle is not a positive integer.
    #[error("Invalid subtitle index: '{0}'")]
    InvalidIndex(String),

    /// The subtitle has no timing line.
    #[error("Missing timing line in subtitle: '{0}'")]
    MissingTiming(String),

    /// The timing line has no `-->` separator.
    #[error("Invalid subtitle timing: '{0}'")]
    InvalidTiming(String),

    /// A time of the timing line is malformed.
    #[error("Invalid time in subtitle timing '{line}'")]
    Time {
        /// The timing line
        line: String,
        /// Timecode error
        #[source]
        source: TimeError,
    },
}

/// A single `SubRip` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitle {
    /// Declared index, starting at 1.
    pub index: usize,
    /// Display time.
    pub time: TimeSpan,
    /// Text of the subtitle, lines separated by `\n`.
    pub text: String,
}

impl Subtitle {
    /// Create a subtitle.
    #[must_use]
    pub const fn new(index: usize, time: TimeSpan, text: String) -> Self {
        Self { index, time, text }
    }

    /// Parse one subtitle block: index line, timing line, then text lines.
    ///
    /// # Errors
    ///
    /// Will return `SrtError` if the index or the timing line are malformed.
    ///
    /// # Panics
    ///
    /// Panic if the Regex creation failed
    pub fn parse(input: &str) -> Result<Self, SrtError> {
        static TIMING_SEPARATOR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\s*-->\s*").unwrap());

        let input = normalize_newlines(input.trim());
        let mut lines = input.split('\n');

        let index_line = lines.next().unwrap_or_default().trim();
        let index = index_line
            .parse::<usize>()
            .ok()
            .filter(|index| *index > 0)
            .ok_or_else(|| SrtError::InvalidIndex(index_line.into()))?;

        let line = lines
            .next()
            .ok_or_else(|| SrtError::MissingTiming(input.clone()))?;
        let mut times = TIMING_SEPARATOR.splitn(line.trim(), 2);
        let (Some(start), Some(end)) = (times.next(), times.next()) else {
            return Err(SrtError::InvalidTiming(line.into()));
        };
        let parse_time = |text: &str| {
            TimePoint::parse(text).map_err(|source| SrtError::Time {
                line: line.into(),
                source,
            })
        };
        let time = TimeSpan::new(parse_time(start)?, parse_time(end)?);

        let text = lines.collect::<Vec<_>>().join("\n");
        Ok(Self { index, time, text })
    }
}

impl FromStr for Subtitle {
    type Err = SrtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Subtitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.index;
        let start = self.time.start;
        let end = self.time.end;
        let text = &self.text;
        write!(f, "{index}\n{start} --> {end}\n{text}")
    }
}

/// A `SubRip` document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubripText {
    /// Subtitles keyed by their declared index.
    entries: BTreeMap<usize, Subtitle>,
}

impl SubripText {
    /// Line ending used by `SubRip` files unless asked otherwise.
    pub const DEFAULT_LINE_ENDING: LineEnding = LineEnding::CrLf;

    /// Create an empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Parse a `SubRip` document. A leading byte-order mark is ignored.
    ///
    /// # Errors
    ///
    /// Will return `SrtError` on the first malformed subtitle.
    #[profiling::function]
    pub fn parse(input: &str) -> Result<Self, SrtError> {
        let input = normalize_newlines(trim_input(input));
        let mut srt = Self::new();
        for block in split_blocks(&input) {
            srt.insert(Subtitle::parse(block)?)?;
        }
        debug!("Parsed {} subtitles", srt.len());
        Ok(srt)
    }

    /// Store `subtitle` at the place given by its index, replacing any
    /// subtitle previously stored with the same index.
    ///
    /// # Errors
    ///
    /// Will return `SrtError::InvalidIndex` if the subtitle index is zero.
    pub fn insert(&mut self, subtitle: Subtitle) -> Result<(), SrtError> {
        if subtitle.index == 0 {
            return Err(SrtError::InvalidIndex(subtitle.index.to_string()));
        }
        if let Some(previous) = self.entries.insert(subtitle.index, subtitle) {
            trace!("Subtitle {} is declared twice, keeping the last one", previous.index);
        }
        Ok(())
    }

    /// Get the subtitle with the declared `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Subtitle> {
        self.entries.get(&index)
    }

    /// Iterate over the present subtitles, in index order.
    pub fn entries(&self) -> impl Iterator<Item = &Subtitle> {
        self.entries.values()
    }

    /// Number of present subtitles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the document has no subtitle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `msecs` (which may be negative) to the start and end of every subtitle.
    pub fn offset(&mut self, msecs: i64) {
        self.entries
            .values_mut()
            .for_each(|subtitle| subtitle.time.shift(msecs));
        debug!("Shifted subtitles by {msecs} ms");
    }

    /// Write the document as text.
    ///
    /// Subtitles are separated by a blank line, every line break is written as `eol`,
    /// and the text ends with a blank line. If `bom` is set, a byte-order mark is written first.
    #[must_use]
    pub fn to_text(&self, eol: LineEnding, bom: bool) -> String {
        let separator = format!("{eol}{eol}");
        let body = self
            .entries()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(&separator);

        let mut text = String::with_capacity(body.len() + separator.len() + 3);
        if bom {
            text.push(BOM);
        }
        text.push_str(&convert_newlines(&body, eol));
        text.push_str(&separator);
        text
    }
}

impl FromStr for SubripText {
    type Err = SrtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Subtitles keep their declared index, removed ones as well as remaining ones.
impl Filterable for SubripText {
    type Entry = Subtitle;

    fn remove_matching<F>(&mut self, mut predicate: F) -> Vec<Subtitle>
    where
        F: FnMut(&str) -> bool,
    {
        let (removed, kept): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|(_, subtitle)| predicate(&subtitle.text));
        self.entries = kept;
        removed.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, Pattern};

    const SIMPLE: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello";

    const SEVERAL: &str = "\
1\r\n00:00:01,000 --> 00:00:02,000\r\n[door creaks]\r\n\r\n\
2\r\n00:00:03,000 --> 00:00:04,500\r\nWho's there?\r\nAnswer me.\r\n\r\n\
3\r\n00:00:05,000 --> 00:00:06,000\r\n(whispering)\r\n\r\n";

    fn span(start: i64, end: i64) -> TimeSpan {
        TimeSpan::new(TimePoint::from_msecs(start), TimePoint::from_msecs(end))
    }

    #[test]
    fn parse_single_subtitle() {
        let srt = SubripText::parse(SIMPLE).unwrap();
        assert_eq!(srt.len(), 1);
        let subtitle = srt.get(1).unwrap();
        assert_eq!(subtitle.index, 1);
        assert_eq!(subtitle.time, span(1000, 2000));
        assert_eq!(subtitle.text, "Hello");
    }

    #[test]
    fn parse_multiline_crlf() {
        let srt = SubripText::parse(SEVERAL).unwrap();
        assert_eq!(srt.len(), 3);
        assert_eq!(srt.get(2).unwrap().text, "Who's there?\nAnswer me.");
        assert_eq!(srt.get(2).unwrap().time, span(3000, 4500));
    }

    #[test]
    fn parse_ignores_bom_and_blank_input() {
        let srt: SubripText = format!("{BOM}{SIMPLE}\n\n").parse().unwrap();
        assert_eq!(srt.len(), 1);
        assert!(SubripText::parse(" \r\n ").unwrap().is_empty());
    }

    #[test]
    fn parse_timing_tolerates_spacing() {
        let subtitle = Subtitle::parse("4\n00:00:01,000-->00:00:02.250\nHi").unwrap();
        assert_eq!(subtitle.time, span(1000, 2250));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            Subtitle::parse("one\n00:00:01,000 --> 00:00:02,000\nHi"),
            Err(SrtError::InvalidIndex(_))
        ));
        assert!(matches!(
            Subtitle::parse("0\n00:00:01,000 --> 00:00:02,000\nHi"),
            Err(SrtError::InvalidIndex(_))
        ));
        assert!(matches!(
            Subtitle::parse("1"),
            Err(SrtError::MissingTiming(_))
        ));
        assert!(matches!(
            Subtitle::parse("1\n00:00:01,000 00:00:02,000\nHi"),
            Err(SrtError::InvalidTiming(_))
        ));
        assert!(matches!(
            Subtitle::parse("1\n00:00:01 --> 00:00:02,000\nHi"),
            Err(SrtError::Time { .. })
        ));
    }

    #[test]
    fn one_malformed_subtitle_fails_the_document() {
        let input = format!("{SIMPLE}\n\n2\nnot a timing\nBye");
        assert!(SubripText::parse(&input).is_err());
    }

    #[test]
    fn sparse_and_duplicate_indices() {
        let input = "\
3\n00:00:03,000 --> 00:00:04,000\nThree\n\n\
1\n00:00:01,000 --> 00:00:02,000\nFirst one\n\n\
1\n00:00:01,500 --> 00:00:02,000\nSecond one";
        let srt = SubripText::parse(input).unwrap();
        assert_eq!(srt.len(), 2);
        assert!(srt.get(2).is_none());
        assert_eq!(srt.get(1).unwrap().text, "Second one");
        assert_eq!(
            srt.to_text(LineEnding::Lf, false),
            "1\n00:00:01,500 --> 00:00:02,000\nSecond one\n\n\
3\n00:00:03,000 --> 00:00:04,000\nThree\n\n"
        );
    }

    #[test]
    fn serialize_crlf_with_bom() {
        let srt = SubripText::parse(SEVERAL).unwrap();
        let text = srt.to_text(SubripText::DEFAULT_LINE_ENDING, true);
        assert_eq!(text, format!("{BOM}{SEVERAL}"));
    }

    #[test]
    fn serialize_then_parse() {
        let srt = SubripText::parse(SEVERAL).unwrap();
        for eol in [LineEnding::Lf, LineEnding::CrLf] {
            for bom in [false, true] {
                let reparsed = SubripText::parse(&srt.to_text(eol, bom)).unwrap();
                assert_eq!(reparsed, srt);
            }
        }
    }

    #[test]
    fn offset_forward() {
        let mut srt = SubripText::parse(SIMPLE).unwrap();
        srt.offset(1000);
        assert_eq!(
            srt.to_text(LineEnding::Lf, false),
            "1\n00:00:02,000 --> 00:00:03,000\nHello\n\n"
        );
    }

    #[test]
    fn offset_below_zero_is_kept_but_written_as_zero() {
        let mut srt = SubripText::parse(SIMPLE).unwrap();
        srt.offset(-1500);
        assert_eq!(srt.get(1).unwrap().time, span(-500, 500));
        assert!(srt
            .to_text(LineEnding::Lf, false)
            .contains("00:00:00,000 --> 00:00:00,500"));
    }

    #[test]
    fn offsets_are_additive() {
        let mut twice = SubripText::parse(SEVERAL).unwrap();
        let mut once = twice.clone();
        twice.offset(1200);
        twice.offset(-450);
        once.offset(750);
        assert_eq!(twice, once);
    }

    #[test]
    fn filter_without_match_keeps_document() {
        let mut srt = SubripText::parse(SIMPLE).unwrap();
        let before = srt.clone();
        assert!(srt.filter(&Pattern::annotations()).is_empty());
        assert_eq!(srt, before);
    }

    #[test]
    fn filter_removes_annotations() {
        let mut srt = SubripText::parse(SEVERAL).unwrap();
        let removed = srt.filter(&Pattern::annotations());
        assert_eq!(
            removed.iter().map(|s| s.index).collect::<Vec<_>>(),
            [1, 3]
        );
        assert_eq!(srt.len(), 1);
        assert!(srt.get(1).is_none());
        let remaining = srt.get(2).unwrap();
        assert_eq!(remaining.text, "Who's there?\nAnswer me.");
        assert_eq!(remaining.time, span(3000, 4500));
        assert_eq!(
            srt.to_text(LineEnding::Lf, false),
            "2\n00:00:03,000 --> 00:00:04,500\nWho's there?\nAnswer me.\n\n"
        );
    }

    #[test]
    fn huge_index_is_stored_sparsely() {
        let srt = SubripText::parse("1000000000000\n00:00:01,000 --> 00:00:02,000\nHi").unwrap();
        assert_eq!(srt.len(), 1);
        assert_eq!(srt.get(1_000_000_000_000).unwrap().text, "Hi");
        assert_eq!(
            srt.to_text(LineEnding::Lf, false),
            "1000000000000\n00:00:01,000 --> 00:00:02,000\nHi\n\n"
        );
    }

    #[test]
    fn insert_rejects_index_zero() {
        let mut srt = SubripText::new();
        let subtitle = Subtitle::new(0, span(0, 1000), "Zero".into());
        assert!(matches!(
            srt.insert(subtitle),
            Err(SrtError::InvalidIndex(_))
        ));
        assert!(srt.is_empty());
        srt.insert(Subtitle::new(2, span(0, 1000), "Two".into()))
            .unwrap();
        assert_eq!(srt.get(2).unwrap().text, "Two");
    }

    #[test]
    fn filter_with_several_patterns() {
        let mut srt = SubripText::parse(SEVERAL).unwrap();
        let filter = Filter::new()
            .with(Pattern::from_expression("/^who/i").unwrap())
            .with(Pattern::from_expression(r"^\(").unwrap());
        let removed = filter.apply(&mut srt);
        assert_eq!(removed.len(), 2);
        assert_eq!(
            srt.entries().map(|s| s.text.as_str()).collect::<Vec<_>>(),
            ["[door creaks]"]
        );
    }
}
