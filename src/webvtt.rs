//! `WebVTT` functionality
//!
//! A document is an optional `WEBVTT` header line followed by blocks separated by
//! blank lines. Each block is a comment (`NOTE`), a region definition (`REGION`),
//! a style sheet (`STYLE`) or a cue:
//!
//! ```text
//! WEBVTT
//!
//! NOTE this is a note
//!
//! 1
//! 00:00:00.000 --> 00:00:01.000
//! Hi
//! ```
//!
//! Region and style bodies are kept as is, they are not interpreted.

use compact_str::CompactString;
use log::{debug, trace};
use regex::Regex;
use std::{
    cmp::Ordering,
    fmt::{self, Write as _},
    str::FromStr,
    sync::LazyLock,
};
use thiserror::Error;

use crate::{
    filter::Filterable,
    time::{TimeError, TimePoint, TimeSpan},
    util::{convert_newlines, normalize_newlines, split_blocks, trim_input, LineEnding, BOM},
};

const ARROW: &str = "-->";

static COMMENT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^NOTE(?:[ \t]|\n|$)").unwrap());
static STYLE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^STYLE[ \t]*(?:\n|$)").unwrap());
static REGION_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^REGION[ \t]*(?:\n|$)").unwrap());
static TIMING_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+-->[ \t]+").unwrap());

/// Error for `WebVTT` parsing.
#[derive(Debug, Error)]
pub enum VttError {
    /// A comment body contains `-->`.
    #[error("Comments cannot contain \"-->\": '{0}'")]
    ArrowInComment(String),

    /// A cue identifier contains `-->`.
    #[error("Identifiers cannot contain \"-->\": '{0}'")]
    ArrowInIdentifier(String),

    /// A cue payload line contains `-->`.
    #[error("Payload cannot contain \"-->\": '{0}'")]
    ArrowInPayload(String),

    /// A cue has no timing line.
    #[error("Missing cue timing in block: '{0}'")]
    MissingTiming(String),

    /// The cue timing line doesn't have exactly one `-->` separator.
    #[error("Invalid cue timing: '{0}'")]
    InvalidTiming(String),

    /// A comment block doesn't start with `NOTE`.
    #[error("Missing NOTE keyword in comment: '{0}'")]
    MissingNoteKeyword(String),

    /// A time of the cue timing line is malformed.
    #[error("Invalid time in cue timing '{line}'")]
    Time {
        /// The timing line
        line: String,
        /// Timecode error
        #[source]
        source: TimeError,
    },
}

/// Extend `TimePoint` for implement `WebVTT` specific `Display`.
#[repr(transparent)]
pub struct TimePointVtt(TimePoint);

impl From<TimePoint> for TimePointVtt {
    fn from(value: TimePoint) -> Self {
        Self(value)
    }
}

impl fmt::Display for TimePointVtt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_separator(f, '.')
    }
}

/// A comment block, introduced by the `NOTE` keyword.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Position of the block in the source.
    pub index: usize,
    /// Blanks and line break between `NOTE` and a body starting on the next line.
    pub leading_blanks: String,
    /// Body of the comment.
    pub text: String,
}

impl Comment {
    /// Parse a comment block.
    ///
    /// # Errors
    ///
    /// Will return `VttError::MissingNoteKeyword` if `input` doesn't start with `NOTE`,
    /// and `VttError::ArrowInComment` if the body contains `-->`.
    ///
    /// # Panics
    ///
    /// Panic if the Regex creation failed
    pub fn parse(input: &str, index: usize) -> Result<Self, VttError> {
        static PREFIX: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^NOTE([ \t]*\n)?").unwrap());

        let input = normalize_newlines(input.trim());
        if !COMMENT_KEYWORD.is_match(&input) {
            return Err(VttError::MissingNoteKeyword(input));
        }
        let (prefix_end, leading_blanks) = PREFIX.captures(&input).map_or((0, ""), |cap| {
            (
                cap.get(0).map_or(0, |m| m.end()),
                cap.get(1).map_or("", |m| m.as_str()),
            )
        });
        let text = &input[prefix_end..];
        if text.contains(ARROW) {
            return Err(VttError::ArrowInComment(text.into()));
        }
        Ok(Self {
            index,
            leading_blanks: leading_blanks.into(),
            text: text.into(),
        })
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NOTE{}{}", self.leading_blanks, self.text)
    }
}

/// A region definition block, introduced by the `REGION` keyword.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Region {
    /// Position of the block in the source.
    pub index: usize,
    /// Whole block, keyword included.
    pub text: String,
}

impl Region {
    /// Create a region block from its source.
    #[must_use]
    pub fn new(input: &str, index: usize) -> Self {
        Self {
            index,
            text: normalize_newlines(input.trim()),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A style sheet block, introduced by the `STYLE` keyword.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Style {
    /// Position of the block in the source.
    pub index: usize,
    /// Whole block, keyword included.
    pub text: String,
}

impl Style {
    /// Create a style block from its source.
    #[must_use]
    pub fn new(input: &str, index: usize) -> Self {
        Self {
            index,
            text: normalize_newlines(input.trim()),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A timed caption.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Position of the block in the source.
    pub index: usize,
    /// Optional identifier line.
    pub id: Option<CompactString>,
    /// Display time.
    pub time: TimeSpan,
    /// Settings written after the end time (`align:start` ...), not interpreted.
    pub settings: Option<String>,
    /// Payload lines.
    pub nodes: Vec<String>,
}

impl Cue {
    /// Parse a cue block: optional identifier line, timing line, then payload lines.
    ///
    /// # Errors
    ///
    /// Will return `VttError` if the identifier or the payload contain `-->`,
    /// or if the timing line is missing or malformed.
    pub fn parse(input: &str, index: usize) -> Result<Self, VttError> {
        let input = normalize_newlines(input.trim());
        let mut lines = input.split('\n').filter(|line| !line.is_empty()).peekable();

        let id = match lines.next_if(|line| !TIMING_SEPARATOR.is_match(line)) {
            Some(id) if id.contains(ARROW) => return Err(VttError::ArrowInIdentifier(id.into())),
            id => id.map(CompactString::from),
        };

        let line = lines
            .next()
            .ok_or_else(|| VttError::MissingTiming(input.clone()))?;
        let (time, settings) = parse_timing(line)?;

        let nodes = lines
            .map(|line| {
                if line.contains(ARROW) {
                    Err(VttError::ArrowInPayload(line.into()))
                } else {
                    Ok(line.to_owned())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            index,
            id,
            time,
            settings,
            nodes,
        })
    }

    /// Payload lines joined by `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.nodes.join("\n")
    }

    /// Write the cue, lines separated by `eol`.
    #[must_use]
    pub fn to_text(&self, eol: LineEnding) -> String {
        let mut text = String::new();
        if let Some(id) = &self.id {
            text.push_str(id);
            text.push_str(eol.as_str());
        }
        let start = TimePointVtt(self.time.start);
        let end = TimePointVtt(self.time.end);
        // Writing in a `String` can't fail.
        let _: fmt::Result = write!(text, "{start} --> {end}");
        if let Some(settings) = &self.settings {
            let _: fmt::Result = write!(text, " {settings}");
        }
        if !self.nodes.is_empty() {
            text.push_str(eol.as_str());
            text.push_str(&self.nodes.join(eol.as_str()));
        }
        text
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(LineEnding::Lf))
    }
}

/// Parse a cue timing line `start --> end [settings]`.
fn parse_timing(line: &str) -> Result<(TimeSpan, Option<String>), VttError> {
    let separator = match TIMING_SEPARATOR.find_iter(line).collect::<Vec<_>>()[..] {
        [separator] if line.matches(ARROW).count() == 1 => separator,
        _ => return Err(VttError::InvalidTiming(line.into())),
    };
    let parse_time = |text: &str| {
        TimePoint::parse(text).map_err(|source| VttError::Time {
            line: line.into(),
            source,
        })
    };

    let start = parse_time(&line[..separator.start()])?;
    let rest = line[separator.end()..].trim();
    let (end, settings) = match rest.split_once(char::is_whitespace) {
        Some((end, settings)) => (end, Some(settings.trim().to_owned())),
        None => (rest, None),
    };
    let end = parse_time(end)?;
    Ok((TimeSpan::new(start, end), settings))
}

/// Any block of a `WebVTT` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `NOTE` block
    Comment(Comment),
    /// `REGION` block
    Region(Region),
    /// `STYLE` block
    Style(Style),
    /// Cue block
    Cue(Cue),
}

impl Block {
    /// Classify a chunk of source by its keyword and parse it.
    /// Keywords are tried in the order `NOTE`, `STYLE`, `REGION`; anything else is a cue.
    ///
    /// # Errors
    ///
    /// Forward the parsing error of the block kind.
    pub fn parse(input: &str, index: usize) -> Result<Self, VttError> {
        let input = input.trim();
        let block = if COMMENT_KEYWORD.is_match(input) {
            Self::Comment(Comment::parse(input, index)?)
        } else if STYLE_KEYWORD.is_match(input) {
            Self::Style(Style::new(input, index))
        } else if REGION_KEYWORD.is_match(input) {
            Self::Region(Region::new(input, index))
        } else {
            Self::Cue(Cue::parse(input, index)?)
        };
        Ok(block)
    }

    /// Borrowed view of the block.
    #[must_use]
    pub const fn view(&self) -> BlockRef<'_> {
        match self {
            Self::Comment(comment) => BlockRef::Comment(comment),
            Self::Region(region) => BlockRef::Region(region),
            Self::Style(style) => BlockRef::Style(style),
            Self::Cue(cue) => BlockRef::Cue(cue),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.view(), f)
    }
}

impl From<Comment> for Block {
    fn from(value: Comment) -> Self {
        Self::Comment(value)
    }
}

impl From<Region> for Block {
    fn from(value: Region) -> Self {
        Self::Region(value)
    }
}

impl From<Style> for Block {
    fn from(value: Style) -> Self {
        Self::Style(value)
    }
}

impl From<Cue> for Block {
    fn from(value: Cue) -> Self {
        Self::Cue(value)
    }
}

/// Reference to a block stored in a [`WebVtt`] document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef<'a> {
    /// `NOTE` block
    Comment(&'a Comment),
    /// `REGION` block
    Region(&'a Region),
    /// `STYLE` block
    Style(&'a Style),
    /// Cue block
    Cue(&'a Cue),
}

impl BlockRef<'_> {
    /// Position of the block in the source.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Comment(comment) => comment.index,
            Self::Region(region) => region.index,
            Self::Style(style) => style.index,
            Self::Cue(cue) => cue.index,
        }
    }

    /// Order of the kinds of blocks sharing the same index.
    const fn precedence(self) -> u8 {
        match self {
            Self::Comment(_) => 1,
            Self::Region(_) => 2,
            Self::Style(_) => 3,
            Self::Cue(_) => 4,
        }
    }

    /// Write the block, lines separated by `eol`.
    #[must_use]
    pub fn to_text(self, eol: LineEnding) -> String {
        match self {
            Self::Cue(cue) => cue.to_text(eol),
            block => convert_newlines(&block.to_string(), eol),
        }
    }
}

impl fmt::Display for BlockRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(comment) => fmt::Display::fmt(comment, f),
            Self::Region(region) => fmt::Display::fmt(region, f),
            Self::Style(style) => fmt::Display::fmt(style, f),
            Self::Cue(cue) => fmt::Display::fmt(cue, f),
        }
    }
}

/// Total order of the blocks of a document.
///
/// Blocks are sorted by index, then by kind (comment, region, style, cue),
/// then cues by start time, and finally by their text.
#[must_use]
pub fn compare_blocks(a: &BlockRef<'_>, b: &BlockRef<'_>) -> Ordering {
    a.index()
        .cmp(&b.index())
        .then_with(|| a.precedence().cmp(&b.precedence()))
        .then_with(|| match (a, b) {
            (BlockRef::Cue(x), BlockRef::Cue(y)) => x.time.start.cmp(&y.time.start),
            _ => Ordering::Equal,
        })
        .then_with(|| a.to_string().cmp(&b.to_string()))
}

/// A `WebVTT` document.
///
/// Blocks are stored by kind, in the order they were parsed or pushed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WebVtt {
    header: CompactString,
    comments: Vec<Comment>,
    regions: Vec<Region>,
    styles: Vec<Style>,
    cues: Vec<Cue>,
}

impl WebVtt {
    /// Line ending used by `WebVTT` files unless asked otherwise.
    pub const DEFAULT_LINE_ENDING: LineEnding = LineEnding::Lf;

    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `WebVTT` document. The `WEBVTT` header line is optional.
    ///
    /// # Errors
    ///
    /// Will return `VttError` on the first malformed block.
    ///
    /// # Panics
    ///
    /// Panic if the Regex creation failed
    #[profiling::function]
    pub fn parse(input: &str) -> Result<Self, VttError> {
        static HEADER: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^WEBVTT(?:[ \t]+([^\n]*))?[ \t]*(?:\n|$)").unwrap());

        let input = normalize_newlines(trim_input(input));
        let mut vtt = Self::new();
        let body = match HEADER.captures(&input) {
            Some(cap) => {
                vtt.header = cap.get(1).map_or("", |m| m.as_str().trim_end()).into();
                &input[cap.get(0).map_or(0, |m| m.end())..]
            }
            None => input.as_str(),
        };
        trace!("WebVTT header: '{}'", vtt.header);

        for (index, chunk) in split_blocks(body).enumerate() {
            vtt.push(Block::parse(chunk, index)?);
        }
        debug!(
            "Parsed {} blocks ({} cues, {} comments, {} regions, {} styles)",
            vtt.len(),
            vtt.cues.len(),
            vtt.comments.len(),
            vtt.regions.len(),
            vtt.styles.len()
        );
        Ok(vtt)
    }

    /// Text following `WEBVTT` on the header line, empty if none.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Set the text following `WEBVTT` on the header line.
    pub fn set_header(&mut self, header: &str) {
        self.header = header.trim().into();
    }

    /// Add a block to the document.
    pub fn push(&mut self, block: Block) {
        match block {
            Block::Comment(comment) => self.comments.push(comment),
            Block::Region(region) => self.regions.push(region),
            Block::Style(style) => self.styles.push(style),
            Block::Cue(cue) => self.cues.push(cue),
        }
    }

    /// Comment blocks.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Region blocks.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Style blocks.
    #[must_use]
    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    /// Cue blocks.
    #[must_use]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// All blocks, sorted with [`compare_blocks`].
    #[must_use]
    pub fn blocks(&self) -> Vec<BlockRef<'_>> {
        let mut blocks = self
            .comments
            .iter()
            .map(BlockRef::Comment)
            .chain(self.regions.iter().map(BlockRef::Region))
            .chain(self.styles.iter().map(BlockRef::Style))
            .chain(self.cues.iter().map(BlockRef::Cue))
            .collect::<Vec<_>>();
        blocks.sort_by(compare_blocks);
        blocks
    }

    /// Total number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len() + self.regions.len() + self.styles.len() + self.cues.len()
    }

    /// Check if the document has no block.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add `msecs` (which may be negative) to the start and end of every cue.
    pub fn offset(&mut self, msecs: i64) {
        self.cues.iter_mut().for_each(|cue| cue.time.shift(msecs));
        debug!("Shifted cues by {msecs} ms");
    }

    /// Write the document as text: header line, then blocks separated by a blank line.
    /// Every line break is written as `eol`. If `bom` is set, a byte-order mark is written first.
    #[must_use]
    pub fn to_text(&self, eol: LineEnding, bom: bool) -> String {
        let mut text = String::new();
        if bom {
            text.push(BOM);
        }
        text.push_str("WEBVTT");
        if !self.header.is_empty() {
            text.push(' ');
            text.push_str(&self.header);
        }
        for block in self.blocks() {
            text.push_str(eol.as_str());
            text.push_str(eol.as_str());
            text.push_str(&block.to_text(eol));
        }
        text.push_str(eol.as_str());
        text
    }
}

impl FromStr for WebVtt {
    type Err = VttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Only cues are filtered, on their payload text.
impl Filterable for WebVtt {
    type Entry = Cue;

    fn remove_matching<F>(&mut self, mut predicate: F) -> Vec<Cue>
    where
        F: FnMut(&str) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.cues)
            .into_iter()
            .partition(|cue| predicate(&cue.text()));
        self.cues = kept;
        removed
    }
}
