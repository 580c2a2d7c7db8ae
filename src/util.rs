//! Miscellaneous utilities.

use nom::{IResult, Needed};
use regex::Regex;
use std::{fmt, sync::LazyLock};
use thiserror::Error;

/// Byte-order mark optionally written at the start of serialized documents.
pub const BOM: char = '\u{feff}';

/// End-of-line convention used when serializing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// The line terminator as text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace `\r\n` and lone `\r` by `\n`.
pub(crate) fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Replace every line break of `text` (`\n` or `\r\n`) by `eol`.
pub(crate) fn convert_newlines(text: &str, eol: LineEnding) -> String {
    let text = text.replace("\r\n", "\n");
    match eol {
        LineEnding::Lf => text,
        LineEnding::CrLf => text.replace('\n', eol.as_str()),
    }
}

/// Remove surrounding whitespace and a leading byte-order mark.
pub(crate) fn trim_input(text: &str) -> &str {
    text.trim_start_matches(BOM).trim()
}

/// Split a newline-normalized text on blank lines, dropping empty chunks.
///
/// # Panics
///
/// Panic if the Regex creation failed
pub(crate) fn split_blocks(text: &str) -> impl Iterator<Item = &str> {
    static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
    BLANK_LINES
        .split(text)
        .filter(|chunk| !chunk.trim().is_empty())
}

/// Error from `nom` handling
#[derive(Debug, Error)]
pub enum NomError {
    /// We have leftover input that we didn't expect.
    #[error("Unexpected extra input")]
    UnexpectedInput,

    /// Our input data ended sooner than we expected.
    #[error("Incomplete input: '{0:?}' needed.")]
    IncompleteInput(Needed),

    /// An error happend during parsing
    #[error("Error from nom : {0}")]
    Error(String),

    /// And Failure happend during parsing
    #[error("Failure from nom : {0}")]
    Failure(String),
}

/// Extend `IResult` management, and convert to [`Result`] with [`NomError`]
pub trait IResultExt<I, O, E> {
    /// Convert an `IResult` to Result<_, `NomError`> and check than the input is empty after parsing.
    /// # Errors
    /// Forward `Error` and `Failure` from nom, and return `UnexpectedInput` if the input is not empty after parsing.
    fn to_result_no_rest(self) -> Result<O, NomError>;
}

impl<I: Default + Eq, O, E: fmt::Debug> IResultExt<I, O, E> for IResult<I, O, E> {
    fn to_result_no_rest(self) -> Result<O, NomError> {
        match self {
            IResult::Ok((rest, val)) => {
                if rest == I::default() {
                    Ok(val)
                } else {
                    Err(NomError::UnexpectedInput)
                }
            }
            IResult::Err(err) => match err {
                nom::Err::Incomplete(needed) => Err(NomError::IncompleteInput(needed)),
                nom::Err::Error(err) => Err(NomError::Error(format!("{err:?}"))),
                nom::Err::Failure(err) => Err(NomError::Failure(format!("{err:?}"))),
            },
        }
    }
}
