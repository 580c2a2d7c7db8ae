use core::fmt;
use std::{
    ops::{Add, AddAssign},
    str::FromStr,
};

use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::{char, one_of},
    combinator::map_res,
    sequence::preceded,
    IResult, Parser,
};

use super::TimeError;
use crate::util::IResultExt;

const SEC: i64 = 1000;
const MIN: i64 = 60 * SEC;
const HOUR: i64 = 60 * MIN;

/// Define a time in milliseconds
///
/// The value may go below zero after an offset is applied, but it is always
/// displayed clamped to `00:00:00,000`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(i64);

impl TimePoint {
    /// The `00:00:00,000` time point.
    pub const ZERO: Self = Self(0);

    /// Create a `TimePoint` from miliseconds
    #[must_use]
    pub const fn from_msecs(time: i64) -> Self {
        Self(time)
    }

    /// Number of milliseconds of this time point.
    #[must_use]
    pub const fn msecs(self) -> i64 {
        self.0
    }

    /// Parse a timecode of the form `[HH:]MM:SS,mmm` or `[HH:]MM:SS.mmm`.
    ///
    /// # Errors
    ///
    /// Will return `TimeError::InvalidTimecode` if the text does not match the pattern
    /// exactly (two digits for hours, minutes and seconds, three for milliseconds).
    pub fn parse(text: &str) -> Result<Self, TimeError> {
        let text = text.trim();
        timecode(text)
            .to_result_no_rest()
            .map_err(|source| TimeError::InvalidTimecode {
                text: text.into(),
                source,
            })
    }

    /// Write the time point as `HH:MM:SS<separator>mmm`.
    /// Negative values are written as zero.
    ///
    /// # Errors
    ///
    /// Will return `Err` if writing in the formatter failed.
    pub fn fmt_separator(&self, f: &mut fmt::Formatter<'_>, separator: char) -> fmt::Result {
        let t = if self.0 < 0 { Self::ZERO } else { *self };
        write!(
            f,
            "{:02}:{:02}:{:02}{separator}{:03}",
            t.hours(),
            t.mins_comp(),
            t.secs_comp(),
            t.msecs_comp()
        )
    }

    const fn secs(self) -> i64 {
        self.0 / SEC
    }

    const fn mins(self) -> i64 {
        self.0 / MIN
    }

    const fn hours(self) -> i64 {
        self.0 / HOUR
    }

    const fn mins_comp(self) -> i64 {
        self.mins() % 60
    }

    const fn secs_comp(self) -> i64 {
        self.secs() % 60
    }

    const fn msecs_comp(self) -> i64 {
        self.0 % SEC
    }
}

/// Parse exactly two decimal digits.
fn two_digits(input: &str) -> IResult<&str, i64> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
        str::parse::<i64>,
    )
    .parse(input)
}

/// Parse the fractional part, `,` or `.` followed by three digits.
fn fraction(input: &str) -> IResult<&str, i64> {
    preceded(
        one_of(",."),
        map_res(
            take_while_m_n(3, 3, |c: char| c.is_ascii_digit()),
            str::parse::<i64>,
        ),
    )
    .parse(input)
}

/// Parse a full timecode, the hours group being optional.
fn timecode(input: &str) -> IResult<&str, TimePoint> {
    let with_hours = (
        two_digits,
        preceded(char(':'), two_digits),
        preceded(char(':'), two_digits),
        fraction,
    );
    let without_hours = (two_digits, preceded(char(':'), two_digits), fraction);

    alt((
        with_hours,
        without_hours.map(|(mins, secs, msecs)| (0, mins, secs, msecs)),
    ))
    .map(|(hours, mins, secs, msecs)| {
        TimePoint(hours * HOUR + mins * MIN + secs * SEC + msecs)
    })
    .parse(input)
}

impl FromStr for TimePoint {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add<i64> for TimePoint {
    type Output = Self;
    fn add(self, msecs: i64) -> Self {
        Self(self.0 + msecs)
    }
}

impl AddAssign<i64> for TimePoint {
    fn add_assign(&mut self, msecs: i64) {
        self.0 += msecs;
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_separator(f, ',')
    }
}
