use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Musical note duration represented as a rational fraction of a whole note.
/// All operations preserve exact ratios; seconds are only computed at the edge.
///
/// Parses from the symbolic forms `"1/4"`, `"1/8d"` (or `"1/8."`) for dotted
/// and `"1/8t"` for triplets. Any reduced `"n/d"` fraction is accepted too, and
/// that is also how a duration formats back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Duration {
    /// Numerator: how many parts
    pub numerator: u32,
    /// Denominator: of what size (4 = quarter, 8 = eighth, etc.)
    pub denominator: u32,
}

impl Duration {
    // Standard note values
    pub const WHOLE: Duration = Duration {
        numerator: 1,
        denominator: 1,
    };
    pub const HALF: Duration = Duration {
        numerator: 1,
        denominator: 2,
    };
    pub const QUARTER: Duration = Duration {
        numerator: 1,
        denominator: 4,
    };
    pub const EIGHTH: Duration = Duration {
        numerator: 1,
        denominator: 8,
    };
    pub const SIXTEENTH: Duration = Duration {
        numerator: 1,
        denominator: 16,
    };
    pub const THIRTY_SECOND: Duration = Duration {
        numerator: 1,
        denominator: 32,
    };

    /// The base values a symbolic duration may name.
    pub const BASES: [Duration; 6] = [
        Duration::WHOLE,
        Duration::HALF,
        Duration::QUARTER,
        Duration::EIGHTH,
        Duration::SIXTEENTH,
        Duration::THIRTY_SECOND,
    ];

    pub const DOTTED_QUARTER: Duration = Duration::QUARTER.dotted();
    pub const DOTTED_EIGHTH: Duration = Duration::EIGHTH.dotted();

    /// Apply a dot: multiply duration by 3/2 (increases by 50%)
    pub const fn dotted(self) -> Self {
        Duration {
            numerator: self.numerator * 3,
            denominator: self.denominator * 2,
        }
        .reduce()
    }

    /// Create a triplet: multiply duration by 2/3
    /// (three notes in the time of two)
    pub const fn triplet(self) -> Self {
        self.tuplet(2, 3)
    }

    /// General tuplet: `played` notes in the time of `in_time_of` notes
    pub const fn tuplet(self, in_time_of: u32, played: u32) -> Self {
        Duration {
            numerator: self.numerator * in_time_of,
            denominator: self.denominator * played,
        }
        .reduce()
    }

    /// [`tuplet`](Self::tuplet) that reports overflow instead of panicking.
    pub const fn checked_tuplet(self, in_time_of: u32, played: u32) -> Option<Self> {
        match (
            self.numerator.checked_mul(in_time_of),
            self.denominator.checked_mul(played),
        ) {
            (Some(numerator), Some(denominator)) => Some(
                Duration {
                    numerator,
                    denominator,
                }
                .reduce(),
            ),
            _ => None,
        }
    }

    /// Compare lengths without overflowing.
    pub fn is_longer_than(&self, other: Duration) -> bool {
        self.numerator as u64 * other.denominator as u64
            > other.numerator as u64 * self.denominator as u64
    }

    /// Reduce the fraction to lowest terms using GCD
    pub const fn reduce(self) -> Self {
        let gcd = const_gcd(self.numerator, self.denominator);
        if gcd == 0 {
            return self;
        }
        Duration {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }

    /// Fraction of a whole note.
    pub fn as_whole_notes(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Length in seconds at `bpm`, counting a quarter note as one beat.
    ///
    /// A whole note is four beats: `seconds = whole_notes * 4 * 60 / bpm`.
    pub fn to_seconds(&self, bpm: f64) -> f64 {
        self.as_whole_notes() * 4.0 * (60.0 / bpm)
    }

    /// Length in MIDI ticks at `ppq` ticks per quarter note, saturating at
    /// `u32::MAX`.
    pub fn to_ticks(&self, ppq: u32) -> u32 {
        let ticks = self.numerator as u64 * 4 * ppq as u64 / self.denominator.max(1) as u64;
        ticks.min(u32::MAX as u64) as u32
    }
}

/// Compute greatest common divisor (Euclidean algorithm)
const fn const_gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid musical duration {0:?} (expected e.g. \"1/4\", \"1/8d\", \"1/8t\")")]
pub struct ParseDurationError(pub String);

impl FromStr for Duration {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDurationError(s.to_string());
        let trimmed = s.trim();

        let (fraction, modifier) = match trimmed.char_indices().last() {
            Some((idx, 'd' | '.')) => (&trimmed[..idx], Some(Modifier::Dotted)),
            Some((idx, 't')) => (&trimmed[..idx], Some(Modifier::Triplet)),
            Some(_) => (trimmed, None),
            None => return Err(err()),
        };

        let (num, den) = fraction.split_once('/').ok_or_else(err)?;
        let numerator: u32 = num.trim().parse().map_err(|_| err())?;
        let denominator: u32 = den.trim().parse().map_err(|_| err())?;
        if numerator == 0 || denominator == 0 {
            return Err(err());
        }

        let base = Duration {
            numerator,
            denominator,
        }
        .reduce();

        match modifier {
            Some(Modifier::Dotted) => base.checked_tuplet(3, 2),
            Some(Modifier::Triplet) => base.checked_tuplet(2, 3),
            None => Some(base),
        }
        .ok_or_else(err)
    }
}

enum Modifier {
    Dotted,
    Triplet,
}

impl TryFrom<String> for Duration {
    type Error = ParseDurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Duration> for String {
    fn from(value: Duration) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reduced = self.reduce();
        write!(f, "{}/{}", reduced.numerator, reduced.denominator)
    }
}
