//! HTTP Range request parsing module
//!
//! Only a single `bytes` range is understood. Whitespace is tolerated around
//! `=` and `-`, and both offsets are signed: a negative offset counts from the
//! end of the file. `bytes=-500` therefore selects the last 500 bytes and
//! `bytes=100-` everything from offset 100 on.

use thiserror::Error;

/// Offset used when the client omits the end of the range
const OPEN_END: i64 = -1;

/// Parsed Range request, not yet resolved against a file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    /// First byte, negative means relative to the end of the file
    pub first: i64,
    /// Last byte (inclusive), negative means relative to the end of the file
    pub last: i64,
}

/// Inclusive byte window of a file that is actually transmitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWindow {
    pub first: u64,
    pub last: u64,
}

impl ByteWindow {
    /// Window covering a whole file, `None` for an empty file
    pub const fn whole(size: u64) -> Option<Self> {
        if size == 0 {
            None
        } else {
            Some(Self {
                first: 0,
                last: size - 1,
            })
        }
    }

    /// Number of bytes in the window
    pub const fn length(&self) -> u64 {
        self.last - self.first + 1
    }
}

/// Range header rejection reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// `bytes=0-9,20-29` and friends
    #[error("multiple ranges are not supported")]
    MultipleRanges,
    #[error("malformed Range header")]
    Malformed,
    /// Resolved first offset lies past the resolved last offset
    #[error("range not satisfiable")]
    NotSatisfiable,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=first-last` - Specific range
/// - `bytes=first-` - From first to end
/// - `bytes=-suffix` - Last suffix bytes
/// - `bytes = first - last` - Same as above with whitespace
pub fn parse_range_header(header: &str) -> Result<RangeSpec, RangeError> {
    if header.contains(',') {
        return Err(RangeError::MultipleRanges);
    }

    let rest = header
        .strip_prefix("bytes")
        .and_then(|rest| rest.trim_start().strip_prefix('='))
        .ok_or(RangeError::Malformed)?;

    let (first, rest) = take_integer(rest).ok_or(RangeError::Malformed)?;

    let Some(rest) = rest.trim_start().strip_prefix('-') else {
        return if rest.trim().is_empty() {
            Ok(RangeSpec {
                first,
                last: OPEN_END,
            })
        } else {
            Err(RangeError::Malformed)
        };
    };

    if rest.trim().is_empty() {
        return Ok(RangeSpec {
            first,
            last: OPEN_END,
        });
    }

    let (last, rest) = take_integer(rest).ok_or(RangeError::Malformed)?;
    if !rest.trim().is_empty() {
        return Err(RangeError::Malformed);
    }

    Ok(RangeSpec { first, last })
}

impl RangeSpec {
    /// Resolve negative offsets against `size` and validate the window
    ///
    /// A negative offset wraps exactly once. A suffix longer than the file
    /// starts at offset 0, and a last offset past the end is clamped to the
    /// final byte.
    pub fn resolve(self, size: u64) -> Result<ByteWindow, RangeError> {
        let size = i64::try_from(size).unwrap_or(i64::MAX);

        let mut first = self.first;
        let mut last = self.last;
        if first < 0 {
            first += size;
        }
        if last < 0 {
            last += size;
        }

        let first = first.max(0);
        let last = last.min(size - 1);
        if first > last {
            return Err(RangeError::NotSatisfiable);
        }

        Ok(ByteWindow {
            first: u64::try_from(first).map_err(|_| RangeError::NotSatisfiable)?,
            last: u64::try_from(last).map_err(|_| RangeError::NotSatisfiable)?,
        })
    }
}

/// Split a leading optionally signed decimal integer off `input`
fn take_integer(input: &str) -> Option<(i64, &str)> {
    let input = input.trim_start();
    let sign_len = usize::from(input.starts_with(['+', '-']));
    let digits = input[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }

    let (number, rest) = input.split_at(sign_len + digits);
    number.parse::<i64>().ok().map(|n| (n, rest))
}
