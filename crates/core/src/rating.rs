//! Review ratings

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted star rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted star rating.
pub const MAX_RATING: u8 = 5;

/// A star rating outside the accepted range.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("rating {0} is outside {MIN_RATING}..={MAX_RATING}")]
pub struct RatingOutOfRange(pub u8);

/// A single review's star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    /// Validate a star rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingOutOfRange`] when `value` is not between 1 and 5.
    pub const fn new(value: u8) -> Result<Self, RatingOutOfRange> {
        if value < MIN_RATING || value > MAX_RATING {
            return Err(RatingOutOfRange(value));
        }

        Ok(Self(value))
    }

    /// Number of stars.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = RatingOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stars> for u8 {
    fn from(value: Stars) -> Self {
        value.0
    }
}

/// Integer-truncated mean of the given ratings; `0` when there are none.
#[must_use]
pub fn average_rating<I>(ratings: I) -> u8
where
    I: IntoIterator<Item = Stars>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0_u64, 0_u64), |(sum, count), stars| {
            (sum + u64::from(stars.value()), count + 1)
        });

    sum.checked_div(count)
        .and_then(|average| u8::try_from(average).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn single_rating_is_its_own_average() -> TestResult {
        assert_eq!(average_rating([Stars::new(4)?]), 4);

        Ok(())
    }

    #[test]
    fn average_truncates() -> TestResult {
        let ratings = [Stars::new(5)?, Stars::new(4)?, Stars::new(4)?];

        // 13 / 3 = 4.33
        assert_eq!(average_rating(ratings), 4);

        Ok(())
    }

    #[test]
    fn no_ratings_average_to_zero() {
        assert_eq!(average_rating(Vec::new()), 0);
    }

    #[test]
    fn out_of_range_ratings_are_rejected() {
        assert_eq!(Stars::new(0), Err(RatingOutOfRange(0)));
        assert_eq!(Stars::new(6), Err(RatingOutOfRange(6)));
    }
}
