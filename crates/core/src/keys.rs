//! Composite document keys and per-scope sequence indices.
//!
//! Cart lines are keyed `{owner}_{sequence}` and orders `{owner}_{item}_{sequence}`.
//! Sequences are computed client-side as one past the largest index already in use
//! within the scope, so they increase monotonically per scope but are not globally
//! unique on their own.

const SEPARATOR: char = '_';

/// Next sequence index after the given existing ones; `1` for an empty scope.
#[must_use]
pub fn next_sequence<I>(existing: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    existing.into_iter().max().map_or(1, |max| max.saturating_add(1))
}

/// Document key for a cart line.
#[must_use]
pub fn cart_line_key(owner: &str, sequence: u64) -> String {
    format!("{owner}{SEPARATOR}{sequence}")
}

/// Document key (and public identifier) for an order.
#[must_use]
pub fn order_key(owner: &str, item: &str, sequence: u64) -> String {
    format!("{owner}{SEPARATOR}{item}{SEPARATOR}{sequence}")
}

/// Trailing numeric sequence of a composite key, if it has one.
#[must_use]
pub fn sequence_suffix(key: &str) -> Option<u64> {
    key.rsplit_once(SEPARATOR)
        .and_then(|(_, suffix)| suffix.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scope_starts_at_one() {
        assert_eq!(next_sequence(std::iter::empty()), 1);
    }

    #[test]
    fn next_sequence_is_one_past_the_maximum() {
        assert_eq!(next_sequence([3, 1, 7, 2]), 8);
    }

    #[test]
    fn gaps_are_not_reused() {
        // Removing line 2 of 1..=3 must not hand out 2 again.
        assert_eq!(next_sequence([1, 3]), 4);
    }

    #[test]
    fn keys_follow_the_composite_layout() {
        assert_eq!(cart_line_key("u1", 4), "u1_4");
        assert_eq!(order_key("u1", "42", 1), "u1_42_1");
    }

    #[test]
    fn suffix_parses_from_the_right() {
        assert_eq!(sequence_suffix("user_with_underscores_42_12"), Some(12));
        assert_eq!(sequence_suffix("u1_42_x"), None);
        assert_eq!(sequence_suffix("plain"), None);
    }
}
