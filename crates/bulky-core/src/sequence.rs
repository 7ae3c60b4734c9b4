use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `%n`, `%0n`, `%00n`, ...: each leading zero widens the field by one.
static SEQUENCE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%(0*)n").expect("sequence token pattern is valid"));

pub fn counter(sequence_index: usize, start: i64, increment: i64) -> i64 {
    let steps = i64::try_from(sequence_index.saturating_sub(1)).unwrap_or(i64::MAX);
    steps.saturating_mul(increment).saturating_add(start)
}

pub fn inject(value: i64, text: &str) -> String {
    if !text.contains('%') {
        return text.to_string();
    }
    SEQUENCE_TOKEN
        .replace_all(text, |caps: &Captures| {
            let width = caps[1].len() + 1;
            format!("{:0width$}", value, width = width)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_widths() {
        assert_eq!(inject(1, "%n"), "1");
        assert_eq!(inject(1, "%0n"), "01");
        assert_eq!(inject(12, "%0n"), "12");
        assert_eq!(inject(1, "%00n"), "001");
        assert_eq!(inject(7, "%0000n"), "00007");
    }

    #[test]
    fn test_inject_wider_value_is_not_truncated() {
        assert_eq!(inject(1234, "%00n"), "1234");
    }

    #[test]
    fn test_inject_multiple_tokens_share_value() {
        assert_eq!(inject(3, "img-%n-of-%00n"), "img-3-of-003");
    }

    #[test]
    fn test_inject_leaves_unknown_sequences() {
        assert_eq!(inject(5, "100% done %x %0 %%n"), "100% done %x %0 %5");
        assert_eq!(inject(5, "no tokens"), "no tokens");
    }

    #[test]
    fn test_counter() {
        assert_eq!(counter(1, 1, 1), 1);
        assert_eq!(counter(4, 1, 1), 4);
        assert_eq!(counter(3, 10, 5), 20);
        assert_eq!(counter(2, 0, -2), -2);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_counter_saturates_on_huge_index() {
        assert_eq!(counter(usize::MAX, 0, 1), i64::MAX);
        assert_eq!(counter(usize::MAX, 5, -1), i64::MIN + 6);
    }
}
