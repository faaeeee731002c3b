//! Expansion of `@`-functions inside command argument text, applied
//! just before the text reaches the buffer.

use std::sync::LazyLock;

use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use regex::{Captures, NoExpand, Regex};

static F_SELECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@sel\(\)").expect("valid pattern"));
static F_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@text\(\)").expect("valid pattern"));
static F_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@expr\((-?\d+) ?([+\-*/]) ?(-?\d+)\)").expect("valid pattern")
});
static F_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@timestamp\(([^)]*)\)").expect("valid pattern"));

/// Expands only `@sel()`. Used where the other functions would not
/// make sense (search queries, clip values, activity specs).
pub fn expand_sel(input: &str, selection: &str) -> String {
    F_SELECTION
        .replace_all(input, NoExpand(selection))
        .into_owned()
}

/// Expands `@sel()`, `@text()`, `@expr(a OP b)` and `@timestamp(FMT)`.
pub fn expand_all(input: &str, selection: &str, full_text: &str) -> String {
    let out = expand_sel(input, selection);
    let out = F_TEXT.replace_all(&out, NoExpand(full_text)).into_owned();
    let out = F_EXPR
        .replace_all(&out, |caps: &Captures<'_>| eval_expr(caps))
        .into_owned();
    F_TIMESTAMP
        .replace_all(&out, |caps: &Captures<'_>| format_timestamp(&caps[1]))
        .into_owned()
}

fn eval_expr(caps: &Captures<'_>) -> String {
    let a: i64 = match caps[1].parse() {
        Ok(v) => v,
        Err(_) => return caps[0].to_string(),
    };
    let b: i64 = match caps[3].parse() {
        Ok(v) => v,
        Err(_) => return caps[0].to_string(),
    };
    let value = match &caps[2] {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" => a.checked_div(b),
        _ => None,
    };
    match value {
        Some(v) => v.to_string(),
        // Overflow or division by zero: leave the token in place.
        None => caps[0].to_string(),
    }
}

fn format_timestamp(fmt: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(fmt).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return format!("@timestamp({fmt})");
    }
    Local::now().format_with_items(items.into_iter()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_sel_is_literal() {
        // '$' in the selection must not be treated as a group reference.
        assert_eq!(expand_sel("<@sel()>", "a$1b"), "<a$1b>");
        assert_eq!(expand_sel("no function here", "x"), "no function here");
    }

    #[test]
    fn test_expand_text() {
        assert_eq!(expand_all("[@text()]", "", "whole buffer"), "[whole buffer]");
    }

    #[test]
    fn test_expr_arithmetic() {
        assert_eq!(expand_all("@expr(1+2)", "", ""), "3");
        assert_eq!(expand_all("@expr(7 - 10)", "", ""), "-3");
        assert_eq!(expand_all("@expr(6*7)", "", ""), "42");
        assert_eq!(expand_all("@expr(9/2)", "", ""), "4");
    }

    #[test]
    fn test_expr_division_by_zero_is_left_in_place() {
        assert_eq!(expand_all("@expr(1/0)", "", ""), "@expr(1/0)");
    }

    #[test]
    fn test_expr_over_selection() {
        assert_eq!(expand_all("@expr(@sel()+1)", "41", ""), "42");
    }

    #[test]
    fn test_timestamp_formats() {
        let out = expand_all("@timestamp(%Y)", "", "");
        assert_eq!(out.len(), 4);
        assert!(out.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_timestamp_bad_format_is_left_in_place() {
        assert_eq!(expand_all("@timestamp(%-)", "", ""), "@timestamp(%-)");
    }
}
