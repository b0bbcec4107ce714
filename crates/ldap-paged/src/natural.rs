//! Natural-order string comparison
//!
//! Compares strings the way people read them: runs of ASCII digits are
//! compared by numeric value, everything else character by character.
//! `"a2" < "a10" < "b2"`. No locale-dependent primitives are used, so
//! the order is identical on every platform.

use std::cmp::Ordering;

/// Compare two strings in natural order, ignoring case.
///
/// Equivalent in spirit to `strnatcasecmp`: leading whitespace is skipped and
/// letters are compared after lowercasing. Numbers that differ only by
/// leading zeros (`"7"`, `"007"`) compare equal.
pub fn natural_case_cmp(a: &str, b: &str) -> Ordering {
    compare(a, b, true)
}

/// Compare two strings in natural order, respecting case.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    compare(a, b, false)
}

fn compare(a: &str, b: &str, fold_case: bool) -> Ordering {
    let (a, b) = (a.trim_start(), b.trim_start());
    let (mut i, mut j) = (0, 0);

    loop {
        match (a[i..].chars().next(), b[j..].chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = digit_run(&a[i..]);
                let right = digit_run(&b[j..]);
                let ord = compare_numbers(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
                i += left.len();
                j += right.len();
            }
            (Some(x), Some(y)) => {
                let ord = fold(x, fold_case).cmp(&fold(y, fold_case));
                if ord != Ordering::Equal {
                    return ord;
                }
                i += x.len_utf8();
                j += y.len_utf8();
            }
        }
    }
}

fn digit_run(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

/// Compare digit runs by value without parsing, so arbitrarily long runs work.
fn compare_numbers(left: &str, right: &str) -> Ordering {
    let l = left.trim_start_matches('0');
    let r = right.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}

fn fold(c: char, fold_case: bool) -> char {
    if fold_case {
        c.to_lowercase().next().unwrap_or(c)
    } else {
        c
    }
}
