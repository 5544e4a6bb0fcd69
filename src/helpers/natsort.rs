//! Natural-order string comparison
//!
//! Names are split into runs of ASCII digits and runs of everything else.
//! Digit runs compare by numeric value, other runs compare as plain strings,
//! so `post2.md` sorts before `post10.md`.

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

lazy_static! {
    static ref CHUNK_RE: Regex = Regex::new(r"[0-9]+|[^0-9]+").unwrap();
}

/// Split a string into maximal digit / non-digit runs
pub fn chunkify(s: &str) -> Vec<&str> {
    CHUNK_RE.find_iter(s).map(|m| m.as_str()).collect()
}

/// Returns true if `a` sorts before `b` in natural order
pub fn compare(a: &str, b: &str) -> bool {
    natural_cmp(a, b) == Ordering::Less
}

/// Sort a slice of names in natural order.
///
/// The sort is stable, so names that compare equal (`"01"` and `"1"`)
/// keep their original relative order.
pub fn sort<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

/// Total natural-order comparison of two strings
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let chunks_a = chunkify(a);
    let chunks_b = chunkify(b);

    for (ca, cb) in chunks_a.iter().zip(chunks_b.iter()) {
        let ord = if is_numeric(ca) && is_numeric(cb) {
            numeric_cmp(ca, cb)
        } else {
            ca.cmp(cb)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    // Every shared chunk matched: the one that ran out first is smaller
    chunks_a.len().cmp(&chunks_b.len())
}

fn is_numeric(chunk: &str) -> bool {
    chunk.bytes().all(|b| b.is_ascii_digit())
}

/// Compare two digit runs by value without parsing, so runs longer than
/// any integer type still order correctly.
fn numeric_cmp(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
