use std::cmp::Ordering;

/// Natural string comparison: digit runs compare as numbers, so "g2" sorts
/// before "g10". Letters compare case-insensitively first; case only breaks
/// ties between otherwise equal names.
pub fn alphanum(a: &str, b: &str) -> Ordering {
    let lower_a = a.to_lowercase();
    let lower_b = b.to_lowercase();
    let chunks_a = chunkify(&lower_a);
    let chunks_b = chunkify(&lower_b);

    for (ca, cb) in chunks_a.iter().zip(chunks_b.iter()) {
        if ca == cb {
            continue;
        }
        let ord = if is_digits(ca) && is_digits(cb) {
            compare_numeric(ca, cb)
        } else {
            ca.cmp(cb)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    chunks_a
        .len()
        .cmp(&chunks_b.len())
        .then_with(|| a.cmp(b))
}

/// Splits into alternating runs of digits and non-digits.
fn chunkify(s: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;
    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        if prev_digit.is_some_and(|p| p != digit) {
            chunks.push(&s[start..i]);
            start = i;
        }
        prev_digit = Some(digit);
    }
    if start < s.len() {
        chunks.push(&s[start..]);
    }
    chunks
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// Arbitrary length, no overflow: strip zeros, longer is larger, else lexical.
// "007" and "7" are equal here; the case-aware fallback in `alphanum` settles them.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_by_value() {
        let mut names = vec!["g2", "g10", "g1"];
        names.sort_by(|a, b| alphanum(a, b));
        assert_eq!(names, vec!["g1", "g2", "g10"]);
    }

    #[test]
    fn letters_ignore_case_before_numbers() {
        let mut names = vec!["beta", "Alpha", "alpha2", "alpha10"];
        names.sort_by(|a, b| alphanum(a, b));
        assert_eq!(names, vec!["Alpha", "alpha2", "alpha10", "beta"]);
    }

    #[test]
    fn case_breaks_exact_ties_deterministically() {
        assert_eq!(alphanum("Ops", "ops"), Ordering::Less);
        assert_eq!(alphanum("ops", "Ops"), Ordering::Greater);
        assert_eq!(alphanum("ops", "ops"), Ordering::Equal);
    }

    #[test]
    fn very_long_digit_runs_do_not_overflow() {
        let big = "n123456789012345678901234567890";
        let bigger = "n923456789012345678901234567890";
        assert_eq!(alphanum(big, bigger), Ordering::Less);
        assert_eq!(alphanum("n0009", "n10"), Ordering::Less);
    }
}
