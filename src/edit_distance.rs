/// Levenshtein edit distance between `a` and `b`.
///
/// Unit cost for insertion, deletion and substitution, compared per `char`.
/// Case-sensitive: callers lowercase both sides when they want otherwise.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rows of the (len(a)+1) x (len(b)+1) table
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j]
            } else {
                1 + prev[j + 1].min(curr[j]).min(prev[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// True when `a` and `b` are at most `max` edits apart.
pub fn within(a: &str, b: &str, max: usize) -> bool {
    // Length difference is a lower bound on the distance
    let (la, lb) = (a.chars().count(), b.chars().count());
    if la.abs_diff(lb) > max {
        return false;
    }
    distance(a, b) <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_distances() {
        assert_eq!(distance("kitten", "sitting"), 3);
        assert_eq!(distance("", "abc"), 3);
        assert_eq!(distance("abc", ""), 3);
        assert_eq!(distance("abc", "abc"), 0);
        assert_eq!(distance("", ""), 0);
        assert_eq!(distance("paypa1.com", "paypal.com"), 1);
        assert_eq!(distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("kitten", "sitting"),
            ("amazon.com", "arnazon.com"),
            ("", "xyz"),
            ("micros0ft.com", "microsoft.com"),
            ("a", "b"),
        ];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(distance("PayPal", "paypal"), 2);
    }

    #[test]
    fn test_multibyte_chars_count_once() {
        // Cyrillic 'а' in place of Latin 'a'
        assert_eq!(distance("pаypal", "paypal"), 1);
    }

    #[test]
    fn test_within() {
        assert!(within("paypa1.com", "paypal.com", 2));
        assert!(within("paypal.com", "paypal.com", 2));
        assert!(!within("evil.ru", "paypal.com", 2));
        assert!(!within("ab", "abcdef", 2));
    }
}
