//! Topic pattern matching.
//!
//! Topics are dot-separated (`materials.material-created.v1`); binding
//! patterns may use `*` to match exactly one segment (`materials.*.v1`).

/// Whether `topic` matches the binding `pattern`.
///
/// `*` matches one whole segment; there is no multi-segment wildcard.
/// Matching is exact otherwise — segment counts must agree.
#[must_use]
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let mut pattern_segments = pattern.split('.');
    let mut topic_segments = topic.split('.');

    loop {
        match (pattern_segments.next(), topic_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(t)) => {
                if p != "*" && p != t {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(topic_matches(
            "materials.material-created.v1",
            "materials.material-created.v1"
        ));
        assert!(!topic_matches(
            "materials.material-created.v1",
            "materials.material-created.v2"
        ));
    }

    #[test]
    fn test_single_segment_wildcard() {
        assert!(topic_matches("materials.*.v1", "materials.material-created.v1"));
        assert!(topic_matches("materials.*.v1", "materials.price-changed.v1"));
        assert!(!topic_matches("materials.*.v1", "models.model-created.v1"));
        assert!(!topic_matches("materials.*.v1", "materials.material-created.v2"));
    }

    #[test]
    fn test_wildcard_matches_exactly_one_segment() {
        assert!(!topic_matches("materials.*", "materials.material-created.v1"));
        assert!(!topic_matches("*.v1", "materials.material-created.v1"));
        assert!(topic_matches("*.*.v1", "materials.material-created.v1"));
    }
}
