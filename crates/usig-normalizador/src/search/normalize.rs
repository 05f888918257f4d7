/// Trims and lowercases raw user input.
///
/// Returns `None` when nothing but whitespace is left, meaning "clear results, do not query".
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only_is_not_eligible() {
        for raw in ["", " ", "\t", "\n  \r\n", "\u{3000}", "\u{a0} "] {
            assert_eq!(normalize(raw), None, "{raw:?} should not be eligible");
        }
    }

    #[test]
    fn test_trims_and_lowercases() {
        assert_eq!(normalize("  Av. Corrientes 1000 "), Some("av. corrientes 1000".into()));
        assert_eq!(normalize("CALLAO Y CÓRDOBA"), Some("callao y córdoba".into()));
    }

    #[test]
    fn test_inner_whitespace_is_preserved() {
        assert_eq!(normalize("corrientes  "), Some("corrientes".into()));
        assert_eq!(normalize("a  b"), Some("a  b".into()));
    }
}
