//! Pure classifier-list helpers.
//!
//! Trove classifiers are semi-structured strings such as
//! `"Development Status :: 4 - Beta"` or `"Intended Audience :: Developers"`.
//! Both helpers pick the first matching entry in list order and derive a
//! single display value from it; no validation is done against the known
//! classifier vocabulary.

/// Sentinel returned when the classifier list has no matching entry.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Development status derived from a classifier list.
///
/// Takes the text after the last `-` of the first entry containing
/// `"Development Status"`, trimmed. `["Development Status :: 4 - Beta"]`
/// yields `"Beta"`.
pub fn development_status(classifiers: &[String]) -> String {
    classifiers
        .iter()
        .find(|c| c.contains("Development Status"))
        .map(|c| c.rsplit('-').next().unwrap_or(c.as_str()).trim().to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

/// Intended audience derived from a classifier list.
///
/// Takes the text after the last `::` of the first entry containing
/// `"Intended Audience"`, trimmed. `["Intended Audience :: Developers"]`
/// yields `"Developers"`.
pub fn intended_audience(classifiers: &[String]) -> String {
    classifiers
        .iter()
        .find(|c| c.contains("Intended Audience"))
        .map(|c| c.rsplit("::").next().unwrap_or(c.as_str()).trim().to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_development_status_beta() {
        let classifiers = list(&[
            "Programming Language :: Python :: 3",
            "Development Status :: 4 - Beta",
        ]);
        assert_eq!(development_status(&classifiers), "Beta");
    }

    #[test]
    fn test_development_status_first_match_wins() {
        let classifiers = list(&[
            "Development Status :: 3 - Alpha",
            "Development Status :: 5 - Production/Stable",
        ]);
        assert_eq!(development_status(&classifiers), "Alpha");
    }

    #[test]
    fn test_development_status_absent() {
        let classifiers = list(&["License :: OSI Approved :: MIT License"]);
        assert_eq!(development_status(&classifiers), NOT_SPECIFIED);
    }

    #[test]
    fn test_intended_audience_developers() {
        let classifiers = list(&[
            "Intended Audience :: Developers",
            "Intended Audience :: Science/Research",
        ]);
        assert_eq!(intended_audience(&classifiers), "Developers");
    }

    #[test]
    fn test_intended_audience_absent() {
        assert_eq!(intended_audience(&[]), NOT_SPECIFIED);
    }

    #[test]
    fn test_intended_audience_last_separator() {
        // The value is whatever follows the final `::`, trimmed.
        let classifiers = list(&["Intended Audience :: Other Audience ::  Spaced  "]);
        assert_eq!(intended_audience(&classifiers), "Spaced");
    }
}
