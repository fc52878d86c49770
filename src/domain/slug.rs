//! URL-safe slug generation

use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const SUFFIX_LENGTH: usize = 6;

/// Lowercase, collapse every run of non-alphanumerics to one hyphen, trim hyphens
pub fn slugify(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// `base` plus a random lowercase suffix, used when `base` is already taken
pub fn with_random_suffix(base: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LENGTH)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();

    format!("{}-{}", base, suffix)
}

pub fn is_slug(value: &str) -> bool {
    !value.is_empty() && slugify(value) == value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Platform Team"), "platform-team");
        assert_eq!(slugify("  Ops & Infra!! "), "ops-infra");
        assert_eq!(slugify("jdoe"), "jdoe");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_random_suffix() {
        let slug = with_random_suffix("platform");
        assert!(slug.starts_with("platform-"));
        assert_eq!(slug.len(), "platform-".len() + 6);
        assert!(is_slug(&slug));
    }

    #[test]
    fn test_is_slug() {
        assert!(is_slug("a-b-c"));
        assert!(!is_slug("A-b"));
        assert!(!is_slug("-ab"));
        assert!(!is_slug(""));
    }
}
