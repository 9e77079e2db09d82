// src/services/slug.rs
// DOCUMENTATION: URL slugs for businesses, categories, cities and countries

/// Lower-case ASCII slug: alphanumeric runs joined by single dashes
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch.is_ascii_punctuation() {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// First of `base`, `base-2`, `base-3`, ... not present in `taken`
pub fn unique_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }

    let mut suffix = 2;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !taken.iter().any(|s| *s == candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Café  Atlas & Sons!"), "caf-atlas-sons");
        assert_eq!(slugify("  --Dar El Beida-- "), "dar-el-beida");
        assert_eq!(slugify("Plumbing 24/7"), "plumbing-24-7");
        assert_eq!(slugify("مطعم"), "item");
    }

    #[test]
    fn test_unique_slug() {
        let taken = vec!["atlas".to_string(), "atlas-2".to_string()];
        assert_eq!(unique_slug("atlas", &taken), "atlas-3");
        assert_eq!(unique_slug("atlas-cafe", &taken), "atlas-cafe");
        assert_eq!(unique_slug("x", &[]), "x");
    }
}
