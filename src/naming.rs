//! Name variants tried when matching a declared field name against mapping keys.
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::locale::Locale;

static ACRONYM_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
static WORD_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_\s]+").unwrap());

/// Ordered, de-duplicated candidate keys for `name`:
/// exact, camelCase, lower, snake_case, snake lower, kebab-case, kebab lower,
/// `_name`, `_camelName`, PascalCase.
pub fn name_variants(name: &str, locale: &Locale) -> Vec<String> {
    if name.is_empty() {
        return Vec::new();
    }
    let camel = to_camel_case(name, locale);
    let snake = add_separators(name, "_");
    let kebab = add_separators(name, "-");

    let mut out = IndexSet::new();
    out.insert(name.to_owned());
    out.insert(camel.clone());
    out.insert(locale.to_lower(name));
    out.insert(snake.clone());
    out.insert(locale.to_lower(&snake));
    out.insert(kebab.clone());
    out.insert(locale.to_lower(&kebab));
    out.insert(format!("_{name}"));
    out.insert(format!("_{camel}"));
    out.insert(to_pascal_case(name, locale));
    out.into_iter().collect()
}

/// Split words at case and separator boundaries and join them with `sep`.
pub fn add_separators(name: &str, sep: &str) -> String {
    let s = ACRONYM_BOUNDARY.replace_all(name, "${1}_${2}");
    let s = WORD_BOUNDARY.replace_all(&s, "${1}_${2}");
    SEPARATORS.replace_all(&s, sep).into_owned()
}

pub fn to_pascal_case(name: &str, locale: &Locale) -> String {
    SEPARATORS
        .split(name)
        .filter(|w| !w.is_empty())
        .map(|w| upper_first(w, locale))
        .collect()
}

pub fn to_camel_case(name: &str, locale: &Locale) -> String {
    let pascal = to_pascal_case(name, locale);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => locale.to_lower(&first.to_string()) + chars.as_str(),
        None => pascal,
    }
}

fn upper_first(word: &str, locale: &Locale) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => locale.to_upper(&first.to_string()) + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_follow_case_boundaries() {
        assert_eq!(add_separators("FirstName", "_"), "First_Name");
        assert_eq!(add_separators("HTTPStatusCode", "_"), "HTTP_Status_Code");
        assert_eq!(add_separators("first_name", "-"), "first-name");
        assert_eq!(add_separators("order id", "_"), "order_id");
    }

    #[test]
    fn case_conversions() {
        let inv = Locale::INVARIANT;
        assert_eq!(to_pascal_case("first_name", &inv), "FirstName");
        assert_eq!(to_camel_case("FirstName", &inv), "firstName");
        assert_eq!(to_camel_case("first-name", &inv), "firstName");
    }

    #[test]
    fn variants_are_ordered_and_unique() {
        let v = name_variants("FirstName", &Locale::INVARIANT);
        assert_eq!(
            v,
            [
                "FirstName", "firstName", "firstname", "First_Name", "first_name",
                "First-Name", "first-name", "_FirstName", "_firstName",
            ]
        );
        let v = name_variants("first_name", &Locale::INVARIANT);
        assert_eq!(v[0], "first_name");
        assert_eq!(v[1], "firstName");
        assert!(v.contains(&"FirstName".to_owned()));
        assert!(v.contains(&"first-name".to_owned()));
        assert!(name_variants("", &Locale::INVARIANT).is_empty());
    }
}
