//! Locale rules used for numeric parsing, number stringification and case folding.
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: Cow<'static, str>,
    decimal: char,
    group: char,
    turkic: bool,
}

impl Default for Locale {
    fn default() -> Self { Self::INVARIANT }
}

// (tag, decimal separator, group separator, turkic casing)
const KNOWN: &[(&str, char, char, bool)] = &[
    ("en", '.', ',', false),
    ("en-US", '.', ',', false),
    ("en-GB", '.', ',', false),
    ("de", ',', '.', false),
    ("de-DE", ',', '.', false),
    ("de-CH", '.', '\'', false),
    ("fr", ',', '\u{202F}', false),
    ("fr-FR", ',', '\u{202F}', false),
    ("es", ',', '.', false),
    ("es-ES", ',', '.', false),
    ("it", ',', '.', false),
    ("it-IT", ',', '.', false),
    ("nl", ',', '.', false),
    ("nl-NL", ',', '.', false),
    ("pt-BR", ',', '.', false),
    ("ru", ',', '\u{00A0}', false),
    ("ru-RU", ',', '\u{00A0}', false),
    ("tr", ',', '.', true),
    ("tr-TR", ',', '.', true),
    ("az", ',', '.', true),
];

impl Locale {
    /// Locale-neutral rules: `.` decimal point, `,` grouping, plain Unicode casing.
    pub const INVARIANT: Locale = Locale {
        tag: Cow::Borrowed(""),
        decimal: '.',
        group: ',',
        turkic: false,
    };

    /// Look up a locale by tag (case-insensitive, `_` accepted for `-`).
    /// The empty tag and `invariant` name the invariant locale.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let wanted = tag.trim().replace('_', "-");
        if wanted.is_empty() || wanted.eq_ignore_ascii_case("invariant") {
            return Some(Self::INVARIANT);
        }
        KNOWN
            .iter()
            .find(|(t, ..)| t.eq_ignore_ascii_case(&wanted))
            .map(|&(t, decimal, group, turkic)| Locale { tag: Cow::Borrowed(t), decimal, group, turkic })
    }

    pub fn tag(&self) -> &str { &self.tag }
    pub fn decimal_separator(&self) -> char { self.decimal }
    pub fn group_separator(&self) -> char { self.group }

    pub fn to_lower(&self, s: &str) -> String {
        if !self.turkic {
            return s.to_lowercase();
        }
        s.chars()
            .flat_map(|c| match c {
                'I' => 'ı'.to_lowercase(),
                'İ' => 'i'.to_lowercase(),
                other => other.to_lowercase(),
            })
            .collect()
    }

    pub fn to_upper(&self, s: &str) -> String {
        if !self.turkic {
            return s.to_uppercase();
        }
        s.chars()
            .flat_map(|c| match c {
                'i' => 'İ'.to_uppercase(),
                'ı' => 'I'.to_uppercase(),
                other => other.to_uppercase(),
            })
            .collect()
    }

    pub fn eq_ignore_case(&self, a: &str, b: &str) -> bool {
        a == b || self.to_lower(a) == self.to_lower(b)
    }

    /// Rewrite a localized numeral into the `.`-decimal form Rust parsers accept.
    /// Group separators are dropped only when `allow_group` is set; a stray one is
    /// left in place so the parse fails.
    pub fn delocalize_number<'a>(&self, s: &'a str, allow_group: bool) -> Cow<'a, str> {
        let s = s.trim();
        if self.decimal == '.' && !(allow_group && s.contains(self.group)) {
            return Cow::Borrowed(s);
        }
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            if c == self.group && allow_group {
                continue;
            }
            if c == self.decimal {
                out.push('.');
            } else if c == '.' && self.decimal != '.' {
                // '.' is not a decimal point here; keep it invalid
                out.push('\u{FFFD}');
            } else {
                out.push(c);
            }
        }
        Cow::Owned(out)
    }

    /// Render a float with this locale's decimal separator and no grouping.
    pub fn format_float(&self, f: f64) -> String {
        let s = f.to_string();
        if self.decimal == '.' { s } else { s.replace('.', &self.decimal.to_string()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_resolve_loosely() {
        assert_eq!(Locale::from_tag("de_de").map(|l| l.decimal_separator()), Some(','));
        assert_eq!(Locale::from_tag(""), Some(Locale::INVARIANT));
        assert_eq!(Locale::from_tag("Invariant"), Some(Locale::INVARIANT));
        assert!(Locale::from_tag("xx-YY").is_none());
    }

    #[test]
    fn turkic_casing() {
        let tr = Locale::from_tag("tr-TR").unwrap();
        assert_eq!(tr.to_lower("ID"), "ıd");
        assert_eq!(tr.to_upper("id"), "İD");
        assert_eq!(Locale::INVARIANT.to_lower("ID"), "id");
        assert!(!tr.eq_ignore_case("ID", "id"));
        assert!(Locale::INVARIANT.eq_ignore_case("ID", "id"));
    }

    #[test]
    fn delocalizes_numbers() {
        let de = Locale::from_tag("de-DE").unwrap();
        assert_eq!(de.delocalize_number("1.234,5", true), "1234.5");
        assert_eq!(de.delocalize_number("1,5", false), "1.5");
        assert!(de.delocalize_number("1.5", false).parse::<f64>().is_err());
        assert_eq!(Locale::INVARIANT.delocalize_number(" 1,234.5 ", true), "1234.5");
        assert_eq!(Locale::INVARIANT.delocalize_number("1,234", false), "1,234");
        assert_eq!(de.format_float(2.25), "2,25");
    }
}
