//! Unicode text helpers shared by searching, sorting and export.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::i18n::Locale;

/// Remove accents: canonical decomposition, then drop combining marks.
#[must_use]
pub fn strip_diacritics(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Case-insensitive substring match. An empty needle matches everything.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    needle_lower.is_empty() || haystack.to_lowercase().contains(needle_lower)
}

/// Compare two strings the way a person reading a list in `locale` expects.
///
/// Letters are compared without accents and case first; accents and then case
/// only break ties. In English and German "Čas" therefore sorts between "Cas"
/// and "Cz". Slovak keeps ä, č, ô, š and ž as letters of their own right after
/// their base letter, and "ch" as one letter after "h", so there "Čas" follows
/// "Cz" and "Chlieb" follows "Hrad".
#[must_use]
pub fn collate(a: &str, b: &str, locale: Locale) -> Ordering {
    primary_key(a, locale)
        .cmp(&primary_key(b, locale))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Primary weight of one letter: its unaccented base, then its rank among the
/// letters sharing that base.
type Weight = (char, u8);

fn primary_key(input: &str, locale: Locale) -> Vec<Weight> {
    let lower: Vec<char> = input.to_lowercase().nfc().collect();
    let mut key = Vec::with_capacity(lower.len());
    let mut chars = lower.into_iter().peekable();
    while let Some(c) = chars.next() {
        if locale == Locale::Sk {
            if c == 'c' && chars.peek() == Some(&'h') {
                chars.next();
                key.push(('h', 1));
                continue;
            }
            if let Some(base) = slovak_letter_base(c) {
                key.push((base, 1));
                continue;
            }
        }
        key.extend(
            std::iter::once(c)
                .nfd()
                .filter(|m| !is_combining_mark(*m))
                .map(|base| (base, 0)),
        );
    }
    key
}

fn slovak_letter_base(c: char) -> Option<char> {
    match c {
        'ä' => Some('a'),
        'č' => Some('c'),
        'ô' => Some('o'),
        'š' => Some('s'),
        'ž' => Some('z'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("Digitálny multimeter"), "Digitalny multimeter");
        assert_eq!(strip_diacritics("Posuvné meradlo"), "Posuvne meradlo");
        assert_eq!(strip_diacritics("Überfällig"), "Uberfallig");
        assert_eq!(strip_diacritics("plain"), "plain");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Fluke 87V", "fluke"));
        assert!(contains_ignore_case("Fluke", ""));
        assert!(!contains_ignore_case("Fluke", "tek"));
    }

    #[test]
    fn test_collate_ignores_accents_first() {
        assert_eq!(collate("Čas", "Dom", Locale::En), Ordering::Less);
        assert_eq!(collate("Cas", "Čas", Locale::En), Ordering::Less);
        assert_eq!(collate("Čas", "Cz", Locale::En), Ordering::Less);
        assert_eq!(collate("apple", "Banana", Locale::En), Ordering::Less);
        assert_eq!(collate("Ärger", "Azur", Locale::De), Ordering::Less);
    }

    #[test]
    fn test_collate_slovak_letters() {
        assert_eq!(collate("Čas", "Cz", Locale::Sk), Ordering::Greater);
        assert_eq!(collate("Čas", "Dom", Locale::Sk), Ordering::Less);
        assert_eq!(collate("Ôsmička", "Ozón", Locale::Sk), Ordering::Greater);
        assert_eq!(collate("Šošovka", "Sz", Locale::Sk), Ordering::Greater);
        assert_eq!(collate("Žiarovka", "Zváranie", Locale::Sk), Ordering::Greater);
        assert_eq!(collate("Äno", "Az", Locale::Sk), Ordering::Greater);
        // Acute accents stay secondary.
        assert_eq!(collate("Ábel", "Ac", Locale::Sk), Ordering::Less);
    }

    #[test]
    fn test_collate_slovak_ch() {
        assert_eq!(collate("Chlieb", "Hrad", Locale::Sk), Ordering::Greater);
        assert_eq!(collate("Chlieb", "Ihla", Locale::Sk), Ordering::Less);
        assert_eq!(collate("Cyklus", "Chlieb", Locale::Sk), Ordering::Less);
        assert_eq!(collate("CHLIEB", "Hz", Locale::Sk), Ordering::Greater);
        assert_eq!(collate("Chlieb", "Hrad", Locale::En), Ordering::Less);
    }

    #[test]
    fn test_collate_sorts_a_list() {
        let mut words = vec!["Hrad", "Čaj", "Chlieb", "Cesta", "Dom"];
        words.sort_by(|a, b| collate(a, b, Locale::Sk));
        assert_eq!(words, ["Cesta", "Čaj", "Dom", "Hrad", "Chlieb"]);
        words.sort_by(|a, b| collate(a, b, Locale::En));
        assert_eq!(words, ["Čaj", "Cesta", "Chlieb", "Dom", "Hrad"]);
    }

    #[test]
    fn test_collate_lowercase_before_uppercase() {
        for locale in [Locale::Sk, Locale::En, Locale::De] {
            assert_eq!(collate("a", "A", locale), Ordering::Less);
            assert_eq!(collate("same", "same", locale), Ordering::Equal);
        }
    }

    #[test]
    fn test_collate_decomposed_input() {
        // "č" written as "c" plus a combining caron.
        assert_eq!(collate("c\u{30c}as", "Cz", Locale::Sk), Ordering::Greater);
    }
}
