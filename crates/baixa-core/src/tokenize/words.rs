use crate::period::is_month_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordClass {
    Acronym,
    Alpha,
    Numeric,
    Mixed,
    Symbol,
}

fn classify(word: &str) -> WordClass {
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    let digits = word.chars().filter(|c| c.is_ascii_digit()).count();

    match (letters > 0, digits > 0) {
        (true, true) => WordClass::Mixed,
        (false, true) => WordClass::Numeric,
        (true, false) => {
            if word
                .chars()
                .filter(|c| c.is_alphabetic())
                .all(char::is_uppercase)
            {
                WordClass::Acronym
            } else {
                WordClass::Alpha
            }
        }
        (false, false) => WordClass::Symbol,
    }
}

fn is_month_de_pair(left: &str, right: &str) -> bool {
    let month = left.trim_end_matches(|c: char| !c.is_alphabetic());
    is_month_name(month) && right.eq_ignore_ascii_case("de")
}

/// Whether two adjacent words belong to different fields.
///
/// Letters next to digits are split; acronym pairs, numeric pairs and
/// "<month> de" pairs stay together.
pub fn should_split(left: &str, right: &str) -> bool {
    if is_month_de_pair(left, right) {
        return false;
    }

    use WordClass::*;
    match (classify(left), classify(right)) {
        (Acronym, Acronym) | (Numeric, Numeric) => false,
        (Mixed, _) | (_, Mixed) => true,
        (Numeric, Alpha | Acronym) | (Alpha | Acronym, Numeric) => true,
        _ => false,
    }
}

/// Re-join each line's words, breaking between pairs that [`should_split`].
pub fn split_word_pairs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut previous: Option<&str> = None;
        for word in line.split_whitespace() {
            if let Some(prev) = previous {
                out.push(if should_split(prev, word) { '\n' } else { ' ' });
            }
            out.push_str(word);
            previous = Some(word);
        }
    }

    out
}
