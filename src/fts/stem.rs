//! English Porter2 (Snowball "english") stemming.
//!
//! The state machine below is a direct rendition of the 2005 Snowball
//! definition: prologue (apostrophes, consonant-y marking, R1/R2), steps
//! 0-5, and the two exception lists. Atomic phrase tokens bypass stemming
//! entirely. Results are memoized process-wide; the same word is stemmed
//! once and reused by every index generation.

use dashmap::DashMap;
use std::sync::LazyLock;

use super::text::is_atomic_phrase;

static STEM_CACHE: LazyLock<DashMap<String, String>> = LazyLock::new(DashMap::new);

/// Stem a lowercased token.
pub fn stem(word: &str) -> String {
    if is_atomic_phrase(word) {
        return word.to_string();
    }
    if let Some(hit) = STEM_CACHE.get(word) {
        return hit.value().clone();
    }
    let stemmed = porter2(word);
    STEM_CACHE.insert(word.to_string(), stemmed.clone());
    stemmed
}

/// Irregular forms handled before the algorithm proper.
const EXCEPTIONS: &[(&str, &str)] = &[
    ("skis", "ski"),
    ("skies", "sky"),
    ("dying", "die"),
    ("lying", "lie"),
    ("tying", "tie"),
    ("idly", "idl"),
    ("gently", "gentl"),
    ("ugly", "ugli"),
    ("early", "earli"),
    ("only", "onli"),
    ("singly", "singl"),
    ("sky", "sky"),
    ("news", "news"),
    ("howe", "howe"),
    ("atlas", "atlas"),
    ("cosmos", "cosmos"),
    ("bias", "bias"),
    ("andes", "andes"),
];

/// Forms left alone after step 1a.
const EXCEPTIONS_POST_1A: &[&str] = &[
    "inning", "outing", "canning", "herring", "earring", "proceed", "exceed", "succeed",
];

// Suffix tables, longest first so a linear scan finds the longest match.
const STEP2: &[(&str, &str)] = &[
    ("ization", "ize"),
    ("ational", "ate"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("iveness", "ive"),
    ("tional", "tion"),
    ("biliti", "ble"),
    ("lessli", "less"),
    ("entli", "ent"),
    ("ation", "ate"),
    ("alism", "al"),
    ("aliti", "al"),
    ("ousli", "ous"),
    ("iviti", "ive"),
    ("fulli", "ful"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("abli", "able"),
    ("izer", "ize"),
    ("ator", "ate"),
    ("alli", "al"),
    ("bli", "ble"),
    ("ogi", "og"),
    ("li", ""),
];

const STEP3: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("alize", "al"),
    ("icate", "ic"),
    ("iciti", "ic"),
    ("ative", ""),
    ("ical", "ic"),
    ("ness", ""),
    ("ful", ""),
];

const STEP4: &[&str] = &[
    "ement", "ance", "ence", "able", "ible", "ment", "ant", "ent", "ism", "ate", "iti",
    "ous", "ive", "ize", "ion", "al", "er", "ic",
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

fn is_double(c: char) -> bool {
    matches!(c, 'b' | 'd' | 'f' | 'g' | 'm' | 'n' | 'p' | 'r' | 't')
}

fn valid_li_ending(c: char) -> bool {
    matches!(c, 'c' | 'd' | 'e' | 'g' | 'h' | 'k' | 'm' | 'n' | 'r' | 't')
}

fn ends_with(word: &[char], suffix: &str) -> bool {
    let n = word.len();
    let m = suffix.chars().count();
    m <= n && word[n - m..].iter().copied().eq(suffix.chars())
}

/// Position after the first non-vowel that follows a vowel, scanning from
/// `start`; the word length when there is no such letter.
fn region_after(word: &[char], start: usize) -> usize {
    let mut i = start;
    while i < word.len() && !is_vowel(word[i]) {
        i += 1;
    }
    while i < word.len() && is_vowel(word[i]) {
        i += 1;
    }
    if i < word.len() {
        i + 1
    } else {
        word.len()
    }
}

/// Does `word` end in a short syllable?
fn ends_short_syllable(word: &[char]) -> bool {
    let n = word.len();
    if n == 2 {
        return is_vowel(word[0]) && !is_vowel(word[1]);
    }
    if n >= 3 {
        return !is_vowel(word[n - 3])
            && is_vowel(word[n - 2])
            && !is_vowel(word[n - 1])
            && !matches!(word[n - 1], 'w' | 'x' | 'Y');
    }
    false
}

/// A word is short when it ends in a short syllable and R1 is empty.
fn is_short(word: &[char], r1: usize) -> bool {
    r1 >= word.len() && ends_short_syllable(word)
}

fn has_vowel(word: &[char]) -> bool {
    word.iter().any(|&c| is_vowel(c))
}

fn porter2(input: &str) -> String {
    let trimmed = input.strip_prefix('\'').unwrap_or(input);
    if trimmed.chars().count() <= 2 {
        return trimmed.to_string();
    }
    if let Some((_, out)) = EXCEPTIONS.iter().find(|(w, _)| *w == trimmed) {
        return out.to_string();
    }

    let mut word: Vec<char> = trimmed.chars().collect();

    // Step 0: longest apostrophe suffix.
    if ends_with(&word, "'s'") {
        word.truncate(word.len() - 3);
    } else if ends_with(&word, "'s") {
        word.truncate(word.len() - 2);
    } else if ends_with(&word, "'") {
        word.truncate(word.len() - 1);
    }

    // Mark consonant y as Y so it is excluded from vowel tests.
    if word[0] == 'y' {
        word[0] = 'Y';
    }
    for i in 1..word.len() {
        if word[i] == 'y' && is_vowel(word[i - 1]) {
            word[i] = 'Y';
        }
    }

    let prefix: String = word.iter().collect();
    let r1 = if prefix.starts_with("gener") || prefix.starts_with("arsen") {
        5
    } else if prefix.starts_with("commun") {
        6
    } else {
        region_after(&word, 0)
    };
    let r2 = region_after(&word, r1);

    // Step 1a.
    if ends_with(&word, "sses") {
        word.truncate(word.len() - 2);
    } else if ends_with(&word, "ied") || ends_with(&word, "ies") {
        if word.len() > 4 {
            word.truncate(word.len() - 2);
        } else {
            word.truncate(word.len() - 1);
        }
    } else if ends_with(&word, "us") || ends_with(&word, "ss") {
        // leave alone
    } else if ends_with(&word, "s") {
        // delete when a vowel occurs before the letter preceding the s
        if word.len() >= 3 && has_vowel(&word[..word.len() - 2]) {
            word.truncate(word.len() - 1);
        }
    }

    let current: String = word.iter().collect();
    if EXCEPTIONS_POST_1A.contains(&current.as_str()) {
        return current;
    }

    // Step 1b.
    let suffix_1b = ["eedly", "ingly", "edly", "eed", "ing", "ed"]
        .into_iter()
        .find(|s| ends_with(&word, s));
    match suffix_1b {
        Some(s @ ("eedly" | "eed")) => {
            let start = word.len() - s.len();
            if start >= r1 {
                // eed(ly) -> ee
                word.truncate(start + 2);
            }
        }
        Some(s) => {
            let start = word.len() - s.len();
            if has_vowel(&word[..start]) {
                word.truncate(start);
                if ends_with(&word, "at") || ends_with(&word, "bl") || ends_with(&word, "iz") {
                    word.push('e');
                } else if word.len() >= 2
                    && word[word.len() - 1] == word[word.len() - 2]
                    && is_double(word[word.len() - 1])
                {
                    word.truncate(word.len() - 1);
                } else if is_short(&word, r1) {
                    word.push('e');
                }
            }
        }
        None => {}
    }

    // Step 1c: y -> i after a non-vowel that is not the first letter.
    let n = word.len();
    if n > 2 && matches!(word[n - 1], 'y' | 'Y') && !is_vowel(word[n - 2]) {
        word[n - 1] = 'i';
    }

    // Step 2 (longest matching suffix, applied when it lies in R1).
    if let Some((suffix, replacement)) = STEP2.iter().find(|(s, _)| ends_with(&word, s)) {
        let start = word.len() - suffix.len();
        if start >= r1 {
            let preceding = if start > 0 { Some(word[start - 1]) } else { None };
            let applies = match *suffix {
                "ogi" => preceding == Some('l'),
                "li" => preceding.map(valid_li_ending).unwrap_or(false),
                _ => true,
            };
            if applies {
                word.truncate(start);
                word.extend(replacement.chars());
            }
        }
    }

    // Step 3 (in R1; "ative" additionally requires R2).
    if let Some((suffix, replacement)) = STEP3.iter().find(|(s, _)| ends_with(&word, s)) {
        let start = word.len() - suffix.len();
        let bound = if *suffix == "ative" { r2 } else { r1 };
        if start >= bound {
            word.truncate(start);
            word.extend(replacement.chars());
        }
    }

    // Step 4 (in R2; "ion" only after s or t).
    if let Some(suffix) = STEP4.iter().find(|s| ends_with(&word, s)) {
        let start = word.len() - suffix.len();
        if start >= r2 {
            let applies = match *suffix {
                "ion" => start > 0 && matches!(word[start - 1], 's' | 't'),
                _ => true,
            };
            if applies {
                word.truncate(start);
            }
        }
    }

    // Step 5.
    let n = word.len();
    if n > 0 && word[n - 1] == 'e' {
        if n - 1 >= r2 || (n - 1 >= r1 && !ends_short_syllable(&word[..n - 1])) {
            word.truncate(n - 1);
        }
    } else if n >= 2 && word[n - 1] == 'l' && n - 1 >= r2 && word[n - 2] == 'l' {
        word.truncate(n - 1);
    }

    word.into_iter()
        .map(|c| if c == 'Y' { 'y' } else { c })
        .collect()
}
