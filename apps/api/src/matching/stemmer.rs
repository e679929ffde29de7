//! Porter stemmer with the NLTK default extensions.
//!
//! On top of Martin Porter's 1980 algorithm this applies an irregular-forms
//! table, the four-letter `ies`/`ied` -> `ie` rewrite, the stricter step 1c
//! `y -> i` condition and the extra step 2 rules (`bli`, `fulli`, `lessli`,
//! `logi`, recursive `alli`). Input is expected to be lowercase ASCII; anything
//! else is returned as-is.

/// Suffix, replacement, and the condition the remaining stem must meet.
type Rule = (&'static str, &'static str, fn(&str) -> bool);

/// Reduces a lowercase token to its Porter stem.
pub fn stem(word: &str) -> String {
    if let Some(stem) = irregular_stem(word) {
        return stem.to_string();
    }
    if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()) {
        return word.to_string();
    }

    let word = step1a(word);
    let word = step1b(&word);
    let word = step1c(&word);
    let word = step2(&word);
    let word = step3(&word);
    let word = step4(&word);
    let word = step5a(&word);
    step5b(&word)
}

/// Words the suffix rules get wrong.
fn irregular_stem(word: &str) -> Option<&'static str> {
    let stem = match word {
        "sky" | "skies" => "sky",
        "dying" => "die",
        "lying" => "lie",
        "tying" => "tie",
        "news" => "news",
        "innings" | "inning" => "inning",
        "outings" | "outing" => "outing",
        "cannings" | "canning" => "canning",
        "howe" => "howe",
        "proceed" => "proceed",
        "exceed" => "exceed",
        "succeed" => "succeed",
        _ => return None,
    };
    Some(stem)
}

fn is_consonant(word: &[u8], i: usize) -> bool {
    match word[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(word, i - 1),
        _ => true,
    }
}

/// Number of vowel-consonant transitions.
fn measure(stem: &str) -> usize {
    let b = stem.as_bytes();
    (1..b.len())
        .filter(|&i| !is_consonant(b, i - 1) && is_consonant(b, i))
        .count()
}

fn has_positive_measure(stem: &str) -> bool {
    measure(stem) > 0
}

fn has_measure_above_one(stem: &str) -> bool {
    measure(stem) > 1
}

fn contains_vowel(stem: &str) -> bool {
    let b = stem.as_bytes();
    (0..b.len()).any(|i| !is_consonant(b, i))
}

fn ends_double_consonant(word: &str) -> bool {
    let b = word.as_bytes();
    let n = b.len();
    n >= 2 && b[n - 1] == b[n - 2] && is_consonant(b, n - 1)
}

/// consonant-vowel-consonant ending where the last letter is not w, x or y.
/// A two-letter vowel-consonant word also counts.
fn ends_cvc(word: &str) -> bool {
    let b = word.as_bytes();
    match b.len() {
        2 => !is_consonant(b, 0) && is_consonant(b, 1),
        n if n >= 3 => {
            is_consonant(b, n - 3)
                && !is_consonant(b, n - 2)
                && is_consonant(b, n - 1)
                && !matches!(b[n - 1], b'w' | b'x' | b'y')
        }
        _ => false,
    }
}

/// Applies the first rule whose suffix matches; `None` when no suffix matches.
/// A matching rule whose condition fails leaves the word unchanged.
fn apply_rules(word: &str, rules: &[Rule]) -> Option<String> {
    rules.iter().find_map(|(suffix, replacement, condition)| {
        word.strip_suffix(suffix).map(|stem| {
            if condition(stem) {
                format!("{stem}{replacement}")
            } else {
                word.to_string()
            }
        })
    })
}

/// Plurals.
fn step1a(word: &str) -> String {
    if word.len() == 4 && word.ends_with("ies") {
        return format!("{}ie", &word[..1]);
    }
    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}i");
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

/// -ed / -ing.
fn step1b(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ied") {
        let replacement = if word.len() == 4 { "ie" } else { "i" };
        return format!("{stem}{replacement}");
    }
    if let Some(stem) = word.strip_suffix("eed") {
        return if has_positive_measure(stem) {
            format!("{stem}ee")
        } else {
            word.to_string()
        };
    }

    let Some(stem) = ["ed", "ing"]
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix))
        .filter(|stem| contains_vowel(stem))
    else {
        return word.to_string();
    };

    for (suffix, replacement) in [("at", "ate"), ("bl", "ble"), ("iz", "ize")] {
        if let Some(base) = stem.strip_suffix(suffix) {
            return format!("{base}{replacement}");
        }
    }
    if ends_double_consonant(stem) {
        let last = stem.len() - 1;
        return match stem.as_bytes()[last] {
            b'l' | b's' | b'z' => stem.to_string(),
            _ => stem[..last].to_string(),
        };
    }
    if measure(stem) == 1 && ends_cvc(stem) {
        format!("{stem}e")
    } else {
        stem.to_string()
    }
}

/// Terminal y -> i after a consonant that is not the first letter.
fn step1c(word: &str) -> String {
    match word.strip_suffix('y') {
        Some(stem) if stem.len() > 1 && is_consonant(stem.as_bytes(), stem.len() - 1) => {
            format!("{stem}i")
        }
        _ => word.to_string(),
    }
}

fn logi_condition(stem: &str) -> bool {
    // the `l` stays with the stem so short stems like geo- still qualify
    has_positive_measure(&format!("{stem}l"))
}

const STEP2_RULES: &[Rule] = &[
    ("ational", "ate", has_positive_measure),
    ("tional", "tion", has_positive_measure),
    ("enci", "ence", has_positive_measure),
    ("anci", "ance", has_positive_measure),
    ("izer", "ize", has_positive_measure),
    ("bli", "ble", has_positive_measure),
    ("alli", "al", has_positive_measure),
    ("entli", "ent", has_positive_measure),
    ("eli", "e", has_positive_measure),
    ("ousli", "ous", has_positive_measure),
    ("ization", "ize", has_positive_measure),
    ("ation", "ate", has_positive_measure),
    ("ator", "ate", has_positive_measure),
    ("alism", "al", has_positive_measure),
    ("iveness", "ive", has_positive_measure),
    ("fulness", "ful", has_positive_measure),
    ("ousness", "ous", has_positive_measure),
    ("aliti", "al", has_positive_measure),
    ("iviti", "ive", has_positive_measure),
    ("biliti", "ble", has_positive_measure),
    ("fulli", "ful", has_positive_measure),
    ("lessli", "less", has_positive_measure),
    ("logi", "log", logi_condition),
];

/// Double suffixes map to single ones.
fn step2(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("alli") {
        if has_positive_measure(stem) {
            return step2(&format!("{stem}al"));
        }
    }
    apply_rules(word, STEP2_RULES).unwrap_or_else(|| word.to_string())
}

const STEP3_RULES: &[Rule] = &[
    ("icate", "ic", has_positive_measure),
    ("ative", "", has_positive_measure),
    ("alize", "al", has_positive_measure),
    ("iciti", "ic", has_positive_measure),
    ("ical", "ic", has_positive_measure),
    ("ful", "", has_positive_measure),
    ("ness", "", has_positive_measure),
];

/// -ic-, -full, -ness etc.
fn step3(word: &str) -> String {
    apply_rules(word, STEP3_RULES).unwrap_or_else(|| word.to_string())
}

fn ion_condition(stem: &str) -> bool {
    has_measure_above_one(stem) && matches!(stem.as_bytes().last(), Some(b's' | b't'))
}

const STEP4_RULES: &[Rule] = &[
    ("al", "", has_measure_above_one),
    ("ance", "", has_measure_above_one),
    ("ence", "", has_measure_above_one),
    ("er", "", has_measure_above_one),
    ("ic", "", has_measure_above_one),
    ("able", "", has_measure_above_one),
    ("ible", "", has_measure_above_one),
    ("ant", "", has_measure_above_one),
    ("ement", "", has_measure_above_one),
    ("ment", "", has_measure_above_one),
    ("ent", "", has_measure_above_one),
    ("ion", "", ion_condition),
    ("ou", "", has_measure_above_one),
    ("ism", "", has_measure_above_one),
    ("ate", "", has_measure_above_one),
    ("iti", "", has_measure_above_one),
    ("ous", "", has_measure_above_one),
    ("ive", "", has_measure_above_one),
    ("ize", "", has_measure_above_one),
];

/// Strips -ant, -ence etc. in context <c>vcvc<v>.
fn step4(word: &str) -> String {
    apply_rules(word, STEP4_RULES).unwrap_or_else(|| word.to_string())
}

/// Removes a final -e when the measure allows it.
fn step5a(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('e') {
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            return stem.to_string();
        }
    }
    word.to_string()
}

/// -ll -> -l on long stems.
fn step5b(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('l') {
        if stem.ends_with('l') && has_measure_above_one(stem) {
            return stem.to_string();
        }
    }
    word.to_string()
}
