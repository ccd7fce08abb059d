use lazy_static::lazy_static;
use regex::Regex;

/// A normalized lexical unit: a lowercased run of word characters.
pub type Term = String;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\b\w+\b").expect("valid regex");
}

/// Tokenize text into lowercased word terms, in order of appearance.
///
/// Word characters are Unicode letters, digits and underscore; everything
/// else separates terms and is dropped.
pub fn tokenize(text: &str) -> Vec<Term> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}
