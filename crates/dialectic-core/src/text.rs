//! Text canonicalisation used by fingerprinting and similarity scoring.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Canonical comparable form of `text`.
///
/// Case, diacritics, punctuation, control characters and whitespace layout
/// are erased, so `"  Café, s'il vous plaît!"` and `"cafe sil vous plait"`
/// compare equal. Symbols are content and survive: `"C++"` stays `"c++"`.
/// Lowercasing happens before decomposition: some lowercase mappings (e.g.
/// `İ` → `i̇`) emit combining marks that must be stripped in the same pass
/// for the function to be idempotent.
pub fn normalize(text: &str) -> String {
  let stripped: String = text
    .to_lowercase()
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .filter(|c| !is_punctuation(*c) && !c.is_control())
    .collect();

  stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Characters of the Unicode punctuation categories (`P*`) that turn up in
/// prose: ASCII, Latin-1, General Punctuation and CJK brackets and marks.
/// Math and currency symbols in those blocks are excluded.
fn is_punctuation(c: char) -> bool {
  matches!(
    c,
    '!' | '"' | '#' | '%' | '&' | '\'' | '(' | ')' | '*' | ',' | '-' | '.' | '/' | ':' | ';'
      | '?' | '@' | '[' | '\\' | ']' | '_' | '{' | '}'
      | '¡' | '§' | '«' | '¶' | '·' | '»' | '¿'
      | '\u{2010}'..='\u{2027}'
      | '\u{2030}'..='\u{2043}'
      | '\u{2045}'..='\u{2051}'
      | '\u{2053}'..='\u{205E}'
      | '\u{3001}'..='\u{3003}'
      | '\u{3008}'..='\u{3011}'
      | '\u{3014}'..='\u{301F}'
  )
}
