//! Right-to-left caption handling.
//!
//! libass lays out each caption line left-to-right unless told otherwise.
//! Captions in Hebrew, Arabic and related scripts are wrapped in explicit
//! Unicode embedding marks so punctuation lands on the correct side.

use crate::document::Subtitle;

/// RIGHT-TO-LEFT EMBEDDING.
const RLE: char = '\u{202B}';
/// POP DIRECTIONAL FORMATTING.
const PDF: char = '\u{202C}';

/// Directional controls removed before re-wrapping a line.
const DIRECTIONAL_MARKS: [char; 7] = [
    '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}',
];

/// ASS hard line break.
const ASS_NEWLINE: &str = "\\N";

fn is_right_to_left_letter(c: char) -> bool {
    matches!(c,
        '\u{0590}'..='\u{05FF}'   // Hebrew
        | '\u{0600}'..='\u{06FF}' // Arabic
        | '\u{0700}'..='\u{074F}' // Syriac
        | '\u{0750}'..='\u{077F}' // Arabic Supplement
        | '\u{0780}'..='\u{07BF}' // Thaana
        | '\u{07C0}'..='\u{07FF}' // NKo
        | '\u{08A0}'..='\u{08FF}' // Arabic Extended-A
        | '\u{FB1D}'..='\u{FB4F}' // Hebrew presentation forms
        | '\u{FB50}'..='\u{FDFF}' // Arabic presentation forms A
        | '\u{FE70}'..='\u{FEFF}' // Arabic presentation forms B
    ) && c.is_alphabetic()
}

/// Whether the text contains at least one right-to-left letter.
pub fn contains_right_to_left_letter(text: &str) -> bool {
    text.chars().any(is_right_to_left_letter)
}

/// Whether a script is plausibly written in a right-to-left language.
///
/// True when at least a quarter of the non-empty captions contain a
/// right-to-left letter.
pub fn could_be_right_to_left(subtitle: &Subtitle) -> bool {
    let mut total = 0usize;
    let mut rtl = 0usize;
    for dialogue in subtitle.dialogues() {
        if dialogue.text.trim().is_empty() {
            continue;
        }
        total += 1;
        if contains_right_to_left_letter(&dialogue.text) {
            rtl += 1;
        }
    }
    total > 0 && rtl * 4 >= total
}

/// Wrap every line of a caption in RLE … PDF.
///
/// Existing directional marks are dropped first so repeated application
/// does not nest embeddings.
pub fn fix_rtl_via_unicode_chars(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !DIRECTIONAL_MARKS.contains(c))
        .collect();

    cleaned
        .split(ASS_NEWLINE)
        .map(|line| format!("{RLE}{line}{PDF}"))
        .collect::<Vec<_>>()
        .join(ASS_NEWLINE)
}

/// Apply [`fix_rtl_via_unicode_chars`] to every caption containing a
/// right-to-left letter. Returns how many captions were changed.
pub fn apply_right_to_left(subtitle: &mut Subtitle) -> usize {
    let mut changed = 0;
    for dialogue in subtitle.dialogues_mut() {
        if contains_right_to_left_letter(&dialogue.text) {
            dialogue.text = fix_rtl_via_unicode_chars(&dialogue.text);
            changed += 1;
        }
    }
    changed
}
