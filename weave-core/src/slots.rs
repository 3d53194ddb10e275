//! `{{slot}}` filling for fragments inserted by the banner and headline passes.
//!
//! Only the first occurrence of a slot is filled. Later copies of the same
//! slot stay in the output as literal text. Existing templates were written
//! against this behaviour, so it is kept until someone decides otherwise.

/// The literal marker for a slot, e.g. `{{page_title}}`.
pub fn slot_marker(slot: &str) -> String {
    format!("{{{{{slot}}}}}")
}

/// Replace the first `{{slot}}` in `text` with `value`.
pub fn fill_slot(text: &str, slot: &str, value: &str) -> String {
    text.replacen(&slot_marker(slot), value, 1)
}

/// Fill each `(slot, value)` pair in order.
///
/// Later pairs see the output of earlier ones, so a value that itself
/// contains a slot marker can be filled by a following pair.
pub fn fill_slots(text: &str, pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .fold(text.to_string(), |acc, (slot, value)| fill_slot(&acc, slot, value))
}
