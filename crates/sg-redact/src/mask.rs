//! Partial masking of text values.

/// Character used to mask hidden characters.
pub const MASK_CHAR: char = '*';

/// Output for values too short to reveal anything.
pub const MASK_TOKEN: &str = "****";

/// Number of trailing characters left visible.
pub const VISIBLE_SUFFIX: usize = 4;

/// Mask all but the last [`VISIBLE_SUFFIX`] characters of `value`.
///
/// Values of [`VISIBLE_SUFFIX`] characters or fewer become [`MASK_TOKEN`].
/// Longer values keep their length. Counting is by Unicode scalar value.
pub fn mask_text(value: &str) -> String {
    let len = value.chars().count();
    if len <= VISIBLE_SUFFIX {
        return MASK_TOKEN.to_string();
    }

    let hidden = len - VISIBLE_SUFFIX;
    let mut masked: String = std::iter::repeat(MASK_CHAR).take(hidden).collect();
    masked.extend(value.chars().skip(hidden));
    masked
}
