//! Collector-number helpers shared by the parser and the storage path builder.

/// Promo numbers use a slash form like "1/P3" and are never zero-padded.
pub fn is_promo_number(number: &str) -> bool {
    number.contains('/')
}

/// Canonical collector number as stored in the database.
///
/// Promo slash-forms pass through unchanged; everything else is trimmed as-is.
/// Zero-padding is a storage-path concern only, never applied here.
pub fn format_card_number(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_promo_number(trimmed) {
        return trimmed.to_string();
    }
    trimmed.to_string()
}

/// Collector number as it appears in object-storage paths.
///
/// Plain numeric values are left-padded to 3 digits ("4" -> "004"); promo
/// slash-forms keep their digits but swap '/' for '-' so the result is a
/// valid single path segment ("1/P3" -> "1-P3").
pub fn pad_for_path(number: &str) -> String {
    let trimmed = number.trim();
    if is_promo_number(trimmed) {
        return trimmed.replace('/', "-");
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return format!("{trimmed:0>3}");
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promo_numbers_pass_through() {
        assert_eq!(format_card_number("1/P3"), "1/P3");
        assert!(is_promo_number("1/P3"));
        assert!(!is_promo_number("143"));
    }

    #[test]
    fn padding_is_path_only() {
        assert_eq!(pad_for_path("4"), "004");
        assert_eq!(pad_for_path("029"), "029");
        assert_eq!(pad_for_path("143"), "143");
        // DB-facing formatting never pads
        assert_eq!(format_card_number("4"), "4");
    }

    #[test]
    fn promo_path_segment_has_no_slash() {
        assert_eq!(pad_for_path("1/P3"), "1-P3");
    }
}
