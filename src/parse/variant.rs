//! Variant/finish tag detection from slug name fragments.
//!
//! Keyword matching over the residual name text, mapped to a small closed set
//! of tags. Unknown keyword combinations fall through to "no variant"; when a
//! source introduces a new treatment the keyword table is extended here.

/// Closed set of print-treatment tags distinguishing alternate printings of
/// the same collector number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantTag {
    /// Alternate artwork of the base card.
    Alt,
    /// Full-art / extended-art frame.
    FullArt,
    /// Textured foil finish.
    FoilTextured,
    /// Parallel (foil) printing of the base art.
    Parallel,
    /// Manga-panel artwork.
    Manga,
    /// Second printing variant ("version 2").
    V2,
}

impl VariantTag {
    /// Short code used in storage paths and number suffixes ("-ALT", "-FA", ...).
    pub fn as_str(self) -> &'static str {
        match self {
            VariantTag::Alt => "ALT",
            VariantTag::FullArt => "FA",
            VariantTag::FoilTextured => "FT",
            VariantTag::Parallel => "PARALLEL",
            VariantTag::Manga => "MANGA",
            VariantTag::V2 => "V2",
        }
    }
}

/// Ordered keyword table; first hit wins. More specific phrases sort before
/// their substrings ("textured-foil" before "foil").
const VARIANT_KEYWORDS: &[(&str, VariantTag)] = &[
    ("alternative-art", VariantTag::Alt),
    ("alternate-art", VariantTag::Alt),
    ("alt-art", VariantTag::Alt),
    ("full-art", VariantTag::FullArt),
    ("foil-textured", VariantTag::FoilTextured),
    ("textured-foil", VariantTag::FoilTextured),
    ("manga-art", VariantTag::Manga),
    ("manga", VariantTag::Manga),
    ("parallel", VariantTag::Parallel),
    ("version-2", VariantTag::V2),
    ("-v2", VariantTag::V2),
];

/// Scan a slug name fragment for a known variant keyword.
///
/// Returns None for ambiguous or unseen keyword combinations; the caller
/// treats that as the base printing.
pub fn detect_variant(name_fragment: &str) -> Option<VariantTag> {
    let hay = name_fragment.to_ascii_lowercase();
    for (keyword, tag) in VARIANT_KEYWORDS {
        if hay.contains(keyword) {
            return Some(*tag);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_alternative_art() {
        assert_eq!(
            detect_variant("prb01-alternative-art-edward-newgate"),
            Some(VariantTag::Alt)
        );
    }

    #[test]
    fn specific_phrase_beats_substring() {
        assert_eq!(
            detect_variant("foil-textured-shanks"),
            Some(VariantTag::FoilTextured)
        );
        assert_eq!(
            detect_variant("textured-foil-shanks"),
            Some(VariantTag::FoilTextured)
        );
    }

    #[test]
    fn unknown_keywords_fall_through() {
        assert_eq!(detect_variant("holographic-rainbow-zoro"), None);
        assert_eq!(detect_variant("roronoa-zoro"), None);
    }
}
