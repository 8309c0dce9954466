//! Source-site rarity labels mapped to the catalog's canonical vocabulary.
//!
//! Each TCG has its own alias table. Lookups fold case and punctuation so
//! "Super Rare", "super-rare" and "SUPER RARE" all resolve identically. An
//! unrecognized label passes through unchanged so ingestion is never blocked
//! by an unseen rarity; gaps are fixed by extending the table.

use crate::tcg::Tcg;

/// Fold a raw label into a lookup key: lowercase, alphanumerics only.
fn fold(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn canonical(tcg: Tcg, key: &str) -> Option<&'static str> {
    match tcg {
        Tcg::OnePiece => match key {
            "c" | "common" => Some("C"),
            "uc" | "uncommon" => Some("UC"),
            "r" | "rare" => Some("R"),
            "sr" | "superrare" => Some("SR"),
            "sec" | "secretrare" | "secret" => Some("SEC"),
            "l" | "leader" => Some("L"),
            "sp" | "special" | "specialcard" => Some("SP"),
            "tr" | "treasurerare" => Some("TR"),
            "p" | "promo" | "promotional" => Some("P"),
            _ => None,
        },
        Tcg::Pokemon => match key {
            "c" | "common" => Some("C"),
            "u" | "uc" | "uncommon" => Some("U"),
            "r" | "rare" => Some("R"),
            "rr" | "doublerare" => Some("RR"),
            "ar" | "artrare" => Some("AR"),
            "sar" | "specialartrare" | "specialillustrationrare" => Some("SAR"),
            "sr" | "superrare" => Some("SR"),
            "ur" | "ultrarare" | "hyperrare" => Some("UR"),
            "promo" | "p" | "promotional" => Some("P"),
            _ => None,
        },
        Tcg::Lorcana => match key {
            "c" | "common" => Some("C"),
            "u" | "uncommon" => Some("U"),
            "r" | "rare" => Some("R"),
            "sr" | "superrare" => Some("SR"),
            "l" | "legendary" => Some("L"),
            "e" | "enchanted" => Some("E"),
            _ => None,
        },
        Tcg::Riftbound => match key {
            "c" | "common" => Some("C"),
            "u" | "uc" | "uncommon" => Some("U"),
            "r" | "rare" => Some("R"),
            "e" | "epic" => Some("E"),
            "o" | "overnumbered" | "secret" => Some("O"),
            _ => None,
        },
        Tcg::StarWars => match key {
            "c" | "common" => Some("C"),
            "u" | "uncommon" => Some("U"),
            "r" | "rare" => Some("R"),
            "l" | "legendary" => Some("L"),
            "s" | "special" => Some("S"),
            _ => None,
        },
        Tcg::Magic => match key {
            "c" | "common" => Some("C"),
            "u" | "uncommon" => Some("U"),
            "r" | "rare" => Some("R"),
            "m" | "mythic" | "mythicrare" => Some("M"),
            _ => None,
        },
        Tcg::Naruto => match key {
            "c" | "common" => Some("C"),
            "u" | "uc" | "uncommon" => Some("U"),
            "r" | "rare" => Some("R"),
            "sr" | "superrare" => Some("SR"),
            "sec" | "secretrare" => Some("SEC"),
            _ => None,
        },
    }
}

/// Map a source rarity label to the canonical code for `tcg`.
/// Unknown labels are returned unchanged (trimmed), never an error.
pub fn normalize_rarity(tcg: Tcg, raw: &str) -> String {
    let key = fold(raw);
    match canonical(tcg, &key) {
        Some(code) => code.to_string(),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_spelling_is_stable() {
        assert_eq!(
            normalize_rarity(Tcg::OnePiece, "Super Rare"),
            normalize_rarity(Tcg::OnePiece, "super-rare")
        );
        assert_eq!(normalize_rarity(Tcg::OnePiece, "Super Rare"), "SR");
    }

    #[test]
    fn unknown_rarity_passes_through() {
        assert_eq!(
            normalize_rarity(Tcg::OnePiece, "unknown-rarity-xyz"),
            "unknown-rarity-xyz"
        );
    }

    #[test]
    fn tables_are_per_tcg() {
        // "L" is Leader in One Piece but Legendary in Lorcana.
        assert_eq!(normalize_rarity(Tcg::OnePiece, "leader"), "L");
        assert_eq!(normalize_rarity(Tcg::Lorcana, "legendary"), "L");
        // Magic has no SR tier; the label survives untouched.
        assert_eq!(normalize_rarity(Tcg::Magic, "super rare"), "super rare");
    }
}
