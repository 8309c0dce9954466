//! Known-bad card names from upstream sources, fixed by ordered substring
//! replacement.
//!
//! This is deliberately simple and brittle: it targets concrete defects
//! observed in one upstream database (concatenated honorifics, dropped middle
//! initials), not general text normalization. Order matters: some
//! corrections are substrings of others, so the list is applied first to
//! last and never re-sorted.

use crate::tcg::Tcg;

/// (find, replace) pairs, matched case-insensitively, applied in order.
fn corrections(tcg: Tcg) -> &'static [(&'static str, &'static str)] {
    match tcg {
        Tcg::OnePiece => &[
            // Middle initials dropped by the source database.
            ("monkey d luffy", "Monkey D. Luffy"),
            ("monkey-d-luffy", "Monkey D. Luffy"),
            ("portgas d ace", "Portgas D. Ace"),
            ("marshall d teach", "Marshall D. Teach"),
            // The source concatenates the epithet onto the name.
            ("edward newgatewhitebeard", "Edward Newgate"),
        ],
        Tcg::Naruto => &[
            // Honorifics glued onto the given name.
            ("kakashisensei", "Kakashi-sensei"),
            ("jiraiyasama", "Jiraiya-sama"),
            ("tsunadesama", "Tsunade-sama"),
        ],
        Tcg::Pokemon => &[
            ("farfetchd", "Farfetch'd"),
            ("mr mime", "Mr. Mime"),
            ("mime jr", "Mime Jr."),
        ],
        _ => &[],
    }
}

/// Case-insensitive replacement of every occurrence of `find` in `haystack`.
fn replace_ci(haystack: &str, find: &str, replace: &str) -> String {
    if find.is_empty() {
        return haystack.to_string();
    }
    let lower_hay = haystack.to_lowercase();
    if lower_hay.len() != haystack.len() {
        // Case folding shifted byte offsets (rare non-ASCII forms); exact
        // match only so the slicing below stays aligned.
        return haystack.replace(find, replace);
    }
    let lower_find = find.to_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    while let Some(pos) = lower_hay[cursor..].find(&lower_find) {
        let start = cursor + pos;
        out.push_str(&haystack[cursor..start]);
        out.push_str(replace);
        cursor = start + find.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}

/// Apply the per-TCG correction table to a card name.
pub fn apply_corrections(tcg: Tcg, name: &str) -> String {
    let mut out = name.to_string();
    for (find, replace) in corrections(tcg) {
        out = replace_ci(&out, find, replace);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_missing_middle_initial() {
        assert_eq!(
            apply_corrections(Tcg::OnePiece, "Monkey D Luffy"),
            "Monkey D. Luffy"
        );
    }

    #[test]
    fn match_is_case_insensitive() {
        assert_eq!(
            apply_corrections(Tcg::Naruto, "KAKASHISENSEI"),
            "Kakashi-sensei"
        );
    }

    #[test]
    fn untouched_names_survive() {
        assert_eq!(
            apply_corrections(Tcg::OnePiece, "Roronoa Zoro"),
            "Roronoa Zoro"
        );
        assert_eq!(apply_corrections(Tcg::Magic, "Black Lotus"), "Black Lotus");
    }

    #[test]
    fn replaces_all_occurrences() {
        assert_eq!(
            replace_ci("mr mime and MR MIME", "mr mime", "Mr. Mime"),
            "Mr. Mime and Mr. Mime"
        );
    }
}
