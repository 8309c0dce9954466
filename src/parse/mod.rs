pub mod number;
pub mod slug;
pub mod variant;

pub use number::{format_card_number, is_promo_number, pad_for_path};
pub use slug::{parse_slug, slug_from_url, CardIdent};
pub use variant::{detect_variant, VariantTag};
