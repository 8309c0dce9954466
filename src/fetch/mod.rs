pub mod client;
pub mod detail;
pub mod listing;

pub use client::{build_client, get_bytes, get_html, pace};
pub use detail::{resolve_detail, DetailData};
pub use listing::{collect_candidates, Candidate, ListingScan};
