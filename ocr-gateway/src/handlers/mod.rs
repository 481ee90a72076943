pub mod download;
pub mod extract;
pub mod fallback;
pub mod health;

pub use download::download_file;
pub use extract::extract_text;
pub use fallback::{download_method_not_allowed, extract_method_not_allowed, route_not_found};
pub use health::{metrics, root, status};
