pub mod detector;

pub use detector::{is_playlist_url, validate_url};
