// Dress photo analysis
//
// Validates uploads and guesses the dress color. Storing the file is the
// caller's job; `storage_key` only suggests where.

pub mod color;
pub mod handlers;
pub mod upload;

pub use color::{color_hex, dominant_color, known_color_hex};
pub use handlers::*;
pub use upload::{storage_key, validate_upload, UploadError, DEFAULT_MAX_IMAGE_BYTES};
