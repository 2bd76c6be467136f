use std::sync::OnceLock;

use regex::Regex;

/// Default upload limit, 2 MiB
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Prefix of every suggested object key
pub const KEY_PREFIX: &str = "dresses";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("No se proporcionó ningún archivo")]
    Empty,

    #[error("El archivo supera los {limit_mb}MB")]
    TooLarge { size: usize, limit_mb: usize },

    #[error("Formato de archivo no válido")]
    UnsupportedType(String),
}

impl UploadError {
    /// Human-readable detail line for the error payload
    pub fn details(&self) -> String {
        match self {
            UploadError::Empty => "El cuerpo de la solicitud está vacío".to_string(),
            UploadError::TooLarge { size, limit_mb } => format!(
                "Tamaño actual: {:.2}MB, Máximo: {}MB",
                *size as f64 / 1024.0 / 1024.0,
                limit_mb
            ),
            UploadError::UnsupportedType(received) => format!(
                "Formato recibido: {}, Formatos válidos: {}",
                received,
                ALLOWED_CONTENT_TYPES.join(", ")
            ),
        }
    }
}

/// Media type without parameters, lowercased
pub fn normalize_content_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or_default().trim().to_lowercase()
}

/// Size first, then type; an empty body is rejected before either
pub fn validate_upload(content_type: &str, size: usize, max_bytes: usize) -> Result<(), UploadError> {
    if size == 0 {
        return Err(UploadError::Empty);
    }
    if size > max_bytes {
        return Err(UploadError::TooLarge {
            size,
            limit_mb: (max_bytes / (1024 * 1024)).max(1),
        });
    }
    let media_type = normalize_content_type(content_type);
    if !ALLOWED_CONTENT_TYPES.contains(&media_type.as_str()) {
        return Err(UploadError::UnsupportedType(media_type));
    }
    Ok(())
}

fn unsafe_chars() -> Result<&'static Regex, regex::Error> {
    static UNSAFE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    UNSAFE
        .get_or_init(|| Regex::new(r"[^a-zA-Z0-9.\-]"))
        .as_ref()
        .map_err(Clone::clone)
}

/// Object key for an uploaded file: `dresses/{millis}-{name}` with every
/// character outside `[a-zA-Z0-9.-]` replaced by `_`
pub fn storage_key(file_name: &str, millis: i64) -> Result<String, regex::Error> {
    let safe = unsafe_chars()?.replace_all(file_name, "_");
    Ok(format!("{}/{}-{}", KEY_PREFIX, millis, safe))
}
