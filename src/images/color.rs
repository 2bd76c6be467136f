// Dominant color detection over raw image bytes
//
// This is a byte-level heuristic, not a decoder: it averages every 100th
// byte triple in the head of the file and snaps the result to a fixed
// palette. Good enough to pre-fill the color field of a new dress.

use serde::Serialize;
use utoipa::ToSchema;

/// Only the first bytes of the file are sampled
pub const SAMPLE_WINDOW: usize = 10_000;

pub const SAMPLE_STRIDE: usize = 100;

/// Returned when nothing can be sampled
pub const FALLBACK_COLOR: &str = "Negro";

/// Returned by `color_hex` for names it does not know
pub const UNKNOWN_HEX: &str = "#CCCCCC";

/// Detection palette, in tie-breaking order
pub const PALETTE: [(&str, Rgb); 9] = [
    ("Rojo", Rgb::new(255, 0, 0)),
    ("Azul", Rgb::new(0, 0, 255)),
    ("Amarillo", Rgb::new(255, 255, 0)),
    ("Verde", Rgb::new(0, 255, 0)),
    ("Naranja", Rgb::new(255, 165, 0)),
    ("Morado", Rgb::new(128, 0, 128)),
    ("Rosa", Rgb::new(255, 192, 203)),
    ("Negro", Rgb::new(0, 0, 0)),
    ("Blanco", Rgb::new(255, 255, 255)),
];

/// Display hex codes of the storefront's named colors
const COLOR_HEX: [(&str, &str); 16] = [
    ("Rojo", "#EF4444"),
    ("Azul", "#3B82F6"),
    ("Amarillo", "#EAB308"),
    ("Blanco", "#FFFFFF"),
    ("Negro", "#000000"),
    ("Verde", "#10B981"),
    ("Naranja", "#F97316"),
    ("Morado", "#8B5CF6"),
    ("Rosa", "#EC4899"),
    ("Vino", "#722F37"),
    ("Dorado", "#D4AF37"),
    ("Plateado", "#9CA3AF"),
    ("Beige", "#D4B896"),
    ("Coral", "#FF7F50"),
    ("Turquesa", "#06B6D4"),
    ("Lavanda", "#A78BFA"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance; ordering matches the true distance
    fn distance_sq(&self, other: &Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// Floor-averaged color of the sampled triples, None when the buffer is
/// too short to yield one
pub fn average_sample(bytes: &[u8]) -> Option<Rgb> {
    let (mut r, mut g, mut b, mut count) = (0u64, 0u64, 0u64, 0u64);

    for i in (0..bytes.len().min(SAMPLE_WINDOW)).step_by(SAMPLE_STRIDE) {
        if i + 2 < bytes.len() {
            r += bytes[i] as u64;
            g += bytes[i + 1] as u64;
            b += bytes[i + 2] as u64;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some(Rgb::new(
        (r / count) as u8,
        (g / count) as u8,
        (b / count) as u8,
    ))
}

/// Closest palette entry; on a tie the earlier entry wins
pub fn nearest_color(color: Rgb) -> &'static str {
    let mut best = FALLBACK_COLOR;
    let mut best_distance = u32::MAX;
    for (name, rgb) in PALETTE.iter() {
        let distance = color.distance_sq(rgb);
        if distance < best_distance {
            best_distance = distance;
            best = name;
        }
    }
    best
}

pub fn dominant_color(bytes: &[u8]) -> &'static str {
    average_sample(bytes).map(nearest_color).unwrap_or(FALLBACK_COLOR)
}

/// Hex code for a known color name, tried verbatim and then capitalized
pub fn known_color_hex(name: &str) -> Option<&'static str> {
    let lookup = |candidate: &str| {
        COLOR_HEX
            .iter()
            .find(|(known, _)| *known == candidate)
            .map(|(_, hex)| *hex)
    };
    lookup(name).or_else(|| lookup(&capitalize(name)))
}

/// Display hex for any color value: known names, then literal `#` codes,
/// then a neutral gray
pub fn color_hex(name: &str) -> String {
    if name.is_empty() {
        return UNKNOWN_HEX.to_string();
    }
    if let Some(hex) = known_color_hex(name) {
        return hex.to_string();
    }
    if name.starts_with('#') {
        return name.to_string();
    }
    UNKNOWN_HEX.to_string()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
