use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Sizes every catalog ships with; these cannot be deleted
pub const DEFAULT_SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];

/// Hex code stored for a color added without one
pub const DEFAULT_HEX_CODE: &str = "#000000";

/// Display order given to operator-added sizes and categories
pub const APPENDED_DISPLAY_ORDER: i32 = 999;

/// Which vocabulary an option belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Color,
    Size,
    Category,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Color => "color",
            OptionKind::Size => "size",
            OptionKind::Category => "category",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            OptionKind::Color => "dress_colors",
            OptionKind::Size => "dress_sizes",
            OptionKind::Category => "dress_categories",
        }
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "color" => Ok(OptionKind::Color),
            "size" => Ok(OptionKind::Size),
            "category" => Ok(OptionKind::Category),
            _ => Err(format!("Invalid option type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ColorOption {
    pub id: Uuid,
    #[schema(example = "Rojo")]
    pub name: String,
    #[schema(example = "#EF4444")]
    pub hex_code: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SizeOption {
    pub id: Uuid,
    #[schema(example = "M")]
    pub name: String,
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CategoryOption {
    pub id: Uuid,
    #[schema(example = "Gala")]
    pub name: String,
    pub display_name: Option<String>,
}

/// A freshly created option of any kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DressOption {
    Color(ColorOption),
    Size(SizeOption),
    Category(CategoryOption),
}

/// Response for GET /api/dress-options
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DressOptions {
    pub colors: Vec<ColorOption>,
    pub sizes: Vec<SizeOption>,
    pub categories: Vec<CategoryOption>,
}

/// Payload for POST /api/dress-options
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddOptionRequest {
    #[serde(rename = "type")]
    #[schema(example = "color")]
    pub kind: Option<String>,
    #[schema(example = "Turquesa")]
    pub name: Option<String>,
    #[schema(example = "#06B6D4")]
    pub hex_code: Option<String>,
}

/// Payload for DELETE /api/dress-options
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteOptionRequest {
    #[serde(rename = "type")]
    #[schema(example = "size")]
    pub kind: Option<String>,
    #[schema(example = "XXXL")]
    pub name: Option<String>,
}

/// A validated option ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDressOption {
    pub kind: OptionKind,
    pub name: String,
    /// Only meaningful for colors
    pub hex_code: String,
}

pub fn is_default_size(name: &str) -> bool {
    DEFAULT_SIZES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_kind_parse() {
        assert_eq!("color".parse::<OptionKind>(), Ok(OptionKind::Color));
        assert_eq!("size".parse::<OptionKind>(), Ok(OptionKind::Size));
        assert_eq!("category".parse::<OptionKind>(), Ok(OptionKind::Category));
        assert!("Color".parse::<OptionKind>().is_err());
        assert!("fabric".parse::<OptionKind>().is_err());
    }

    #[test]
    fn test_default_sizes_are_protected() {
        assert!(is_default_size("XS"));
        assert!(is_default_size("XXL"));
        assert!(!is_default_size("XXXL"));
        assert!(!is_default_size("m"));
    }

    #[test]
    fn test_add_option_request_reads_type_key() {
        let request: AddOptionRequest =
            serde_json::from_str(r#"{"type":"color","name":"Vino"}"#).unwrap();
        assert_eq!(request.kind.as_deref(), Some("color"));
        assert_eq!(request.name.as_deref(), Some("Vino"));
        assert_eq!(request.hex_code, None);
    }

    #[test]
    fn test_dress_option_serializes_flat() {
        let option = DressOption::Size(SizeOption {
            id: Uuid::nil(),
            name: "XXXL".to_string(),
            display_order: APPENDED_DISPLAY_ORDER,
        });
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["name"], "XXXL");
        assert_eq!(json["display_order"], 999);
    }
}
