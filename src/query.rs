use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::availability::dates;
use crate::models::Dress;

/// Columns selected for every dress query
pub const DRESS_COLUMNS: &str = "id, name, description, category, color, size, price_per_day, \
     image_url, additional_images, available, created_at, updated_at";

/// Filter values the storefront sends to mean "no filter"
const WILDCARD_VALUES: [&str; 3] = ["todos", "all", "todas"];

/// Substrings that identify a multicolor dress
pub const MULTICOLOR_PATTERNS: [&str; 3] = ["multi", "varios", "arcoiris"];

/// A value bound to a positional placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Decimal(Decimal),
    Uuids(Vec<Uuid>),
}

/// SQL query builder for the dress catalog
/// Builds a single parameterized query with filters, sorting, and pagination
pub struct SQLQueryBuilder {
    base_query: String,
    where_clauses: Vec<String>,
    params: Vec<QueryParam>,
    order_clause: Option<String>,
    limit: u32,
    offset: u32,
}

impl SQLQueryBuilder {
    pub fn new() -> Self {
        Self {
            base_query: format!("SELECT {} FROM dresses", DRESS_COLUMNS),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: None,
            limit: 24,
            offset: 0,
        }
    }

    fn push_param(&mut self, param: QueryParam) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Only dresses the operator has left switched on
    pub fn only_available(&mut self) {
        self.where_clauses.push("available = TRUE".to_string());
    }

    /// Case-insensitive partial match on name or description
    pub fn add_search_filter(&mut self, search: &str) {
        let idx = self.push_param(QueryParam::Text(contains_pattern(search)));
        self.where_clauses
            .push(format!("(name ILIKE ${idx} OR description ILIKE ${idx})"));
    }

    pub fn add_category_filter(&mut self, category: &str) {
        let idx = self.push_param(QueryParam::Text(contains_pattern(category)));
        self.where_clauses.push(format!("category ILIKE ${}", idx));
    }

    /// `multicolor` matches any of the multicolor spellings; anything else is
    /// a case-insensitive partial match
    pub fn add_color_filter(&mut self, color: &str) {
        if is_multicolor(color) {
            let clauses: Vec<String> = MULTICOLOR_PATTERNS
                .iter()
                .map(|pattern| {
                    let idx = self.push_param(QueryParam::Text(contains_pattern(pattern)));
                    format!("color ILIKE ${}", idx)
                })
                .collect();
            self.where_clauses.push(format!("({})", clauses.join(" OR ")));
        } else {
            let idx = self.push_param(QueryParam::Text(contains_pattern(color)));
            self.where_clauses.push(format!("color ILIKE ${}", idx));
        }
    }

    pub fn add_size_filter(&mut self, size: &str) {
        let idx = self.push_param(QueryParam::Text(size.to_string()));
        self.where_clauses.push(format!("size = ${}", idx));
    }

    /// Both bounds are inclusive
    pub fn add_price_range(&mut self, min: Option<Decimal>, max: Option<Decimal>) {
        if let Some(min_price) = min {
            let idx = self.push_param(QueryParam::Decimal(min_price));
            self.where_clauses.push(format!("price_per_day >= ${}", idx));
        }

        if let Some(max_price) = max {
            let idx = self.push_param(QueryParam::Decimal(max_price));
            self.where_clauses.push(format!("price_per_day <= ${}", idx));
        }
    }

    pub fn exclude_ids(&mut self, ids: &[Uuid]) {
        if ids.is_empty() {
            return;
        }
        let idx = self.push_param(QueryParam::Uuids(ids.to_vec()));
        self.where_clauses.push(format!("NOT (id = ANY(${}))", idx));
    }

    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        let field_name = match field {
            SortField::Price => "price_per_day",
            SortField::Newest => "created_at",
        };

        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        self.order_clause = Some(format!("{} {}, id", field_name, order_str));
    }

    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = page.saturating_sub(1).saturating_mul(limit);
    }

    /// Returns the query string and its parameters in placeholder order
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut query = self.base_query.clone();

        if !self.where_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        // LIMIT/OFFSET are validated integers, inlined rather than bound
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }
}

impl Default for SQLQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape LIKE wildcards in user input and wrap it for a contains match
fn contains_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn is_multicolor(color: &str) -> bool {
    color.eq_ignore_ascii_case("multicolor")
}

/// Catalog query string for GET /api/dresses
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQueryParams {
    /// Partial match on name or description
    pub search: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    pub max_price: Option<Decimal>,
    /// `YYYY-MM-DD`; hides dresses already booked around that date
    pub available_date: Option<String>,
    /// "price" or "newest"
    pub sort: Option<String>,
    /// "asc" or "desc"
    pub order: Option<String>,
    /// 1-indexed, defaults to 1
    pub page: Option<u32>,
    /// Items per page, defaults to 24, at most 100
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Newest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated and normalized catalog filter
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub available_date: Option<NaiveDate>,
    /// Filled in by the caller once `available_date` has been resolved
    pub exclude_ids: Vec<Uuid>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            color: None,
            size: None,
            min_price: None,
            max_price: None,
            available_date: None,
            exclude_ids: Vec::new(),
            sort_field: SortField::Newest,
            sort_order: SortOrder::Desc,
            page: 1,
            limit: 24,
        }
    }
}

impl CatalogFilter {
    pub fn to_builder(&self) -> SQLQueryBuilder {
        let mut builder = SQLQueryBuilder::new();
        builder.only_available();
        if let Some(ref search) = self.search {
            builder.add_search_filter(search);
        }
        if let Some(ref category) = self.category {
            builder.add_category_filter(category);
        }
        if let Some(ref color) = self.color {
            builder.add_color_filter(color);
        }
        if let Some(ref size) = self.size {
            builder.add_size_filter(size);
        }
        builder.add_price_range(self.min_price, self.max_price);
        builder.exclude_ids(&self.exclude_ids);
        builder.set_sort(self.sort_field, self.sort_order);
        builder.set_pagination(self.page, self.limit);
        builder
    }

    /// In-process equivalent of the WHERE clause built by `to_builder`
    pub fn matches(&self, dress: &Dress) -> bool {
        if !dress.available || self.exclude_ids.contains(&dress.id) {
            return false;
        }
        if let Some(ref search) = self.search {
            let in_name = contains_ignore_case(&dress.name, search);
            let in_description = dress
                .description
                .as_deref()
                .map(|d| contains_ignore_case(d, search))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if !contains_ignore_case(&dress.category, category) {
                return false;
            }
        }
        if let Some(ref color) = self.color {
            let hit = if is_multicolor(color) {
                MULTICOLOR_PATTERNS
                    .iter()
                    .any(|p| contains_ignore_case(&dress.color, p))
            } else {
                contains_ignore_case(&dress.color, color)
            };
            if !hit {
                return false;
            }
        }
        if let Some(ref size) = self.size {
            if &dress.size != size {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if dress.price_per_day < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if dress.price_per_day > max {
                return false;
            }
        }
        true
    }

    /// Filter, order and page an in-memory list the same way the SQL does
    pub fn apply(&self, dresses: impl IntoIterator<Item = Dress>) -> Vec<Dress> {
        let mut hits: Vec<Dress> = dresses.into_iter().filter(|d| self.matches(d)).collect();
        hits.sort_by(|a, b| {
            let ordering = match self.sort_field {
                SortField::Price => a.price_per_day.cmp(&b.price_per_day),
                SortField::Newest => a.created_at.cmp(&b.created_at),
            };
            let ordering = match self.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });
        let offset = self.page.saturating_sub(1).saturating_mul(self.limit) as usize;
        hits.into_iter().skip(offset).take(self.limit as usize).collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Validation error type
#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

pub const MAX_PAGE_SIZE: u32 = 100;

/// Catalog query validator
pub struct QueryValidator;

impl QueryValidator {
    pub fn validate(params: CatalogQueryParams) -> Result<CatalogFilter, ValidationError> {
        let search = Self::normalize_string(params.search);
        let category = Self::normalize_filter(params.category);
        let color = Self::normalize_filter(params.color);
        let size = Self::normalize_filter(params.size);

        let min_price = match params.min_price {
            Some(price) => Some(Self::validate_price(price, "min_price")?),
            None => None,
        };
        let max_price = match params.max_price {
            Some(price) => Some(Self::validate_price(price, "max_price")?),
            None => None,
        };

        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ValidationError {
                    message: "min_price cannot be greater than max_price".to_string(),
                });
            }
        }

        let available_date = match Self::normalize_string(params.available_date) {
            Some(raw) => Some(dates::parse_event_date(&raw).map_err(|_| ValidationError {
                message: format!("available_date '{}' must use the YYYY-MM-DD format", raw),
            })?),
            None => None,
        };

        let sort_field = match params.sort {
            Some(ref sort) => Self::parse_sort_field(sort)?,
            None => SortField::Newest,
        };

        let sort_order = match params.order {
            Some(ref order) => Self::parse_sort_order(order)?,
            None => match sort_field {
                SortField::Price => SortOrder::Asc,
                SortField::Newest => SortOrder::Desc,
            },
        };

        let page = match params.page {
            Some(p) => Self::validate_pagination_param(p, "page")?,
            None => 1,
        };

        let limit = match params.limit {
            Some(l) => Self::validate_pagination_param(l, "limit")?.min(MAX_PAGE_SIZE),
            None => 24,
        };

        Ok(CatalogFilter {
            search,
            category,
            color,
            size,
            min_price,
            max_price,
            available_date,
            exclude_ids: Vec::new(),
            sort_field,
            sort_order,
            page,
            limit,
        })
    }

    /// Trims whitespace; empty strings become None
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    /// Like `normalize_string`, but the storefront's "all" values also mean none
    fn normalize_filter(s: Option<String>) -> Option<String> {
        Self::normalize_string(s).filter(|value| {
            let lower = value.to_lowercase();
            !WILDCARD_VALUES.contains(&lower.as_str())
        })
    }

    fn validate_price(price: Decimal, param_name: &str) -> Result<Decimal, ValidationError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ValidationError {
                message: format!("{} must not be negative", param_name),
            });
        }
        Ok(price)
    }

    fn parse_sort_field(s: &str) -> Result<SortField, ValidationError> {
        match s.to_lowercase().as_str() {
            "price" => Ok(SortField::Price),
            "newest" | "created_at" => Ok(SortField::Newest),
            _ => Err(ValidationError {
                message: format!("Invalid sort field '{}'. Must be 'price' or 'newest'", s),
            }),
        }
    }

    fn parse_sort_order(s: &str) -> Result<SortOrder, ValidationError> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError {
                message: format!("Invalid sort order '{}'. Must be 'asc' or 'desc'", s),
            }),
        }
    }

    fn validate_pagination_param(value: u32, param_name: &str) -> Result<u32, ValidationError> {
        if value == 0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number (greater than 0)", param_name),
            });
        }
        Ok(value)
    }
}
