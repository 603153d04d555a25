//! Core data models for merchant and menu data
//!
//! This module contains the types handed to callers: opaque merchant records
//! and the display-ready menu view assembled from products and categories.

pub mod api;
pub mod menu;
pub mod merchants;

pub use api::{ContentApi, FetchError, HttpContentApi, Paginated};
pub use menu::merge_categories;
pub use merchants::MerchantService;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A merchant (restaurant) record as returned by the content API
///
/// The record is passed through untouched; only `id` is interpreted, to
/// build per-merchant cache keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Merchant(Value);

impl Merchant {
    /// Wraps a raw JSON record
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The merchant's stable identifier, with numeric ids rendered as strings
    pub fn id(&self) -> Option<String> {
        self.0.get("id").and_then(id_to_string)
    }

    /// Looks up a top-level field of the record
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the raw JSON record
    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Renders a JSON string or number id as a string
pub(crate) fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Query filters for listing merchants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerchantFilters {
    /// Restrict to active (`Some(true)`) or inactive (`Some(false)`) merchants
    pub is_active: Option<bool>,
    /// Page size
    pub limit: u32,
    /// 1-based page number
    pub page: u32,
}

impl Default for MerchantFilters {
    fn default() -> Self {
        Self {
            is_active: None,
            limit: 10,
            page: 1,
        }
    }
}

/// A product category ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDisplay {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A product ready for display on a merchant's menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDisplay {
    /// Identifier of the merchant-product listing
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Merchant price override if set, otherwise the product's base price
    pub price: f64,
    /// Primary display image, if the product has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Categories this product belongs to, in payload order
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Pagination metadata from a paginated API response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total_docs: u64,
    pub limit: u32,
    pub page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// A merchant's menu: visible products plus every category they reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantMenuData {
    pub products: Vec<ProductDisplay>,
    pub categories: Vec<CategoryDisplay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl MerchantMenuData {
    /// The menu returned when nothing could be loaded
    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            categories: Vec::new(),
            pagination: None,
        }
    }
}
