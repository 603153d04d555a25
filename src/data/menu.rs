//! Menu assembly from merchant-product and category payloads
//!
//! Turns raw merchant-product documents into display products, collects the
//! categories they reference, and merges category metadata from the category
//! endpoint with the copies embedded in product payloads.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use tracing::{debug, warn};

use super::{CategoryDisplay, ProductDisplay};

/// Catalog visibility value that hides a product from customer listings
const HIDDEN_VISIBILITY: &str = "hidden";

/// An id that the API may render as a string or a number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(Number),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Str(s) => s,
            RawId::Num(n) => n.to_string(),
        }
    }
}

/// A relationship field: either the expanded document or just its id
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Relation<T> {
    Expanded(T),
    Id(RawId),
}

impl<T> Relation<T> {
    fn expanded(self) -> Option<T> {
        match self {
            Relation::Expanded(doc) => Some(doc),
            Relation::Id(_) => None,
        }
    }
}

/// Reads an optional field, treating a value of an unexpected type as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A merchant's listing of a product
#[derive(Debug, Deserialize)]
struct MerchantProductDoc {
    id: RawId,
    #[serde(default, deserialize_with = "lenient")]
    product_id: Option<Relation<ProductDoc>>,
    #[serde(default, deserialize_with = "lenient")]
    price_override: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    is_featured: Option<bool>,
}

/// An expanded product; any JSON object parses
#[derive(Debug, Deserialize)]
struct ProductDoc {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    base_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    catalog_visibility: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    media: Option<ProductMedia>,
    #[serde(default, deserialize_with = "lenient")]
    categories: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ProductMedia {
    #[serde(default, deserialize_with = "lenient")]
    primary_image: Option<Relation<ImageDoc>>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageDoc {
    #[serde(default, deserialize_with = "lenient")]
    cdn_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryDoc {
    id: RawId,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    slug: Option<String>,
    #[serde(default)]
    icon: Option<Value>,
}

impl CategoryDoc {
    fn into_display(self) -> CategoryDisplay {
        CategoryDisplay {
            id: self.id.into_string(),
            name: self.name.unwrap_or_default(),
            slug: self.slug.unwrap_or_default(),
            icon: self.icon.as_ref().and_then(icon_url),
        }
    }
}

/// An icon is either a plain string or an expanded media document
fn icon_url(icon: &Value) -> Option<String> {
    match icon {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(_) => ["cdn_url", "url"]
            .iter()
            .filter_map(|field| icon.get(*field).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Whether a product's catalog visibility hides it from listings
fn is_hidden(product: &ProductDoc) -> bool {
    product
        .catalog_visibility
        .as_deref()
        .is_some_and(|v| v.eq_ignore_ascii_case(HIDDEN_VISIBILITY))
}

/// Picks the display URL of an image: CDN, then original, then thumbnail
fn primary_image_url(image: &ImageDoc) -> Option<String> {
    [&image.cdn_url, &image.url, &image.thumbnail_url]
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .cloned()
}

/// Products gathered from a merchant-products page
#[derive(Debug, Default)]
pub struct CollectedProducts {
    /// Visible products, in payload order
    pub products: Vec<ProductDisplay>,
    /// Union of referenced category ids, in first-seen order
    pub category_ids: Vec<String>,
    /// Category metadata embedded in the product payloads, keyed by id
    pub embedded: HashMap<String, CategoryDisplay>,
}

/// Builds display products from raw merchant-product documents
///
/// Hidden products and listings whose product was not expanded are skipped.
/// Optional fields of an unexpected type are read as absent, so only a
/// listing without a usable id is dropped as malformed. Embedded category
/// metadata is captured as a side product; the first copy of a category wins.
/// A category reference that is neither an id nor a category document is
/// ignored.
pub fn collect_products(docs: Vec<Value>) -> CollectedProducts {
    let mut collected = CollectedProducts::default();
    let mut seen_ids = HashSet::new();

    for doc in docs {
        let listing: MerchantProductDoc = match serde_json::from_value(doc) {
            Ok(listing) => listing,
            Err(e) => {
                warn!(error = %e, "Skipping malformed merchant product");
                continue;
            }
        };

        let Some(product) = listing.product_id.and_then(Relation::expanded) else {
            debug!("Skipping merchant product without an expanded product");
            continue;
        };
        if is_hidden(&product) {
            continue;
        }

        let image_url = product
            .media
            .and_then(|media| media.primary_image)
            .and_then(Relation::expanded)
            .and_then(|image| primary_image_url(&image));

        let mut category_ids = Vec::new();
        for raw in product.categories.unwrap_or_default() {
            let relation = match serde_json::from_value::<Relation<CategoryDoc>>(raw) {
                Ok(relation) => relation,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed category reference");
                    continue;
                }
            };
            let id = match relation {
                Relation::Expanded(doc) => {
                    let category = doc.into_display();
                    let id = category.id.clone();
                    collected.embedded.entry(id.clone()).or_insert(category);
                    id
                }
                Relation::Id(id) => id.into_string(),
            };
            if category_ids.contains(&id) {
                continue;
            }
            if seen_ids.insert(id.clone()) {
                collected.category_ids.push(id.clone());
            }
            category_ids.push(id);
        }

        collected.products.push(ProductDisplay {
            id: listing.id.into_string(),
            name: product.name.unwrap_or_default(),
            description: product.description,
            price: listing.price_override.or(product.base_price).unwrap_or(0.0),
            image_url,
            category_ids,
            is_featured: listing.is_featured.unwrap_or(false),
        });
    }

    collected
}

/// Indexes category documents from the category endpoint by id
pub fn index_categories(docs: Vec<Value>) -> HashMap<String, CategoryDisplay> {
    docs.into_iter()
        .filter_map(|doc| match serde_json::from_value::<CategoryDoc>(doc) {
            Ok(doc) => Some(doc.into_display()),
            Err(e) => {
                warn!(error = %e, "Skipping malformed category");
                None
            }
        })
        .map(|category| (category.id.clone(), category))
        .collect()
}

/// Resolves each referenced category id, preferring the authoritative record
/// and falling back to the copy embedded in a product payload
///
/// Ids found in neither map are dropped. The result follows the order of
/// `ids`, without duplicates, and never contains a category not in `ids`.
pub fn merge_categories(
    authoritative: &HashMap<String, CategoryDisplay>,
    embedded: &HashMap<String, CategoryDisplay>,
    ids: &[String],
) -> Vec<CategoryDisplay> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(*id))
        .filter_map(|id| authoritative.get(id).or_else(|| embedded.get(id)).cloned())
        .collect()
}
