//! In-memory search, category filter and sort over the full product list.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::Product;

pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    PriceAsc,
    PriceDesc,
    Title,
    #[default]
    Latest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    pub search: String,
    pub category: String,
    pub sort: SortMode,
}

impl Default for ProductFilter {
    fn default() -> Self {
        ProductFilter {
            search: String::new(),
            category: ALL_CATEGORIES.to_string(),
            sort: SortMode::default(),
        }
    }
}

impl ProductFilter {
    /// Case-insensitive substring of the title or the description.
    pub fn matches_search(&self, product: &Product) -> bool {
        let term = self.search.trim().to_lowercase();
        term.is_empty()
            || product.title.to_lowercase().contains(&term)
            || product.description.to_lowercase().contains(&term)
    }

    pub fn matches_category(&self, product: &Product) -> bool {
        self.category.eq_ignore_ascii_case(ALL_CATEGORIES)
            || product.category.to_lowercase() == self.category.to_lowercase()
    }

    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut visible: Vec<Product> = products
            .iter()
            .filter(|p| self.matches_search(p) && self.matches_category(p))
            .cloned()
            .collect();
        visible.sort_by(|a, b| compare(self.sort, a, b));
        visible
    }
}

fn compare(sort: SortMode, a: &Product, b: &Product) -> Ordering {
    match sort {
        SortMode::PriceAsc => a.price.total_cmp(&b.price),
        SortMode::PriceDesc => b.price.total_cmp(&a.price),
        SortMode::Title => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title)),
        SortMode::Latest => b.created_at.cmp(&a.created_at),
    }
}

/// Distinct categories for the filter picker, compared case-insensitively and
/// reported with the first spelling seen.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen = BTreeMap::new();
    for product in products {
        seen.entry(product.category.to_lowercase())
            .or_insert_with(|| product.category.clone());
    }
    seen.into_values().collect()
}
