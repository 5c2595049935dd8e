use crate::types::CatalogItem;

/// Search query prepared for matching: lower-cased once, whitespace kept.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    needle: String,
}

pub fn compile_query(q: &str) -> CompiledQuery {
    CompiledQuery {
        needle: q.to_lowercase(),
    }
}

impl CompiledQuery {
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }
}

/// Case-insensitive substring match on the item name. An empty query matches everything.
pub fn item_matches(item: &CatalogItem, q: &CompiledQuery) -> bool {
    q.is_empty() || item.name.to_lowercase().contains(&q.needle)
}

/// Items passing the query, in their original order
pub fn filter_items(items: &[CatalogItem], q: &CompiledQuery) -> Vec<CatalogItem> {
    if q.is_empty() {
        return items.to_vec();
    }
    items.iter().filter(|i| item_matches(i, q)).cloned().collect()
}
