use serde::{Deserialize, Serialize};

/// One entry of the browsing list.
///
/// `id` is stable: it is the dedup key of the paging controller, the path
/// parameter of the detail request and the stem of the artwork URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Offset-based slice descriptor passed to `CatalogClient::fetch_page`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self {
            limit,
            offset: crate::constants::api::DEFAULT_OFFSET,
        }
    }
}

impl std::fmt::Display for PageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "limit={} offset={}", self.limit, self.offset)
    }
}

/// Rich per-item record, fetched lazily when the detail view opens
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogDetail {
    pub id: String,
    pub name: String,
    pub height: Option<u32>,
    pub weight: Option<u32>,
    pub base_experience: Option<u32>,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub stats: Vec<StatLine>,
    pub sprites: SpriteRefs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatLine {
    pub name: String,
    pub base: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpriteRefs {
    pub front_default: Option<String>,
    pub official_artwork: Option<String>,
}

// ----- wire types -----

/// `{ name, url }` reference as returned by the API everywhere
#[derive(Debug, Clone, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// List endpoint payload
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub count: Option<u64>,
    pub results: Vec<NamedResource>,
}

/// Detail endpoint payload (only the fields we render)
#[derive(Debug, Clone, Deserialize)]
pub struct DetailResponse {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub stats: Vec<StatSlot>,
    #[serde(default)]
    pub sprites: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatSlot {
    pub base_stat: u32,
    pub stat: NamedResource,
}

/// Extract the item id from a resource URL: its last non-empty path segment.
/// `https://pokeapi.co/api/v2/pokemon/25/` → `Some("25")`.
pub fn id_from_resource_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or("");
    path.rsplit('/')
        .find(|seg| !seg.is_empty())
        .filter(|seg| !seg.contains(':'))
        .map(str::to_string)
}

impl NamedResource {
    pub fn into_item(self) -> Option<CatalogItem> {
        let id = id_from_resource_url(&self.url)?;
        Some(CatalogItem { id, name: self.name })
    }
}

impl From<DetailResponse> for CatalogDetail {
    fn from(d: DetailResponse) -> Self {
        let mut types = d.types;
        types.sort_by_key(|t| t.slot);

        let sprites = d
            .sprites
            .as_ref()
            .map(|s| SpriteRefs {
                front_default: s
                    .pointer("/front_default")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                official_artwork: s
                    .pointer("/other/official-artwork/front_default")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            })
            .unwrap_or_default();

        CatalogDetail {
            id: d.id.to_string(),
            name: d.name,
            height: d.height,
            weight: d.weight,
            base_experience: d.base_experience,
            types: types.into_iter().map(|t| t.kind.name).collect(),
            abilities: d
                .abilities
                .into_iter()
                .map(|a| {
                    if a.is_hidden {
                        format!("{} (hidden)", a.ability.name)
                    } else {
                        a.ability.name
                    }
                })
                .collect(),
            stats: d
                .stats
                .into_iter()
                .map(|s| StatLine {
                    name: s.stat.name,
                    base: s.base_stat,
                })
                .collect(),
            sprites,
        }
    }
}
