//! Derived, side-effect free view of the paging state for rendering.

use serde::Serialize;

use crate::constants::messages;
use crate::filter::{compile_query, filter_items};
use crate::paging::LoadState;
use crate::types::CatalogItem;

/// What the screen renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayState {
    Loading,
    Empty {
        message: String,
    },
    Grid {
        items: Vec<CatalogItem>,
        loading_more: bool,
        can_load_more: bool,
    },
    Error {
        message: String,
        is_network_error: bool,
        retryable: bool,
    },
}

impl DisplayState {
    /// Items on screen (empty unless `Grid`)
    pub fn items(&self) -> &[CatalogItem] {
        match self {
            DisplayState::Grid { items, .. } => items,
            _ => &[],
        }
    }

    pub fn is_loading_more(&self) -> bool {
        matches!(self, DisplayState::Grid { loading_more: true, .. })
    }

    pub fn can_load_more(&self) -> bool {
        matches!(self, DisplayState::Grid { can_load_more: true, .. })
    }
}

/// Pure function of `(state, query)`; recomputed on every change.
pub fn project(state: &LoadState, query: &str) -> DisplayState {
    match state {
        LoadState::Idle | LoadState::Loading => DisplayState::Loading,
        LoadState::Ready {
            items,
            loading_more,
            can_load_more,
        } => {
            let filtered = filter_items(items, &compile_query(query));
            if filtered.is_empty() {
                DisplayState::Empty {
                    message: messages::NO_ENTRIES.to_string(),
                }
            } else {
                DisplayState::Grid {
                    items: filtered,
                    loading_more: *loading_more,
                    can_load_more: *can_load_more,
                }
            }
        }
        LoadState::Failed(failure) => DisplayState::Error {
            message: failure.message.clone(),
            is_network_error: failure.is_network_error(),
            retryable: failure.retryable,
        },
    }
}
