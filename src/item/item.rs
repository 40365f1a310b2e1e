use serde::{Deserialize, Serialize};

use super::metadata::{Collection, ItemAttributes, ItemMetadata};
use crate::types::identifiers::ItemId;

/// Read-mostly snapshot of a catalog item held in the compare set.
///
/// Only `id` takes part in set logic. Everything else is carried through
/// unchanged for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparedItem {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ItemMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Collection>,
    #[serde(flatten)]
    pub attributes: ItemAttributes,
}

impl ComparedItem {
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail: None,
            handle: handle.into(),
            description: None,
            metadata: None,
            collection: None,
            attributes: ItemAttributes::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_collection(mut self, title: impl Into<String>) -> Self {
        self.collection = Some(Collection { title: title.into() });
        self
    }

    pub fn with_attributes(mut self, attributes: ItemAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}
