pub mod attributes;
pub mod item;
pub mod metadata;

pub use crate::types::identifiers::ItemId;
pub use attributes::{attribute_rows, Attribute, AttributeRow, NOT_SPECIFIED};
pub use item::ComparedItem;
pub use metadata::{Collection, ItemAttributes, ItemMetadata};
