//! Display attributes extracted from compared items.
//!
//! Every extractor is total: missing or empty values fall back to
//! [`NOT_SPECIFIED`], so a comparison table never has holes. Description is
//! the exception and renders empty.

use serde::Serialize;

use super::item::ComparedItem;
use super::metadata::ItemMetadata;

pub const NOT_SPECIFIED: &str = "Not specified";
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

const DEFAULT_WEIGHT_UNIT: &str = "g";
const DEFAULT_DIMENSION_UNIT: &str = "cm";

/// Rows of the comparison table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Attribute {
    Description,
    Collection,
    Material,
    CountryOfOrigin,
    Type,
    Weight,
    Dimensions,
}

impl Attribute {
    pub const ALL: [Attribute; 7] = [
        Attribute::Description,
        Attribute::Collection,
        Attribute::Material,
        Attribute::CountryOfOrigin,
        Attribute::Type,
        Attribute::Weight,
        Attribute::Dimensions,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Description => "Description",
            Attribute::Collection => "Collection",
            Attribute::Material => "Material",
            Attribute::CountryOfOrigin => "Country of origin",
            Attribute::Type => "Type",
            Attribute::Weight => "Weight",
            Attribute::Dimensions => "Dimensions",
        }
    }

    pub fn value_for(&self, item: &ComparedItem) -> String {
        match self {
            Attribute::Description => description(item),
            Attribute::Collection => collection(item),
            Attribute::Material => material(item),
            Attribute::CountryOfOrigin => country_of_origin(item),
            Attribute::Type => kind(item),
            Attribute::Weight => weight(item),
            Attribute::Dimensions => dimensions(item),
        }
    }
}

/// One table row: an attribute label and one value per compared item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeRow {
    pub label: &'static str,
    pub values: Vec<String>,
}

pub fn attribute_rows(items: &[ComparedItem]) -> Vec<AttributeRow> {
    Attribute::ALL
        .iter()
        .map(|attribute| AttributeRow {
            label: attribute.label(),
            values: items.iter().map(|item| attribute.value_for(item)).collect(),
        })
        .collect()
}

/// Effective metadata: the item's own blob when present, otherwise a record
/// derived from its structured attributes.
pub fn effective_metadata(item: &ComparedItem) -> ItemMetadata {
    if let Some(metadata) = &item.metadata {
        return metadata.clone();
    }

    let attrs = &item.attributes;
    let mut derived = ItemMetadata::new();
    derived.weight = positive(attrs.weight).map(format_number);
    derived.material = present(attrs.material.as_deref()).map(str::to_string);
    derived.country_of_origin = present(attrs.origin_country.as_deref()).map(str::to_string);
    derived.kind = present(attrs.kind.as_deref()).map(str::to_string);

    if let (Some(h), Some(w), Some(l)) = (
        positive(attrs.height),
        positive(attrs.width),
        positive(attrs.length),
    ) {
        derived.height = Some(format_number(h));
        derived.width = Some(format_number(w));
        derived.length = Some(format_number(l));
    }

    derived
}

pub fn description(item: &ComparedItem) -> String {
    let Some(text) = present(item.description.as_deref()) else {
        return String::new();
    };

    let mut preview: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    if text.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

pub fn collection(item: &ComparedItem) -> String {
    item.collection
        .as_ref()
        .and_then(|c| present(Some(c.title.as_str())))
        .unwrap_or(NOT_SPECIFIED)
        .to_string()
}

pub fn material(item: &ComparedItem) -> String {
    let metadata = effective_metadata(item);
    first_present(&[metadata.material.as_deref(), item.attributes.material.as_deref()])
}

pub fn country_of_origin(item: &ComparedItem) -> String {
    let metadata = effective_metadata(item);
    first_present(&[
        metadata.country_of_origin.as_deref(),
        item.attributes.origin_country.as_deref(),
    ])
}

pub fn kind(item: &ComparedItem) -> String {
    let metadata = effective_metadata(item);
    first_present(&[metadata.kind.as_deref(), item.attributes.kind.as_deref()])
}

pub fn weight(item: &ComparedItem) -> String {
    let metadata = effective_metadata(item);
    if let Some(value) = present(metadata.weight.as_deref()) {
        let unit = present(metadata.weight_unit.as_deref()).unwrap_or(DEFAULT_WEIGHT_UNIT);
        return format!("{value} {unit}");
    }
    if let Some(value) = positive(item.attributes.weight) {
        return format!("{} {DEFAULT_WEIGHT_UNIT}", format_number(value));
    }
    NOT_SPECIFIED.to_string()
}

pub fn dimensions(item: &ComparedItem) -> String {
    let metadata = effective_metadata(item);
    if let Some(value) = present(metadata.dimensions.as_deref()) {
        return value.to_string();
    }

    if let (Some(l), Some(w), Some(h)) = (
        present(metadata.length.as_deref()),
        present(metadata.width.as_deref()),
        present(metadata.height.as_deref()),
    ) {
        let unit = present(metadata.dimension_unit.as_deref()).unwrap_or(DEFAULT_DIMENSION_UNIT);
        return format!("{l} × {w} × {h} {unit}");
    }

    let attrs = &item.attributes;
    if let (Some(l), Some(w), Some(h)) = (
        positive(attrs.length),
        positive(attrs.width),
        positive(attrs.height),
    ) {
        return format!(
            "{} × {} × {} {DEFAULT_DIMENSION_UNIT}",
            format_number(l),
            format_number(w),
            format_number(h)
        );
    }

    NOT_SPECIFIED.to_string()
}

fn first_present(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .find_map(|c| present(*c))
        .unwrap_or(NOT_SPECIFIED)
        .to_string()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// Zero and NaN read as "absent", matching how merchants leave unset dimensions.
fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

fn format_number(value: f64) -> String {
    value.to_string()
}
