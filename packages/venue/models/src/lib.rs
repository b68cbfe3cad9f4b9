#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Venue records and the venue category taxonomy.
//!
//! A [`Venue`] is a single point-located commercial entity (a wine shop, a
//! winery, a supermarket) as produced by the data-acquisition layer. Venues
//! are immutable once ingested; region membership is derived per run and is
//! never stored on the venue itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A scalar attribute value attached to a venue (an OSM tag, an address
/// component, a flag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Free-form text.
    Text(String),
}

impl AttributeValue {
    /// Returns the value as a string slice if it is textual.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for `Bool(true)` and for the OSM-style text `"yes"`.
    #[must_use]
    pub fn is_affirmative(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => s.eq_ignore_ascii_case("yes"),
            Self::Int(_) | Self::Float(_) => false,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Venue classification derived from a venue's attributes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum VenueCategory {
    /// Wine producer (`craft=winery` or `amenity=winery`).
    Winery,
    /// Retail wine shop (`shop=wine`).
    WineShop,
    /// Bar advertising wine (`amenity=bar` with `drink:wine=yes`).
    WineBar,
    /// Supermarket (`shop=supermarket`).
    Supermarket,
    /// Anything not matching the above.
    Other,
}

impl VenueCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Winery,
            Self::WineShop,
            Self::WineBar,
            Self::Supermarket,
            Self::Other,
        ]
    }

    /// Whether this category belongs to the wine trade.
    #[must_use]
    pub const fn is_wine_related(self) -> bool {
        matches!(self, Self::Winery | Self::WineShop | Self::WineBar)
    }
}

/// A single point-located commercial entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    /// Stable identifier from the upstream source (e.g. `"node/123456"`).
    pub id: String,
    /// Display name. Upstream data uses `"Unknown"` when absent.
    pub name: String,
    /// WGS84 latitude. `None` when the source record had no position.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
    /// Open attribute bag (OSM tags, address parts, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Venue {
    /// Creates a venue with no attributes.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style helper for attaching an attribute.
    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the `(lat, lon)` pair when both coordinates are present and
    /// finite.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    /// Looks up a textual attribute.
    #[must_use]
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttributeValue::as_str)
    }

    /// Whether the attribute `key` is present with the textual value `value`.
    #[must_use]
    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.attribute_str(key).is_some_and(|v| v == value)
    }

    /// Classifies the venue from its attributes.
    ///
    /// Checked in order: winery, wine shop, wine bar, supermarket.
    #[must_use]
    pub fn category(&self) -> VenueCategory {
        if self.has_tag("craft", "winery") || self.has_tag("amenity", "winery") {
            VenueCategory::Winery
        } else if self.has_tag("shop", "wine") {
            VenueCategory::WineShop
        } else if self.has_tag("amenity", "bar")
            && self
                .attributes
                .get("drink:wine")
                .is_some_and(AttributeValue::is_affirmative)
        {
            VenueCategory::WineBar
        } else if self.has_tag("shop", "supermarket") {
            VenueCategory::Supermarket
        } else {
            VenueCategory::Other
        }
    }

    /// Whether the venue classifies as `category`.
    #[must_use]
    pub fn has_category(&self, category: VenueCategory) -> bool {
        self.category() == category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_from_tags() {
        let winery = Venue::new("n1", "Weingut", 52.5, 13.4).with_attribute("craft", "winery");
        let shop = Venue::new("n2", "Weinladen", 52.5, 13.4).with_attribute("shop", "wine");
        let bar = Venue::new("n3", "Weinbar", 52.5, 13.4)
            .with_attribute("amenity", "bar")
            .with_attribute("drink:wine", "yes");
        let plain_bar = Venue::new("n4", "Kneipe", 52.5, 13.4).with_attribute("amenity", "bar");
        let market = Venue::new("n5", "Edeka", 52.5, 13.4).with_attribute("shop", "supermarket");

        assert_eq!(winery.category(), VenueCategory::Winery);
        assert_eq!(shop.category(), VenueCategory::WineShop);
        assert_eq!(bar.category(), VenueCategory::WineBar);
        assert_eq!(plain_bar.category(), VenueCategory::Other);
        assert_eq!(market.category(), VenueCategory::Supermarket);
        assert!(bar.has_category(VenueCategory::WineBar));
    }

    #[test]
    fn wine_related_categories() {
        let wine: Vec<_> = VenueCategory::all()
            .iter()
            .copied()
            .filter(|c| c.is_wine_related())
            .collect();
        assert_eq!(
            wine,
            vec![VenueCategory::Winery, VenueCategory::WineShop, VenueCategory::WineBar]
        );
    }

    #[test]
    fn coordinates_require_finite_pair() {
        let mut venue = Venue::new("n1", "A", 52.5, 13.4);
        assert_eq!(venue.coordinates(), Some((52.5, 13.4)));

        venue.longitude = None;
        assert_eq!(venue.coordinates(), None);

        venue.longitude = Some(f64::NAN);
        assert_eq!(venue.coordinates(), None);

        venue.longitude = Some(13.4);
        venue.latitude = Some(f64::INFINITY);
        assert_eq!(venue.coordinates(), None);
    }

    #[test]
    fn category_string_roundtrip() {
        for category in VenueCategory::all() {
            let parsed: VenueCategory = category.as_ref().parse().unwrap();
            assert_eq!(parsed, *category);
        }
        assert_eq!(VenueCategory::WineShop.to_string(), "WINE_SHOP");
    }

    #[test]
    fn deserializes_attribute_bag() {
        let json = r#"{
            "id": "node/1",
            "name": "Vin",
            "latitude": 52.51,
            "longitude": 13.41,
            "attributes": { "shop": "wine", "level": 2, "wheelchair": true }
        }"#;
        let venue: Venue = serde_json::from_str(json).unwrap();
        assert_eq!(venue.category(), VenueCategory::WineShop);
        assert_eq!(venue.attributes.get("level"), Some(&AttributeValue::Int(2)));
        assert!(venue.attributes["wheelchair"].is_affirmative());
    }
}
