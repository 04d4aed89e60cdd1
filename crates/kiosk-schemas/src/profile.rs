//! Kiosk profile document model
//!
//! The profile is serialized as camelCase JSON. Optional fields are omitted
//! when absent so a document survives a decode/encode cycle without growing
//! `null` entries.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Current timestamp in the RFC 3339 form used by `createdAt`/`updatedAt`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Root versioned document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Document identifier
    pub id: String,
    /// Document schema/content version
    pub version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last modification timestamp (RFC 3339)
    pub updated_at: String,
    /// Store identity and opening hours
    pub store_info: StoreInfo,
    /// Menu tree
    pub menu: Menu,
    /// Promotions
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    /// Kiosk display and behavior settings
    #[serde(default)]
    pub settings: Settings,
}

impl Profile {
    /// Look up a category by id.
    pub fn category(&self, id: &str) -> Option<&MenuCategory> {
        self.menu.categories.iter().find(|c| c.id == id)
    }

    /// Look up an item by id together with its category.
    pub fn item(&self, id: &str) -> Option<(&MenuCategory, &MenuItem)> {
        self.menu.categories.iter().find_map(|category| {
            category
                .items
                .iter()
                .find(|item| item.id == id)
                .map(|item| (category, item))
        })
    }

    /// Look up a promotion by id.
    pub fn promotion(&self, id: &str) -> Option<&Promotion> {
        self.promotions.iter().find(|p| p.id == id)
    }
}

/// Store identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    /// Store identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// ISO currency code, e.g. `KRW`
    pub currency: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Contact phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Tax rate as a fraction in `0.0..=1.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
    /// Opening hours keyed by day name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<BTreeMap<String, BusinessHours>>,
}

/// Opening hours for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    /// Opening time, `HH:MM`
    pub open: String,
    /// Closing time, `HH:MM`
    pub close: String,
    /// Closed all day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
}

/// Menu tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    /// Categories in storage order
    pub categories: Vec<MenuCategory>,
}

/// Menu category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    /// Category identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Sort key for display
    pub display_order: u32,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon name or URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether the category is offered
    #[serde(default = "default_true")]
    pub available: bool,
    /// Option groups shared by every item in the category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_option_groups: Vec<OptionGroup>,
    /// Items in storage order
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// Menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Item identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Base price in store currency
    pub price: f64,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Whether the item can be ordered
    #[serde(default = "default_true")]
    pub available: bool,
    /// Highlighted as popular
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popular: Option<bool>,
    /// Spiciness `0..=5`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spicy_level: Option<u8>,
    /// Energy in kcal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    /// Search and filter tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Sort key within the category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<u32>,
    /// Item-specific option groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_groups: Vec<OptionGroup>,
    /// Option groups or options hidden for this item.
    ///
    /// Each entry is a group id, a `groupId.optionId` pair or a bare option id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_options: Vec<String>,
}

impl MenuItem {
    /// Option groups offered for this item inside `category`.
    ///
    /// Common groups come first in their original order; an item group with
    /// the same id replaces the common one in place. Item-only groups follow
    /// in their own order.
    pub fn effective_option_groups(&self, category: &MenuCategory) -> Vec<OptionGroup> {
        let mut groups: Vec<OptionGroup> = category
            .common_option_groups
            .iter()
            .map(|common| {
                self.option_groups
                    .iter()
                    .find(|own| own.id == common.id)
                    .unwrap_or(common)
                    .clone()
            })
            .collect();
        for own in &self.option_groups {
            if !category
                .common_option_groups
                .iter()
                .any(|common| common.id == own.id)
            {
                groups.push(own.clone());
            }
        }
        groups
    }
}

/// Group of selectable options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroup {
    /// Group identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// A selection is mandatory
    #[serde(default)]
    pub required: bool,
    /// More than one option may be selected
    #[serde(default)]
    pub multiple: bool,
    /// Upper bound on selections when `multiple`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<u32>,
    /// Options in display order
    #[serde(default)]
    pub items: Vec<OptionItem>,
}

/// Selectable option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionItem {
    /// Option identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Surcharge in store currency
    #[serde(default)]
    pub price: f64,
    /// Whether the option can be selected
    #[serde(default = "default_true")]
    pub available: bool,
}

/// Promotion kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionType {
    /// Fixed amount off
    Discount,
    /// Percentage off
    Percentage,
    /// Set of items at a bundle price
    Bundle,
    /// Free item with purchase
    Freebie,
}

impl PromotionType {
    /// Wire names accepted by validation.
    pub const NAMES: [&'static str; 4] = ["discount", "percentage", "bundle", "freebie"];
}

/// Promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    /// Promotion identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Promotion kind
    #[serde(rename = "type")]
    pub kind: PromotionType,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Amount or percentage, depending on `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<f64>,
    /// Item ids the promotion applies to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applicable_items: Vec<String>,
    /// RFC 3339 start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// RFC 3339 end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Whether the promotion is running
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Display theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    #[default]
    Light,
    /// Dark theme
    Dark,
    /// Follow ambient light / time of day
    Auto,
}

impl Theme {
    /// Wire names accepted by validation.
    pub const NAMES: [&'static str; 3] = ["light", "dark", "auto"];
}

/// Base font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    /// Small text
    Small,
    /// Medium text
    #[default]
    Medium,
    /// Large text
    Large,
}

impl FontSize {
    /// Wire names accepted by validation.
    pub const NAMES: [&'static str; 3] = ["small", "medium", "large"];
}

/// Kiosk settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Display theme
    pub theme: Theme,
    /// Base font size
    pub font_size: FontSize,
    /// UI and voice language tag
    pub language: String,
    /// Voice assistant enabled
    pub voice_enabled: bool,
    /// Seconds of inactivity before the kiosk resets
    pub idle_timeout_seconds: u32,
    /// Show calorie information
    pub show_calories: bool,
    /// Require age verification for restricted items
    pub age_verification: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font_size: FontSize::Medium,
            language: "ko".to_string(),
            voice_enabled: true,
            idle_timeout_seconds: 60,
            show_calories: false,
            age_verification: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(id: &str, name: &str) -> OptionGroup {
        OptionGroup {
            id: id.into(),
            name: name.into(),
            required: false,
            multiple: false,
            max_selections: None,
            items: Vec::new(),
        }
    }

    fn item_with_groups(groups: Vec<OptionGroup>) -> MenuItem {
        MenuItem {
            id: "item".into(),
            name: "Item".into(),
            price: 1000.0,
            description: None,
            image_url: None,
            available: true,
            popular: None,
            spicy_level: None,
            calories: None,
            tags: Vec::new(),
            display_order: None,
            option_groups: groups,
            exclude_options: Vec::new(),
        }
    }

    fn category_with_common(groups: Vec<OptionGroup>) -> MenuCategory {
        MenuCategory {
            id: "cat".into(),
            name: "Cat".into(),
            display_order: 0,
            description: None,
            icon: None,
            available: true,
            common_option_groups: groups,
            items: Vec::new(),
        }
    }

    #[test]
    fn test_effective_groups_override_in_place_and_append() {
        let category = category_with_common(vec![group("size", "Size"), group("sauce", "Sauce")]);
        let item = item_with_groups(vec![group("extra", "Extra"), group("size", "Big size")]);

        let effective = item.effective_option_groups(&category);
        let ids: Vec<&str> = effective.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["size", "sauce", "extra"]);
        assert_eq!(effective[0].name, "Big size");
    }

    #[test]
    fn test_effective_groups_without_common() {
        let category = category_with_common(Vec::new());
        let item = item_with_groups(vec![group("extra", "Extra")]);
        assert_eq!(item.effective_option_groups(&category).len(), 1);
    }

    #[test]
    fn test_defaults_on_decode() -> Result<(), serde_json::Error> {
        let item: MenuItem = serde_json::from_value(json!({
            "id": "a", "name": "A", "price": 1500
        }))?;
        assert!(item.available);
        assert!(item.option_groups.is_empty());

        let settings: Settings = serde_json::from_value(json!({"theme": "dark"}))?;
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.font_size, FontSize::Medium);
        Ok(())
    }

    #[test]
    fn test_promotion_type_field_name() -> Result<(), serde_json::Error> {
        let promo: Promotion = serde_json::from_value(json!({
            "id": "p1", "name": "Set", "type": "bundle"
        }))?;
        assert_eq!(promo.kind, PromotionType::Bundle);
        let encoded = serde_json::to_value(&promo)?;
        assert_eq!(encoded["type"], json!("bundle"));
        assert!(encoded.get("description").is_none());
        Ok(())
    }
}
