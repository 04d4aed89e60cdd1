//! Read-only menu tree for the voice ordering assistant
//!
//! Only what a customer can actually order is included: available
//! categories, available items, their effective option groups with
//! `excludeOptions` applied, and available options. Ids and prices are
//! copied verbatim so orders can be mapped back to the menu.

use kiosk_errors::Result;
use kiosk_schemas::{
    ExclusionTarget, GroupIndex, MenuCategory, MenuItem, OptionGroup, Profile, resolve_exclusion,
};
use serde::{Deserialize, Serialize};

use crate::engine::ProfileEngine;

/// Menu projection handed to the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmMenu {
    /// Store display name
    pub store_name: String,
    /// ISO currency code
    pub currency: String,
    /// Available categories by display order
    pub categories: Vec<LlmCategory>,
}

/// An orderable category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmCategory {
    /// Id as stored in the profile
    pub id: String,
    /// Display name
    pub name: String,
    /// Available items
    pub items: Vec<LlmItem>,
}

/// An orderable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmItem {
    /// Id as stored in the profile
    pub id: String,
    /// Display name
    pub name: String,
    /// Price as stored
    pub price: f64,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Popular flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popular: Option<bool>,
    /// Effective groups after exclusions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_groups: Vec<LlmOptionGroup>,
}

/// An option group with its selectable options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmOptionGroup {
    /// Id as stored in the profile
    pub id: String,
    /// Display name
    pub name: String,
    /// A selection is required
    pub required: bool,
    /// More than one option may be chosen
    pub multiple: bool,
    /// Selection limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<u32>,
    /// Available options after exclusions
    pub options: Vec<LlmOption>,
}

/// A selectable option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmOption {
    /// Id as stored in the profile
    pub id: String,
    /// Display name
    pub name: String,
    /// Price as stored
    pub price: f64,
}

/// Project `profile` into the ordering menu.
pub fn project_menu(profile: &Profile) -> LlmMenu {
    let mut categories: Vec<&MenuCategory> = profile
        .menu
        .categories
        .iter()
        .filter(|category| category.available)
        .collect();
    categories.sort_by_key(|category| category.display_order);

    LlmMenu {
        store_name: profile.store_info.name.clone(),
        currency: profile.store_info.currency.clone(),
        categories: categories.into_iter().map(project_category).collect(),
    }
}

fn project_category(category: &MenuCategory) -> LlmCategory {
    LlmCategory {
        id: category.id.clone(),
        name: category.name.clone(),
        items: category
            .items
            .iter()
            .filter(|item| item.available)
            .map(|item| project_item(category, item))
            .collect(),
    }
}

fn project_item(category: &MenuCategory, item: &MenuItem) -> LlmItem {
    let groups = item.effective_option_groups(category);
    let index: Vec<GroupIndex> = groups.iter().map(GroupIndex::from).collect();
    let exclusions: Vec<ExclusionTarget> = item
        .exclude_options
        .iter()
        .filter_map(|reference| resolve_exclusion(reference, &index))
        .collect();

    LlmItem {
        id: item.id.clone(),
        name: item.name.clone(),
        price: item.price,
        description: item.description.clone(),
        popular: item.popular,
        option_groups: groups
            .iter()
            .filter(|group| !exclusions.iter().any(|e| e.hides_group(&group.id)))
            .filter_map(|group| project_group(group, &exclusions))
            .collect(),
    }
}

/// `None` when every option of the group is hidden.
fn project_group(group: &OptionGroup, exclusions: &[ExclusionTarget]) -> Option<LlmOptionGroup> {
    let options: Vec<LlmOption> = group
        .items
        .iter()
        .filter(|option| option.available)
        .filter(|option| !exclusions.iter().any(|e| e.hides_option(&group.id, &option.id)))
        .map(|option| LlmOption {
            id: option.id.clone(),
            name: option.name.clone(),
            price: option.price,
        })
        .collect();
    if options.is_empty() {
        return None;
    }
    Some(LlmOptionGroup {
        id: group.id.clone(),
        name: group.name.clone(),
        required: group.required,
        multiple: group.multiple,
        max_selections: group.max_selections,
        options,
    })
}

impl ProfileEngine {
    /// Ordering menu built from the working document, or the committed one
    /// when `committed_only`.
    pub fn get_menu_for_llm(&self, committed_only: bool) -> Result<LlmMenu> {
        Ok(project_menu(self.get_profile(committed_only)?))
    }
}
