//! Menu categories, items and option groups

use std::collections::HashSet;

use kiosk_errors::{EntityKind, KioskError, Result};
use kiosk_schemas::{MenuCategory, MenuItem, OptionGroup, ProfilePatch};
use tracing::info;
use uuid::Uuid;

use crate::engine::ProfileEngine;

/// Selection for [`ProfileEngine::get_menu_items`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItemFilter {
    /// Only items of this category
    pub category_id: Option<String>,
    /// Only items with this availability
    pub available: Option<bool>,
    /// Only items carrying this tag
    pub tag: Option<String>,
    /// Read the committed document instead of the working one
    pub committed_only: bool,
}

impl MenuItemFilter {
    /// Match every item of the working document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one category.
    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Restrict by availability.
    pub fn available(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }

    /// Restrict to items carrying `tag`.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Read the committed document.
    pub fn committed(mut self) -> Self {
        self.committed_only = true;
        self
    }

    fn matches(&self, category: &MenuCategory, item: &MenuItem) -> bool {
        self.category_id.as_ref().is_none_or(|id| &category.id == id)
            && self.available.is_none_or(|available| item.available == available)
            && self.tag.as_ref().is_none_or(|tag| item.tags.contains(tag))
    }
}

/// A category to add. The id is generated.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// Display name
    pub name: String,
    /// Sort key
    pub display_order: u32,
    /// Description
    pub description: Option<String>,
    /// Icon name
    pub icon: Option<String>,
    /// Availability
    pub available: bool,
    /// Option groups shared by every item
    pub common_option_groups: Vec<OptionGroup>,
}

impl NewCategory {
    /// An available category without options.
    pub fn new(name: impl Into<String>, display_order: u32) -> Self {
        Self {
            name: name.into(),
            display_order,
            description: None,
            icon: None,
            available: true,
            common_option_groups: Vec::new(),
        }
    }

    fn into_category(self, id: String) -> MenuCategory {
        MenuCategory {
            id,
            name: self.name,
            display_order: self.display_order,
            description: self.description,
            icon: self.icon,
            available: self.available,
            common_option_groups: self.common_option_groups,
            items: Vec::new(),
        }
    }
}

/// Fields to change on a category; `None` leaves a field as is and
/// `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryUpdate {
    /// Display name
    pub name: Option<String>,
    /// Sort key
    pub display_order: Option<u32>,
    /// Description
    pub description: Option<Option<String>>,
    /// Icon name
    pub icon: Option<Option<String>>,
    /// Availability
    pub available: Option<bool>,
    /// Option groups shared by every item
    pub common_option_groups: Option<Vec<OptionGroup>>,
}

impl CategoryUpdate {
    fn apply_to(self, category: &mut MenuCategory) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(order) = self.display_order {
            category.display_order = order;
        }
        if let Some(description) = self.description {
            category.description = description;
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
        if let Some(available) = self.available {
            category.available = available;
        }
        if let Some(groups) = self.common_option_groups {
            category.common_option_groups = groups;
        }
    }
}

/// A menu item to add. The id is generated.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMenuItem {
    /// Display name
    pub name: String,
    /// Base price
    pub price: f64,
    /// Description
    pub description: Option<String>,
    /// Image location
    pub image_url: Option<String>,
    /// Availability
    pub available: bool,
    /// Popular flag
    pub popular: Option<bool>,
    /// Spiciness, 0 to 5
    pub spicy_level: Option<u8>,
    /// Calories
    pub calories: Option<u32>,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Sort key
    pub display_order: Option<u32>,
    /// Item option groups
    pub option_groups: Vec<OptionGroup>,
    /// Hidden groups or options
    pub exclude_options: Vec<String>,
}

impl NewMenuItem {
    /// An available item with no options.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            description: None,
            image_url: None,
            available: true,
            popular: None,
            spicy_level: None,
            calories: None,
            tags: Vec::new(),
            display_order: None,
            option_groups: Vec::new(),
            exclude_options: Vec::new(),
        }
    }

    fn into_item(self, id: String) -> MenuItem {
        MenuItem {
            id,
            name: self.name,
            price: self.price,
            description: self.description,
            image_url: self.image_url,
            available: self.available,
            popular: self.popular,
            spicy_level: self.spicy_level,
            calories: self.calories,
            tags: self.tags,
            display_order: self.display_order,
            option_groups: self.option_groups,
            exclude_options: self.exclude_options,
        }
    }
}

/// Fields to change on a menu item; `None` leaves a field as is and
/// `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuItemUpdate {
    /// Display name
    pub name: Option<String>,
    /// Base price
    pub price: Option<f64>,
    /// Description
    pub description: Option<Option<String>>,
    /// Image location
    pub image_url: Option<Option<String>>,
    /// Availability
    pub available: Option<bool>,
    /// Popular flag
    pub popular: Option<Option<bool>>,
    /// Spiciness, 0 to 5
    pub spicy_level: Option<Option<u8>>,
    /// Calories
    pub calories: Option<Option<u32>>,
    /// Free-form tags
    pub tags: Option<Vec<String>>,
    /// Sort key
    pub display_order: Option<Option<u32>>,
    /// Item option groups
    pub option_groups: Option<Vec<OptionGroup>>,
    /// Hidden groups or options
    pub exclude_options: Option<Vec<String>>,
}

impl MenuItemUpdate {
    fn apply_to(self, item: &mut MenuItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(image_url) = self.image_url {
            item.image_url = image_url;
        }
        if let Some(available) = self.available {
            item.available = available;
        }
        if let Some(popular) = self.popular {
            item.popular = popular;
        }
        if let Some(spicy_level) = self.spicy_level {
            item.spicy_level = spicy_level;
        }
        if let Some(calories) = self.calories {
            item.calories = calories;
        }
        if let Some(tags) = self.tags {
            item.tags = tags;
        }
        if let Some(display_order) = self.display_order {
            item.display_order = display_order;
        }
        if let Some(groups) = self.option_groups {
            item.option_groups = groups;
        }
        if let Some(excluded) = self.exclude_options {
            item.exclude_options = excluded;
        }
    }
}

pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

fn ensure_unique_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
    scope: impl Fn() -> String,
    what: &str,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(KioskError::conflict(
                scope(),
                format!("{what} name '{name}' is already used"),
            ));
        }
    }
    Ok(())
}

fn check_option_groups(groups: &[OptionGroup], scope: &str) -> Result<()> {
    ensure_unique_names(
        groups.iter().map(|group| group.name.as_str()),
        || scope.to_string(),
        "option group",
    )?;
    for group in groups {
        ensure_unique_names(
            group.items.iter().map(|option| option.name.as_str()),
            || format!("option group {}", group.id),
            "option",
        )?;
    }
    Ok(())
}

/// Name rules for one category and everything below it.
fn check_category(category: &MenuCategory) -> Result<()> {
    let scope = format!("category {}", category.id);
    ensure_unique_names(
        category.items.iter().map(|item| item.name.as_str()),
        || scope.clone(),
        "item",
    )?;
    check_option_groups(&category.common_option_groups, &scope)?;
    for item in &category.items {
        check_option_groups(&item.option_groups, &format!("item {}", item.id))?;
    }
    Ok(())
}

fn category_mut<'a>(categories: &'a mut [MenuCategory], id: &str) -> Result<&'a mut MenuCategory> {
    categories
        .iter_mut()
        .find(|category| category.id == id)
        .ok_or_else(|| KioskError::not_found(EntityKind::Category, id))
}

/// The category holding `item_id`.
fn owner_mut<'a>(categories: &'a mut [MenuCategory], item_id: &str) -> Result<&'a mut MenuCategory> {
    categories
        .iter_mut()
        .find(|category| category.items.iter().any(|item| item.id == item_id))
        .ok_or_else(|| KioskError::not_found(EntityKind::MenuItem, item_id))
}

fn item_mut<'a>(category: &'a mut MenuCategory, item_id: &str) -> Result<&'a mut MenuItem> {
    category
        .items
        .iter_mut()
        .find(|item| item.id == item_id)
        .ok_or_else(|| KioskError::not_found(EntityKind::MenuItem, item_id))
}

impl ProfileEngine {
    /// Copy the working categories, edit them and stage the result.
    fn edit_categories<T, F>(&mut self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<MenuCategory>) -> Result<T>,
    {
        let mut categories = self.get_profile(false)?.menu.categories.clone();
        let out = edit(&mut categories)?;
        self.stage_changes(ProfilePatch::categories(categories))?;
        Ok(out)
    }

    /// Categories ordered by display order.
    pub fn get_categories(&self, committed_only: bool) -> Result<Vec<&MenuCategory>> {
        let mut categories: Vec<&MenuCategory> =
            self.get_profile(committed_only)?.menu.categories.iter().collect();
        categories.sort_by_key(|category| category.display_order);
        Ok(categories)
    }

    /// One category of the working document.
    pub fn get_category(&self, id: &str) -> Result<&MenuCategory> {
        self.get_profile(false)?
            .category(id)
            .ok_or_else(|| KioskError::not_found(EntityKind::Category, id))
    }

    /// Items matching `filter`, in menu order.
    pub fn get_menu_items(&self, filter: &MenuItemFilter) -> Result<Vec<&MenuItem>> {
        let profile = self.get_profile(filter.committed_only)?;
        Ok(profile
            .menu
            .categories
            .iter()
            .flat_map(|category| {
                category
                    .items
                    .iter()
                    .filter(move |item| filter.matches(category, item))
            })
            .collect())
    }

    /// One item of the working document.
    pub fn get_menu_item(&self, id: &str) -> Result<&MenuItem> {
        self.get_profile(false)?
            .item(id)
            .map(|(_, item)| item)
            .ok_or_else(|| KioskError::not_found(EntityKind::MenuItem, id))
    }

    /// Option groups offered for an item: the category's common groups,
    /// overridden by same-id item groups, followed by item-only groups.
    ///
    /// `excludeOptions` is not applied here.
    pub fn get_effective_option_groups(&self, item_id: &str) -> Result<Vec<OptionGroup>> {
        let (category, item) = self
            .get_profile(false)?
            .item(item_id)
            .ok_or_else(|| KioskError::not_found(EntityKind::MenuItem, item_id))?;
        Ok(item.effective_option_groups(category))
    }

    /// Stage a new category and return its id.
    ///
    /// # Errors
    ///
    /// `Conflict` if option group or option names repeat.
    pub fn add_category(&mut self, category: NewCategory) -> Result<String> {
        let id = generate_id();
        let category = category.into_category(id.clone());
        check_category(&category)?;
        self.edit_categories(|categories| {
            categories.push(category);
            Ok(())
        })?;
        info!(category_id = %id, "Category added");
        Ok(id)
    }

    /// Stage changes to a category.
    pub fn update_category(&mut self, id: &str, update: CategoryUpdate) -> Result<()> {
        self.edit_categories(|categories| {
            let category = category_mut(categories, id)?;
            update.apply_to(category);
            check_category(category)
        })
    }

    /// Stage removal of a category and its items.
    pub fn remove_category(&mut self, id: &str) -> Result<()> {
        self.edit_categories(|categories| {
            let before = categories.len();
            categories.retain(|category| category.id != id);
            if categories.len() == before {
                return Err(KioskError::not_found(EntityKind::Category, id));
            }
            Ok(())
        })?;
        info!(category_id = %id, "Category removed");
        Ok(())
    }

    /// Stage a new item in `category_id` and return its id.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown category; `Conflict` if the item name is
    /// already used in the category.
    pub fn add_menu_item(&mut self, category_id: &str, item: NewMenuItem) -> Result<String> {
        let id = generate_id();
        let item = item.into_item(id.clone());
        self.edit_categories(|categories| {
            let category = category_mut(categories, category_id)?;
            category.items.push(item);
            check_category(category)
        })?;
        info!(item_id = %id, category_id, "Menu item added");
        Ok(id)
    }

    /// Stage changes to an item.
    pub fn update_menu_item(&mut self, item_id: &str, update: MenuItemUpdate) -> Result<()> {
        self.edit_categories(|categories| {
            let category = owner_mut(categories, item_id)?;
            update.apply_to(item_mut(category, item_id)?);
            check_category(category)
        })
    }

    /// Stage removal of an item.
    pub fn remove_menu_item(&mut self, item_id: &str) -> Result<()> {
        self.edit_categories(|categories| {
            let category = owner_mut(categories, item_id)?;
            category.items.retain(|item| item.id != item_id);
            Ok(())
        })?;
        info!(item_id, "Menu item removed");
        Ok(())
    }

    /// Stage an availability change for an item.
    pub fn set_item_availability(&mut self, item_id: &str, available: bool) -> Result<()> {
        self.update_menu_item(
            item_id,
            MenuItemUpdate {
                available: Some(available),
                ..MenuItemUpdate::default()
            },
        )
    }
}
