//! Partial profile updates
//!
//! A [`ProfilePatch`] names only the fields it changes. Patches combine with
//! [`ProfilePatch::merge`]: the `storeInfo`, `menu` and `settings` sections
//! merge field by field, while every value below them (arrays, maps,
//! scalars) is replaced as a whole by the newer patch.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::profile::{
    BusinessHours, FontSize, MenuCategory, Profile, Promotion, Settings, StoreInfo, Theme,
};

fn overlay<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

fn assign<T>(target: &mut T, value: &Option<T>)
where
    T: Clone,
{
    if let Some(value) = value {
        *target = value.clone();
    }
}

/// Deserialize a field that distinguishes "absent" from explicit `null`.
///
/// Absent stays `None` through `#[serde(default)]`; `null` becomes
/// `Some(None)` and clears the target field.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of a [`Profile`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// New document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// New document version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// New creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// New modification timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Store info fields to change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_info: Option<StoreInfoPatch>,
    /// Menu fields to change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuPatch>,
    /// Replacement promotion list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotions: Option<Vec<Promotion>>,
    /// Settings fields to change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsPatch>,
}

impl ProfilePatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Patch that replaces the menu category list.
    pub fn categories(categories: Vec<MenuCategory>) -> Self {
        Self {
            menu: Some(MenuPatch {
                categories: Some(categories),
            }),
            ..Self::default()
        }
    }

    /// Patch that replaces the promotion list.
    pub fn promotions(promotions: Vec<Promotion>) -> Self {
        Self {
            promotions: Some(promotions),
            ..Self::default()
        }
    }

    /// Fold a newer patch into this one.
    pub fn merge(&mut self, newer: ProfilePatch) {
        overlay(&mut self.id, newer.id);
        overlay(&mut self.version, newer.version);
        overlay(&mut self.created_at, newer.created_at);
        overlay(&mut self.updated_at, newer.updated_at);
        match (&mut self.store_info, newer.store_info) {
            (Some(current), Some(newer)) => current.merge(newer),
            (slot, newer) => overlay(slot, newer),
        }
        match (&mut self.menu, newer.menu) {
            (Some(current), Some(newer)) => current.merge(newer),
            (slot, newer) => overlay(slot, newer),
        }
        overlay(&mut self.promotions, newer.promotions);
        match (&mut self.settings, newer.settings) {
            (Some(current), Some(newer)) => current.merge(newer),
            (slot, newer) => overlay(slot, newer),
        }
    }

    /// Write every field named by the patch into `profile`.
    pub fn apply_to(&self, profile: &mut Profile) {
        assign(&mut profile.id, &self.id);
        assign(&mut profile.version, &self.version);
        assign(&mut profile.created_at, &self.created_at);
        assign(&mut profile.updated_at, &self.updated_at);
        if let Some(store_info) = &self.store_info {
            store_info.apply_to(&mut profile.store_info);
        }
        if let Some(menu) = &self.menu {
            assign(&mut profile.menu.categories, &menu.categories);
        }
        assign(&mut profile.promotions, &self.promotions);
        if let Some(settings) = &self.settings {
            settings.apply_to(&mut profile.settings);
        }
    }

    /// `base` with this patch applied.
    pub fn applied(&self, base: &Profile) -> Profile {
        let mut profile = base.clone();
        self.apply_to(&mut profile);
        profile
    }
}

impl From<Profile> for ProfilePatch {
    fn from(profile: Profile) -> Self {
        Self {
            id: Some(profile.id),
            version: Some(profile.version),
            created_at: Some(profile.created_at),
            updated_at: Some(profile.updated_at),
            store_info: Some(profile.store_info.into()),
            menu: Some(MenuPatch {
                categories: Some(profile.menu.categories),
            }),
            promotions: Some(profile.promotions),
            settings: Some(profile.settings.into()),
        }
    }
}

/// Partial update of [`StoreInfo`].
///
/// Optional store fields are cleared by an explicit `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfoPatch {
    /// New store id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New currency code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// New description
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    /// New address
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<Option<String>>,
    /// New phone number
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<Option<String>>,
    /// New tax rate
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub tax_rate: Option<Option<f64>>,
    /// Replacement opening hours
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub business_hours: Option<Option<BTreeMap<String, BusinessHours>>>,
}

impl StoreInfoPatch {
    /// Fold a newer store info patch into this one.
    pub fn merge(&mut self, newer: StoreInfoPatch) {
        overlay(&mut self.id, newer.id);
        overlay(&mut self.name, newer.name);
        overlay(&mut self.currency, newer.currency);
        overlay(&mut self.description, newer.description);
        overlay(&mut self.address, newer.address);
        overlay(&mut self.phone, newer.phone);
        overlay(&mut self.tax_rate, newer.tax_rate);
        overlay(&mut self.business_hours, newer.business_hours);
    }

    /// Write every named field into `store_info`.
    pub fn apply_to(&self, store_info: &mut StoreInfo) {
        assign(&mut store_info.id, &self.id);
        assign(&mut store_info.name, &self.name);
        assign(&mut store_info.currency, &self.currency);
        assign(&mut store_info.description, &self.description);
        assign(&mut store_info.address, &self.address);
        assign(&mut store_info.phone, &self.phone);
        assign(&mut store_info.tax_rate, &self.tax_rate);
        assign(&mut store_info.business_hours, &self.business_hours);
    }
}

impl From<StoreInfo> for StoreInfoPatch {
    fn from(info: StoreInfo) -> Self {
        Self {
            id: Some(info.id),
            name: Some(info.name),
            currency: Some(info.currency),
            description: Some(info.description),
            address: Some(info.address),
            phone: Some(info.phone),
            tax_rate: Some(info.tax_rate),
            business_hours: Some(info.business_hours),
        }
    }
}

/// Partial update of the menu.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuPatch {
    /// Replacement category list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<MenuCategory>>,
}

impl MenuPatch {
    /// Fold a newer menu patch into this one.
    pub fn merge(&mut self, newer: MenuPatch) {
        overlay(&mut self.categories, newer.categories);
    }
}

/// Partial update of [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New theme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    /// New font size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
    /// New language tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Toggle the voice assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_enabled: Option<bool>,
    /// New idle timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_seconds: Option<u32>,
    /// Toggle calorie display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_calories: Option<bool>,
    /// Toggle age verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_verification: Option<bool>,
}

impl SettingsPatch {
    /// Fold a newer settings patch into this one.
    pub fn merge(&mut self, newer: SettingsPatch) {
        overlay(&mut self.theme, newer.theme);
        overlay(&mut self.font_size, newer.font_size);
        overlay(&mut self.language, newer.language);
        overlay(&mut self.voice_enabled, newer.voice_enabled);
        overlay(&mut self.idle_timeout_seconds, newer.idle_timeout_seconds);
        overlay(&mut self.show_calories, newer.show_calories);
        overlay(&mut self.age_verification, newer.age_verification);
    }

    /// Write every named field into `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        assign(&mut settings.theme, &self.theme);
        assign(&mut settings.font_size, &self.font_size);
        assign(&mut settings.language, &self.language);
        assign(&mut settings.voice_enabled, &self.voice_enabled);
        assign(&mut settings.idle_timeout_seconds, &self.idle_timeout_seconds);
        assign(&mut settings.show_calories, &self.show_calories);
        assign(&mut settings.age_verification, &self.age_verification);
    }
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            theme: Some(settings.theme),
            font_size: Some(settings.font_size),
            language: Some(settings.language),
            voice_enabled: Some(settings.voice_enabled),
            idle_timeout_seconds: Some(settings.idle_timeout_seconds),
            show_calories: Some(settings.show_calories),
            age_verification: Some(settings.age_verification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_test_helpers::prelude::*;
    use serde_json::json;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn sample() -> Result<Profile, serde_json::Error> {
        serde_json::from_value(sample_profile_json())
    }

    #[test]
    fn test_store_info_fields_merge() -> TestResult {
        let mut staged: ProfilePatch =
            serde_json::from_value(json!({"storeInfo": {"name": "Y"}}))?;
        staged.merge(serde_json::from_value(json!({"storeInfo": {"phone": "02-000"}}))?);

        let store = staged.store_info.as_ref().ok_or("store info missing")?;
        assert_eq!(store.name.as_deref(), Some("Y"));
        assert_eq!(store.phone, Some(Some("02-000".to_string())));
        Ok(())
    }

    #[test]
    fn test_null_clears_optional_store_field() -> TestResult {
        let mut profile = sample()?;
        profile.store_info.phone = Some("02-123".to_string());

        let clear: ProfilePatch = serde_json::from_value(json!({"storeInfo": {"phone": null}}))?;
        assert_eq!(clear.applied(&profile).store_info.phone, None);

        let absent: ProfilePatch = serde_json::from_value(json!({"storeInfo": {"name": "Y"}}))?;
        assert_eq!(absent.applied(&profile).store_info.phone.as_deref(), Some("02-123"));
        Ok(())
    }

    #[test]
    fn test_patch_from_profile_reproduces_it() -> TestResult {
        let base = sample()?;
        let mut target = sample()?;
        target.store_info.phone = None;
        target.store_info.name = "Y".to_string();

        let patch = ProfilePatch::from(target.clone());
        assert_eq!(patch.applied(&base), target);
        Ok(())
    }

    #[test]
    fn test_later_categories_replace_earlier() -> TestResult {
        let profile = sample()?;
        let mut staged = ProfilePatch::categories(profile.menu.categories.clone());
        staged.merge(ProfilePatch::categories(Vec::new()));

        let updated = staged.applied(&profile);
        assert!(updated.menu.categories.is_empty());
        Ok(())
    }

    #[test]
    fn test_apply_leaves_untouched_fields() -> TestResult {
        let profile = sample()?;
        let patch: ProfilePatch = serde_json::from_value(json!({
            "storeInfo": {"name": "Y"},
            "settings": {"theme": "dark"}
        }))?;

        let updated = patch.applied(&profile);
        assert_eq!(updated.store_info.name, "Y");
        assert_eq!(updated.store_info.currency, profile.store_info.currency);
        assert_eq!(updated.settings.theme, Theme::Dark);
        assert_eq!(updated.settings.language, profile.settings.language);
        assert_eq!(updated.menu, profile.menu);
        Ok(())
    }

    #[test]
    fn test_full_patch_reproduces_profile() -> TestResult {
        let profile = sample()?;
        let mut other = profile.clone();
        other.store_info.name = "Other".into();
        other.menu.categories.clear();

        let restored = ProfilePatch::from(profile.clone()).applied(&other);
        assert_eq!(restored, profile);
        Ok(())
    }

    #[test]
    fn test_empty_patch() -> TestResult {
        assert!(ProfilePatch::default().is_empty());
        let patch: ProfilePatch = serde_json::from_value(json!({}))?;
        assert!(patch.is_empty());
        assert_eq!(serde_json::to_value(&patch)?, json!({}));
        Ok(())
    }
}
