//! Promotions, store information and kiosk settings

use kiosk_errors::{EntityKind, KioskError, Result};
use kiosk_schemas::{
    ProfilePatch, Promotion, PromotionType, Settings, SettingsPatch, StoreInfo, StoreInfoPatch,
};
use tracing::info;

use crate::engine::ProfileEngine;
use crate::menu::generate_id;

/// A promotion to add. The id is generated.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPromotion {
    /// Display name
    pub name: String,
    /// Promotion type
    pub kind: PromotionType,
    /// Description
    pub description: Option<String>,
    /// Discount amount or percentage
    pub discount_value: Option<f64>,
    /// Item ids the promotion applies to
    pub applicable_items: Vec<String>,
    /// RFC 3339 start
    pub start_date: Option<String>,
    /// RFC 3339 end
    pub end_date: Option<String>,
    /// Whether the promotion is running
    pub active: bool,
}

impl NewPromotion {
    /// An active promotion with no discount or items.
    pub fn new(name: impl Into<String>, kind: PromotionType) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            discount_value: None,
            applicable_items: Vec::new(),
            start_date: None,
            end_date: None,
            active: true,
        }
    }

    fn into_promotion(self, id: String) -> Promotion {
        Promotion {
            id,
            name: self.name,
            kind: self.kind,
            description: self.description,
            discount_value: self.discount_value,
            applicable_items: self.applicable_items,
            start_date: self.start_date,
            end_date: self.end_date,
            active: self.active,
        }
    }
}

/// Fields to change on a promotion; `None` leaves a field as is and
/// `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromotionUpdate {
    /// Display name
    pub name: Option<String>,
    /// Promotion type
    pub kind: Option<PromotionType>,
    /// Description
    pub description: Option<Option<String>>,
    /// Discount amount or percentage
    pub discount_value: Option<Option<f64>>,
    /// Item ids the promotion applies to
    pub applicable_items: Option<Vec<String>>,
    /// RFC 3339 start
    pub start_date: Option<Option<String>>,
    /// RFC 3339 end
    pub end_date: Option<Option<String>>,
    /// Whether the promotion is running
    pub active: Option<bool>,
}

impl PromotionUpdate {
    fn apply_to(self, promotion: &mut Promotion) {
        if let Some(name) = self.name {
            promotion.name = name;
        }
        if let Some(kind) = self.kind {
            promotion.kind = kind;
        }
        if let Some(description) = self.description {
            promotion.description = description;
        }
        if let Some(discount_value) = self.discount_value {
            promotion.discount_value = discount_value;
        }
        if let Some(items) = self.applicable_items {
            promotion.applicable_items = items;
        }
        if let Some(start_date) = self.start_date {
            promotion.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            promotion.end_date = end_date;
        }
        if let Some(active) = self.active {
            promotion.active = active;
        }
    }
}

impl ProfileEngine {
    fn edit_promotions<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Promotion>) -> Result<()>,
    {
        let mut promotions = self.get_profile(false)?.promotions.clone();
        edit(&mut promotions)?;
        self.stage_changes(ProfilePatch::promotions(promotions))
    }

    /// Promotions of the working document, optionally only active ones.
    pub fn get_promotions(&self, active_only: bool) -> Result<Vec<&Promotion>> {
        Ok(self
            .get_profile(false)?
            .promotions
            .iter()
            .filter(|promotion| !active_only || promotion.active)
            .collect())
    }

    /// One promotion of the working document.
    pub fn get_promotion(&self, id: &str) -> Result<&Promotion> {
        self.get_profile(false)?
            .promotion(id)
            .ok_or_else(|| KioskError::not_found(EntityKind::Promotion, id))
    }

    /// Stage a new promotion and return its id.
    pub fn add_promotion(&mut self, promotion: NewPromotion) -> Result<String> {
        let id = generate_id();
        let promotion = promotion.into_promotion(id.clone());
        self.edit_promotions(|promotions| {
            promotions.push(promotion);
            Ok(())
        })?;
        info!(promotion_id = %id, "Promotion added");
        Ok(id)
    }

    /// Stage changes to a promotion.
    pub fn update_promotion(&mut self, id: &str, update: PromotionUpdate) -> Result<()> {
        self.edit_promotions(|promotions| {
            let promotion = promotions
                .iter_mut()
                .find(|promotion| promotion.id == id)
                .ok_or_else(|| KioskError::not_found(EntityKind::Promotion, id))?;
            update.apply_to(promotion);
            Ok(())
        })
    }

    /// Stage removal of a promotion.
    pub fn remove_promotion(&mut self, id: &str) -> Result<()> {
        self.edit_promotions(|promotions| {
            let before = promotions.len();
            promotions.retain(|promotion| promotion.id != id);
            if promotions.len() == before {
                return Err(KioskError::not_found(EntityKind::Promotion, id));
            }
            Ok(())
        })?;
        info!(promotion_id = %id, "Promotion removed");
        Ok(())
    }

    /// Store information.
    pub fn get_store_info(&self, committed_only: bool) -> Result<&StoreInfo> {
        Ok(&self.get_profile(committed_only)?.store_info)
    }

    /// Stage a store information update.
    pub fn update_store_info(&mut self, update: StoreInfoPatch) -> Result<()> {
        self.stage_changes(ProfilePatch {
            store_info: Some(update),
            ..ProfilePatch::default()
        })
    }

    /// Kiosk settings.
    pub fn get_settings(&self, committed_only: bool) -> Result<&Settings> {
        Ok(&self.get_profile(committed_only)?.settings)
    }

    /// Stage a settings update.
    pub fn update_settings(&mut self, update: SettingsPatch) -> Result<()> {
        self.stage_changes(ProfilePatch {
            settings: Some(update),
            ..ProfilePatch::default()
        })
    }
}
