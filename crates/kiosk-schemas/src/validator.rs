//! Structural and referential validation of profile documents
//!
//! The validator works on untyped JSON so that it can report every problem in
//! a document that would not even deserialize. Issues are addressed with
//! dotted/indexed paths such as `menu.categories[0].items[1].price`.

use std::collections::HashSet;

use chrono::{DateTime, NaiveTime};
use kiosk_errors::{ValidationError, ValidationIssue};
use serde_json::{Map, Value};

use crate::exclusion::{GroupIndex, resolve_exclusion};
use crate::profile::{FontSize, Profile, PromotionType, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Full,
    Partial,
}

impl Mode {
    fn requires(self) -> bool {
        self == Mode::Full
    }
}

/// Validates full profiles and partial updates.
///
/// The issue buffer is reset at the start of every call and holds the issues
/// of the most recent call only.
#[derive(Debug, Default)]
pub struct ProfileValidator {
    issues: Vec<ValidationIssue>,
}

impl ProfileValidator {
    /// Create a validator with an empty issue buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a complete document. Returns `true` when no issue was found.
    pub fn validate(&mut self, candidate: &Value) -> bool {
        self.run(candidate, Mode::Full)
    }

    /// Check a partial document; only present fields are examined.
    pub fn validate_partial(&mut self, candidate: &Value) -> bool {
        self.run(candidate, Mode::Partial)
    }

    /// Check a typed profile.
    pub fn validate_profile(&mut self, profile: &Profile) -> bool {
        match serde_json::to_value(profile) {
            Ok(value) => self.validate(&value),
            Err(e) => {
                self.issues = vec![ValidationIssue::new("", format!("unserializable: {e}"))];
                false
            }
        }
    }

    /// Issues recorded by the most recent call.
    pub fn errors(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Full validation as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns every recorded issue when the document is invalid.
    pub fn check(&mut self, candidate: &Value) -> Result<(), ValidationError> {
        if self.validate(candidate) {
            Ok(())
        } else {
            Err(ValidationError::new(self.issues.clone()))
        }
    }

    /// Partial validation as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns every recorded issue when the partial document is invalid.
    pub fn check_partial(&mut self, candidate: &Value) -> Result<(), ValidationError> {
        if self.validate_partial(candidate) {
            Ok(())
        } else {
            Err(ValidationError::new(self.issues.clone()))
        }
    }

    fn run(&mut self, candidate: &Value, mode: Mode) -> bool {
        self.issues.clear();
        let mut checker = Checker {
            issues: &mut self.issues,
        };
        checker.document(candidate, mode);
        if !self.issues.is_empty() {
            tracing::debug!(
                issues = self.issues.len(),
                partial = (mode == Mode::Partial),
                "profile validation failed"
            );
        }
        self.issues.is_empty()
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{path}[{i}]")
}

fn is_hh_mm(s: &str) -> bool {
    s.len() == 5 && NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}

struct Checker<'a> {
    issues: &'a mut Vec<ValidationIssue>,
}

impl Checker<'_> {
    fn issue(&mut self, path: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    fn as_object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.issue(path, "must be an object");
        }
        object
    }

    fn field<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'v Value> {
        match obj.get(key) {
            Some(Value::Null) | None => {
                if required {
                    self.issue(&join(path, key), "is required");
                }
                None
            }
            Some(value) => Some(value),
        }
    }

    fn text<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'v str> {
        let value = self.field(obj, path, key, required)?;
        let text = value.as_str();
        if text.is_none() {
            self.issue(&join(path, key), "must be a string");
        }
        text
    }

    fn identifier<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'v str> {
        let text = self.text(obj, path, key, required)?;
        if text.trim().is_empty() {
            self.issue(&join(path, key), "must not be empty");
            return None;
        }
        Some(text)
    }

    fn number(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
        range: (f64, Option<f64>),
    ) -> Option<f64> {
        let value = self.field(obj, path, key, required)?;
        let Some(n) = value.as_f64() else {
            self.issue(&join(path, key), "must be a number");
            return None;
        };
        let (min, max) = range;
        if n < min {
            self.issue(&join(path, key), format!("must be at least {min}"));
        } else if let Some(max) = max.filter(|max| n > *max) {
            self.issue(&join(path, key), format!("must be at most {max}"));
        }
        Some(n)
    }

    fn integer(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
        range: (u64, Option<u64>),
    ) {
        let Some(value) = self.field(obj, path, key, required) else {
            return;
        };
        let Some(n) = value.as_u64() else {
            self.issue(&join(path, key), "must be a non-negative integer");
            return;
        };
        let (min, max) = range;
        if n < min {
            self.issue(&join(path, key), format!("must be at least {min}"));
        } else if let Some(max) = max.filter(|max| n > *max) {
            self.issue(&join(path, key), format!("must be at most {max}"));
        }
    }

    fn boolean(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> Option<bool> {
        let value = self.field(obj, path, key, false)?;
        let flag = value.as_bool();
        if flag.is_none() {
            self.issue(&join(path, key), "must be a boolean");
        }
        flag
    }

    fn one_of<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
        allowed: &[&str],
    ) -> Option<&'v str> {
        let text = self.text(obj, path, key, required)?;
        if allowed.contains(&text) {
            Some(text)
        } else {
            self.issue(
                &join(path, key),
                format!("must be one of {}, got '{text}'", allowed.join(", ")),
            );
            None
        }
    }

    fn timestamp(&mut self, obj: &Map<String, Value>, path: &str, key: &str, required: bool) {
        if let Some(text) = self.text(obj, path, key, required) {
            if DateTime::parse_from_rfc3339(text).is_err() {
                self.issue(&join(path, key), format!("'{text}' is not an RFC 3339 timestamp"));
            }
        }
    }

    fn time_of_day<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'v str> {
        let text = self.text(obj, path, key, true)?;
        if is_hh_mm(text) {
            Some(text)
        } else {
            self.issue(&join(path, key), format!("'{text}' is not an HH:MM time"));
            None
        }
    }

    fn array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'v [Value]> {
        let value = self.field(obj, path, key, required)?;
        let items = value.as_array().map(Vec::as_slice);
        if items.is_none() {
            self.issue(&join(path, key), "must be an array");
        }
        items
    }

    fn string_array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Vec<(usize, &'v str)> {
        let Some(items) = self.array(obj, path, key, false) else {
            return Vec::new();
        };
        let base = join(path, key);
        let mut strings = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => strings.push((i, s)),
                None => self.issue(&index(&base, i), "must be a string"),
            }
        }
        strings
    }

    fn duplicate(&mut self, seen: &mut HashSet<String>, path: &str, what: &str, id: Option<&str>) {
        if let Some(id) = id {
            if !seen.insert(id.to_string()) {
                self.issue(path, format!("duplicate {what} id '{id}'"));
            }
        }
    }

    fn document(&mut self, candidate: &Value, mode: Mode) {
        let Some(doc) = candidate.as_object() else {
            self.issue("", "document must be a JSON object");
            return;
        };
        let required = mode.requires();

        self.identifier(doc, "", "id", required);
        self.identifier(doc, "", "version", required);
        self.timestamp(doc, "", "createdAt", required);
        self.timestamp(doc, "", "updatedAt", required);

        if let Some(store) = self.field(doc, "", "storeInfo", required) {
            self.store_info(store, "storeInfo", mode);
        }
        if let Some(menu) = self.field(doc, "", "menu", required) {
            self.menu(menu, "menu", mode);
        }
        if let Some(promotions) = self.array(doc, "", "promotions", false) {
            let mut seen = HashSet::new();
            for (i, promotion) in promotions.iter().enumerate() {
                let path = index("promotions", i);
                let id = self.promotion(promotion, &path);
                self.duplicate(&mut seen, &join(&path, "id"), "promotion", id);
            }
        }
        if let Some(settings) = self.field(doc, "", "settings", false) {
            self.settings(settings, "settings");
        }
    }

    fn store_info(&mut self, value: &Value, path: &str, mode: Mode) {
        let Some(store) = self.as_object(value, path) else {
            return;
        };
        let required = mode.requires();
        self.identifier(store, path, "id", required);
        self.identifier(store, path, "name", required);
        self.identifier(store, path, "currency", required);
        self.text(store, path, "description", false);
        self.text(store, path, "address", false);
        self.text(store, path, "phone", false);
        self.number(store, path, "taxRate", false, (0.0, Some(1.0)));

        if let Some(hours) = self.field(store, path, "businessHours", false) {
            let hours_path = join(path, "businessHours");
            if let Some(days) = self.as_object(hours, &hours_path) {
                for (day, entry) in days {
                    self.business_day(entry, &join(&hours_path, day));
                }
            }
        }
    }

    fn business_day(&mut self, value: &Value, path: &str) {
        let Some(day) = self.as_object(value, path) else {
            return;
        };
        let open = self.time_of_day(day, path, "open");
        let close = self.time_of_day(day, path, "close");
        let closed = self.boolean(day, path, "closed").unwrap_or(false);
        if let (Some(open), Some(close), false) = (open, close, closed) {
            // Zero-padded HH:MM compares correctly as text.
            if open >= close {
                self.issue(path, format!("open {open} must be before close {close}"));
            }
        }
    }

    fn menu(&mut self, value: &Value, path: &str, mode: Mode) {
        let Some(menu) = self.as_object(value, path) else {
            return;
        };
        let Some(categories) = self.array(menu, path, "categories", mode.requires()) else {
            return;
        };
        let categories_path = join(path, "categories");
        let mut category_ids = HashSet::new();
        let mut item_ids = HashSet::new();
        for (i, category) in categories.iter().enumerate() {
            let category_path = index(&categories_path, i);
            let id = self.category(category, &category_path, &mut item_ids);
            self.duplicate(&mut category_ids, &join(&category_path, "id"), "category", id);
        }
    }

    fn category<'v>(
        &mut self,
        value: &'v Value,
        path: &str,
        item_ids: &mut HashSet<String>,
    ) -> Option<&'v str> {
        let category = self.as_object(value, path)?;
        let id = self.identifier(category, path, "id", true);
        self.identifier(category, path, "name", true);
        self.integer(category, path, "displayOrder", true, (0, None));
        self.text(category, path, "description", false);
        self.text(category, path, "icon", false);
        self.boolean(category, path, "available");

        let common = self.option_groups(category, path, "commonOptionGroups");

        if let Some(items) = self.array(category, path, "items", false) {
            let items_path = join(path, "items");
            for (i, item) in items.iter().enumerate() {
                let item_path = index(&items_path, i);
                let item_id = self.item(item, &item_path, &common);
                self.duplicate(item_ids, &join(&item_path, "id"), "item", item_id);
            }
        }
        id
    }

    fn item<'v>(&mut self, value: &'v Value, path: &str, common: &[GroupIndex]) -> Option<&'v str> {
        let item = self.as_object(value, path)?;
        let id = self.identifier(item, path, "id", true);
        self.identifier(item, path, "name", true);
        self.number(item, path, "price", true, (0.0, None));
        self.text(item, path, "description", false);
        self.text(item, path, "imageUrl", false);
        self.boolean(item, path, "available");
        self.boolean(item, path, "popular");
        self.integer(item, path, "spicyLevel", false, (0, Some(5)));
        self.integer(item, path, "calories", false, (0, None));
        self.string_array(item, path, "tags");
        self.integer(item, path, "displayOrder", false, (0, None));

        let mut visible = common.to_vec();
        visible.extend(self.option_groups(item, path, "optionGroups"));

        let exclude_path = join(path, "excludeOptions");
        for (i, reference) in self.string_array(item, path, "excludeOptions") {
            if resolve_exclusion(reference, &visible).is_none() {
                self.issue(
                    &index(&exclude_path, i),
                    format!("'{reference}' matches no option group or option of this item"),
                );
            }
        }
        id
    }

    fn option_groups(
        &mut self,
        owner: &Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Vec<GroupIndex> {
        let Some(groups) = self.array(owner, path, key, false) else {
            return Vec::new();
        };
        let groups_path = join(path, key);
        groups
            .iter()
            .enumerate()
            .filter_map(|(i, group)| self.option_group(group, &index(&groups_path, i)))
            .collect()
    }

    fn option_group(&mut self, value: &Value, path: &str) -> Option<GroupIndex> {
        let group = self.as_object(value, path)?;
        let id = self.identifier(group, path, "id", true);
        self.identifier(group, path, "name", true);
        self.boolean(group, path, "required");
        self.boolean(group, path, "multiple");
        self.integer(group, path, "maxSelections", false, (1, None));

        let mut option_ids = Vec::new();
        if let Some(options) = self.array(group, path, "items", false) {
            let options_path = join(path, "items");
            let mut seen = HashSet::new();
            for (i, option) in options.iter().enumerate() {
                let option_path = index(&options_path, i);
                let option_id = self.option_item(option, &option_path);
                self.duplicate(&mut seen, &join(&option_path, "id"), "option", option_id);
                option_ids.extend(option_id.map(str::to_string));
            }
        }
        id.map(|id| GroupIndex {
            id: id.to_string(),
            option_ids,
        })
    }

    fn option_item<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v str> {
        let option = self.as_object(value, path)?;
        let id = self.identifier(option, path, "id", true);
        self.identifier(option, path, "name", true);
        self.number(option, path, "price", false, (0.0, None));
        self.boolean(option, path, "available");
        id
    }

    fn promotion<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v str> {
        let promotion = self.as_object(value, path)?;
        let id = self.identifier(promotion, path, "id", true);
        self.identifier(promotion, path, "name", true);
        let kind = self.one_of(promotion, path, "type", true, &PromotionType::NAMES);
        self.text(promotion, path, "description", false);
        let max = (kind == Some("percentage")).then_some(100.0);
        self.number(promotion, path, "discountValue", false, (0.0, max));
        self.string_array(promotion, path, "applicableItems");
        self.timestamp(promotion, path, "startDate", false);
        self.timestamp(promotion, path, "endDate", false);
        self.boolean(promotion, path, "active");
        id
    }

    fn settings(&mut self, value: &Value, path: &str) {
        let Some(settings) = self.as_object(value, path) else {
            return;
        };
        self.one_of(settings, path, "theme", false, &Theme::NAMES);
        self.one_of(settings, path, "fontSize", false, &FontSize::NAMES);
        self.identifier(settings, path, "language", false);
        self.boolean(settings, path, "voiceEnabled");
        self.integer(settings, path, "idleTimeoutSeconds", false, (0, None));
        self.boolean(settings, path, "showCalories");
        self.boolean(settings, path, "ageVerification");
    }
}
