//! Profile fixtures.
//!
//! The sample document models a small burger shop: a "버거" category with two
//! items sharing common `set` and `drink` option groups, a side category and
//! one promotion. The store name is `"X"`.

use std::path::Path;

use serde_json::{Value, json};

/// The sample burger shop profile.
pub fn sample_profile_json() -> Value {
    json!({
        "id": "profile-001",
        "version": "1.0.0",
        "createdAt": "2026-01-05T09:00:00.000Z",
        "updatedAt": "2026-01-05T09:00:00.000Z",
        "storeInfo": {
            "id": "store-001",
            "name": "X",
            "currency": "KRW",
            "address": "서울시 강남구 테헤란로 1",
            "phone": "02-123-4567",
            "taxRate": 0.1,
            "businessHours": {
                "mon": {"open": "09:00", "close": "22:00"},
                "sun": {"open": "10:00", "close": "20:00", "closed": true}
            }
        },
        "menu": {
            "categories": [
                {
                    "id": "버거",
                    "name": "버거",
                    "displayOrder": 1,
                    "available": true,
                    "commonOptionGroups": [
                        {
                            "id": "set",
                            "name": "세트 선택",
                            "required": true,
                            "multiple": false,
                            "items": [
                                {"id": "single", "name": "단품", "price": 0, "available": true},
                                {"id": "combo", "name": "세트", "price": 2000, "available": true}
                            ]
                        },
                        {
                            "id": "drink",
                            "name": "음료 선택",
                            "required": false,
                            "multiple": false,
                            "items": [
                                {"id": "cola", "name": "콜라", "price": 0, "available": true},
                                {"id": "cider", "name": "사이다", "price": 0, "available": true}
                            ]
                        }
                    ],
                    "items": [
                        {
                            "id": "bulgogi-burger",
                            "name": "불고기버거",
                            "price": 5500,
                            "available": true,
                            "popular": true,
                            "calories": 520,
                            "tags": ["beef"],
                            "optionGroups": [
                                {
                                    "id": "extra",
                                    "name": "추가 토핑",
                                    "required": false,
                                    "multiple": true,
                                    "maxSelections": 2,
                                    "items": [
                                        {"id": "cheese", "name": "치즈", "price": 500, "available": true},
                                        {"id": "bacon", "name": "베이컨", "price": 800, "available": false}
                                    ]
                                }
                            ]
                        },
                        {
                            "id": "shrimp-burger",
                            "name": "새우버거",
                            "price": 6000,
                            "available": true,
                            "spicyLevel": 1,
                            "excludeOptions": ["drink.cider"]
                        }
                    ]
                },
                {
                    "id": "사이드",
                    "name": "사이드",
                    "displayOrder": 2,
                    "available": true,
                    "items": [
                        {"id": "fries", "name": "감자튀김", "price": 2000, "available": true}
                    ]
                }
            ]
        },
        "promotions": [
            {
                "id": "promo-combo",
                "name": "세트 할인",
                "type": "discount",
                "discountValue": 1000,
                "applicableItems": ["bulgogi-burger"],
                "active": true
            }
        ],
        "settings": {
            "theme": "light",
            "fontSize": "medium",
            "language": "ko",
            "voiceEnabled": true,
            "idleTimeoutSeconds": 60,
            "showCalories": true,
            "ageVerification": false
        }
    })
}

/// The smallest document that passes full validation.
pub fn minimal_profile_json() -> Value {
    json!({
        "id": "profile-min",
        "version": "1.0.0",
        "createdAt": "2026-01-05T09:00:00.000Z",
        "updatedAt": "2026-01-05T09:00:00.000Z",
        "storeInfo": {"id": "store-min", "name": "Minimal", "currency": "KRW"},
        "menu": {"categories": []}
    })
}

/// Builder over [`sample_profile_json`].
#[derive(Debug, Clone)]
pub struct ProfileFixture {
    doc: Value,
}

impl Default for ProfileFixture {
    fn default() -> Self {
        Self {
            doc: sample_profile_json(),
        }
    }
}

impl ProfileFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimal() -> Self {
        Self {
            doc: minimal_profile_json(),
        }
    }

    pub fn with_store_name(mut self, name: &str) -> Self {
        self.doc["storeInfo"]["name"] = json!(name);
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.doc["version"] = json!(version);
        self
    }

    pub fn with_category(mut self, category: Value) -> Self {
        if let Some(categories) = self.doc["menu"]["categories"].as_array_mut() {
            categories.push(category);
        }
        self
    }

    pub fn without_promotions(mut self) -> Self {
        if let Some(doc) = self.doc.as_object_mut() {
            doc.remove("promotions");
        }
        self
    }

    pub fn build(self) -> Value {
        self.doc
    }
}

/// Write `doc` as pretty JSON to `path`.
pub fn write_json(path: &Path, doc: &Value) -> std::io::Result<()> {
    let text = serde_json::to_string_pretty(doc).map_err(std::io::Error::other)?;
    std::fs::write(path, text)
}
