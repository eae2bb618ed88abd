use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Entity;
use crate::models::ValidationErrors;

pub const MAX_NAME_LENGTH: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Villa {
    pub id: i32,
    pub name: String,
    pub details: Option<String>,
    pub rate: f64,
    pub sqft: i32,
    pub occupancy: i32,
    pub image_url: Option<String>,
    pub amenity: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Entity for Villa {
    const TABLE: &'static str = "villas";
    const KEY: &'static str = "id";
    const GENERATED_KEY: bool = true;

    fn key(&self) -> i32 {
        self.id
    }

    fn set_key(&mut self, key: i32) {
        self.id = key;
    }

    fn touch(&mut self) {
        self.updated_date = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaDto {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub sqft: i32,
    #[serde(default)]
    pub occupancy: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub amenity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaCreateDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub sqft: i32,
    #[serde(default)]
    pub occupancy: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub amenity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaUpdateDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub sqft: i32,
    #[serde(default)]
    pub occupancy: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub amenity: Option<String>,
}

fn validate_fields(name: &str, rate: f64, sqft: i32, occupancy: i32) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    errors.required("name", name);
    errors.max_length("name", name, MAX_NAME_LENGTH);
    errors.non_negative("rate", rate);
    errors.non_negative("sqft", f64::from(sqft));
    errors.non_negative("occupancy", f64::from(occupancy));
    errors
}

impl VillaCreateDto {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_fields(&self.name, self.rate, self.sqft, self.occupancy).finish()
    }
}

impl VillaUpdateDto {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = validate_fields(&self.name, self.rate, self.sqft, self.occupancy);
        errors.positive("id", self.id);
        errors.finish()
    }

    /// Apply the DTO over a stored villa, keeping its creation time
    pub fn merge_into(self, existing: Villa) -> Villa {
        Villa {
            id: existing.id,
            name: self.name,
            details: self.details,
            rate: self.rate,
            sqft: self.sqft,
            occupancy: self.occupancy,
            image_url: self.image_url,
            amenity: self.amenity,
            created_date: existing.created_date,
            updated_date: Utc::now(),
        }
    }
}

impl From<Villa> for VillaDto {
    fn from(villa: Villa) -> Self {
        Self {
            id: villa.id,
            name: villa.name,
            details: villa.details,
            rate: villa.rate,
            sqft: villa.sqft,
            occupancy: villa.occupancy,
            image_url: villa.image_url,
            amenity: villa.amenity,
        }
    }
}

impl From<Villa> for VillaUpdateDto {
    fn from(villa: Villa) -> Self {
        Self {
            id: villa.id,
            name: villa.name,
            details: villa.details,
            rate: villa.rate,
            sqft: villa.sqft,
            occupancy: villa.occupancy,
            image_url: villa.image_url,
            amenity: villa.amenity,
        }
    }
}

impl From<VillaCreateDto> for Villa {
    fn from(dto: VillaCreateDto) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: dto.name,
            details: dto.details,
            rate: dto.rate,
            sqft: dto.sqft,
            occupancy: dto.occupancy,
            image_url: dto.image_url,
            amenity: dto.amenity,
            created_date: now,
            updated_date: now,
        }
    }
}

impl From<VillaDto> for VillaUpdateDto {
    fn from(dto: VillaDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            details: dto.details,
            rate: dto.rate,
            sqft: dto.sqft,
            occupancy: dto.occupancy,
            image_url: dto.image_url,
            amenity: dto.amenity,
        }
    }
}

/// Villas inserted into an empty store on first start
pub fn sample_villas() -> Vec<VillaCreateDto> {
    [
        ("Ocean View Villa", 100, 4),
        ("Mountain Retreat Villa", 200, 27),
        ("City Lights Villa", 522, 44),
        ("Countryside Villa", 785, 9),
    ]
    .into_iter()
    .map(|(name, sqft, occupancy)| VillaCreateDto {
        name: name.to_string(),
        sqft,
        occupancy,
        ..Default::default()
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str) -> VillaCreateDto {
        VillaCreateDto {
            name: name.to_string(),
            rate: 150.0,
            sqft: 500,
            occupancy: 4,
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_reasonable_villa() {
        assert!(create("Royal Villa").validate().is_ok());
    }

    #[test]
    fn name_is_required_and_bounded() {
        let err = create("   ").validate().unwrap_err();
        assert!(err.fields.contains_key("name"));

        let err = create(&"x".repeat(31)).validate().unwrap_err();
        assert!(err.fields["name"].contains("30"));

        assert!(create(&"x".repeat(30)).validate().is_ok());
    }

    #[test]
    fn rejects_negative_numbers() {
        let mut dto = create("Royal Villa");
        dto.rate = -1.0;
        dto.occupancy = -2;
        let err = dto.validate().unwrap_err();
        assert!(err.fields.contains_key("rate"));
        assert!(err.fields.contains_key("occupancy"));
        assert!(!err.fields.contains_key("sqft"));
    }

    #[test]
    fn update_requires_an_id() {
        let dto = VillaUpdateDto {
            name: "Royal Villa".to_string(),
            ..Default::default()
        };
        assert!(dto.validate().unwrap_err().fields.contains_key("id"));
    }

    #[test]
    fn merge_keeps_identity_and_creation_time() {
        let mut existing = Villa::from(create("Old"));
        existing.id = 7;
        let created = existing.created_date;

        let updated = VillaUpdateDto {
            id: 7,
            name: "New".to_string(),
            occupancy: 9,
            ..Default::default()
        }
        .merge_into(existing);

        assert_eq!(updated.id, 7);
        assert_eq!(updated.name, "New");
        assert_eq!(updated.occupancy, 9);
        assert_eq!(updated.created_date, created);
    }

    #[test]
    fn dto_uses_camel_case() {
        let mut villa = Villa::from(create("Royal Villa"));
        villa.image_url = Some("https://img/1.png".to_string());
        let json = serde_json::to_value(VillaDto::from(villa)).unwrap();
        assert_eq!(json["imageUrl"], "https://img/1.png");
        assert!(json.get("image_url").is_none());
    }
}
