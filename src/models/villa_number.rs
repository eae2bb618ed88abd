use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Entity;
use crate::models::{ValidationErrors, VillaDto};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VillaNumber {
    pub villa_no: i32,
    pub villa_id: i32,
    pub special_details: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Entity for VillaNumber {
    const TABLE: &'static str = "villa_numbers";
    const KEY: &'static str = "villa_no";
    const GENERATED_KEY: bool = false;

    fn key(&self) -> i32 {
        self.villa_no
    }

    fn set_key(&mut self, key: i32) {
        self.villa_no = key;
    }

    fn touch(&mut self) {
        self.updated_date = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaNumberDto {
    pub villa_no: i32,
    pub villa_id: i32,
    #[serde(default)]
    pub special_details: Option<String>,
    /// Parent villa, when it was loaded with the number
    #[serde(default)]
    pub villa: Option<VillaDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaNumberCreateDto {
    #[serde(default)]
    pub villa_no: i32,
    #[serde(default)]
    pub villa_id: i32,
    #[serde(default)]
    pub special_details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaNumberUpdateDto {
    #[serde(default)]
    pub villa_no: i32,
    #[serde(default)]
    pub villa_id: i32,
    #[serde(default)]
    pub special_details: Option<String>,
}

fn validate_keys(villa_no: i32, villa_id: i32) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.positive("villaNo", villa_no);
    errors.positive("villaId", villa_id);
    errors.finish()
}

impl VillaNumberCreateDto {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_keys(self.villa_no, self.villa_id)
    }
}

impl VillaNumberUpdateDto {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_keys(self.villa_no, self.villa_id)
    }

    pub fn merge_into(self, existing: VillaNumber) -> VillaNumber {
        VillaNumber {
            villa_no: existing.villa_no,
            villa_id: self.villa_id,
            special_details: self.special_details,
            created_date: existing.created_date,
            updated_date: Utc::now(),
        }
    }
}

impl VillaNumberDto {
    pub fn with_villa(number: VillaNumber, villa: Option<VillaDto>) -> Self {
        Self {
            villa,
            ..Self::from(number)
        }
    }
}

impl From<VillaNumber> for VillaNumberDto {
    fn from(number: VillaNumber) -> Self {
        Self {
            villa_no: number.villa_no,
            villa_id: number.villa_id,
            special_details: number.special_details,
            villa: None,
        }
    }
}

impl From<VillaNumberCreateDto> for VillaNumber {
    fn from(dto: VillaNumberCreateDto) -> Self {
        let now = Utc::now();
        Self {
            villa_no: dto.villa_no,
            villa_id: dto.villa_id,
            special_details: dto.special_details,
            created_date: now,
            updated_date: now,
        }
    }
}
