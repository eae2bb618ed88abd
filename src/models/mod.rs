pub mod pagination;
pub mod user;
pub mod villa;
pub mod villa_number;

use std::collections::HashMap;

use thiserror::Error;

pub use pagination::Pagination;
pub use user::{LocalUser, LoginRequestDto, LoginResponseDto, RegistrationRequestDto, UserDto, UserRole};
pub use villa::{Villa, VillaCreateDto, VillaDto, VillaUpdateDto};
pub use villa_number::{VillaNumber, VillaNumberCreateDto, VillaNumberDto, VillaNumberUpdateDto};

/// Field-level validation failures keyed by the camelCase field name
#[derive(Debug, Default, Error)]
#[error("One or more validation errors occurred.")]
pub struct ValidationErrors {
    pub fields: HashMap<String, String>,
}

impl ValidationErrors {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.insert(field.to_string(), message.into());
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("The {} field is required.", field));
        }
    }

    fn max_length(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("The field {} must be at most {} characters.", field, max));
        }
    }

    fn non_negative(&mut self, field: &str, value: f64) {
        if value < 0.0 {
            self.add(field, format!("The field {} must not be negative.", field));
        }
    }

    fn positive(&mut self, field: &str, value: i32) {
        if value <= 0 {
            self.add(field, format!("The field {} must be greater than zero.", field));
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
