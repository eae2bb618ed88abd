pub mod auth;
pub mod villa;
pub mod villa_number;
