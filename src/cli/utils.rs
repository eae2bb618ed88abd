use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::models::{VillaDto, VillaNumberDto};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a value as JSON, or with `text` for the human format
pub fn output_value<T: Serialize>(
    output_format: &OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text(value)),
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("[]"),
        OutputFormat::Text => println!("{}", message),
    }
    Ok(())
}

pub fn villa_line(villa: &VillaDto) -> String {
    format!(
        "{:>4}  {:<30}  occ {:>3}  {:>6} sqft  rate {:>8.2}  {}",
        villa.id,
        villa.name,
        villa.occupancy,
        villa.sqft,
        villa.rate,
        villa.amenity.as_deref().unwrap_or("")
    )
}

pub fn villa_number_line(number: &VillaNumberDto) -> String {
    let villa = number.villa.as_ref().map(|v| v.name.as_str()).unwrap_or("?");
    format!(
        "{:>6}  villa {:>4} ({})  {}",
        number.villa_no,
        number.villa_id,
        villa,
        number.special_details.as_deref().unwrap_or("")
    )
}

pub fn table<T>(rows: &[T], line: impl Fn(&T) -> String) -> String {
    rows.iter().map(line).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn villa_number_line_names_the_villa() {
        let number = VillaNumberDto {
            villa_no: 101,
            villa_id: 3,
            special_details: Some("corner".to_string()),
            villa: None,
        };
        assert_eq!(villa_number_line(&number), "   101  villa    3 (?)  corner");
    }
}
