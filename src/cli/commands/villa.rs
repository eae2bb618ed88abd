use clap::{Args, Subcommand};
use serde_json::{json, Value};

use crate::cli::utils::{output_empty_collection, output_success, output_value, table, villa_line};
use crate::cli::CliContext;
use crate::client::{villa::VillaQuery, VillaClient};
use crate::models::{VillaCreateDto, VillaUpdateDto};

#[derive(Args, Debug, Clone)]
pub struct VillaFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub details: Option<String>,
    #[arg(long, default_value_t = 0.0)]
    pub rate: f64,
    #[arg(long, default_value_t = 0)]
    pub sqft: i32,
    #[arg(long, default_value_t = 0)]
    pub occupancy: i32,
    #[arg(long)]
    pub image_url: Option<String>,
    #[arg(long)]
    pub amenity: Option<String>,
}

#[derive(Subcommand)]
pub enum VillaCommands {
    #[command(about = "List villas")]
    List {
        #[arg(long, help = "Only villas with exactly this occupancy")]
        occupancy: Option<i32>,
        #[arg(long, help = "Case-insensitive match on name or amenity")]
        search: Option<String>,
        #[arg(long)]
        page_size: Option<i64>,
        #[arg(long)]
        page_number: Option<i64>,
    },

    #[command(about = "Show one villa")]
    Get { id: i32 },

    #[command(about = "Create a villa (admin)")]
    Create {
        #[command(flatten)]
        fields: VillaFields,
    },

    #[command(about = "Replace a villa (admin)")]
    Update {
        id: i32,
        #[command(flatten)]
        fields: VillaFields,
    },

    #[command(about = "Apply a JSON-Patch document to a villa (admin)")]
    Patch {
        id: i32,
        #[arg(help = r#"RFC 6902 operations, e.g. '[{"op":"replace","path":"/occupancy","value":6}]'"#)]
        operations: String,
    },

    #[command(about = "Delete a villa and its villa numbers (admin)")]
    Delete { id: i32 },
}

pub async fn handle(cmd: VillaCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let client = VillaClient::new(ctx.api.clone());

    match cmd {
        VillaCommands::List { occupancy, search, page_size, page_number } => {
            let query = VillaQuery { occupancy, search, page_size, page_number };
            let villas = client.get_all(&query, ctx.token()).await?.into_result()?.unwrap_or_default();
            if villas.is_empty() {
                return output_empty_collection(&ctx.output, "No villas found");
            }
            output_value(&ctx.output, &villas, |v| table(v.as_slice(), villa_line))
        }
        VillaCommands::Get { id } => {
            let villa = client
                .get(id, ctx.token())
                .await?
                .into_result()?
                .ok_or_else(|| anyhow::anyhow!("Villa {} not returned", id))?;
            output_value(&ctx.output, &villa, villa_line)
        }
        VillaCommands::Create { fields } => {
            let token = ctx.require_token()?;
            let dto = VillaCreateDto {
                name: fields.name,
                details: fields.details,
                rate: fields.rate,
                sqft: fields.sqft,
                occupancy: fields.occupancy,
                image_url: fields.image_url,
                amenity: fields.amenity,
            };
            let villa = client
                .create(&dto, Some(token))
                .await?
                .into_result()?
                .ok_or_else(|| anyhow::anyhow!("Server returned no villa"))?;
            output_success(
                &ctx.output,
                &format!("Created villa {} ({})", villa.id, villa.name),
                Some(serde_json::to_value(&villa)?),
            )
        }
        VillaCommands::Update { id, fields } => {
            let token = ctx.require_token()?;
            let dto = VillaUpdateDto {
                id,
                name: fields.name,
                details: fields.details,
                rate: fields.rate,
                sqft: fields.sqft,
                occupancy: fields.occupancy,
                image_url: fields.image_url,
                amenity: fields.amenity,
            };
            client.update(&dto, Some(token)).await?.into_result()?;
            output_success(&ctx.output, &format!("Updated villa {}", id), Some(json!({ "id": id })))
        }
        VillaCommands::Patch { id, operations } => {
            let token = ctx.require_token()?;
            let operations: Value = serde_json::from_str(&operations)
                .map_err(|e| anyhow::anyhow!("Patch operations must be a JSON array: {}", e))?;
            client.patch(id, operations, Some(token)).await?.into_result()?;
            output_success(&ctx.output, &format!("Patched villa {}", id), Some(json!({ "id": id })))
        }
        VillaCommands::Delete { id } => {
            let token = ctx.require_token()?;
            client.delete(id, Some(token)).await?.into_result()?;
            output_success(&ctx.output, &format!("Deleted villa {}", id), Some(json!({ "id": id })))
        }
    }
}
