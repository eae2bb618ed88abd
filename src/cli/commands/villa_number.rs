use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_empty_collection, output_success, output_value, table, villa_number_line};
use crate::cli::CliContext;
use crate::client::VillaNumberClient;
use crate::models::{VillaNumberCreateDto, VillaNumberUpdateDto};

#[derive(Subcommand)]
pub enum VillaNumberCommands {
    #[command(about = "List villa numbers with their villas")]
    List {
        #[arg(long)]
        page_size: Option<i64>,
        #[arg(long)]
        page_number: Option<i64>,
    },

    #[command(about = "Show one villa number")]
    Get { villa_no: i32 },

    #[command(about = "Create a villa number (admin)")]
    Create {
        villa_no: i32,
        #[arg(long)]
        villa_id: i32,
        #[arg(long)]
        special_details: Option<String>,
    },

    #[command(about = "Replace a villa number (admin)")]
    Update {
        villa_no: i32,
        #[arg(long)]
        villa_id: i32,
        #[arg(long)]
        special_details: Option<String>,
    },

    #[command(about = "Delete a villa number (admin)")]
    Delete { villa_no: i32 },
}

pub async fn handle(cmd: VillaNumberCommands, api_version: u8, ctx: &CliContext) -> anyhow::Result<()> {
    let client = VillaNumberClient::new(ctx.api.clone(), api_version);

    match cmd {
        VillaNumberCommands::List { page_size, page_number } => {
            let numbers = client
                .get_all(page_size, page_number, ctx.token())
                .await?
                .into_result()?
                .unwrap_or_default();
            if numbers.is_empty() {
                return output_empty_collection(&ctx.output, "No villa numbers found");
            }
            output_value(&ctx.output, &numbers, |n| table(n.as_slice(), villa_number_line))
        }
        VillaNumberCommands::Get { villa_no } => {
            let number = client
                .get(villa_no, ctx.token())
                .await?
                .into_result()?
                .ok_or_else(|| anyhow::anyhow!("Villa number {} not returned", villa_no))?;
            output_value(&ctx.output, &number, villa_number_line)
        }
        VillaNumberCommands::Create { villa_no, villa_id, special_details } => {
            let token = ctx.require_token()?;
            let dto = VillaNumberCreateDto { villa_no, villa_id, special_details };
            client.create(&dto, Some(token)).await?.into_result()?;
            output_success(
                &ctx.output,
                &format!("Created villa number {} for villa {}", villa_no, villa_id),
                Some(json!({ "villaNo": villa_no, "villaId": villa_id })),
            )
        }
        VillaNumberCommands::Update { villa_no, villa_id, special_details } => {
            let token = ctx.require_token()?;
            let dto = VillaNumberUpdateDto { villa_no, villa_id, special_details };
            client.update(&dto, Some(token)).await?.into_result()?;
            output_success(
                &ctx.output,
                &format!("Updated villa number {}", villa_no),
                Some(json!({ "villaNo": villa_no })),
            )
        }
        VillaNumberCommands::Delete { villa_no } => {
            let token = ctx.require_token()?;
            client.delete(villa_no, Some(token)).await?.into_result()?;
            output_success(
                &ctx.output,
                &format!("Deleted villa number {}", villa_no),
                Some(json!({ "villaNo": villa_no })),
            )
        }
    }
}
