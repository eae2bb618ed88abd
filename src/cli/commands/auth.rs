use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_success, output_value};
use crate::cli::CliContext;
use crate::client::AuthClient;
use crate::models::{LoginRequestDto, RegistrationRequestDto};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login and remember the token")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Register a new user")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Display name")]
        name: Option<String>,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Forget the saved session")]
    Logout,

    #[command(about = "Show who the server thinks you are")]
    Whoami,
}

fn read_password(provided: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn handle(cmd: AuthCommands, ctx: &mut CliContext) -> anyhow::Result<()> {
    let client = AuthClient::new(ctx.api.clone());

    match cmd {
        AuthCommands::Login { username, password } => {
            let request = LoginRequestDto {
                user_name: username,
                password: read_password(password)?,
            };
            let login = client
                .login(&request)
                .await?
                .into_result()?
                .ok_or_else(|| anyhow::anyhow!("Server returned no login result"))?;

            let (user_name, role) = match &login.user {
                Some(user) => (user.user_name.clone(), user.role.clone()),
                None => (request.user_name.clone(), None),
            };
            ctx.session.login(login.token, user_name.clone(), role.clone());
            ctx.store.save(&ctx.session)?;

            output_success(
                &ctx.output,
                &format!("Logged in as {}", user_name),
                Some(json!({ "userName": user_name, "role": role })),
            )
        }
        AuthCommands::Register { username, name, password } => {
            let request = RegistrationRequestDto {
                name: name.unwrap_or_else(|| username.clone()),
                user_name: username,
                password: read_password(password)?,
            };
            let user = client
                .register(&request)
                .await?
                .into_result()?
                .ok_or_else(|| anyhow::anyhow!("Server returned no user"))?;

            output_success(
                &ctx.output,
                &format!("Registered {}", user.user_name),
                Some(serde_json::to_value(&user)?),
            )
        }
        AuthCommands::Logout => {
            ctx.store.clear()?;
            ctx.session.logout();
            output_success(&ctx.output, "Logged out", None)
        }
        AuthCommands::Whoami => {
            let token = ctx.require_token()?;
            let user = client
                .whoami(token)
                .await?
                .into_result()?
                .ok_or_else(|| anyhow::anyhow!("Server returned no identity"))?;
            output_value(&ctx.output, &user, |u| format!("{} ({})", u.name, u.role))
        }
    }
}
