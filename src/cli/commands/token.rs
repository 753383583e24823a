use anyhow::Context;
use chrono::{TimeZone, Utc};
use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{issue_session_token, Principal, Role, SessionClaims};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Principal id (random if omitted)")]
    pub id: Option<Uuid>,

    #[arg(long, help = "Principal email")]
    pub email: String,

    #[arg(long, help = "Principal role: student, lecturer or admin")]
    pub role: Role,

    #[arg(long, help = "Display name")]
    pub name: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let principal = Principal {
        id: args.id.unwrap_or_else(Uuid::new_v4),
        email: args.email,
        role: args.role,
        name: args.name,
        avatar: None,
    };

    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = SessionClaims::new(&principal, hours).context("invalid --hours")?;
    let token = issue_session_token(&claims, &config.security.jwt_secret).context("failed to sign session token")?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => {
            let expires_at = Utc.timestamp_opt(claims.exp, 0).single();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "token": token,
                    "principal": principal,
                    "expires_at": expires_at,
                }))?
            );
        }
    }

    Ok(())
}
