//! # seed
//!
//! Development helper for the members configured under `[[forum.members]]`:
//! writes them to Postgres and prints bearer tokens signed with
//! `auth.jwt_secret`.

use anyhow::Context;
use auth_adapters::JwtAuthenticator;
use clap::{Parser, Subcommand};
use configs::Settings;
use domains::UserId;
use secrecy::ExposeSecret;

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Seed forum members and issue their tokens", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print `username id token` for each configured member
    Tokens {
        /// Only this member
        #[arg(short, long)]
        user: Option<String>,

        /// Token lifetime in hours
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },

    /// Upsert the configured members into the database at `database.url`
    #[cfg(feature = "db-postgres")]
    Members,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("loading settings")?;

    match cli.command {
        Commands::Tokens { user, ttl_hours } => {
            let auth = JwtAuthenticator::new(settings.auth.jwt_secret.expose_secret().as_bytes());
            let members = settings
                .forum
                .members
                .iter()
                .filter(|m| user.as_deref().map_or(true, |u| m.username == u));
            let mut printed = 0;
            for member in members {
                let token = auth
                    .issue(UserId::from_uuid(member.id), chrono::Duration::hours(ttl_hours))
                    .with_context(|| format!("issuing token for {}", member.username))?;
                println!("{}\t{}\t{}", member.username, member.id, token);
                printed += 1;
            }
            if printed == 0 {
                anyhow::bail!("no configured member matches");
            }
        }
        #[cfg(feature = "db-postgres")]
        Commands::Members => {
            use domains::User;
            use storage_adapters::postgres::{connect, PgMemberDirectory};

            let pool = connect(
                settings.database.url.expose_secret(),
                settings.database.max_connections,
            )
            .await
            .context("connecting to postgres")?;
            let directory = PgMemberDirectory::new(pool);
            for member in &settings.forum.members {
                let user = User {
                    id: UserId::from_uuid(member.id),
                    username: member.username.clone(),
                };
                directory
                    .upsert(&user, member.admin, member.banned)
                    .await
                    .with_context(|| format!("seeding member {}", member.username))?;
                println!("seeded {}", member.username);
            }
        }
    }
    Ok(())
}
