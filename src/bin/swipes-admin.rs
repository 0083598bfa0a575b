//! Operator tooling for the swipes service.
//!
//! The HTTP API has no registration route; users are provisioned here.
//!
//! ```bash
//! swipes-admin -c ./config.yaml create-user -u ama -p hunter2 -e ama@example.com
//! swipes-admin hash-password -p hunter2
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use creator_swipes::auth::password::hash_password;
use creator_swipes::config::{Config, resolve_paths};
use creator_swipes::db::Database;
use creator_swipes::model::NewUser;

#[derive(Parser, Debug)]
#[command(name = "swipes-admin", version, about = "Manage creator swipes users")]
struct Cli {
    #[arg(short = 'c', long = "config", global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user that can log in.
    CreateUser {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long)]
        email: String,

        /// Override the configured collection quota for this user.
        #[arg(long)]
        max_collections: Option<i64>,

        /// Override the configured per-collection swipe quota for this user.
        #[arg(long)]
        max_swipes_per_collection: Option<i64>,
    },

    /// Print an Argon2id hash for a password.
    HashPassword {
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::CreateUser {
            username,
            password,
            email,
            max_collections,
            max_swipes_per_collection,
        } => {
            let (config_path, data_dir) = resolve_paths(cli.config_path);
            let cfg = Config::new(&config_path.to_string_lossy())?;
            std::fs::create_dir_all(&data_dir)?;
            let db = Database::new(&cfg, &data_dir).await?;

            if db.find_user_by_username(&username).await?.is_some() {
                anyhow::bail!("user already exists: {}", username);
            }

            let user = db
                .create_user(NewUser {
                    username,
                    password_hash: hash_password(&password)?,
                    email,
                    max_collections,
                    max_swipes_per_collection,
                })
                .await?;
            println!("{}", user.id);
        }
        Command::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
    }

    Ok(())
}
