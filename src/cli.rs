use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use commands::{init_database, migrate_and_serve, seed_admin, serve, SeedAdminArgs};

use crate::config::{DEFAULT_BIND_ADDRESS, DEFAULT_DATABASE_URL};

#[derive(Parser)]
#[command(name = "paddock")]
#[command(about = "Race betting backend with CLI tools and web server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Database URL
        ///
        /// For SQLite databases, use:
        ///   - sqlite:///absolute/path/to/database.sqlite?mode=rwc (absolute path)
        #[arg(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,

        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long, env = "BIND_ADDRESS", default_value = DEFAULT_BIND_ADDRESS)]
        bind_address: String,
    },
    /// Initialize the database using migrations
    InitDb {
        /// Database URL. `mode=rwc` creates the SQLite file if it is missing.
        #[arg(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },
    /// Apply pending migrations, then start the web server
    MigrateAndServe {
        #[arg(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,

        #[arg(short, long, env = "BIND_ADDRESS", default_value = DEFAULT_BIND_ADDRESS)]
        bind_address: String,
    },
    /// Create the bootstrap admin account, or promote an existing one
    SeedAdmin {
        #[arg(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,

        #[arg(short, long, default_value = "admin")]
        username: String,

        #[arg(short, long, env = "PADDOCK_ADMIN_PASSWORD")]
        password: String,

        #[arg(long, default_value = "Administrator")]
        display_name: String,

        /// Starting wallet of a newly created admin
        #[arg(short, long, default_value_t = 50_000)]
        wallet: i64,

        /// Team partition, defaults to the configured team
        #[arg(short, long)]
        team_id: Option<i32>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve { database_url, bind_address } => {
                serve(&database_url, &bind_address).await?;
            }
            Commands::InitDb { database_url } => {
                init_database(&database_url).await?;
            }
            Commands::MigrateAndServe { database_url, bind_address } => {
                migrate_and_serve(&database_url, &bind_address).await?;
            }
            Commands::SeedAdmin {
                database_url,
                username,
                password,
                display_name,
                wallet,
                team_id,
            } => {
                seed_admin(
                    &database_url,
                    SeedAdminArgs {
                        username,
                        password,
                        display_name,
                        wallet,
                        team_id,
                    },
                )
                .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_seed_admin_defaults() {
        let cli = Cli::try_parse_from(["paddock", "seed-admin", "--password", "s3cret"]).unwrap();

        match cli.command {
            Commands::SeedAdmin { username, wallet, team_id, .. } => {
                assert_eq!(username, "admin");
                assert_eq!(wallet, 50_000);
                assert_eq!(team_id, None);
            }
            _ => panic!("expected seed-admin"),
        }
    }

    #[test]
    fn test_command_tree_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
