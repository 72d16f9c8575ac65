use anyhow::Result;
use clap::Parser;
use kindredcore::config::{Cli, Command, Config};
use local_store::LocalBackend;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli)?;

    let default_level = if cfg.logging_enabled { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let backend = LocalBackend::open(&cfg.data_dir)?;

    match cli.command {
        Command::Stats => {
            let (stories, views, profiles) = backend.stats()?;
            println!("stories:  {stories}");
            println!("views:    {views}");
            println!("profiles: {profiles}");
        }
        Command::Purge => {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            let conn = backend.conn()?;
            let removed = local_store::housekeeping::purge_expired(&conn, now)?;
            println!("purged {removed} expired stories");
        }
    }
    Ok(())
}
