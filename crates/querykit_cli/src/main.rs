//! Seed-and-query demo for `querykit_core`.
//!
//! # Responsibility
//! - Open (or create) a blog database and fill it with random seed data.
//! - Print the first user with comments, then with comments and posts.

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use querykit_core::db::{open_db, open_db_in_memory};
use querykit_core::{
    blog_schema, core_version, default_log_level, init_logging, seed_blog, LogTarget,
    SqliteRecordStore, UserQuery, DEFAULT_SEED_ROWS,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "querykit")]
#[command(version, about = "Seed a blog database and run repository queries", long_about = None)]
struct Cli {
    /// Database file; an in-memory database is used when omitted
    #[arg(long, env = "QUERYKIT_DB")]
    db: Option<PathBuf>,

    /// Delete the database file before opening it; requires --db
    #[arg(long, requires = "db")]
    fresh: bool,

    /// Number of users to seed (posts, comments and stories scale with it)
    #[arg(long, env = "QUERYKIT_SEED_ROWS", default_value_t = DEFAULT_SEED_ROWS)]
    rows: usize,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "QUERYKIT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rotated log files; logs go to stderr when omitted
    #[arg(long, env = "QUERYKIT_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Print each query plan before its result
    #[arg(long)]
    explain: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let target = match &cli.log_dir {
        Some(dir) => LogTarget::directory(dir).map_err(anyhow::Error::msg)?,
        None => LogTarget::Stderr,
    };
    init_logging(level, target).map_err(anyhow::Error::msg)?;
    info!("event=cli_start module=cli status=ok version={}", core_version());

    let mut conn = match &cli.db {
        Some(path) => {
            if cli.fresh && path.exists() {
                std::fs::remove_file(path)
                    .with_context(|| format!("failed to remove `{}`", path.display()))?;
            }
            open_db(path).with_context(|| format!("failed to open `{}`", path.display()))?
        }
        None => open_db_in_memory().context("failed to open in-memory database")?,
    };

    let summary = seed_blog(&mut conn, cli.rows).context("failed to seed blog data")?;
    let Some(first_user) = summary.users.first().cloned() else {
        bail!("nothing was seeded; use --rows with a value above zero");
    };

    let store = SqliteRecordStore::try_new(&conn, blog_schema())?;
    let users = UserQuery::new(&store);
    let with_comments = users.with_comments().read(first_user.clone());
    let with_comments_and_posts = users.with_comments().with_posts().read(first_user);

    for query in [with_comments, with_comments_and_posts] {
        if cli.explain {
            println!("{}", serde_json::to_string_pretty(&query.plan()?)?);
        }
        let record = query.run()?;
        println!("{}", serde_json::to_string_pretty(&record)?);
    }

    Ok(())
}
