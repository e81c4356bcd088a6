//! `slate-seed`: create the sample student database.
//!
//! Writes `students` with five rows to the first argument, or to the path
//! configured under `[database]`, defaulting to `student.db`.

use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .map_or_else(|| config::SlateConfig::get_or_default().database.path, PathBuf::from);

    db::seed::seed_students(&path).await?;

    println!("{} created successfully with 5 students!", path.display());

    Ok(())
}
