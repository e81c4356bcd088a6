//! One-shot seeding of the sample `students` database.

use crate::DbError;
use sqlx::{Connection, SqliteConnection};
use std::path::Path;

/// The five sample rows: `(name, class, section, marks)`.
pub const SAMPLE_STUDENTS: [(&str, &str, &str, i64); 5] = [
    ("Arjun", "10", "A", 88),
    ("Sneha", "9", "B", 92),
    ("Rahul", "10", "C", 75),
    ("Meera", "8", "A", 81),
    ("Vikram", "9", "C", 95),
];

const CREATE_STUDENTS: &str = "CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    class TEXT,
    section TEXT,
    marks INTEGER
)";

/// Create the students table at `path` (the file is created if missing) and
/// insert the five sample rows.
pub async fn seed_students(path: &Path) -> Result<(), DbError> {
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let mut connection = SqliteConnection::connect(&url).await?;

    sqlx::query(CREATE_STUDENTS)
        .execute(&mut connection)
        .await?;

    for (name, class, section, marks) in SAMPLE_STUDENTS {
        sqlx::query("INSERT INTO students (name, class, section, marks) VALUES (?1, ?2, ?3, ?4)")
            .bind(name)
            .bind(class)
            .bind(section)
            .bind(marks)
            .execute(&mut connection)
            .await?;
    }

    connection.close().await?;
    tracing::info!(path = %path.display(), "seeded students table");

    Ok(())
}
