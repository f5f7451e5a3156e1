//! Bulk seed data for the blog schema.
//!
//! # Responsibility
//! - Insert users, posts, comments and stories with random text content.
//!
//! # Invariants
//! - Everything is inserted in one transaction; a failure leaves no rows.
//! - Children are spread round-robin over their parents.
//! - `rows == 0` inserts nothing.
//! - `rows` above [`MAX_SEED_ROWS`] is rejected before any row is written.

use crate::db::{DbError, DbResult};
use crate::model::record::RecordId;
use log::info;
use rand::Rng;
use rusqlite::{params, Connection, Transaction};
use std::time::Instant;
use uuid::Builder;

/// Users inserted when the caller does not choose a size.
pub const DEFAULT_SEED_ROWS: usize = 200;

/// Largest accepted user count; children scale to at most five times this.
pub const MAX_SEED_ROWS: usize = 1_000_000;

const POSTS_PER_USER: usize = 2;
const COMMENTS_PER_USER: usize = 5;
const STORIES_PER_USER: usize = 2;

/// Ids inserted per table, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: Vec<RecordId>,
    pub posts: Vec<RecordId>,
    pub comments: Vec<RecordId>,
    pub stories: Vec<RecordId>,
}

/// Seeds `rows` users (and their children) using the thread RNG.
pub fn seed_blog(conn: &mut Connection, rows: usize) -> DbResult<SeedSummary> {
    seed_blog_with_rng(conn, rows, &mut rand::thread_rng())
}

/// Seeds `rows` users (and their children) drawing ids and text from `rng`.
///
/// Inserts `rows` users, `2 * rows` posts, `5 * rows` comments and
/// `2 * rows` stories.
///
/// # Errors
/// - [`DbError::SeedTooLarge`] when `rows` exceeds [`MAX_SEED_ROWS`].
/// - SQLite failures; the transaction is rolled back.
pub fn seed_blog_with_rng<R>(conn: &mut Connection, rows: usize, rng: &mut R) -> DbResult<SeedSummary>
where
    R: Rng + ?Sized,
{
    if rows == 0 {
        return Ok(SeedSummary::default());
    }
    if rows > MAX_SEED_ROWS {
        return Err(DbError::SeedTooLarge {
            rows,
            max_rows: MAX_SEED_ROWS,
        });
    }

    let started_at = Instant::now();
    info!("event=seed_run module=seed status=start rows={rows}");

    let tx = conn.transaction()?;
    let users = insert_users(&tx, rng, rows)?;
    let posts = insert_owned(&tx, rng, "posts", "title", &users, rows * POSTS_PER_USER)?;
    let comments = insert_comments(&tx, rng, &users, &posts, rows * COMMENTS_PER_USER)?;
    let stories = insert_owned(&tx, rng, "stories", "title", &users, rows * STORIES_PER_USER)?;
    tx.commit()?;

    info!(
        "event=seed_run module=seed status=ok users={} posts={} comments={} stories={} duration_ms={}",
        users.len(),
        posts.len(),
        comments.len(),
        stories.len(),
        started_at.elapsed().as_millis()
    );

    Ok(SeedSummary {
        users,
        posts,
        comments,
        stories,
    })
}

fn insert_users<R: Rng + ?Sized>(
    tx: &Transaction<'_>,
    rng: &mut R,
    count: usize,
) -> DbResult<Vec<RecordId>> {
    let mut stmt =
        tx.prepare("INSERT INTO users (id, first_name, last_name) VALUES (?1, ?2, ?3);")?;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let id = random_id(rng);
        stmt.execute(params![id, word(rng), word(rng)])?;
        ids.push(id);
    }
    Ok(ids)
}

/// Inserts rows into a `(id, <text_column>, user_id)` table.
fn insert_owned<R: Rng + ?Sized>(
    tx: &Transaction<'_>,
    rng: &mut R,
    table: &'static str,
    text_column: &'static str,
    users: &[RecordId],
    count: usize,
) -> DbResult<Vec<RecordId>> {
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} (id, {text_column}, user_id) VALUES (?1, ?2, ?3);"
    ))?;
    let mut ids = Vec::with_capacity(count);
    for index in 0..count {
        let id = random_id(rng);
        stmt.execute(params![id, word(rng), users[index % users.len()]])?;
        ids.push(id);
    }
    Ok(ids)
}

fn insert_comments<R: Rng + ?Sized>(
    tx: &Transaction<'_>,
    rng: &mut R,
    users: &[RecordId],
    posts: &[RecordId],
    count: usize,
) -> DbResult<Vec<RecordId>> {
    let mut stmt = tx.prepare(
        "INSERT INTO comments (id, content, user_id, post_id) VALUES (?1, ?2, ?3, ?4);",
    )?;
    let mut ids = Vec::with_capacity(count);
    for index in 0..count {
        let id = random_id(rng);
        stmt.execute(params![
            id,
            word(rng),
            users[index % users.len()],
            posts[index % posts.len()]
        ])?;
        ids.push(id);
    }
    Ok(ids)
}

fn random_id<R: Rng + ?Sized>(rng: &mut R) -> RecordId {
    Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

/// Random decimal digit string.
fn word<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen::<u64>().to_string()
}
