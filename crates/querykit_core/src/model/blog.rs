//! Blog schema: users with posts, comments and stories.
//!
//! # Invariants
//! - Table and column names match migration `0001_blog.sql`.
//! - `has_many` aliases are plural, `belongs_to` aliases are singular.

use super::entity::{EntityDef, EntityType, Schema};
use once_cell::sync::Lazy;

pub const USER: EntityType = EntityType::new("User");
pub const POST: EntityType = EntityType::new("Post");
pub const COMMENT: EntityType = EntityType::new("Comment");
pub const STORY: EntityType = EntityType::new("Story");

static BLOG_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .define(
            EntityDef::new(USER, "users", &["id", "first_name", "last_name"])
                .has_many(POST, "posts", "user_id")
                .has_many(COMMENT, "comments", "user_id")
                .has_many(STORY, "stories", "user_id"),
        )
        .define(
            EntityDef::new(POST, "posts", &["id", "title", "user_id"])
                .belongs_to(USER, "user", "user_id")
                .has_many(COMMENT, "comments", "post_id"),
        )
        .define(
            EntityDef::new(COMMENT, "comments", &["id", "content", "user_id", "post_id"])
                .belongs_to(USER, "user", "user_id")
                .belongs_to(POST, "post", "post_id"),
        )
        .define(
            EntityDef::new(STORY, "stories", &["id", "title", "user_id"])
                .belongs_to(USER, "user", "user_id"),
        )
});

/// Returns the process-wide blog schema.
pub fn blog_schema() -> &'static Schema {
    &BLOG_SCHEMA
}
