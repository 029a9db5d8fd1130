use chrono::{NaiveDateTime, Utc};
use diesel::dsl::{count_star, max};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewPost, NewPostContent, Post, PostContent};
use crate::schema::{comments, post_contents, posts};
use crate::utils::json::{optional_i32, optional_text, required_text};

pub const INITIAL_VERSION: i32 = 1;

/// A validated, not yet persisted post revision.
#[derive(Debug, Clone)]
pub struct PostContentDraft {
    pub body: String,
    pub version_intro: Option<String>,
    /// Chosen by the caller; [`INITIAL_VERSION`] when absent.
    pub version: Option<i32>,
    pub created_at: Option<NaiveDateTime>,
}

impl PostContentDraft {
    pub fn new(body: impl Into<String>) -> AppResult<Self> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(AppError::validation("post does not have a body"));
        }
        Ok(Self {
            body,
            version_intro: None,
            version: None,
            created_at: None,
        })
    }

    pub fn from_json(value: &Value) -> AppResult<Self> {
        let body = required_text(value, "body")
            .map_err(|_| AppError::validation("post does not have a body"))?;
        let version_intro = optional_text(value, "version_intro").map_err(AppError::validation)?;
        let version = optional_i32(value, "version").map_err(AppError::validation)?;
        if version.is_some_and(|version| version < 1) {
            return Err(AppError::validation("version must be positive"));
        }
        Ok(Self {
            body,
            version_intro,
            version,
            created_at: None,
        })
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.version_intro = Some(intro.into());
        self
    }
}

pub fn create_post(conn: &mut PgConnection, author_id: Uuid, title: &str) -> AppResult<Post> {
    let post: Post = diesel::insert_into(posts::table)
        .values(&NewPost {
            id: Uuid::new_v4(),
            author_id,
            title: title.trim().to_string(),
        })
        .get_result(conn)?;
    tracing::info!(component = "posts", post_id = %post.id, author_id = %author_id, "post created");
    Ok(post)
}

/// Creates a post together with its first revision.
pub fn create_post_with_content(
    conn: &mut PgConnection,
    author_id: Uuid,
    title: &str,
    draft: PostContentDraft,
) -> AppResult<(Post, PostContent)> {
    conn.transaction::<_, AppError, _>(|conn| {
        let post = create_post(conn, author_id, title)?;
        let content = add_post_content(conn, post.id, draft)?;
        Ok((post, content))
    })
}

pub fn find_post(conn: &mut PgConnection, post_id: Uuid) -> AppResult<Post> {
    Ok(posts::table.find(post_id).first(conn)?)
}

pub fn posts_by_author(conn: &mut PgConnection, author_id: Uuid) -> AppResult<Vec<Post>> {
    Ok(posts::table
        .filter(posts::author_id.eq(author_id))
        .order(posts::created_at.desc())
        .load(conn)?)
}

/// Stores a new revision of `post_id` and bumps the post's update time.
/// A version already used by this post is a conflict.
pub fn add_post_content(
    conn: &mut PgConnection,
    post_id: Uuid,
    draft: PostContentDraft,
) -> AppResult<PostContent> {
    if draft.body.trim().is_empty() {
        return Err(AppError::validation("post does not have a body"));
    }

    conn.transaction::<_, AppError, _>(|conn| {
        let touched = diesel::update(posts::table.find(post_id))
            .set(posts::last_updated_at.eq(Utc::now().naive_utc()))
            .execute(conn)?;
        if touched == 0 {
            return Err(AppError::not_found());
        }

        let content: PostContent = diesel::insert_into(post_contents::table)
            .values(&NewPostContent {
                id: Uuid::new_v4(),
                post_id,
                version: draft.version.unwrap_or(INITIAL_VERSION),
                version_intro: draft.version_intro,
                body: draft.body,
                created_at: draft.created_at,
            })
            .get_result(conn)?;

        tracing::info!(
            component = "posts",
            post_id = %post_id,
            post_content_id = %content.id,
            version = content.version,
            "post content added"
        );
        Ok(content)
    })
}

/// One past the highest stored version of `post_id`. Never applied
/// implicitly; callers opt in by passing it to the draft.
pub fn next_version(conn: &mut PgConnection, post_id: Uuid) -> AppResult<i32> {
    let current: Option<i32> = post_contents::table
        .filter(post_contents::post_id.eq(post_id))
        .select(max(post_contents::version))
        .first(conn)?;
    Ok(current.map_or(INITIAL_VERSION, |version| version + 1))
}

pub fn find_post_content(conn: &mut PgConnection, content_id: Uuid) -> AppResult<PostContent> {
    Ok(post_contents::table.find(content_id).first(conn)?)
}

/// All revisions of a post, lowest version first.
pub fn post_contents(conn: &mut PgConnection, post_id: Uuid) -> AppResult<Vec<PostContent>> {
    Ok(post_contents::table
        .filter(post_contents::post_id.eq(post_id))
        .order(post_contents::version.asc())
        .load(conn)?)
}

pub fn latest_post_content(
    conn: &mut PgConnection,
    post_id: Uuid,
) -> AppResult<Option<PostContent>> {
    Ok(post_contents::table
        .filter(post_contents::post_id.eq(post_id))
        .order(post_contents::version.desc())
        .first(conn)
        .optional()?)
}

/// The author of the post a revision belongs to.
pub fn post_content_author(conn: &mut PgConnection, content_id: Uuid) -> AppResult<Uuid> {
    Ok(post_contents::table
        .inner_join(posts::table)
        .filter(post_contents::id.eq(content_id))
        .select(posts::author_id)
        .first(conn)?)
}

pub fn comment_count(conn: &mut PgConnection, content_id: Uuid) -> AppResult<i64> {
    Ok(comments::table
        .filter(comments::post_content_id.eq(content_id))
        .select(count_star())
        .first(conn)?)
}
