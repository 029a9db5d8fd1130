use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{Permission, Viewer};
use crate::error::{AppError, AppResult};
use crate::models::{Comment, NewComment};
use crate::schema::{comments, post_contents};
use crate::utils::json::required_text;

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub body: String,
}

impl CommentDraft {
    pub fn new(body: impl Into<String>) -> AppResult<Self> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(AppError::validation("comment does not have a body"));
        }
        Ok(Self { body })
    }

    pub fn from_json(value: &Value) -> AppResult<Self> {
        let body = required_text(value, "body")
            .map_err(|_| AppError::validation("comment does not have a body"))?;
        Ok(Self { body })
    }
}

pub fn add_comment(
    conn: &mut PgConnection,
    author_id: Uuid,
    post_content_id: Uuid,
    draft: CommentDraft,
) -> AppResult<Comment> {
    if draft.body.trim().is_empty() {
        return Err(AppError::validation("comment does not have a body"));
    }

    let content_exists: bool = diesel::select(diesel::dsl::exists(
        post_contents::table.find(post_content_id),
    ))
    .get_result(conn)?;
    if !content_exists {
        return Err(AppError::not_found());
    }

    let comment: Comment = diesel::insert_into(comments::table)
        .values(&NewComment {
            id: Uuid::new_v4(),
            body: draft.body,
            author_id,
            post_content_id,
        })
        .get_result(conn)?;

    tracing::info!(
        component = "comments",
        comment_id = %comment.id,
        post_content_id = %post_content_id,
        author_id = %author_id,
        "comment added"
    );
    Ok(comment)
}

pub fn find_comment(conn: &mut PgConnection, comment_id: Uuid) -> AppResult<Comment> {
    Ok(comments::table.find(comment_id).first(conn)?)
}

/// Comments on a revision, oldest first. Disabled comments are included;
/// rendering decides what to show.
pub fn comments_for(conn: &mut PgConnection, post_content_id: Uuid) -> AppResult<Vec<Comment>> {
    Ok(comments::table
        .filter(comments::post_content_id.eq(post_content_id))
        .order(comments::created_at.asc())
        .load(conn)?)
}

pub fn comments_by_author(conn: &mut PgConnection, author_id: Uuid) -> AppResult<Vec<Comment>> {
    Ok(comments::table
        .filter(comments::author_id.eq(author_id))
        .order(comments::created_at.desc())
        .load(conn)?)
}

/// Hides or restores a comment. Requires the moderate-comments permission.
pub fn moderate_comment(
    conn: &mut PgConnection,
    viewer: &Viewer,
    comment_id: Uuid,
    disabled: bool,
) -> AppResult<Comment> {
    if !viewer.can(Permission::MODERATE_COMMENTS) {
        return Err(AppError::forbidden("moderating comments requires permission"));
    }

    let comment: Comment = diesel::update(comments::table.find(comment_id))
        .set(comments::disabled.eq(disabled))
        .get_result(conn)?;

    tracing::info!(
        component = "comments",
        comment_id = %comment_id,
        moderator_id = ?viewer.user().map(|user| user.user.id),
        disabled,
        "comment moderated"
    );
    Ok(comment)
}
