use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{CommentLike, NewCommentLike, NewPostContentLike, PostContentLike};
use crate::schema::{comment_likes, post_content_likes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    /// `(is_like, is_dislike)` column values for this vote.
    pub fn flags(self) -> (bool, bool) {
        match self {
            Vote::Like => (true, false),
            Vote::Dislike => (false, true),
        }
    }
}

/// Likes minus dislikes over `(is_like, is_dislike)` rows.
pub fn tally<I>(rows: I) -> i64
where
    I: IntoIterator<Item = (bool, bool)>,
{
    rows.into_iter().fold(0, |total, (like, dislike)| {
        total + i64::from(like) - i64::from(dislike)
    })
}

/// Records `author_id`'s vote on a post revision, replacing any earlier vote.
pub fn vote_post_content(
    conn: &mut PgConnection,
    author_id: Uuid,
    post_content_id: Uuid,
    vote: Vote,
) -> AppResult<PostContentLike> {
    let (is_like, is_dislike) = vote.flags();
    let row: PostContentLike = diesel::insert_into(post_content_likes::table)
        .values(&NewPostContentLike {
            id: Uuid::new_v4(),
            post_content_id,
            author_id,
            is_like,
            is_dislike,
        })
        .on_conflict((
            post_content_likes::post_content_id,
            post_content_likes::author_id,
        ))
        .do_update()
        .set((
            post_content_likes::is_like.eq(is_like),
            post_content_likes::is_dislike.eq(is_dislike),
        ))
        .get_result(conn)?;

    tracing::info!(
        component = "likes",
        post_content_id = %post_content_id,
        author_id = %author_id,
        vote = ?vote,
        "post content vote recorded"
    );
    Ok(row)
}

pub fn withdraw_post_content_vote(
    conn: &mut PgConnection,
    author_id: Uuid,
    post_content_id: Uuid,
) -> AppResult<bool> {
    let removed = diesel::delete(
        post_content_likes::table
            .filter(post_content_likes::post_content_id.eq(post_content_id))
            .filter(post_content_likes::author_id.eq(author_id)),
    )
    .execute(conn)?;
    Ok(removed > 0)
}

pub fn post_content_total_likes(conn: &mut PgConnection, post_content_id: Uuid) -> AppResult<i64> {
    let rows: Vec<(bool, bool)> = post_content_likes::table
        .filter(post_content_likes::post_content_id.eq(post_content_id))
        .select((post_content_likes::is_like, post_content_likes::is_dislike))
        .load(conn)?;
    Ok(tally(rows))
}

pub fn vote_comment(
    conn: &mut PgConnection,
    author_id: Uuid,
    comment_id: Uuid,
    vote: Vote,
) -> AppResult<CommentLike> {
    let (is_like, is_dislike) = vote.flags();
    let row: CommentLike = diesel::insert_into(comment_likes::table)
        .values(&NewCommentLike {
            id: Uuid::new_v4(),
            comment_id,
            author_id,
            is_like,
            is_dislike,
        })
        .on_conflict((comment_likes::comment_id, comment_likes::author_id))
        .do_update()
        .set((
            comment_likes::is_like.eq(is_like),
            comment_likes::is_dislike.eq(is_dislike),
        ))
        .get_result(conn)?;

    tracing::info!(
        component = "likes",
        comment_id = %comment_id,
        author_id = %author_id,
        vote = ?vote,
        "comment vote recorded"
    );
    Ok(row)
}

pub fn withdraw_comment_vote(
    conn: &mut PgConnection,
    author_id: Uuid,
    comment_id: Uuid,
) -> AppResult<bool> {
    let removed = diesel::delete(
        comment_likes::table
            .filter(comment_likes::comment_id.eq(comment_id))
            .filter(comment_likes::author_id.eq(author_id)),
    )
    .execute(conn)?;
    Ok(removed > 0)
}

pub fn comment_total_likes(conn: &mut PgConnection, comment_id: Uuid) -> AppResult<i64> {
    let rows: Vec<(bool, bool)> = comment_likes::table
        .filter(comment_likes::comment_id.eq(comment_id))
        .select((comment_likes::is_like, comment_likes::is_dislike))
        .load(conn)?;
    Ok(tally(rows))
}
