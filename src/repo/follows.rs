use std::collections::HashSet;

use diesel::dsl::{count_star, exists};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Follow, NewFollow, Post, User};
use crate::schema::{follows, posts, users};

/// Adds the edge `follower -> followed`. Returns whether a new edge was written.
pub fn follow(conn: &mut PgConnection, follower_id: Uuid, followed_id: Uuid) -> AppResult<bool> {
    let inserted = diesel::insert_into(follows::table)
        .values(&NewFollow {
            follower_id,
            followed_id,
        })
        .on_conflict_do_nothing()
        .execute(conn)?;

    if inserted == 0 {
        tracing::debug!(
            component = "follows",
            follower_id = %follower_id,
            followed_id = %followed_id,
            "already following"
        );
    } else {
        tracing::info!(
            component = "follows",
            follower_id = %follower_id,
            followed_id = %followed_id,
            "follow edge added"
        );
    }
    Ok(inserted > 0)
}

/// Removes the edge `follower -> followed`. Returns whether an edge existed.
pub fn unfollow(conn: &mut PgConnection, follower_id: Uuid, followed_id: Uuid) -> AppResult<bool> {
    let removed = diesel::delete(follows::table.find((follower_id, followed_id))).execute(conn)?;
    if removed > 0 {
        tracing::info!(
            component = "follows",
            follower_id = %follower_id,
            followed_id = %followed_id,
            "follow edge removed"
        );
    }
    Ok(removed > 0)
}

/// Does `user_id` follow `other_id`?
pub fn is_following(conn: &mut PgConnection, user_id: Uuid, other_id: Uuid) -> AppResult<bool> {
    Ok(diesel::select(exists(follows::table.find((user_id, other_id)))).get_result(conn)?)
}

/// Is `user_id` followed by `other_id`?
pub fn is_followed_by(conn: &mut PgConnection, user_id: Uuid, other_id: Uuid) -> AppResult<bool> {
    is_following(conn, other_id, user_id)
}

/// Users following `user_id`, newest edge first. Includes the self-loop.
pub fn followers(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<(User, Follow)>> {
    let rows: Vec<(Follow, User)> = follows::table
        .inner_join(users::table.on(users::id.eq(follows::follower_id)))
        .filter(follows::followed_id.eq(user_id))
        .order(follows::created_at.desc())
        .load(conn)?;
    Ok(rows.into_iter().map(|(edge, user)| (user, edge)).collect())
}

/// Users `user_id` follows, newest edge first. Includes the self-loop.
pub fn followed(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<(User, Follow)>> {
    let rows: Vec<(Follow, User)> = follows::table
        .inner_join(users::table.on(users::id.eq(follows::followed_id)))
        .filter(follows::follower_id.eq(user_id))
        .order(follows::created_at.desc())
        .load(conn)?;
    Ok(rows.into_iter().map(|(edge, user)| (user, edge)).collect())
}

pub fn follower_count(conn: &mut PgConnection, user_id: Uuid) -> AppResult<i64> {
    Ok(follows::table
        .filter(follows::followed_id.eq(user_id))
        .select(count_star())
        .first(conn)?)
}

pub fn followed_count(conn: &mut PgConnection, user_id: Uuid) -> AppResult<i64> {
    Ok(follows::table
        .filter(follows::follower_id.eq(user_id))
        .select(count_star())
        .first(conn)?)
}

/// Posts written by anyone `user_id` follows, newest first. The self-loop
/// puts the user's own posts in the feed.
pub fn followed_posts(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<Post>> {
    Ok(posts::table
        .inner_join(follows::table.on(follows::followed_id.eq(posts::author_id)))
        .filter(follows::follower_id.eq(user_id))
        .select(posts::all_columns)
        .order(posts::created_at.desc())
        .load(conn)?)
}

/// Writes the missing reflexive edge for every user lacking one and returns
/// how many were repaired.
pub fn add_self_follows(conn: &mut PgConnection) -> AppResult<usize> {
    let reflexive: HashSet<Uuid> = follows::table
        .filter(follows::follower_id.eq(follows::followed_id))
        .select(follows::follower_id)
        .load::<Uuid>(conn)?
        .into_iter()
        .collect();
    let missing: Vec<Uuid> = users::table
        .select(users::id)
        .load::<Uuid>(conn)?
        .into_iter()
        .filter(|id| !reflexive.contains(id))
        .collect();

    let mut repaired = 0;
    for user_id in missing {
        if follow(conn, user_id, user_id)? {
            repaired += 1;
        }
    }

    tracing::info!(component = "follows", repaired, "self-follow backfill complete");
    Ok(repaired)
}
