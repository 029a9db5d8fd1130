use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Message, NewTeamMember, TeamMember, User};
use crate::repo::{messages, posts};
use crate::schema::{team_members, users};

/// Adds `user_id` to the team of `post_id`. Returns whether they were new.
pub fn join_team(conn: &mut PgConnection, post_id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let inserted = diesel::insert_into(team_members::table)
        .values(&NewTeamMember {
            id: Uuid::new_v4(),
            post_id,
            teammate_id: user_id,
        })
        .on_conflict((team_members::post_id, team_members::teammate_id))
        .do_nothing()
        .execute(conn)?;

    if inserted > 0 {
        tracing::info!(
            component = "teams",
            post_id = %post_id,
            user_id = %user_id,
            "teammate added"
        );
    }
    Ok(inserted > 0)
}

pub fn leave_team(conn: &mut PgConnection, post_id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let removed = diesel::delete(
        team_members::table
            .filter(team_members::post_id.eq(post_id))
            .filter(team_members::teammate_id.eq(user_id)),
    )
    .execute(conn)?;
    Ok(removed > 0)
}

/// Teammates of a post in joining order.
pub fn team_members(conn: &mut PgConnection, post_id: Uuid) -> AppResult<Vec<User>> {
    let rows: Vec<(TeamMember, User)> = team_members::table
        .inner_join(users::table)
        .filter(team_members::post_id.eq(post_id))
        .order(team_members::created_at.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(|(_, user)| user).collect())
}

/// Accepts a join request: `message` must have been sent to `receiver_id`
/// from a post revision whose post `receiver_id` wrote. The sender joins
/// that post's team and the message is marked read.
pub fn accept_join_request(
    conn: &mut PgConnection,
    receiver_id: Uuid,
    message: &Message,
) -> AppResult<Uuid> {
    if message.receiver_id != receiver_id {
        return Err(AppError::forbidden("only the receiver can accept a request"));
    }
    let Some(content_id) = message.post_content_id else {
        return Err(AppError::validation("message is not a team request"));
    };

    conn.transaction::<_, AppError, _>(|conn| {
        let content = posts::find_post_content(conn, content_id)?;
        let post = posts::find_post(conn, content.post_id)?;
        if post.author_id != receiver_id {
            return Err(AppError::forbidden("only the post author can accept a request"));
        }

        join_team(conn, post.id, message.sender_id)?;
        messages::mark_read(conn, receiver_id, message.id)?;
        Ok(post.id)
    })
}
