use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Message, NewMessage};
use crate::schema::messages;

/// Sends a direct message. `post_content_id` marks it as originating from a
/// post revision, which makes it a request to join that post's team.
pub fn send_message(
    conn: &mut PgConnection,
    sender_id: Uuid,
    receiver_id: Uuid,
    body: &str,
    post_content_id: Option<Uuid>,
) -> AppResult<Message> {
    if body.trim().is_empty() {
        return Err(AppError::validation("message does not have a body"));
    }

    let message: Message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            body: body.to_string(),
            post_content_id,
        })
        .get_result(conn)?;

    tracing::info!(
        component = "messages",
        message_id = %message.id,
        sender_id = %sender_id,
        receiver_id = %receiver_id,
        "message sent"
    );
    Ok(message)
}

pub fn find_message(conn: &mut PgConnection, message_id: Uuid) -> AppResult<Message> {
    Ok(messages::table.find(message_id).first(conn)?)
}

/// Messages received by `user_id`, newest first.
pub fn inbox(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<Message>> {
    Ok(messages::table
        .filter(messages::receiver_id.eq(user_id))
        .order(messages::created_at.desc())
        .load(conn)?)
}

/// Messages sent by `user_id`, newest first.
pub fn outbox(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<Message>> {
    Ok(messages::table
        .filter(messages::sender_id.eq(user_id))
        .order(messages::created_at.desc())
        .load(conn)?)
}

pub fn unread_count(conn: &mut PgConnection, user_id: Uuid) -> AppResult<i64> {
    Ok(messages::table
        .filter(messages::receiver_id.eq(user_id))
        .filter(messages::is_read.eq(false))
        .select(count_star())
        .first(conn)?)
}

/// Marks one message read. Only its receiver may do so; anyone else gets
/// `NotFound`.
pub fn mark_read(conn: &mut PgConnection, receiver_id: Uuid, message_id: Uuid) -> AppResult<Message> {
    let message = diesel::update(
        messages::table
            .filter(messages::id.eq(message_id))
            .filter(messages::receiver_id.eq(receiver_id)),
    )
    .set(messages::is_read.eq(true))
    .get_result::<Message>(conn)
    .optional()?;

    message.ok_or_else(AppError::not_found)
}

pub fn mark_all_read(conn: &mut PgConnection, receiver_id: Uuid) -> AppResult<usize> {
    let updated = diesel::update(
        messages::table
            .filter(messages::receiver_id.eq(receiver_id))
            .filter(messages::is_read.eq(false)),
    )
    .set(messages::is_read.eq(true))
    .execute(conn)?;
    Ok(updated)
}
