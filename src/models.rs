use chrono::NaiveDateTime;
use diesel::prelude::*;
use md5::{Digest, Md5};
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable)]
#[diesel(table_name = roles)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub permissions: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = roles)]
pub struct NewRole {
    pub id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub permissions: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = users)]
#[diesel(belongs_to(Role))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role_id: Option<Uuid>,
    pub password_hash: String,
    pub avatar_hash: Option<String>,
    pub confirmed: bool,
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
    pub member_since: NaiveDateTime,
    pub last_seen: NaiveDateTime,
}

impl User {
    /// Builds a Gravatar image URL. Falls back to hashing the current email
    /// when no avatar hash has been stored yet.
    pub fn gravatar_url(&self, size: u32, default: &str, rating: &str, secure: bool) -> String {
        let base = if secure {
            "https://secure.gravatar.com/avatar"
        } else {
            "http://www.gravatar.com/avatar"
        };
        let hash = self
            .avatar_hash
            .clone()
            .unwrap_or_else(|| avatar_hash(&self.email));
        format!("{base}/{hash}?s={size}&d={default}&r={rating}")
    }
}

/// Hex MD5 of the normalised email address, as Gravatar expects.
pub fn avatar_hash(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    hex::encode(Md5::digest(normalized.as_bytes()))
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role_id: Option<Uuid>,
    pub password_hash: String,
    pub avatar_hash: Option<String>,
    pub confirmed: bool,
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
    pub member_since: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Queryable)]
pub struct Follow {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = follows)]
pub struct NewFollow {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = posts)]
#[diesel(belongs_to(User, foreign_key = author_id))]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub created_at: NaiveDateTime,
    pub last_updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = post_contents)]
#[diesel(belongs_to(Post))]
pub struct PostContent {
    pub id: Uuid,
    pub post_id: Uuid,
    pub version: i32,
    pub version_intro: Option<String>,
    pub body: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = post_contents)]
pub struct NewPostContent {
    pub id: Uuid,
    pub post_id: Uuid,
    pub version: i32,
    pub version_intro: Option<String>,
    pub body: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = comments)]
#[diesel(belongs_to(PostContent))]
pub struct Comment {
    pub id: Uuid,
    pub body: String,
    pub author_id: Uuid,
    pub post_content_id: Uuid,
    pub disabled: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub id: Uuid,
    pub body: String,
    pub author_id: Uuid,
    pub post_content_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = comment_likes)]
#[diesel(belongs_to(Comment))]
pub struct CommentLike {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub author_id: Uuid,
    pub is_like: bool,
    pub is_dislike: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comment_likes)]
pub struct NewCommentLike {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub author_id: Uuid,
    pub is_like: bool,
    pub is_dislike: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = post_content_likes)]
#[diesel(belongs_to(PostContent))]
pub struct PostContentLike {
    pub id: Uuid,
    pub post_content_id: Uuid,
    pub author_id: Uuid,
    pub is_like: bool,
    pub is_dislike: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = post_content_likes)]
pub struct NewPostContentLike {
    pub id: Uuid,
    pub post_content_id: Uuid,
    pub author_id: Uuid,
    pub is_like: bool,
    pub is_dislike: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: String,
    pub is_read: bool,
    pub post_content_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: String,
    pub post_content_id: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = team_members)]
#[diesel(belongs_to(Post))]
pub struct TeamMember {
    pub id: Uuid,
    pub post_id: Uuid,
    pub teammate_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = team_members)]
pub struct NewTeamMember {
    pub id: Uuid,
    pub post_id: Uuid,
    pub teammate_id: Uuid,
}
