use chrono::NaiveDateTime;
use diesel::pg::PgConnection;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Comment, PostContent, User};
use crate::repo::{posts, users};

/// Builds absolute resource links below the configured API base URL.
#[derive(Debug, Clone)]
pub struct ResourceUrls {
    base: Url,
}

impl ResourceUrls {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    fn link(&self, path: &str) -> AppResult<String> {
        self.base
            .join(path)
            .map(String::from)
            .map_err(AppError::internal)
    }

    pub fn user(&self, id: Uuid) -> AppResult<String> {
        self.link(&format!("users/{id}"))
    }

    pub fn user_posts(&self, id: Uuid) -> AppResult<String> {
        self.link(&format!("users/{id}/posts/"))
    }

    pub fn post_content(&self, id: Uuid) -> AppResult<String> {
        self.link(&format!("post-contents/{id}"))
    }

    pub fn post_content_comments(&self, id: Uuid) -> AppResult<String> {
        self.link(&format!("post-contents/{id}/comments/"))
    }

    pub fn comment(&self, id: Uuid) -> AppResult<String> {
        self.link(&format!("comments/{id}"))
    }
}

#[derive(Debug, Serialize)]
pub struct UserJson {
    pub url: String,
    pub username: String,
    pub member_since: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    pub posts: String,
    pub post_count: i64,
}

impl UserJson {
    pub fn build(urls: &ResourceUrls, user: &User, post_count: i64) -> AppResult<Self> {
        Ok(Self {
            url: urls.user(user.id)?,
            username: user.username.clone(),
            member_since: user.member_since,
            last_seen: user.last_seen,
            posts: urls.user_posts(user.id)?,
            post_count,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PostContentJson {
    pub url: String,
    pub body: String,
    pub timestamp: NaiveDateTime,
    pub author: String,
    pub comments: String,
    pub comment_count: i64,
}

impl PostContentJson {
    pub fn build(
        urls: &ResourceUrls,
        content: &PostContent,
        author_id: Uuid,
        comment_count: i64,
    ) -> AppResult<Self> {
        Ok(Self {
            url: urls.post_content(content.id)?,
            body: content.body.clone(),
            timestamp: content.created_at,
            author: urls.user(author_id)?,
            comments: urls.post_content_comments(content.id)?,
            comment_count,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CommentJson {
    pub url: String,
    #[serde(rename = "postContent")]
    pub post_content: String,
    pub body: String,
    pub timestamp: NaiveDateTime,
    pub author: String,
}

impl CommentJson {
    pub fn build(urls: &ResourceUrls, comment: &Comment) -> AppResult<Self> {
        Ok(Self {
            url: urls.comment(comment.id)?,
            post_content: urls.post_content(comment.post_content_id)?,
            body: comment.body.clone(),
            timestamp: comment.created_at,
            author: urls.user(comment.author_id)?,
        })
    }
}

pub fn user_to_json(conn: &mut PgConnection, urls: &ResourceUrls, user: &User) -> AppResult<UserJson> {
    let post_count = users::post_count(conn, user.id)?;
    UserJson::build(urls, user, post_count)
}

pub fn post_content_to_json(
    conn: &mut PgConnection,
    urls: &ResourceUrls,
    content: &PostContent,
) -> AppResult<PostContentJson> {
    let author_id = posts::post_content_author(conn, content.id)?;
    let comment_count = posts::comment_count(conn, content.id)?;
    PostContentJson::build(urls, content, author_id, comment_count)
}

pub fn comment_to_json(urls: &ResourceUrls, comment: &Comment) -> AppResult<CommentJson> {
    CommentJson::build(urls, comment)
}
