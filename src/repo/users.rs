use chrono::{NaiveDateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::auth::jwt::{JwtService, TokenAction};
use crate::auth::password;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::{avatar_hash, NewUser, User};
use crate::repo::{follows, roles};
use crate::schema::{posts, users};

/// Width of the `VARCHAR(64)` user columns.
pub const MAX_FIELD_LEN: usize = 64;

/// Emails are stored and looked up lower-cased so uniqueness ignores case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_length(field: &str, value: &str) -> AppResult<()> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::validation(format!(
            "{field} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}

/// Input for [`create_user`]. The password is plaintext and hashed on insert.
#[derive(Debug, Clone, Default)]
pub struct NewUserForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirmed: bool,
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
    pub member_since: Option<NaiveDateTime>,
}

impl NewUserForm {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.email.trim().is_empty() {
            return Err(AppError::validation("email must not be empty"));
        }
        if !self.email.contains('@') {
            return Err(AppError::validation("email must contain '@'"));
        }
        if self.username.trim().is_empty() {
            return Err(AppError::validation("username must not be empty"));
        }
        if self.password.is_empty() {
            return Err(AppError::validation("password must not be empty"));
        }
        check_length("email", &self.email)?;
        check_length("username", &self.username)?;
        if let Some(name) = &self.name {
            check_length("name", name)?;
        }
        if let Some(location) = &self.location {
            check_length("location", location)?;
        }
        Ok(())
    }
}

/// Inserts a user with its role, avatar hash and the reflexive follow edge
/// in one transaction.
pub fn create_user(
    conn: &mut PgConnection,
    config: &AppConfig,
    form: NewUserForm,
) -> AppResult<User> {
    form.validate()?;
    let email = normalize_email(&form.email);
    let password_hash = password::hash_password(&form.password)?;

    conn.transaction::<_, AppError, _>(|conn| {
        let mut role = None;
        if config.is_admin_email(&email) {
            role = roles::administrator_role(conn)?;
        }
        if role.is_none() {
            role = roles::default_role(conn)?;
        }

        let new_user = NewUser {
            id: Uuid::new_v4(),
            avatar_hash: Some(avatar_hash(&email)),
            email,
            username: form.username.trim().to_string(),
            role_id: role.as_ref().map(|role| role.id),
            password_hash,
            confirmed: form.confirmed,
            name: form.name,
            location: form.location,
            about_me: form.about_me,
            member_since: form.member_since,
        };

        let user: User = diesel::insert_into(users::table)
            .values(&new_user)
            .get_result(conn)?;
        follows::follow(conn, user.id, user.id)?;

        tracing::info!(
            component = "users",
            user_id = %user.id,
            username = %user.username,
            role = role.as_ref().map(|role| role.name.as_str()).unwrap_or("none"),
            "user created"
        );
        Ok(user)
    })
}

pub fn find_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    Ok(users::table.find(user_id).first(conn)?)
}

pub fn find_user_by_email(conn: &mut PgConnection, email: &str) -> AppResult<Option<User>> {
    Ok(users::table
        .filter(users::email.eq(normalize_email(email)))
        .first(conn)
        .optional()?)
}

pub fn find_user_by_username(conn: &mut PgConnection, username: &str) -> AppResult<Option<User>> {
    Ok(users::table
        .filter(users::username.eq(username.trim()))
        .first(conn)
        .optional()?)
}

/// Looks a user up by email and checks the password. Unknown email and wrong
/// password are indistinguishable to the caller.
pub fn authenticate(
    conn: &mut PgConnection,
    email: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let Some(user) = find_user_by_email(conn, email)? else {
        return Ok(None);
    };
    let valid = password::verify_password(password, &user.password_hash).unwrap_or(false);
    Ok(valid.then_some(user))
}

pub fn set_password(conn: &mut PgConnection, user_id: Uuid, new_password: &str) -> AppResult<()> {
    if new_password.is_empty() {
        return Err(AppError::validation("password must not be empty"));
    }
    let hash = password::hash_password(new_password)?;
    let updated = diesel::update(users::table.find(user_id))
        .set(users::password_hash.eq(hash))
        .execute(conn)?;
    if updated == 0 {
        return Err(AppError::not_found());
    }
    Ok(())
}

/// Marks the user confirmed when `token` is a live confirmation token issued
/// to them. Returns `false` for any token problem.
pub fn confirm(
    conn: &mut PgConnection,
    jwt: &JwtService,
    user: &User,
    token: &str,
) -> AppResult<bool> {
    if jwt
        .verify_token_for(token, TokenAction::Confirm, user.id)
        .is_none()
    {
        return Ok(false);
    }

    diesel::update(users::table.find(user.id))
        .set(users::confirmed.eq(true))
        .execute(conn)?;
    tracing::info!(component = "users", user_id = %user.id, "account confirmed");
    Ok(true)
}

pub fn reset_password(
    conn: &mut PgConnection,
    jwt: &JwtService,
    user: &User,
    token: &str,
    new_password: &str,
) -> AppResult<bool> {
    if jwt
        .verify_token_for(token, TokenAction::Reset, user.id)
        .is_none()
    {
        return Ok(false);
    }

    set_password(conn, user.id, new_password)?;
    tracing::info!(component = "users", user_id = %user.id, "password reset");
    Ok(true)
}

/// Applies an email change token. Rejected when the token is invalid or the
/// new address already belongs to someone.
pub fn change_email(
    conn: &mut PgConnection,
    jwt: &JwtService,
    user: &User,
    token: &str,
) -> AppResult<bool> {
    let Some(claims) = jwt.verify_token_for(token, TokenAction::ChangeEmail, user.id) else {
        return Ok(false);
    };
    let Some(new_email) = claims.new_email.as_deref().map(normalize_email) else {
        return Ok(false);
    };
    if new_email.is_empty()
        || new_email.chars().count() > MAX_FIELD_LEN
        || find_user_by_email(conn, &new_email)?.is_some()
    {
        return Ok(false);
    }

    diesel::update(users::table.find(user.id))
        .set((
            users::avatar_hash.eq(avatar_hash(&new_email)),
            users::email.eq(&new_email),
        ))
        .execute(conn)?;
    tracing::info!(component = "users", user_id = %user.id, "email changed");
    Ok(true)
}

/// Resolves an API auth token to its user; `None` for bad tokens or deleted users.
pub fn verify_auth_token(
    conn: &mut PgConnection,
    jwt: &JwtService,
    token: &str,
) -> AppResult<Option<User>> {
    let Some(claims) = jwt.verify_token(token, TokenAction::Auth) else {
        return Ok(None);
    };
    Ok(users::table.find(claims.sub).first(conn).optional()?)
}

/// Refreshes `last_seen`.
pub fn ping(conn: &mut PgConnection, user_id: Uuid) -> AppResult<NaiveDateTime> {
    let now = Utc::now().naive_utc();
    diesel::update(users::table.find(user_id))
        .set(users::last_seen.eq(now))
        .execute(conn)?;
    Ok(now)
}

pub fn post_count(conn: &mut PgConnection, user_id: Uuid) -> AppResult<i64> {
    Ok(posts::table
        .filter(posts::author_id.eq(user_id))
        .select(count_star())
        .first(conn)?)
}

pub fn user_count(conn: &mut PgConnection) -> AppResult<i64> {
    Ok(users::table.select(count_star()).first(conn)?)
}
