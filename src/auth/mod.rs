pub mod jwt;
pub mod password;

use std::ops::BitOr;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Role, User};
use crate::schema::{roles, users};

/// Capability bits carried by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission(i32);

impl Permission {
    pub const FOLLOW: Permission = Permission(0x01);
    pub const COMMENT: Permission = Permission(0x02);
    pub const WRITE_ARTICLES: Permission = Permission(0x04);
    pub const MODERATE_COMMENTS: Permission = Permission(0x08);
    pub const ADMINISTER: Permission = Permission(0x80);
    pub const ALL: Permission = Permission(0xff);

    pub const fn bits(self) -> i32 {
        self.0
    }

    pub const fn from_bits(bits: i32) -> Self {
        Permission(bits)
    }

    pub const fn contains(self, other: Permission) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Permission {
    type Output = Permission;

    fn bitor(self, rhs: Permission) -> Permission {
        Permission(self.0 | rhs.0)
    }
}

/// True iff a role is present and grants every bit of `mask`.
pub fn can(role: Option<&Role>, mask: Permission) -> bool {
    role.is_some_and(|role| Permission::from_bits(role.permissions).contains(mask))
}

/// A user row together with its resolved role.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub role: Option<Role>,
}

impl AuthenticatedUser {
    pub fn can(&self, mask: Permission) -> bool {
        can(self.role.as_ref(), mask)
    }

    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMINISTER)
    }
}

/// Whoever is performing an operation.
#[derive(Debug, Clone)]
pub enum Viewer {
    Anonymous,
    User(AuthenticatedUser),
}

impl Viewer {
    pub fn can(&self, mask: Permission) -> bool {
        match self {
            Viewer::Anonymous => false,
            Viewer::User(user) => user.can(mask),
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMINISTER)
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(user) => Some(user),
        }
    }
}

/// Resolves a user id into an [`AuthenticatedUser`], or `None` when no such user exists.
pub fn load_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Option<AuthenticatedUser>> {
    let row: Option<(User, Option<Role>)> = users::table
        .left_join(roles::table)
        .filter(users::id.eq(user_id))
        .first(conn)
        .optional()?;

    Ok(row.map(|(user, role)| AuthenticatedUser { user, role }))
}
