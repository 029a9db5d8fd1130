use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::auth::Permission;
use crate::error::{AppError, AppResult};
use crate::models::{NewRole, Role};
use crate::schema::{roles, users};

pub const ROLE_USER: &str = "User";
pub const ROLE_MODERATOR: &str = "Moderator";
pub const ROLE_ADMINISTRATOR: &str = "Administrator";

/// The roles every installation starts with: name, permissions, default flag.
pub fn standard_roles() -> [(&'static str, Permission, bool); 3] {
    let user = Permission::FOLLOW | Permission::COMMENT | Permission::WRITE_ARTICLES;
    [
        (ROLE_USER, user, true),
        (ROLE_MODERATOR, user | Permission::MODERATE_COMMENTS, false),
        (ROLE_ADMINISTRATOR, Permission::ALL, false),
    ]
}

/// Creates or refreshes the standard roles. Existing rows keep their ids;
/// default flags are cleared first so exactly one default remains.
pub fn insert_roles(conn: &mut PgConnection) -> AppResult<Vec<Role>> {
    conn.transaction::<_, AppError, _>(|conn| {
        diesel::update(roles::table.filter(roles::is_default.eq(true)))
            .set(roles::is_default.eq(false))
            .execute(conn)?;

        let mut seeded = Vec::new();
        for (name, permissions, is_default) in standard_roles() {
            let new_role = NewRole {
                id: Uuid::new_v4(),
                name: name.to_string(),
                is_default,
                permissions: permissions.bits(),
            };

            let role: Role = diesel::insert_into(roles::table)
                .values(&new_role)
                .on_conflict(roles::name)
                .do_update()
                .set((
                    roles::permissions.eq(permissions.bits()),
                    roles::is_default.eq(is_default),
                ))
                .get_result(conn)?;
            seeded.push(role);
        }

        tracing::info!(component = "roles", count = seeded.len(), "standard roles seeded");
        Ok(seeded)
    })
}

pub fn default_role(conn: &mut PgConnection) -> AppResult<Option<Role>> {
    Ok(roles::table
        .filter(roles::is_default.eq(true))
        .first(conn)
        .optional()?)
}

/// The role granting every permission bit, if one has been seeded.
pub fn administrator_role(conn: &mut PgConnection) -> AppResult<Option<Role>> {
    Ok(roles::table
        .filter(roles::permissions.eq(Permission::ALL.bits()))
        .order(roles::name.asc())
        .first(conn)
        .optional()?)
}

pub fn find_role_by_name(conn: &mut PgConnection, name: &str) -> AppResult<Option<Role>> {
    Ok(roles::table
        .filter(roles::name.eq(name))
        .first(conn)
        .optional()?)
}

pub fn list_roles(conn: &mut PgConnection) -> AppResult<Vec<Role>> {
    Ok(roles::table.order(roles::permissions.asc()).load(conn)?)
}

/// Points a user at a role, or detaches it entirely with `None`.
pub fn assign_role(
    conn: &mut PgConnection,
    user_id: Uuid,
    role_id: Option<Uuid>,
) -> AppResult<()> {
    let updated = diesel::update(users::table.find(user_id))
        .set(users::role_id.eq(role_id))
        .execute(conn)?;
    if updated == 0 {
        return Err(AppError::not_found());
    }
    tracing::info!(
        component = "roles",
        user_id = %user_id,
        role_id = ?role_id,
        "user role changed"
    );
    Ok(())
}
