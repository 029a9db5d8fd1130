mod common;

use anyhow::Result;
use chrono::Duration;
use common::{TestApp, ADMIN_EMAIL};
use rand::rngs::StdRng;
use rand::SeedableRng;
use socialblog::auth::{self, Permission};
use socialblog::fake;
use socialblog::models::avatar_hash;
use socialblog::repo::{follows, roles, users};
use socialblog::AppError;

#[test]
fn new_user_follows_itself_and_gets_default_role() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_roles()?;
    let alice = app.insert_user("alice", "cat")?;
    let mut conn = app.conn()?;

    assert!(follows::is_following(&mut conn, alice.id, alice.id)?);
    assert_eq!(follows::follower_count(&mut conn, alice.id)?, 1);
    assert_eq!(alice.avatar_hash.as_deref().map(str::len), Some(32));

    let default = roles::default_role(&mut conn)?.expect("default role");
    assert_eq!(default.name, roles::ROLE_USER);
    assert_eq!(alice.role_id, Some(default.id));

    let loaded = auth::load_user(&mut conn, alice.id)?.expect("user exists");
    assert!(loaded.can(Permission::FOLLOW | Permission::COMMENT | Permission::WRITE_ARTICLES));
    assert!(!loaded.can(Permission::MODERATE_COMMENTS));
    assert!(!loaded.is_administrator());
    Ok(())
}

#[test]
fn admin_email_receives_administrator_role() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_roles()?;
    let mut conn = app.conn()?;

    let form = users::NewUserForm::new(ADMIN_EMAIL, "root", "hunter2");
    let admin = users::create_user(&mut conn, &app.state.config, form)?;
    let loaded = auth::load_user(&mut conn, admin.id)?.expect("admin exists");

    assert!(loaded.is_administrator());
    assert!(loaded.can(Permission::MODERATE_COMMENTS));
    Ok(())
}

#[test]
fn removing_role_revokes_every_permission() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_roles()?;
    let bob = app.insert_user("bob", "dog")?;
    let mut conn = app.conn()?;

    roles::assign_role(&mut conn, bob.id, None)?;
    let loaded = auth::load_user(&mut conn, bob.id)?.expect("user exists");
    assert!(loaded.role.is_none());
    assert!(!loaded.can(Permission::FOLLOW));
    Ok(())
}

#[test]
fn users_without_seeded_roles_have_no_role() -> Result<()> {
    let app = TestApp::new()?;
    let carol = app.insert_user("carol", "pw")?;
    assert!(carol.role_id.is_none());
    Ok(())
}

#[test]
fn reseeding_roles_keeps_a_single_default() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_roles()?;
    app.seed_roles()?;
    let mut conn = app.conn()?;

    let all = roles::list_roles(&mut conn)?;
    assert_eq!(all.len(), 3);
    assert_eq!(all.iter().filter(|role| role.is_default).count(), 1);

    let moderator = roles::find_role_by_name(&mut conn, roles::ROLE_MODERATOR)?.expect("moderator");
    assert_eq!(moderator.permissions, 0x0f);
    assert!(roles::find_role_by_name(&mut conn, "Nobody")?.is_none());
    Ok(())
}

#[test]
fn duplicate_username_is_a_conflict() -> Result<()> {
    let app = TestApp::new()?;
    app.insert_user("dave", "pw")?;
    let mut conn = app.conn()?;

    let form = users::NewUserForm::new("other@blog.test", "dave", "pw");
    let err = users::create_user(&mut conn, &app.state.config, form).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "unexpected error: {err:?}");
    assert_eq!(users::user_count(&mut conn)?, 1);

    let found = users::find_user_by_username(&mut conn, "dave")?.expect("dave exists");
    assert_eq!(found.email, "dave@blog.test");
    Ok(())
}

#[test]
fn emails_are_unique_regardless_of_case() -> Result<()> {
    let app = TestApp::new()?;
    app.insert_user("kim", "pw")?;
    let mut conn = app.conn()?;

    let form = users::NewUserForm::new("  KIM@Blog.Test ", "kim2", "pw");
    let err = users::create_user(&mut conn, &app.state.config, form).unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {err:?}");

    let found = users::find_user_by_email(&mut conn, "Kim@BLOG.test")?.expect("kim exists");
    assert_eq!(found.username, "kim");
    assert!(users::authenticate(&mut conn, "KIM@blog.test", "pw")?.is_some());
    Ok(())
}

#[test]
fn over_long_profile_fields_are_validation_errors() -> Result<()> {
    let app = TestApp::new()?;
    let mut conn = app.conn()?;
    let long = "x".repeat(users::MAX_FIELD_LEN + 6);

    let form = users::NewUserForm::new(format!("{long}@blog.test"), "lena", "pw");
    let err = users::create_user(&mut conn, &app.state.config, form).unwrap_err();
    assert!(err.is_validation(), "unexpected error: {err:?}");

    let mut form = users::NewUserForm::new("lena@blog.test", "lena", "pw");
    form.name = Some(long);
    let err = users::create_user(&mut conn, &app.state.config, form).unwrap_err();
    assert!(err.is_validation(), "unexpected error: {err:?}");

    assert_eq!(users::user_count(&mut conn)?, 0);
    Ok(())
}

#[test]
fn failed_unit_of_work_rolls_back() -> Result<()> {
    let app = TestApp::new()?;
    let config = app.state.config.clone();

    let result: Result<(), AppError> = app.state.transaction(|conn| {
        users::create_user(conn, &config, users::NewUserForm::new("eve@blog.test", "eve", "pw"))?;
        Err(AppError::validation("abort"))
    });
    assert!(result.unwrap_err().is_validation());

    let mut conn = app.conn()?;
    assert_eq!(users::user_count(&mut conn)?, 0);
    assert!(users::find_user_by_username(&mut conn, "eve")?.is_none());
    Ok(())
}

#[test]
fn password_authentication_and_reset() -> Result<()> {
    let app = TestApp::new()?;
    let erin = app.insert_user("erin", "old-pass")?;
    let mut conn = app.conn()?;
    let jwt = &app.state.jwt;

    assert!(users::authenticate(&mut conn, "erin@blog.test", "old-pass")?.is_some());
    assert!(users::authenticate(&mut conn, "erin@blog.test", "nope")?.is_none());
    assert!(users::authenticate(&mut conn, "ghost@blog.test", "old-pass")?.is_none());

    let token = jwt.generate_reset_token(erin.id)?;
    assert!(!users::reset_password(&mut conn, jwt, &erin, "garbage", "new-pass")?);
    assert!(users::reset_password(&mut conn, jwt, &erin, &token, "new-pass")?);

    assert!(users::authenticate(&mut conn, "erin@blog.test", "old-pass")?.is_none());
    assert!(users::authenticate(&mut conn, "erin@blog.test", "new-pass")?.is_some());
    Ok(())
}

#[test]
fn confirmation_token_is_bound_to_its_user() -> Result<()> {
    let app = TestApp::new()?;
    let frank = app.insert_user("frank", "pw")?;
    let grace = app.insert_user("grace", "pw")?;
    let mut conn = app.conn()?;
    let jwt = &app.state.jwt;

    let token = jwt.generate_confirmation_token(frank.id)?;
    assert!(!users::confirm(&mut conn, jwt, &grace, &token)?);
    assert!(!users::find_user(&mut conn, grace.id)?.confirmed);

    assert!(users::confirm(&mut conn, jwt, &frank, &token)?);
    assert!(users::find_user(&mut conn, frank.id)?.confirmed);

    let expired = jwt.generate_token(
        grace.id,
        auth::jwt::TokenAction::Confirm,
        None,
        Duration::seconds(-5),
    )?;
    assert!(!users::confirm(&mut conn, jwt, &grace, &expired)?);
    Ok(())
}

#[test]
fn email_change_updates_avatar_and_rejects_taken_address() -> Result<()> {
    let app = TestApp::new()?;
    let heidi = app.insert_user("heidi", "pw")?;
    app.insert_user("ivan", "pw")?;
    let mut conn = app.conn()?;
    let jwt = &app.state.jwt;

    let taken = jwt.generate_email_change_token(heidi.id, "ivan@blog.test")?;
    assert!(!users::change_email(&mut conn, jwt, &heidi, &taken)?);
    let taken_other_case = jwt.generate_email_change_token(heidi.id, "Ivan@Blog.Test")?;
    assert!(!users::change_email(&mut conn, jwt, &heidi, &taken_other_case)?);
    let too_long = format!("{}@blog.test", "h".repeat(users::MAX_FIELD_LEN));
    let oversized = jwt.generate_email_change_token(heidi.id, &too_long)?;
    assert!(!users::change_email(&mut conn, jwt, &heidi, &oversized)?);

    let token = jwt.generate_email_change_token(heidi.id, "Heidi@New.Test")?;
    assert!(users::change_email(&mut conn, jwt, &heidi, &token)?);

    let updated = users::find_user(&mut conn, heidi.id)?;
    assert_eq!(updated.email, "heidi@new.test");
    assert_ne!(updated.avatar_hash, heidi.avatar_hash);
    assert_eq!(
        updated.avatar_hash.as_deref(),
        Some(avatar_hash("heidi@new.test").as_str())
    );
    Ok(())
}

#[test]
fn auth_token_resolves_user() -> Result<()> {
    let app = TestApp::new()?;
    let judy = app.insert_user("judy", "pw")?;
    let mut conn = app.conn()?;
    let jwt = &app.state.jwt;

    let token = jwt.generate_auth_token(judy.id, Duration::seconds(60))?;
    let resolved = users::verify_auth_token(&mut conn, jwt, &token)?.expect("valid token");
    assert_eq!(resolved.id, judy.id);

    let confirm = jwt.generate_confirmation_token(judy.id)?;
    assert!(users::verify_auth_token(&mut conn, jwt, &confirm)?.is_none());

    let seen = users::ping(&mut conn, judy.id)?;
    let stored = users::find_user(&mut conn, judy.id)?.last_seen;
    assert!((stored - seen).num_milliseconds().abs() <= 1);
    Ok(())
}

#[test]
fn fake_users_are_created_with_self_follows() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_roles()?;
    let mut conn = app.conn()?;
    let mut rng = StdRng::seed_from_u64(3);

    let created = fake::generate_fake_users(&mut conn, &app.state.config, &mut rng, 10)?;
    assert!(created > 0);
    assert_eq!(users::user_count(&mut conn)?, created as i64);
    assert_eq!(follows::add_self_follows(&mut conn)?, 0);
    Ok(())
}
