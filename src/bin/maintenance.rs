use std::env;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use socialblog::{
    auth::jwt::JwtService,
    config::AppConfig,
    db, fake,
    repo::{follows, roles},
    state::AppState,
};

const USAGE: &str = "Usage: maintenance <migrate|insert-roles|add-self-follows|fake-users [count]|fake-posts [count]>";
const DEFAULT_FAKE_COUNT: usize = 100;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let mut args = env::args().skip(1);
    let command = args.next();
    let count = args
        .next()
        .map(|raw| raw.parse::<usize>().context("count must be a positive integer"))
        .transpose()?
        .unwrap_or(DEFAULT_FAKE_COUNT);

    let Some(command) = command else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        command = %command,
        "loaded configuration"
    );
    let pool = db::init_pool(&config)?;
    let jwt = JwtService::from_config(&config)?;
    let state = AppState::new(pool, config, jwt);
    let mut conn = state.db()?;

    match command.as_str() {
        "migrate" => {
            let applied = db::run_migrations(&mut conn)?;
            println!("Applied {applied} migrations.");
        }
        "insert-roles" => {
            let seeded = roles::insert_roles(&mut conn)?;
            for role in seeded {
                println!(
                    "{:<14} permissions=0x{:02x} default={}",
                    role.name, role.permissions, role.is_default
                );
            }
        }
        "add-self-follows" => {
            let repaired = follows::add_self_follows(&mut conn)?;
            println!("Repaired {repaired} missing self-follows.");
        }
        "fake-users" => {
            let created =
                fake::generate_fake_users(&mut conn, &state.config, &mut rand::thread_rng(), count)?;
            println!("Created {created} of {count} requested users.");
        }
        "fake-posts" => {
            let created = fake::generate_fake_posts(&mut conn, &mut rand::thread_rng(), count)?;
            println!("Created {created} posts.");
        }
        other => {
            eprintln!("Unknown command: {other}\n{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
