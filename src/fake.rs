//! Random users and posts for local development databases.

use chrono::{Duration, NaiveDateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::repo::posts::{self, PostContentDraft};
use crate::repo::users::{self, NewUserForm};
use crate::schema::users as users_table;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "John",
    "Ken", "Linus", "Margaret", "Niklaus", "Radia", "Tony",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Hamilton", "Hopper", "Kernighan", "Knuth", "Lamarr", "Liskov",
    "Lovelace", "Perlman", "Ritchie", "Shannon", "Thompson", "Turing", "Wirth",
];

const CITIES: &[&str] = &[
    "Amsterdam", "Berlin", "Cairo", "Hangzhou", "Lagos", "Lima", "Montreal", "Oslo", "Osaka",
    "Porto", "Seoul", "Tartu",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
    "enim", "minim", "veniam", "quis", "nostrud",
];

fn pick<R: Rng>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

pub fn sentence<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(4..12);
    let words: Vec<&str> = (0..len).map(|_| pick(rng, WORDS)).collect();
    let mut text = String::new();
    if let Some(first) = words.first() {
        let mut chars = first.chars();
        if let Some(head) = chars.next() {
            text.push(head.to_ascii_uppercase());
            text.push_str(chars.as_str());
        }
    }
    for word in words.iter().skip(1) {
        text.push(' ');
        text.push_str(word);
    }
    text.push('.');
    text
}

pub fn sentences<R: Rng>(rng: &mut R, count: usize) -> String {
    (0..count)
        .map(|_| sentence(rng))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A date within roughly the last year.
pub fn past_date<R: Rng>(rng: &mut R) -> NaiveDateTime {
    let seconds = rng.gen_range(0..365 * 24 * 3600);
    (Utc::now() - Duration::seconds(seconds)).naive_utc()
}

pub fn fake_user_form<R: Rng>(rng: &mut R) -> NewUserForm {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let suffix: u16 = rng.gen_range(0..1000);
    let username = format!("{}{}{suffix}", first.to_lowercase(), last.to_lowercase());
    let email = format!("{username}@{}", pick(rng, DOMAINS));

    NewUserForm {
        email,
        username,
        password: pick(rng, WORDS).to_string(),
        confirmed: true,
        name: Some(format!("{first} {last}")),
        location: Some(pick(rng, CITIES).to_string()),
        about_me: Some(sentence(rng)),
        member_since: Some(past_date(rng)),
    }
}

/// Inserts up to `count` random users. Records colliding with an existing
/// email or username are dropped; the number actually created is returned.
pub fn generate_fake_users<R: Rng>(
    conn: &mut PgConnection,
    config: &AppConfig,
    rng: &mut R,
    count: usize,
) -> AppResult<usize> {
    let mut created = 0;
    for _ in 0..count {
        let form = fake_user_form(rng);
        let username = form.username.clone();
        match users::create_user(conn, config, form) {
            Ok(_) => created += 1,
            Err(AppError::Conflict(reason)) => {
                tracing::debug!(component = "fake", %username, %reason, "discarding duplicate fake user");
            }
            Err(err) => return Err(err),
        }
    }
    tracing::info!(component = "fake", requested = count, created, "fake users generated");
    Ok(created)
}

/// Creates `count` posts, each with one revision, authored by random existing users.
pub fn generate_fake_posts<R: Rng>(
    conn: &mut PgConnection,
    rng: &mut R,
    count: usize,
) -> AppResult<usize> {
    let author_ids: Vec<uuid::Uuid> = users_table::table
        .select(users_table::id)
        .load(conn)?;
    if author_ids.is_empty() {
        return Err(AppError::validation("no users to author fake posts"));
    }

    for _ in 0..count {
        let author_id = author_ids[rng.gen_range(0..author_ids.len())];
        let title = sentence(rng);
        let paragraphs = rng.gen_range(1..=3);
        let mut draft = PostContentDraft::new(sentences(rng, paragraphs))?
            .with_intro(sentences(rng, 1));
        draft.created_at = Some(past_date(rng));
        posts::create_post_with_content(conn, author_id, title.trim_end_matches('.'), draft)?;
    }
    tracing::info!(component = "fake", created = count, "fake posts generated");
    Ok(count)
}
