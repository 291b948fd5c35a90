use std::sync::Arc;

use chrono::{DateTime, Utc};
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ConnectOptions, ConnectionTrait, Database as SeaDatabase, Set};

use crate::database::Database;
use crate::entities;

/// Fresh in-memory database with every migration applied.
pub async fn test_db() -> Arc<Database> {
    // A single pooled connection, otherwise each connection sees its own empty database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = SeaDatabase::connect(opt).await.unwrap();

    // Enable foreign keys
    conn.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .unwrap();

    migration::Migrator::up(&conn, None).await.unwrap();

    Arc::new(Database { conn })
}

pub async fn insert_venue(
    db: &Database,
    name: &str,
    city: &str,
    state: &str,
) -> entities::venue::Model {
    let venue = entities::venue::ActiveModel {
        name: Set(name.into()),
        city: Set(city.into()),
        state: Set(state.into()),
        image_link: Set(Some(format!("https://img.example/{}.png", name.len()))),
        seeking_talent: Set(false),
        genres: Set("[]".into()),
        ..Default::default()
    };
    venue.insert(&db.conn).await.unwrap()
}

pub async fn insert_artist(db: &Database, name: &str) -> entities::artist::Model {
    let artist = entities::artist::ActiveModel {
        name: Set(name.into()),
        city: Set("San Francisco".into()),
        state: Set("CA".into()),
        image_link: Set(Some(format!("https://img.example/artist-{}.png", name.len()))),
        seeking_venue: Set(false),
        genres: Set(r#"["Jazz"]"#.into()),
        ..Default::default()
    };
    artist.insert(&db.conn).await.unwrap()
}

pub async fn insert_show(
    db: &Database,
    venue_id: i64,
    artist_id: i64,
    start_time: DateTime<Utc>,
) -> entities::show::Model {
    let show = entities::show::ActiveModel {
        venue_id: Set(venue_id),
        artist_id: Set(artist_id),
        start_time: Set(start_time),
        ..Default::default()
    };
    show.insert(&db.conn).await.unwrap()
}
