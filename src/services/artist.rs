use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;

use crate::database::Database;
use crate::entities::{artist, show, venue};
use crate::error::{BookingError, BookingResult};
use crate::services::{
    DETAIL_TIME_FORMAT, EntitySummary, SearchResults, decode_genres, encode_genres, name_matches,
    split_past_upcoming,
};

/// Editable artist fields, already parsed from a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistInput {
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistListItem {
    pub id: i64,
    pub name: String,
}

/// A show on an artist page, described by the venue hosting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistShow {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<ArtistShow>,
    pub upcoming_shows: Vec<ArtistShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

pub struct ArtistService {
    db: Arc<Database>,
}

impl ArtistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> BookingResult<Vec<ArtistListItem>> {
        let artists = artist::Entity::find()
            .order_by_asc(artist::Column::Id)
            .all(&self.db.conn)
            .await?;

        Ok(artists
            .into_iter()
            .map(|artist| ArtistListItem {
                id: artist.id,
                name: artist.name,
            })
            .collect())
    }

    /// Case-insensitive substring match on the artist name
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, search_term: &str, now: DateTime<Utc>) -> BookingResult<SearchResults> {
        // SQLite's LIKE only folds ASCII, so the match runs here
        let matches = artist::Entity::find()
            .order_by_asc(artist::Column::Id)
            .all(&self.db.conn)
            .await?
            .into_iter()
            .filter(|artist| name_matches(&artist.name, search_term));

        let mut data = Vec::new();
        for artist in matches {
            data.push(EntitySummary {
                id: artist.id,
                num_upcoming_shows: self.count_upcoming_shows(artist.id, now).await?,
                name: artist.name,
            });
        }

        Ok(data.into())
    }

    pub async fn find(&self, id: i64) -> BookingResult<Option<artist::Model>> {
        Ok(artist::Entity::find_by_id(id).one(&self.db.conn).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn detail(&self, id: i64, now: DateTime<Utc>) -> BookingResult<ArtistDetail> {
        let artist = self
            .find(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Artist", id))?;

        let shows = show::Entity::find()
            .filter(show::Column::ArtistId.eq(id))
            .order_by_asc(show::Column::StartTime)
            .find_also_related(venue::Entity)
            .all(&self.db.conn)
            .await?;

        let shows = shows.into_iter().filter_map(|(show, venue)| {
            let Some(venue) = venue else {
                log::warn!("Show {} references missing venue {}", show.id, show.venue_id);
                return None;
            };
            Some((
                show.start_time,
                ArtistShow {
                    venue_id: venue.id,
                    venue_name: venue.name,
                    venue_image_link: venue.image_link,
                    start_time: show.start_time.format(DETAIL_TIME_FORMAT).to_string(),
                },
            ))
        });
        let (past_shows, upcoming_shows) = split_past_upcoming(shows, now);

        Ok(ArtistDetail {
            id: artist.id,
            genres: decode_genres(&artist.genres)?,
            name: artist.name,
            city: artist.city,
            state: artist.state,
            phone: artist.phone,
            website: artist.website,
            facebook_link: artist.facebook_link,
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description,
            image_link: artist.image_link,
            past_shows_count: past_shows.len(),
            upcoming_shows_count: upcoming_shows.len(),
            past_shows,
            upcoming_shows,
        })
    }

    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ArtistInput) -> BookingResult<artist::Model> {
        let artist = artist::ActiveModel {
            name: Set(input.name),
            genres: Set(encode_genres(&input.genres)?),
            city: Set(input.city),
            state: Set(input.state),
            phone: Set(input.phone),
            image_link: Set(input.image_link),
            facebook_link: Set(input.facebook_link),
            website: Set(input.website),
            seeking_venue: Set(input.seeking_venue),
            seeking_description: Set(input.seeking_description),
            ..Default::default()
        };

        let txn = self.db.conn.begin().await?;
        let model = artist.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(id = model.id, "Artist created");
        Ok(model)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: i64, input: ArtistInput) -> BookingResult<artist::Model> {
        let genres = encode_genres(&input.genres)?;

        let txn = self.db.conn.begin().await?;
        let existing = artist::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| BookingError::not_found("Artist", id))?;

        let mut artist: artist::ActiveModel = existing.into();
        artist.name = Set(input.name);
        artist.genres = Set(genres);
        artist.city = Set(input.city);
        artist.state = Set(input.state);
        artist.phone = Set(input.phone);
        artist.image_link = Set(input.image_link);
        artist.facebook_link = Set(input.facebook_link);
        artist.website = Set(input.website);
        artist.seeking_venue = Set(input.seeking_venue);
        artist.seeking_description = Set(input.seeking_description);

        let model = artist.update(&txn).await?;
        txn.commit().await?;

        tracing::info!("Artist updated");
        Ok(model)
    }

    /// Delete an artist together with all of their shows, returning the deleted row
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> BookingResult<artist::Model> {
        let txn = self.db.conn.begin().await?;
        let artist = artist::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| BookingError::not_found("Artist", id))?;

        let removed_shows = show::Entity::delete_many()
            .filter(show::Column::ArtistId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        artist::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(removed_shows, "Artist deleted");
        Ok(artist)
    }

    async fn count_upcoming_shows(&self, artist_id: i64, now: DateTime<Utc>) -> BookingResult<u64> {
        Ok(show::Entity::find()
            .filter(show::Column::ArtistId.eq(artist_id))
            .filter(show::Column::StartTime.gt(now))
            .count(&self.db.conn)
            .await?)
    }
}
