use std::collections::BTreeMap;
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

/// Editable venue fields, already parsed from a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueInput {
    pub name: String,
    pub genres: Vec<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

/// Venues sharing a city and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueArea {
    pub city: String,
    pub state: String,
    pub venues: Vec<EntitySummary>,
}

/// A show on a venue page, described by the artist playing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueShow {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<VenueShow>,
    pub upcoming_shows: Vec<VenueShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

pub struct VenueService {
    db: Arc<Database>,
}

impl VenueService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All venues grouped by (city, state), areas sorted by city then state
    #[tracing::instrument(skip(self))]
    pub async fn list_by_area(&self, now: DateTime<Utc>) -> BookingResult<Vec<VenueArea>> {
        let venues = venue::Entity::find()
            .order_by_asc(venue::Column::Id)
            .all(&self.db.conn)
            .await?;

        let mut areas: BTreeMap<(String, String), Vec<EntitySummary>> = BTreeMap::new();
        for venue in venues {
            let num_upcoming_shows = self.count_upcoming_shows(venue.id, now).await?;
            areas
                .entry((venue.city, venue.state))
                .or_default()
                .push(EntitySummary {
                    id: venue.id,
                    name: venue.name,
                    num_upcoming_shows,
                });
        }

        Ok(areas
            .into_iter()
            .map(|((city, state), venues)| VenueArea {
                city,
                state,
                venues,
            })
            .collect())
    }

    /// Case-insensitive substring match on the venue name
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, search_term: &str, now: DateTime<Utc>) -> BookingResult<SearchResults> {
        // SQLite's LIKE only folds ASCII, so the match runs here
        let matches = venue::Entity::find()
            .order_by_asc(venue::Column::Id)
            .all(&self.db.conn)
            .await?
            .into_iter()
            .filter(|venue| name_matches(&venue.name, search_term));

        let mut data = Vec::new();
        for venue in matches {
            data.push(EntitySummary {
                id: venue.id,
                num_upcoming_shows: self.count_upcoming_shows(venue.id, now).await?,
                name: venue.name,
            });
        }

        Ok(data.into())
    }

    pub async fn find(&self, id: i64) -> BookingResult<Option<venue::Model>> {
        Ok(venue::Entity::find_by_id(id).one(&self.db.conn).await?)
    }

    /// Full venue page: attributes plus past and upcoming shows with their artists
    #[tracing::instrument(skip(self))]
    pub async fn detail(&self, id: i64, now: DateTime<Utc>) -> BookingResult<VenueDetail> {
        let venue = self
            .find(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Venue", id))?;

        let shows = show::Entity::find()
            .filter(show::Column::VenueId.eq(id))
            .order_by_asc(show::Column::StartTime)
            .find_also_related(artist::Entity)
            .all(&self.db.conn)
            .await?;

        let shows = shows.into_iter().filter_map(|(show, artist)| {
            let Some(artist) = artist else {
                log::warn!("Show {} references missing artist {}", show.id, show.artist_id);
                return None;
            };
            Some((
                show.start_time,
                VenueShow {
                    artist_id: artist.id,
                    artist_name: artist.name,
                    artist_image_link: artist.image_link,
                    start_time: show.start_time.format(DETAIL_TIME_FORMAT).to_string(),
                },
            ))
        });
        let (past_shows, upcoming_shows) = split_past_upcoming(shows, now);

        Ok(VenueDetail {
            id: venue.id,
            genres: decode_genres(&venue.genres)?,
            name: venue.name,
            address: venue.address,
            city: venue.city,
            state: venue.state,
            phone: venue.phone,
            website: venue.website,
            facebook_link: venue.facebook_link,
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description,
            image_link: venue.image_link,
            past_shows_count: past_shows.len(),
            upcoming_shows_count: upcoming_shows.len(),
            past_shows,
            upcoming_shows,
        })
    }

    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: VenueInput) -> BookingResult<venue::Model> {
        let venue = venue::ActiveModel {
            name: Set(input.name),
            genres: Set(encode_genres(&input.genres)?),
            address: Set(input.address),
            city: Set(input.city),
            state: Set(input.state),
            phone: Set(input.phone),
            image_link: Set(input.image_link),
            facebook_link: Set(input.facebook_link),
            website: Set(input.website),
            seeking_talent: Set(input.seeking_talent),
            seeking_description: Set(input.seeking_description),
            ..Default::default()
        };

        let txn = self.db.conn.begin().await?;
        let model = venue.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(id = model.id, "Venue created");
        Ok(model)
    }

    /// Overwrite every editable field of an existing venue
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: i64, input: VenueInput) -> BookingResult<venue::Model> {
        let genres = encode_genres(&input.genres)?;

        let txn = self.db.conn.begin().await?;
        let existing = venue::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| BookingError::not_found("Venue", id))?;

        let mut venue: venue::ActiveModel = existing.into();
        venue.name = Set(input.name);
        venue.genres = Set(genres);
        venue.address = Set(input.address);
        venue.city = Set(input.city);
        venue.state = Set(input.state);
        venue.phone = Set(input.phone);
        venue.image_link = Set(input.image_link);
        venue.facebook_link = Set(input.facebook_link);
        venue.website = Set(input.website);
        venue.seeking_talent = Set(input.seeking_talent);
        venue.seeking_description = Set(input.seeking_description);

        let model = venue.update(&txn).await?;
        txn.commit().await?;

        tracing::info!("Venue updated");
        Ok(model)
    }

    /// Delete a venue together with all of its shows, returning the deleted row
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> BookingResult<venue::Model> {
        let txn = self.db.conn.begin().await?;
        let venue = venue::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| BookingError::not_found("Venue", id))?;

        let removed_shows = show::Entity::delete_many()
            .filter(show::Column::VenueId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        venue::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(removed_shows, "Venue deleted");
        Ok(venue)
    }

    async fn count_upcoming_shows(&self, venue_id: i64, now: DateTime<Utc>) -> BookingResult<u64> {
        Ok(show::Entity::find()
            .filter(show::Column::VenueId.eq(venue_id))
            .filter(show::Column::StartTime.gt(now))
            .count(&self.db.conn)
            .await?)
    }
}
