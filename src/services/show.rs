use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

use crate::database::Database;
use crate::entities::{artist, show, venue};
use crate::error::{BookingError, BookingResult};
use crate::services::LISTING_TIME_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowInput {
    pub venue_id: i64,
    pub artist_id: i64,
    pub start_time: DateTime<Utc>,
}

/// One row of the shows listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowListing {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

pub struct ShowService {
    db: Arc<Database>,
}

impl ShowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every show, latest first, joined to its venue and artist
    pub async fn list(&self) -> BookingResult<Vec<ShowListing>> {
        let shows = show::Entity::find()
            .order_by_desc(show::Column::StartTime)
            .order_by_desc(show::Column::Id)
            .find_also_related(venue::Entity)
            .all(&self.db.conn)
            .await?;

        // One bind parameter per distinct artist
        let artist_ids: HashSet<i64> = shows.iter().map(|(show, _)| show.artist_id).collect();
        let artists: HashMap<i64, artist::Model> = artist::Entity::find()
            .filter(artist::Column::Id.is_in(artist_ids))
            .all(&self.db.conn)
            .await?
            .into_iter()
            .map(|artist| (artist.id, artist))
            .collect();

        let mut listings = Vec::with_capacity(shows.len());
        for (show, venue) in shows {
            let (Some(venue), Some(artist)) = (venue, artists.get(&show.artist_id)) else {
                log::warn!("Skipping show {} with a dangling venue or artist", show.id);
                continue;
            };
            listings.push(ShowListing {
                venue_id: venue.id,
                venue_name: venue.name,
                artist_id: artist.id,
                artist_name: artist.name.clone(),
                artist_image_link: artist.image_link.clone(),
                start_time: show.start_time.format(LISTING_TIME_FORMAT).to_string(),
            });
        }

        Ok(listings)
    }

    /// Book an artist at a venue. Both must already exist.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, input: ShowInput) -> BookingResult<show::Model> {
        let txn = self.db.conn.begin().await?;

        venue::Entity::find_by_id(input.venue_id)
            .one(&txn)
            .await?
            .ok_or_else(|| BookingError::not_found("Venue", input.venue_id))?;
        artist::Entity::find_by_id(input.artist_id)
            .one(&txn)
            .await?
            .ok_or_else(|| BookingError::not_found("Artist", input.artist_id))?;

        let show = show::ActiveModel {
            venue_id: Set(input.venue_id),
            artist_id: Set(input.artist_id),
            start_time: Set(input.start_time),
            ..Default::default()
        };
        let model = show.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(id = model.id, "Show created");
        Ok(model)
    }
}
