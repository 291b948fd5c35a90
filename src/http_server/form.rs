use axum::{
    Form,
    extract::{FromRequest, Request, rejection::FormRejection},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::entities::{artist, venue};
use crate::error::{BookingError, BookingResult};
use crate::services::{
    DETAIL_TIME_FORMAT, artist::ArtistInput, decode_genres, show::ShowInput, venue::VenueInput,
};

/// Accepted spellings of a show's start time, tried in order after RFC 3339.
/// Naive values are taken as UTC.
const START_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("field `{0}` must not be blank")]
    Blank(&'static str),
    #[error("field `{field}` is not a valid {expected}: {value:?}")]
    Invalid {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl From<FormError> for BookingError {
    fn from(err: FormError) -> Self {
        BookingError::InvalidInput(err.to_string())
    }
}

/// A submitted url-encoded form, in submission order. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    /// First value submitted under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Every value submitted under `key`, in order
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(name, _)| name == key)
    }

    fn required(&self, key: &'static str) -> Result<String, FormError> {
        let value = self.get(key).ok_or(FormError::Missing(key))?.trim();
        if value.is_empty() {
            return Err(FormError::Blank(key));
        }
        Ok(value.to_string())
    }

    /// Trimmed value, with blank treated the same as absent
    fn optional(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn id(&self, key: &'static str) -> Result<i64, FormError> {
        let raw = self.required(key)?;
        raw.parse().map_err(|_| FormError::Invalid {
            field: key,
            expected: "id",
            value: raw,
        })
    }

    fn genres(&self) -> Vec<String> {
        self.get_all("genres")
            .into_iter()
            .map(|genre| genre.trim().to_string())
            .filter(|genre| !genre.is_empty())
            .collect()
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(fields: Vec<(String, String)>) -> Self {
        Self(fields)
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = FormRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state).await?;
        Ok(Self(fields))
    }
}

/// How a "seeking" checkbox is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekingRule {
    /// True only when the submitted value is exactly `y` (create forms)
    LiteralYes,
    /// True whenever the key is submitted, whatever its value (edit forms)
    KeyPresent,
}

impl SeekingRule {
    fn read(self, form: &FormData, key: &str) -> bool {
        match self {
            SeekingRule::LiteralYes => form.get(key) == Some("y"),
            SeekingRule::KeyPresent => form.contains(key),
        }
    }
}

pub fn venue_input(form: &FormData, seeking: SeekingRule) -> Result<VenueInput, FormError> {
    Ok(VenueInput {
        name: form.required("name")?,
        genres: form.genres(),
        address: form.optional("address"),
        city: form.required("city")?,
        state: form.required("state")?,
        phone: form.optional("phone"),
        image_link: form.optional("image_link"),
        facebook_link: form.optional("facebook_link"),
        website: form.optional("website_link"),
        seeking_talent: seeking.read(form, "seeking_talent"),
        seeking_description: form.optional("seeking_description"),
    })
}

pub fn artist_input(form: &FormData, seeking: SeekingRule) -> Result<ArtistInput, FormError> {
    Ok(ArtistInput {
        name: form.required("name")?,
        genres: form.genres(),
        city: form.required("city")?,
        state: form.required("state")?,
        phone: form.optional("phone"),
        image_link: form.optional("image_link"),
        facebook_link: form.optional("facebook_link"),
        website: form.optional("website_link"),
        seeking_venue: seeking.read(form, "seeking_venue"),
        seeking_description: form.optional("seeking_description"),
    })
}

pub fn show_input(form: &FormData) -> Result<ShowInput, FormError> {
    Ok(ShowInput {
        artist_id: form.id("artist_id")?,
        venue_id: form.id("venue_id")?,
        start_time: parse_start_time(&form.required("start_time")?)?,
    })
}

pub fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, FormError> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }
    START_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| FormError::Invalid {
            field: "start_time",
            expected: "date and time",
            value: raw.to_string(),
        })
}

/// Values shown in a venue form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VenueFormValues {
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub website_link: String,
    pub facebook_link: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
    pub image_link: String,
}

impl VenueFormValues {
    pub fn from_model(venue: &venue::Model) -> BookingResult<Self> {
        Ok(Self {
            name: venue.name.clone(),
            genres: decode_genres(&venue.genres)?,
            address: venue.address.clone().unwrap_or_default(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            phone: venue.phone.clone().unwrap_or_default(),
            website_link: venue.website.clone().unwrap_or_default(),
            facebook_link: venue.facebook_link.clone().unwrap_or_default(),
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description.clone().unwrap_or_default(),
            image_link: venue.image_link.clone().unwrap_or_default(),
        })
    }
}

/// Values shown in an artist form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtistFormValues {
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub website_link: String,
    pub facebook_link: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
    pub image_link: String,
}

impl ArtistFormValues {
    pub fn from_model(artist: &artist::Model) -> BookingResult<Self> {
        Ok(Self {
            name: artist.name.clone(),
            genres: decode_genres(&artist.genres)?,
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone().unwrap_or_default(),
            website_link: artist.website.clone().unwrap_or_default(),
            facebook_link: artist.facebook_link.clone().unwrap_or_default(),
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description.clone().unwrap_or_default(),
            image_link: artist.image_link.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShowFormValues {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

impl ShowFormValues {
    /// Blank show form whose start time defaults to `now`
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            start_time: now.format(DETAIL_TIME_FORMAT).to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form(fields: &[(&str, &str)]) -> FormData {
        fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<Vec<_>>()
            .into()
    }

    fn venue_fields(seeking: Option<&str>) -> FormData {
        let mut fields = vec![
            ("name", "The Fillmore"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("address", "1805 Geary Blvd"),
            ("phone", ""),
            ("genres", "Rock n Roll"),
            ("genres", "Blues"),
            ("website_link", "https://fillmore.example"),
        ];
        if let Some(value) = seeking {
            fields.push(("seeking_talent", value));
        }
        form(&fields)
    }

    #[test]
    fn test_create_seeking_needs_literal_y() {
        let input = venue_input(&venue_fields(Some("y")), SeekingRule::LiteralYes).unwrap();
        assert!(input.seeking_talent);

        for value in [Some("yes"), Some("true"), Some(""), None] {
            let input = venue_input(&venue_fields(value), SeekingRule::LiteralYes).unwrap();
            assert!(!input.seeking_talent, "value {:?}", value);
        }
    }

    #[test]
    fn test_edit_seeking_is_key_presence() {
        for value in ["y", "on", ""] {
            let input = venue_input(&venue_fields(Some(value)), SeekingRule::KeyPresent).unwrap();
            assert!(input.seeking_talent, "value {:?}", value);
        }
        let input = venue_input(&venue_fields(None), SeekingRule::KeyPresent).unwrap();
        assert!(!input.seeking_talent);
    }

    #[test]
    fn test_venue_input_fields() {
        let input = venue_input(&venue_fields(None), SeekingRule::LiteralYes).unwrap();
        assert_eq!(input.genres, vec!["Rock n Roll", "Blues"]);
        assert_eq!(input.address.as_deref(), Some("1805 Geary Blvd"));
        assert_eq!(input.website.as_deref(), Some("https://fillmore.example"));
        assert_eq!(input.phone, None);
        assert_eq!(input.image_link, None);
    }

    #[test]
    fn test_missing_and_blank_name() {
        let err = venue_input(&form(&[("city", "Austin"), ("state", "TX")]), SeekingRule::LiteralYes)
            .unwrap_err();
        assert_eq!(err, FormError::Missing("name"));

        let err = artist_input(
            &form(&[("name", "  "), ("city", "Austin"), ("state", "TX")]),
            SeekingRule::LiteralYes,
        )
        .unwrap_err();
        assert_eq!(err, FormError::Blank("name"));
    }

    #[test]
    fn test_artist_seeking_venue() {
        let fields = form(&[
            ("name", "Guns N Petals"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("seeking_venue", "y"),
        ]);
        assert!(artist_input(&fields, SeekingRule::LiteralYes).unwrap().seeking_venue);
        assert!(artist_input(&fields, SeekingRule::KeyPresent).unwrap().seeking_venue);
    }

    #[test]
    fn test_show_input() {
        let input = show_input(&form(&[
            ("artist_id", "4"),
            ("venue_id", " 1 "),
            ("start_time", "2035-04-01 20:00:00"),
        ]))
        .unwrap();

        assert_eq!(input.artist_id, 4);
        assert_eq!(input.venue_id, 1);
        assert_eq!(input.start_time, Utc.with_ymd_and_hms(2035, 4, 1, 20, 0, 0).unwrap());
    }

    #[test]
    fn test_show_input_rejects_bad_id() {
        let err = show_input(&form(&[
            ("artist_id", "four"),
            ("venue_id", "1"),
            ("start_time", "2035-04-01 20:00:00"),
        ]))
        .unwrap_err();
        assert!(matches!(err, FormError::Invalid { field: "artist_id", .. }));
    }

    #[test]
    fn test_start_time_formats() {
        let expected = Utc.with_ymd_and_hms(2035, 4, 1, 20, 30, 0).unwrap();
        assert_eq!(parse_start_time("2035-04-01T20:30").unwrap(), expected);
        assert_eq!(parse_start_time("2035-04-01 20:30").unwrap(), expected);
        assert_eq!(parse_start_time("2035-04-01T22:30:00+02:00").unwrap(), expected);
        assert!(parse_start_time("next tuesday").is_err());
    }

    #[test]
    fn test_form_values_from_model() {
        let venue = venue::Model {
            id: 1,
            name: "The Fillmore".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            address: None,
            phone: Some("123-123-1234".into()),
            image_link: None,
            facebook_link: None,
            website: Some("https://fillmore.example".into()),
            seeking_talent: true,
            seeking_description: None,
            genres: r#"["Jazz"]"#.into(),
        };

        let values = VenueFormValues::from_model(&venue).unwrap();
        assert_eq!(values.website_link, "https://fillmore.example");
        assert_eq!(values.address, "");
        assert_eq!(values.genres, vec!["Jazz"]);
        assert!(values.seeking_talent);
    }
}
