//! Import of photo-scraper `metadata.json` files.
//!
//! The scrapers write a JSON array with one object per downloaded photo.
//! Each geotagged entry becomes a public, pulled spot with a single photo;
//! entries without usable coordinates are skipped. Spot and photo ids are
//! derived from the source photo id, so an entry always maps to the same
//! records.

use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use spotlens_types::{GeoPoint, Media, Privacy, Spot, SpotStatus};

use crate::error::Result;
use crate::store::{PullOutcome, Store};

/// Counts from [`Store::import_scraped_metadata`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportResult {
    /// Entries stored as new spots.
    pub imported: usize,
    /// Entries that refreshed a spot from an earlier import.
    pub updated: usize,
    /// Entries without usable coordinates.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct ScrapedPhoto {
    #[serde(default)]
    photo_id: serde_json::Value,
    title: Option<String>,
    description: Option<String>,
    location: Option<ScrapedLocation>,
    /// Coordinates read from the file's EXIF block.
    exif_coords: Option<ScrapedLocation>,
    tags: Option<Vec<String>>,
    date_taken: Option<String>,
    username: Option<String>,
    photographer_name: Option<String>,
    photographer: Option<String>,
    license: Option<String>,
    download_url: Option<String>,
    photo_url: Option<String>,
    url: Option<String>,
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapedLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    place_name: Option<String>,
    name: Option<String>,
}

impl ScrapedLocation {
    fn point(&self) -> Option<GeoPoint> {
        let point = GeoPoint::new(self.latitude?, self.longitude?);
        point.is_valid().then_some(point)
    }
}

impl ScrapedPhoto {
    fn photo_id(&self) -> Option<String> {
        match &self.photo_id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `geograph:<id>` for files from the Geograph scraper, else `flickr:<id>`.
    fn server_id(&self, photo_id: &str) -> String {
        let source = match &self.filename {
            Some(name) if name.starts_with("geograph_") => "geograph",
            _ => "flickr",
        };
        format!("{source}:{photo_id}")
    }

    fn point(&self) -> Option<GeoPoint> {
        self.location
            .as_ref()
            .and_then(ScrapedLocation::point)
            .or_else(|| self.exif_coords.as_ref().and_then(ScrapedLocation::point))
    }

    fn creator(&self) -> String {
        self.photographer_name
            .as_deref()
            .or(self.photographer.as_deref())
            .or(self.username.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string()
    }

    fn into_spot(self, photo_id: &str, location: GeoPoint) -> Spot {
        let creator = self.creator();
        let place = self
            .location
            .as_ref()
            .and_then(|l| l.place_name.clone().or_else(|| l.name.clone()));
        let title = self
            .title
            .clone()
            .filter(|t| !t.is_empty() && t != "Untitled")
            .or(place)
            .unwrap_or_else(|| format!("Photo {photo_id}"));

        let server_id = self.server_id(photo_id);
        let mut spot = Spot::new_local(title, location, creator.clone());
        spot.id = Uuid::new_v5(&Uuid::NAMESPACE_URL, server_id.as_bytes());
        spot.description = self.description.clone().filter(|d| !d.is_empty());
        for tag in self.tags.clone().unwrap_or_default() {
            spot.add_tag(tag);
        }
        spot.privacy = Privacy::Public;
        spot.status = SpotStatus::Active;
        spot.license = self.license.clone().unwrap_or_default();
        spot.sync.server_id = Some(server_id.clone());

        let url = self
            .download_url
            .or(self.url)
            .or(self.photo_url)
            .unwrap_or_default();
        let mut photo = Media::new_photo(creator, url).for_spot(spot.id);
        photo.id = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{server_id}/photo").as_bytes());
        photo.capture_time = self.date_taken.as_deref().and_then(parse_date_taken);
        photo.original_filename = self.filename;
        spot.media.push(photo);
        spot
    }
}

/// Scrapers report either RFC 3339 or Flickr's `YYYY-MM-DD HH:MM:SS`.
fn parse_date_taken(text: &str) -> Option<OffsetDateTime> {
    if let Ok(t) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(t);
    }
    let naive = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(text, naive)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

impl Store {
    /// Import a scraper `metadata.json` array.
    ///
    /// Re-importing the same file refreshes the existing spots instead of
    /// duplicating them.
    pub fn import_scraped_metadata(&self, json: &str, ttl: Duration) -> Result<ImportResult> {
        let photos: Vec<ScrapedPhoto> = serde_json::from_str(json)?;
        let mut result = ImportResult::default();

        for photo in photos {
            let (Some(photo_id), Some(location)) = (photo.photo_id(), photo.point()) else {
                debug!("Skipping scraped photo without id or coordinates");
                result.skipped += 1;
                continue;
            };
            let spot = photo.into_spot(&photo_id, location);
            match self.upsert_pulled_spot(&spot, ttl)? {
                PullOutcome::Inserted(_) => result.imported += 1,
                PullOutcome::Updated(_) => result.updated += 1,
            }
        }

        info!(
            "Imported scraped metadata: {} new, {} updated, {} skipped",
            result.imported, result.updated, result.skipped
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::SpotQuery;

    const FLICKR_METADATA: &str = r#"[
      {
        "photo_id": "53012345678",
        "username": "alpinelight",
        "photo_url": "https://www.flickr.com/photos/alpinelight/53012345678",
        "title": "Moraine Lake at first light",
        "description": "Ten peaks glowing",
        "location": {"latitude": 51.3217, "longitude": -116.1860, "place_name": "Moraine Lake"},
        "tags": ["sunrise", "lake", "sunrise"],
        "date_taken": "2023-07-14 05:21:09",
        "photographer_name": "Alpine Light",
        "views": "1,204",
        "license": "CC BY 2.0",
        "filename": "flickr_53012345678_alpinelight.jpg",
        "download_url": "https://live.staticflickr.com/65535/53012345678_abcd_o.jpg"
      },
      {
        "photo_id": "53000000001",
        "username": "nogps",
        "title": "Somewhere",
        "location": null,
        "tags": []
      },
      {
        "photo_id": 7712345,
        "filename": "geograph_7712345.jpg",
        "title": "Stac Pollaidh",
        "photographer": "J Smith",
        "url": "https://s0.geograph.org.uk/geophotos/07/71/23/7712345.jpg",
        "exif_coords": {"latitude": 58.0417, "longitude": -5.2069}
      }
    ]"#;

    #[test]
    fn test_import_creates_pulled_spots() {
        let store = Store::open_in_memory().unwrap();
        let result = store
            .import_scraped_metadata(FLICKR_METADATA, Duration::days(7))
            .unwrap();
        assert_eq!(
            result,
            ImportResult {
                imported: 2,
                updated: 0,
                skipped: 1
            }
        );

        let spots = store.list_spots(&SpotQuery::new().tag("lake")).unwrap();
        assert_eq!(spots.len(), 1);
        let spot = &spots[0];
        assert_eq!(spot.title, "Moraine Lake at first light");
        assert_eq!(spot.tags, vec!["sunrise", "lake"]);
        assert_eq!(spot.creator_id, "Alpine Light");
        assert_eq!(spot.privacy, Privacy::Public);
        assert_eq!(spot.sync.server_id.as_deref(), Some("flickr:53012345678"));
        assert!(!spot.sync.is_local_only);

        assert_eq!(spot.media.len(), 1);
        let photo = &spot.media[0];
        assert_eq!(
            photo.url,
            "https://live.staticflickr.com/65535/53012345678_abcd_o.jpg"
        );
        assert_eq!(
            photo.capture_time,
            Some(time::macros::datetime!(2023-07-14 05:21:09 UTC))
        );

        let geograph = store.list_spots(&SpotQuery::new().creator("J Smith")).unwrap();
        assert_eq!(geograph.len(), 1);
        assert_eq!(geograph[0].sync.server_id.as_deref(), Some("geograph:7712345"));
    }

    #[test]
    fn test_reimport_updates_in_place() {
        let store = Store::open_in_memory().unwrap();
        store
            .import_scraped_metadata(FLICKR_METADATA, Duration::days(7))
            .unwrap();
        let result = store
            .import_scraped_metadata(FLICKR_METADATA, Duration::days(7))
            .unwrap();
        assert_eq!(result.imported, 0);
        assert_eq!(result.updated, 2);
        assert_eq!(store.count_spots(&SpotQuery::new()).unwrap(), 2);

        let spots = store.list_spots(&SpotQuery::new()).unwrap();
        assert!(spots.iter().all(|s| s.media.len() == 1));
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .import_scraped_metadata("{\"not\": \"an array\"}", Duration::days(1))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }

    #[test]
    fn test_parse_date_taken_formats() {
        assert!(parse_date_taken("2023-07-14T05:21:09Z").is_some());
        assert!(parse_date_taken("2023-07-14 05:21:09").is_some());
        assert!(parse_date_taken("July 14, 2023").is_none());
    }
}
