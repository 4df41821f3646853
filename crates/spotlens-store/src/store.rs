//! Main store implementation.

use std::path::Path;

use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use spotlens_types::{
    AccessInfo, CaptureMetadata, Comment, Media, Spot, SunSnapshot, SyncState, WeatherSnapshot,
};

use crate::codec::SentinelCodec;
use crate::error::{Error, Result};
use crate::queries::SpotQuery;
use crate::records::{
    AccessInfoRecord, CommentRecord, MediaRecord, SpotRecord, StoredRecord, SunSnapshotRecord,
    WeatherSnapshotRecord,
};
use crate::schema;
use crate::sentinel::decode_required_uuid;

/// SQLite-based store for spots and their children.
///
/// Every entity is persisted through its flat record and the
/// [`SentinelCodec`]; callers only ever see domain types.
pub struct Store {
    conn: Connection,
}

/// What [`Store::delete_spot`] removed or detached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub comments: usize,
    /// Sun and weather snapshots.
    pub snapshots: usize,
    pub access_info: usize,
    /// Media whose owning spot was cleared. They are kept, not deleted.
    pub orphaned_media: usize,
}

/// Result of [`Store::upsert_pulled_spot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// No local spot carried this server id.
    Inserted(Uuid),
    /// An existing spot was refreshed in place; its local id is returned.
    Updated(Uuid),
}

impl PullOutcome {
    /// Local id of the stored spot.
    pub fn local_id(&self) -> Uuid {
        match self {
            PullOutcome::Inserted(id) | PullOutcome::Updated(id) => *id,
        }
    }
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }
}

// Spot operations
impl Store {
    /// Insert a new spot together with any children it carries.
    ///
    /// Children are re-parented onto `spot.id`.
    pub fn create_spot(&self, spot: &Spot) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        if spot_exists(&tx, spot.id)? {
            return Err(Error::AlreadyExists {
                kind: "Spot",
                id: spot.id,
            });
        }
        insert_record(&tx, &SpotRecord::encode(spot))?;
        write_children(&tx, spot)?;
        tx.commit()?;

        info!("Created spot {} ({})", spot.id, spot.title);
        Ok(())
    }

    /// Overwrite a spot's own fields. Children are left untouched.
    pub fn update_spot(&self, spot: &Spot) -> Result<()> {
        let mut record = fetch_one::<SpotRecord>(&self.conn, &spot.id.to_string())?
            .ok_or(Error::SpotNotFound(spot.id))?;
        record.encode_into(spot);
        update_record(&self.conn, &record)?;
        debug!("Updated spot {}", spot.id);
        Ok(())
    }

    /// Get a spot with all of its children.
    pub fn get_spot(&self, id: Uuid) -> Result<Option<Spot>> {
        let Some(record) = fetch_one::<SpotRecord>(&self.conn, &id.to_string())? else {
            return Ok(None);
        };
        let mut spot = record.decode();
        load_children(&self.conn, &mut spot)?;
        Ok(Some(spot))
    }

    /// List spots matching a query, children included.
    pub fn list_spots(&self, query: &SpotQuery) -> Result<Vec<Spot>> {
        let sql = query.build_sql(&column_list::<SpotRecord>());
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_ref.as_slice(), SpotRecord::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut spots = Vec::with_capacity(records.len());
        for record in records {
            let mut spot = record.decode();
            load_children(&self.conn, &mut spot)?;
            spots.push(spot);
        }
        Ok(spots)
    }

    /// Count spots matching a query's filters.
    pub fn count_spots(&self, query: &SpotQuery) -> Result<u64> {
        let sql = query.build_count_sql();
        let (_, params) = query.build_where();
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = self
            .conn
            .query_row(&sql, params_ref.as_slice(), |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete a spot.
    ///
    /// Comments, snapshots and access info go with it. Media are detached
    /// and kept so the user's photos survive.
    pub fn delete_spot(&self, id: Uuid) -> Result<DeleteSummary> {
        let tx = self.conn.unchecked_transaction()?;
        if !spot_exists(&tx, id)? {
            return Err(Error::SpotNotFound(id));
        }
        let id_text = id.to_string();

        let comments = tx.execute("DELETE FROM comments WHERE spot_id = ?1", [&id_text])?;
        let sun = tx.execute("DELETE FROM sun_snapshots WHERE spot_id = ?1", [&id_text])?;
        let weather = tx.execute("DELETE FROM weather_snapshots WHERE spot_id = ?1", [&id_text])?;
        let access_info = tx.execute("DELETE FROM access_info WHERE spot_id = ?1", [&id_text])?;
        let orphaned_media =
            tx.execute("UPDATE media SET spot_id = '' WHERE spot_id = ?1", [&id_text])?;
        tx.execute("DELETE FROM spots WHERE id = ?1", [&id_text])?;
        tx.commit()?;

        let summary = DeleteSummary {
            comments,
            snapshots: sun + weather,
            access_info,
            orphaned_media,
        };
        info!("Deleted spot {}: {:?}", id, summary);
        Ok(summary)
    }
}

// Media operations
impl Store {
    /// Insert or update a media item.
    ///
    /// If it names an owning spot, that spot must exist.
    pub fn upsert_media(&self, media: &Media) -> Result<()> {
        upsert_media_in(&self.conn, media)
    }

    pub fn get_media(&self, id: Uuid) -> Result<Option<Media>> {
        Ok(fetch_one::<MediaRecord>(&self.conn, &id.to_string())?.map(|r| r.decode()))
    }

    /// Media attached to a spot, oldest first.
    pub fn list_media_for_spot(&self, spot_id: Uuid) -> Result<Vec<Media>> {
        let records: Vec<MediaRecord> = fetch_where(
            &self.conn,
            "WHERE spot_id = ?1 ORDER BY created_at, id",
            &[&spot_id.to_string()],
        )?;
        Ok(records.iter().map(SentinelCodec::decode).collect())
    }

    /// Media not attached to any spot, including those orphaned by a delete.
    pub fn list_unattached_media(&self) -> Result<Vec<Media>> {
        let records: Vec<MediaRecord> =
            fetch_where(&self.conn, "WHERE spot_id = '' ORDER BY created_at, id", &[])?;
        Ok(records.iter().map(SentinelCodec::decode).collect())
    }

    /// Merge extractor metadata into a stored media item.
    pub fn attach_capture_metadata(
        &self,
        media_id: Uuid,
        metadata: &CaptureMetadata,
    ) -> Result<Media> {
        let mut record = fetch_one::<MediaRecord>(&self.conn, &media_id.to_string())?
            .ok_or(Error::MediaNotFound(media_id))?;
        record.encode_capture(metadata);
        update_record(&self.conn, &record)?;
        Ok(record.decode())
    }

    /// Delete a media item. Returns whether it existed.
    pub fn delete_media(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM media WHERE id = ?1", [id.to_string()])?;
        Ok(rows > 0)
    }
}

// Snapshot and access operations
impl Store {
    /// Store the current sun snapshot for its spot, replacing any other.
    pub fn set_sun_snapshot(&self, snapshot: &SunSnapshot) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_spot(&tx, snapshot.spot_id)?;
        replace_current::<SunSnapshotRecord>(&tx, snapshot, snapshot.id, snapshot.spot_id)?;
        tx.commit()?;
        Ok(())
    }

    pub fn sun_snapshot(&self, spot_id: Uuid) -> Result<Option<SunSnapshot>> {
        current::<SunSnapshotRecord>(&self.conn, spot_id)
    }

    /// Store the current weather snapshot for its spot, replacing any other.
    pub fn set_weather_snapshot(&self, snapshot: &WeatherSnapshot) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_spot(&tx, snapshot.spot_id)?;
        replace_current::<WeatherSnapshotRecord>(&tx, snapshot, snapshot.id, snapshot.spot_id)?;
        tx.commit()?;
        Ok(())
    }

    pub fn weather_snapshot(&self, spot_id: Uuid) -> Result<Option<WeatherSnapshot>> {
        current::<WeatherSnapshotRecord>(&self.conn, spot_id)
    }

    /// Store access info for its spot, replacing any other.
    pub fn set_access_info(&self, access: &AccessInfo) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_spot(&tx, access.spot_id)?;
        replace_current::<AccessInfoRecord>(&tx, access, access.id, access.spot_id)?;
        tx.commit()?;
        Ok(())
    }

    pub fn access_info(&self, spot_id: Uuid) -> Result<Option<AccessInfo>> {
        current::<AccessInfoRecord>(&self.conn, spot_id)
    }
}

// Comment operations
impl Store {
    pub fn add_comment(&self, comment: &Comment) -> Result<()> {
        ensure_spot(&self.conn, comment.spot_id)?;
        if fetch_one::<CommentRecord>(&self.conn, &comment.id.to_string())?.is_some() {
            return Err(Error::AlreadyExists {
                kind: "Comment",
                id: comment.id,
            });
        }
        insert_record(&self.conn, &CommentRecord::encode(comment))
    }

    /// Comments on a spot, oldest first.
    pub fn list_comments(&self, spot_id: Uuid) -> Result<Vec<Comment>> {
        let records: Vec<CommentRecord> = fetch_where(
            &self.conn,
            "WHERE spot_id = ?1 ORDER BY created_at, id",
            &[&spot_id.to_string()],
        )?;
        Ok(records.iter().map(SentinelCodec::decode).collect())
    }

    /// Delete a comment. Replies to it become top-level comments.
    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let id_text = id.to_string();
        tx.execute(
            "UPDATE comments SET parent_id = '' WHERE parent_id = ?1",
            [&id_text],
        )?;
        let rows = tx.execute("DELETE FROM comments WHERE id = ?1", [&id_text])?;
        tx.commit()?;
        Ok(rows > 0)
    }
}

// Sync operations
impl Store {
    /// Record a successful publish of a local spot.
    pub fn mark_published(&self, id: Uuid, server_id: &str) -> Result<Spot> {
        let mut record = fetch_one::<SpotRecord>(&self.conn, &id.to_string())?
            .ok_or(Error::SpotNotFound(id))?;
        let mut spot = record.decode();
        spot.sync.mark_published(server_id, OffsetDateTime::now_utc());
        record.encode_into(&spot);
        update_record(&self.conn, &record)?;

        info!("Published spot {} as {}", id, server_id);
        load_children(&self.conn, &mut spot)?;
        Ok(spot)
    }

    /// Store a spot pulled from the backend.
    ///
    /// A local spot with the same server id is refreshed in place and keeps
    /// its local id; its children are re-parented onto that id. The stored
    /// sync state expires `ttl` from now.
    pub fn upsert_pulled_spot(&self, spot: &Spot, ttl: Duration) -> Result<PullOutcome> {
        let server_id = spot
            .sync
            .server_id
            .clone()
            .ok_or(Error::MissingServerId(spot.id))?;
        let now = OffsetDateTime::now_utc();

        let mut incoming = spot.clone();
        incoming.sync = SyncState::pulled(server_id.as_str(), now, ttl);

        let tx = self.conn.unchecked_transaction()?;
        let existing: Option<SpotRecord> =
            fetch_where(&tx, "WHERE server_id = ?1", &[&server_id])?
                .into_iter()
                .next();

        let outcome = match existing {
            Some(mut record) => {
                incoming.id = decode_required_uuid(&record.id);
                record.encode_into(&incoming);
                update_record(&tx, &record)?;
                PullOutcome::Updated(incoming.id)
            }
            None => {
                if spot_exists(&tx, incoming.id)? {
                    return Err(Error::AlreadyExists {
                        kind: "Spot",
                        id: incoming.id,
                    });
                }
                insert_record(&tx, &SpotRecord::encode(&incoming))?;
                PullOutcome::Inserted(incoming.id)
            }
        };
        write_children(&tx, &incoming)?;
        tx.commit()?;

        debug!("Pulled {} -> {:?}", server_id, outcome);
        Ok(outcome)
    }

    /// Local-only spots waiting to be published, oldest first.
    pub fn pending_publish(&self) -> Result<Vec<Spot>> {
        self.list_spots(&SpotQuery::new().local_only(true).oldest_first())
    }

    /// Synced spots whose cache expiry has passed at `now`.
    pub fn stale_spots(&self, now: OffsetDateTime) -> Result<Vec<Spot>> {
        let synced = self.list_spots(&SpotQuery::new().local_only(false))?;
        Ok(synced
            .into_iter()
            .filter(|spot| spot.sync.is_stale(now))
            .collect())
    }
}

fn column_list<R: StoredRecord>() -> String {
    R::COLUMNS.join(", ")
}

fn insert_record<R: StoredRecord>(conn: &Connection, record: &R) -> Result<()> {
    let placeholders = (1..=R::COLUMNS.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::TABLE,
        column_list::<R>(),
        placeholders
    );
    conn.execute(&sql, record.values().as_slice())?;
    Ok(())
}

/// Update every column but `id`, matching on `id`.
fn update_record<R: StoredRecord>(conn: &Connection, record: &R) -> Result<bool> {
    let assignments = R::COLUMNS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, column)| format!("{} = ?{}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {} WHERE id = ?1", R::TABLE, assignments);
    let rows = conn.execute(&sql, record.values().as_slice())?;
    Ok(rows > 0)
}

fn fetch_one<R: StoredRecord>(conn: &Connection, id: &str) -> Result<Option<R>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", column_list::<R>(), R::TABLE);
    let record = conn.query_row(&sql, [id], R::from_row).optional()?;
    Ok(record)
}

fn fetch_where<R: StoredRecord>(
    conn: &Connection,
    clause: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<R>> {
    let sql = format!("SELECT {} FROM {} {}", column_list::<R>(), R::TABLE, clause);
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params, R::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

fn spot_exists(conn: &Connection, id: Uuid) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM spots WHERE id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn ensure_spot(conn: &Connection, id: Uuid) -> Result<()> {
    if spot_exists(conn, id)? {
        Ok(())
    } else {
        Err(Error::SpotNotFound(id))
    }
}

fn upsert_media_in(conn: &Connection, media: &Media) -> Result<()> {
    if let Some(spot_id) = media.spot_id {
        ensure_spot(conn, spot_id)?;
    }
    match fetch_one::<MediaRecord>(conn, &media.id.to_string())? {
        Some(mut record) => {
            record.encode_into(media);
            update_record(conn, &record)?;
        }
        None => insert_record(conn, &MediaRecord::encode(media))?,
    }
    Ok(())
}

fn upsert_comment_in(conn: &Connection, comment: &Comment) -> Result<()> {
    match fetch_one::<CommentRecord>(conn, &comment.id.to_string())? {
        Some(mut record) => {
            record.encode_into(comment);
            update_record(conn, &record)?;
        }
        None => insert_record(conn, &CommentRecord::encode(comment))?,
    }
    Ok(())
}

/// Make `value` the only record of its kind for `spot_id`.
///
/// A record with the same id is updated in place; any other record for the
/// spot is removed.
fn replace_current<R>(conn: &Connection, value: &R::Domain, id: Uuid, spot_id: Uuid) -> Result<()>
where
    R: StoredRecord + SentinelCodec,
{
    let id_text = id.to_string();
    conn.execute(
        &format!("DELETE FROM {} WHERE spot_id = ?1 AND id <> ?2", R::TABLE),
        [spot_id.to_string(), id_text.clone()],
    )?;
    match fetch_one::<R>(conn, &id_text)? {
        Some(mut record) => {
            record.encode_into(value);
            update_record(conn, &record)?;
        }
        None => insert_record(conn, &R::encode(value))?,
    }
    Ok(())
}

fn current<R>(conn: &Connection, spot_id: Uuid) -> Result<Option<R::Domain>>
where
    R: StoredRecord + SentinelCodec,
{
    let records: Vec<R> = fetch_where(conn, "WHERE spot_id = ?1", &[&spot_id.to_string()])?;
    Ok(records.first().map(SentinelCodec::decode))
}

/// Persist a spot's children, re-parented onto the spot.
fn write_children(conn: &Connection, spot: &Spot) -> Result<()> {
    for media in &spot.media {
        let mut media = media.clone();
        media.spot_id = Some(spot.id);
        upsert_media_in(conn, &media)?;
    }
    if let Some(sun) = &spot.sun {
        let mut sun = sun.clone();
        sun.spot_id = spot.id;
        replace_current::<SunSnapshotRecord>(conn, &sun, sun.id, spot.id)?;
    }
    if let Some(weather) = &spot.weather {
        let mut weather = weather.clone();
        weather.spot_id = spot.id;
        replace_current::<WeatherSnapshotRecord>(conn, &weather, weather.id, spot.id)?;
    }
    if let Some(access) = &spot.access {
        let mut access = access.clone();
        access.spot_id = spot.id;
        replace_current::<AccessInfoRecord>(conn, &access, access.id, spot.id)?;
    }
    for comment in &spot.comments {
        let mut comment = comment.clone();
        comment.spot_id = spot.id;
        upsert_comment_in(conn, &comment)?;
    }
    Ok(())
}

fn load_children(conn: &Connection, spot: &mut Spot) -> Result<()> {
    let id_text = spot.id.to_string();
    let media: Vec<MediaRecord> =
        fetch_where(conn, "WHERE spot_id = ?1 ORDER BY created_at, id", &[&id_text])?;
    let comments: Vec<CommentRecord> =
        fetch_where(conn, "WHERE spot_id = ?1 ORDER BY created_at, id", &[&id_text])?;

    spot.media = media.iter().map(SentinelCodec::decode).collect();
    spot.comments = comments.iter().map(SentinelCodec::decode).collect();
    spot.sun = current::<SunSnapshotRecord>(conn, spot.id)?;
    spot.weather = current::<WeatherSnapshotRecord>(conn, spot.id)?;
    spot.access = current::<AccessInfoRecord>(conn, spot.id)?;
    Ok(())
}
