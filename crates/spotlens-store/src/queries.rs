//! Query builder for spots.
//!
//! # Example
//!
//! ```
//! use spotlens_store::{SpotQuery, Store};
//! use spotlens_types::SpotStatus;
//!
//! let store = Store::open_in_memory()?;
//!
//! let query = SpotQuery::new()
//!     .creator("user-1")
//!     .status(SpotStatus::Active)
//!     .tag("sunrise")
//!     .limit(20);
//!
//! let spots = store.list_spots(&query)?;
//! # Ok::<(), spotlens_store::Error>(())
//! ```

use spotlens_types::{Privacy, SpotStatus};

/// Tags are a JSON array of strings, or empty text for none. Anything that
/// is not a valid array matches nothing, mirroring `decode_list`.
const TAG_CONDITION: &str = "EXISTS (SELECT 1 FROM json_each(\
     CASE WHEN json_valid(spots.tags) THEN \
     CASE WHEN json_type(spots.tags) = 'array' THEN spots.tags END END) \
     WHERE json_each.type = 'text' AND json_each.value = ?)";

/// Fluent query builder for [`Store::list_spots`](crate::Store::list_spots)
/// and [`Store::count_spots`](crate::Store::count_spots).
///
/// All filters are optional and combine with AND. By default results are
/// ordered by `created_at` descending (newest first).
#[derive(Debug, Default, Clone)]
pub struct SpotQuery {
    /// Filter by creator.
    pub creator_id: Option<String>,
    pub status: Option<SpotStatus>,
    pub privacy: Option<Privacy>,
    /// `Some(true)` for unpublished spots only, `Some(false)` for synced ones.
    pub local_only: Option<bool>,
    /// Only spots carrying this exact tag.
    pub tag: Option<String>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
    /// Order by created_at descending (newest first).
    pub newest_first: bool,
}

impl SpotQuery {
    /// Create a new query: no filters, no limit, newest first.
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    pub fn creator(mut self, creator_id: &str) -> Self {
        self.creator_id = Some(creator_id.to_string());
        self
    }

    pub fn status(mut self, status: SpotStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = Some(privacy);
        self
    }

    /// Restrict to spots that were never published (`true`) or that have
    /// been synced with the backend (`false`).
    pub fn local_only(mut self, local_only: bool) -> Self {
        self.local_only = Some(local_only);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results. Use with `limit()` for pagination.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Order results by oldest first.
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref creator_id) = self.creator_id {
            conditions.push("creator_id = ?");
            params.push(Box::new(creator_id.clone()));
        }

        if let Some(status) = self.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(privacy) = self.privacy {
            conditions.push("privacy = ?");
            params.push(Box::new(privacy.as_str()));
        }

        if let Some(local_only) = self.local_only {
            conditions.push("is_local_only = ?");
            params.push(Box::new(local_only));
        }

        if let Some(ref tag) = self.tag {
            conditions.push(TAG_CONDITION);
            params.push(Box::new(tag.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query over the given column list.
    pub(crate) fn build_sql(&self, columns: &str) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT {} FROM spots {} ORDER BY created_at {}, id {}",
            columns, where_clause, order, order
        );

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        sql
    }

    /// Build a COUNT query; limit and offset are ignored.
    pub(crate) fn build_count_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        format!("SELECT COUNT(*) FROM spots {}", where_clause)
    }
}
