//! Output formatting for text and JSON output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use spotlens_media::{CacheStats, EvictionReport, MetricsSnapshot};
use spotlens_store::{DeleteSummary, ImportResult};
use spotlens_types::{AssetId, CacheKey, Spot, SpotStatus};
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            compact: false,
        }
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    fn title(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.bold().to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.dimmed().to_string()
        }
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        if self.no_color {
            table.with(Style::blank());
        } else {
            table.with(Style::rounded());
        }
        table.to_string()
    }
}

/// Human-readable byte count (binary units).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn format_time(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| time.unix_timestamp().to_string())
}

/// Colored status label.
pub fn format_status(status: SpotStatus, no_color: bool) -> String {
    let label = status.as_str();
    if no_color {
        return label.to_string();
    }
    match status {
        SpotStatus::Active => label.green().to_string(),
        SpotStatus::Draft => label.cyan().to_string(),
        SpotStatus::PendingReview => label.yellow().to_string(),
        SpotStatus::Archived => label.dimmed().to_string(),
    }
}

fn sync_label(spot: &Spot) -> String {
    match (&spot.sync.server_id, spot.sync.is_local_only) {
        (_, true) => "local".to_string(),
        (Some(id), false) => format!("synced ({})", id),
        (None, false) => "synced".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// One row of `normalize` output.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedIdentifier {
    pub identifier: String,
    pub kind: &'static str,
    pub key: CacheKey,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_url: Option<String>,
}

impl NormalizedIdentifier {
    pub fn new(identifier: &str) -> Self {
        let id = AssetId::parse(identifier);
        let key = id.cache_key();
        let kind = match &id {
            AssetId::Local(_) => "local",
            AssetId::Legacy { .. } => "legacy",
            AssetId::Remote(_) => "remote",
        };
        Self {
            identifier: identifier.to_string(),
            kind,
            file_name: key.file_name(),
            fetch_url: id.remote_url().map(str::to_string),
            key,
        }
    }
}

pub fn format_normalized_text(rows: &[NormalizedIdentifier], opts: &FormatOptions) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Identifier", "Kind", "Cache key"]);
    for row in rows {
        builder.push_record([row.identifier.as_str(), row.kind, row.key.as_str()]);
    }
    format!("{}\n", opts.table(builder))
}

// ---------------------------------------------------------------------------
// Spots
// ---------------------------------------------------------------------------

pub fn format_spot_list_text(spots: &[Spot], total: u64, opts: &FormatOptions) -> String {
    if spots.is_empty() {
        return "No spots found.\n".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["Id", "Title", "Status", "Privacy", "Location", "Media", "Sync"]);
    for spot in spots {
        builder.push_record([
            spot.id.to_string(),
            spot.title.clone(),
            format_status(spot.status, opts.no_color),
            spot.privacy.to_string(),
            spot.location.to_string(),
            spot.media.len().to_string(),
            sync_label(spot),
        ]);
    }

    let mut output = format!(
        "{}\n{}\n",
        opts.title(&format!("Spots ({} of {})", spots.len(), total)),
        opts.table(builder)
    );
    if (spots.len() as u64) < total {
        output.push_str(&opts.dim("Use --limit and --offset to page through results.\n"));
    }
    output
}

pub fn format_spot_detail_text(spot: &Spot, opts: &FormatOptions) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Property", "Value"]);
    builder.push_record(["Id".to_string(), spot.id.to_string()]);
    if let Some(description) = &spot.description {
        builder.push_record(["Description".to_string(), description.clone()]);
    }
    builder.push_record(["Location".to_string(), spot.location.to_string()]);
    if let Some(elevation) = spot.elevation_m {
        builder.push_record(["Elevation".to_string(), format!("{:.0} m", elevation)]);
    }
    if let Some(heading) = spot.heading {
        builder.push_record(["Heading".to_string(), format!("{:.0}°", heading)]);
    }
    builder.push_record(["Difficulty".to_string(), spot.difficulty.to_string()]);
    builder.push_record([
        "Status".to_string(),
        format_status(spot.status, opts.no_color),
    ]);
    builder.push_record(["Privacy".to_string(), spot.privacy.to_string()]);
    builder.push_record(["Creator".to_string(), spot.creator_id.clone()]);
    if !spot.license.is_empty() {
        builder.push_record(["License".to_string(), spot.license.clone()]);
    }
    if !spot.tags.is_empty() {
        builder.push_record(["Tags".to_string(), spot.tags.join(", ")]);
    }
    builder.push_record(["Votes".to_string(), spot.vote_count.to_string()]);
    builder.push_record(["Created".to_string(), format_time(spot.created_at)]);
    builder.push_record(["Updated".to_string(), format_time(spot.updated_at)]);
    builder.push_record(["Sync".to_string(), sync_label(spot)]);
    if let Some(expiry) = spot.sync.cache_expiry {
        builder.push_record(["Cache expiry".to_string(), format_time(expiry)]);
    }
    if let Some(access) = &spot.access {
        if let Some(parking) = access.parking {
            builder.push_record(["Parking".to_string(), parking.to_string()]);
        }
        if let Some(fee) = &access.fee {
            builder.push_record(["Fee".to_string(), fee.clone()]);
        }
        if access.requires_permit {
            builder.push_record(["Permit".to_string(), "required".to_string()]);
        }
        if let Some(minutes) = access.hike_minutes {
            builder.push_record(["Hike".to_string(), format!("{} min", minutes)]);
        }
    }

    let mut output = format!("{}\n{}\n", opts.title(&spot.title), opts.table(builder));

    if !spot.media.is_empty() {
        output.push_str(&format!("\n{}\n", opts.title("Media")));
        for media in &spot.media {
            let key = spotlens_types::normalize(&media.url);
            output.push_str(&format!(
                "  {} {} {}\n",
                media.media_type,
                media.url,
                opts.dim(&format!("(cache key {})", key))
            ));
        }
    }

    if !spot.comments.is_empty() {
        output.push_str(&format!("\n{}\n", opts.title("Comments")));
        for comment in &spot.comments {
            let indent = if comment.parent_id.is_some() { "    " } else { "  " };
            output.push_str(&format!(
                "{}{}: {}\n",
                indent, comment.user_id, comment.body
            ));
        }
    }

    output
}

pub fn format_delete_text(spot: &Spot, summary: &DeleteSummary) -> String {
    let mut output = format!("Deleted spot '{}' ({})\n", spot.title, spot.id);
    output.push_str(&format!(
        "  Removed {} comment(s), {} snapshot(s), {} access record(s)\n",
        summary.comments, summary.snapshots, summary.access_info
    ));
    if summary.orphaned_media > 0 {
        output.push_str(&format!(
            "  Kept {} media item(s) as unattached media\n",
            summary.orphaned_media
        ));
    }
    output
}

pub fn format_import_text(result: &ImportResult) -> String {
    format!(
        "Import complete:\n  Imported: {}\n  Updated: {}\n  Skipped (no coordinates): {}\n",
        result.imported, result.updated, result.skipped
    )
}

#[derive(Serialize)]
struct ImportJson {
    imported: usize,
    updated: usize,
    skipped: usize,
}

pub fn format_import_json(result: &ImportResult, opts: &FormatOptions) -> Result<String> {
    opts.as_json(&ImportJson {
        imported: result.imported,
        updated: result.updated,
        skipped: result.skipped,
    })
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

pub fn format_cache_stats_text(stats: &CacheStats, opts: &FormatOptions) -> String {
    let limit = |value: Option<String>| value.unwrap_or_else(|| "unbounded".to_string());

    let mut builder = Builder::default();
    builder.push_record(["Property", "Value"]);
    builder.push_record(["Directory".to_string(), stats.dir.display().to_string()]);
    builder.push_record([
        "Entries".to_string(),
        format!(
            "{} / {}",
            stats.entries,
            limit(stats.max_entries.map(|n| n.to_string()))
        ),
    ]);
    builder.push_record([
        "Size".to_string(),
        format!(
            "{} / {}",
            format_bytes(stats.total_bytes),
            limit(stats.max_bytes.map(format_bytes))
        ),
    ]);
    builder.push_record([
        "Oldest access".to_string(),
        stats
            .oldest_access
            .map(format_time)
            .unwrap_or_else(|| "-".to_string()),
    ]);

    format!("{}\n{}\n", opts.title("Media Cache"), opts.table(builder))
}

pub fn format_eviction_text(report: &EvictionReport) -> String {
    if report.removed == 0 {
        "Cache is within bounds; nothing evicted.\n".to_string()
    } else {
        format!(
            "Evicted {} entr{} ({})\n",
            report.removed,
            if report.removed == 1 { "y" } else { "ies" },
            format_bytes(report.freed_bytes)
        )
    }
}

pub fn format_metrics_text(metrics: &MetricsSnapshot, opts: &FormatOptions) -> String {
    let hit_rate = metrics
        .hit_rate()
        .map(|r| format!("{:.0}%", r * 100.0))
        .unwrap_or_else(|| "-".to_string());
    opts.dim(&format!(
        "hits {} | misses {} | fetches {} | coalesced {} | failures {} | hit rate {}\n",
        metrics.hits,
        metrics.misses,
        metrics.fetches,
        metrics.coalesced,
        metrics.failures,
        hit_rate
    ))
}
