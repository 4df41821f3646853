//! Spots command - query and manage the local spot store.

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use serde::Serialize;
use spotlens_store::{SpotQuery, Store};
use spotlens_types::Spot;
use time::OffsetDateTime;
use uuid::Uuid;

use super::Context;
use crate::cli::{SpotFilterArgs, SpotsAction};
use crate::format::{
    format_delete_text, format_import_json, format_import_text, format_spot_detail_text,
    format_spot_list_text,
};

/// Execute the spots command.
pub fn cmd_spots(action: SpotsAction, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    print!("{}", run(action, &store, ctx)?);
    Ok(())
}

fn run(action: SpotsAction, store: &Store, ctx: &Context) -> Result<String> {
    match action {
        SpotsAction::List { filter } => list_spots(store, &filter, ctx),
        SpotsAction::Show { id } => show_spot(store, id, ctx),
        SpotsAction::Delete { id } => delete_spot(store, id, ctx),
        SpotsAction::Publish { id, server_id } => {
            if server_id.trim().is_empty() {
                bail!("Server id must not be empty");
            }
            let spot = store.mark_published(id, &server_id)?;
            if ctx.is_json() {
                ctx.opts.as_json(&spot)
            } else {
                Ok(format!("Published '{}' as {}\n", spot.title, server_id))
            }
        }
        SpotsAction::Pending => {
            let spots = store.pending_publish()?;
            render_list(&spots, spots.len() as u64, ctx)
        }
        SpotsAction::Stale => {
            let spots = store.stale_spots(OffsetDateTime::now_utc())?;
            render_list(&spots, spots.len() as u64, ctx)
        }
        SpotsAction::Unattached => {
            let media = store.list_unattached_media()?;
            if ctx.is_json() {
                return ctx.opts.as_json(&media);
            }
            if media.is_empty() {
                return Ok("No unattached media.\n".to_string());
            }
            Ok(media
                .iter()
                .map(|m| format!("{} {} {}\n", m.id, m.media_type, m.url))
                .collect())
        }
        SpotsAction::Import { input, ttl_days } => import(store, &input, ttl_days, ctx),
    }
}

fn build_query(filter: &SpotFilterArgs) -> SpotQuery {
    let mut query = SpotQuery::new();
    if let Some(creator) = &filter.creator {
        query = query.creator(creator);
    }
    if let Some(status) = filter.status {
        query = query.status(status);
    }
    if let Some(privacy) = filter.privacy {
        query = query.privacy(privacy);
    }
    if let Some(tag) = &filter.tag {
        query = query.tag(tag);
    }
    if filter.local_only {
        query = query.local_only(true);
    } else if filter.synced {
        query = query.local_only(false);
    }
    if filter.oldest_first {
        query = query.oldest_first();
    }
    query
}

fn list_spots(store: &Store, filter: &SpotFilterArgs, ctx: &Context) -> Result<String> {
    let query = build_query(filter);
    let total = store.count_spots(&query)?;

    let mut page = query;
    if filter.limit > 0 {
        page = page.limit(filter.limit);
    }
    if filter.offset > 0 {
        page = page.offset(filter.offset);
    }
    let spots = store.list_spots(&page)?;
    render_list(&spots, total, ctx)
}

fn render_list(spots: &[Spot], total: u64, ctx: &Context) -> Result<String> {
    if ctx.is_json() {
        ctx.opts.as_json(&spots)
    } else {
        Ok(format_spot_list_text(spots, total, &ctx.opts))
    }
}

fn show_spot(store: &Store, id: Uuid, ctx: &Context) -> Result<String> {
    let Some(spot) = store.get_spot(id)? else {
        bail!("Spot not found: {}", id);
    };
    if ctx.is_json() {
        ctx.opts.as_json(&spot)
    } else {
        Ok(format_spot_detail_text(&spot, &ctx.opts))
    }
}

#[derive(Serialize)]
struct DeleteJson {
    id: Uuid,
    comments: usize,
    snapshots: usize,
    access_info: usize,
    orphaned_media: usize,
}

fn delete_spot(store: &Store, id: Uuid, ctx: &Context) -> Result<String> {
    let Some(spot) = store.get_spot(id)? else {
        bail!("Spot not found: {}", id);
    };
    let summary = store.delete_spot(id)?;

    if ctx.is_json() {
        ctx.opts.as_json(&DeleteJson {
            id,
            comments: summary.comments,
            snapshots: summary.snapshots,
            access_info: summary.access_info,
            orphaned_media: summary.orphaned_media,
        })
    } else {
        Ok(format_delete_text(&spot, &summary))
    }
}

fn import(store: &Store, input: &Path, ttl_days: Option<u32>, ctx: &Context) -> Result<String> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read file: {}", input.display()))?;
    let ttl = match ttl_days {
        Some(0) => bail!("--ttl-days must be at least 1"),
        Some(days) => time::Duration::days(i64::from(days)),
        None => ctx.config.pull_ttl(),
    };
    let result = store
        .import_scraped_metadata(&json, ttl)
        .with_context(|| format!("Failed to import {}", input.display()))?;

    if ctx.is_json() {
        format_import_json(&result, &ctx.opts)
    } else {
        Ok(format_import_text(&result))
    }
}
