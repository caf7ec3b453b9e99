use geojson::GeoJson;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::from_slice;
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::error::{AtlasError, Result};
use crate::interaction::normalize_name;

const LISTING_FILE: &str = "communities.json";
const DETAIL_DIR: &str = "communities";
const OUTLINE_FILE: &str = "outline.geojson";

/// Geographic position of a community.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// One community as listed in the static data files.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CommunityRecord {
    pub id: String,
    pub name: String,
    pub province: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Set when the record was loaded through [`CommunityStore::find_by_slug`].
    #[serde(default, skip_deserializing)]
    pub slug: Option<String>,
}

impl CommunityRecord {
    /// Identifier the detail pages are keyed by.
    pub fn slug(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Read-only access to the static community data:
/// a listing file plus one detail file per slug.
pub struct CommunityStore {
    base: PathBuf,
    communities: Vec<CommunityRecord>,
}

impl CommunityStore {
    pub fn open<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let path = base.join(LISTING_FILE);
        let data = fs::read(&path).map_err(|e| AtlasError::io(&path, e))?;
        let communities: Vec<CommunityRecord> =
            from_slice(&data).map_err(|e| AtlasError::json(&path, e))?;

        let unplaced = communities.iter().filter(|c| c.location.is_none()).count();
        info!(
            "event=communities_loaded count={} without_location={} dir={}",
            communities.len(),
            unplaced,
            base.display()
        );
        Ok(Self { base, communities })
    }

    pub fn communities(&self) -> &[CommunityRecord] {
        &self.communities
    }

    /// Country outline drawn beneath the markers.
    pub fn load_outline(&self) -> Result<GeoJson> {
        let path = self.base.join(OUTLINE_FILE);
        let txt = fs::read_to_string(&path).map_err(|e| AtlasError::io(&path, e))?;
        Ok(GeoJson::from_str(&txt)?)
    }

    /// Loads the detail record stored under `slug`.
    ///
    /// Absent data is not an error: empty or malformed slugs, missing files
    /// and unreadable files all yield `None`.
    pub fn find_by_slug(&self, slug: &str) -> Option<CommunityRecord> {
        if slug.is_empty() {
            error!("event=detail_lookup status=rejected reason=empty_slug");
            return None;
        }
        if normalize_name(slug) != slug {
            warn!("event=detail_lookup status=rejected reason=not_normalized slug={slug:?}");
            return None;
        }

        let path = self.base.join(DETAIL_DIR).join(format!("{slug}.json"));
        if !path.is_file() {
            error!("event=detail_lookup status=missing slug={slug} path={}", path.display());
            return None;
        }

        let mut community = match fs::read(&path)
            .map_err(|e| AtlasError::io(&path, e))
            .and_then(|b| from_slice::<CommunityRecord>(&b).map_err(|e| AtlasError::json(&path, e)))
        {
            Ok(c) => c,
            Err(err) => {
                error!("event=detail_lookup status=failed slug={slug} error={err}");
                return None;
            }
        };
        community.slug = Some(slug.to_string());
        Some(community)
    }
}
