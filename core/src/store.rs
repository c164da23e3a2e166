use std::path::{Path, PathBuf};

use geo::{MapCoords, MultiPolygon};
use geojson::GeoJson;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::territory::{Territory, WaterFeature};

/// 1:50m Natural Earth states and provinces, GeoJSON build.
pub const BOUNDARIES_URL: &str = "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_50m_admin_1_states_provinces.geojson";
/// 1:50m Natural Earth lakes, GeoJSON build.
pub const LAKES_URL: &str = "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_50m_lakes.geojson";

const EARTH_RADIUS_M: f64 = 6_378_137.0;
/// Web Mercator is undefined at the poles; EPSG:3857 clamps at this latitude.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Dataset locations and filter lists for [`GeometryStore::load_with`].
///
/// The defaults reproduce the production map: U.S. plus the southern tier of
/// Canadian provinces, with the five Great Lakes drawn for context.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub boundaries_url: String,
    pub lakes_url: String,
    /// Countries whose subdivisions are kept.
    pub retained_admins: Vec<String>,
    /// Subdivision names dropped even when their country is retained.
    pub excluded_territories: Vec<String>,
    /// Lakes drawn on the map; everything else in the dataset is ignored.
    pub lake_names: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            boundaries_url: BOUNDARIES_URL.to_owned(),
            lakes_url: LAKES_URL.to_owned(),
            retained_admins: vec!["United States of America".into(), "Canada".into()],
            excluded_territories: vec![
                "Nunavut".into(),
                "Northwest Territories".into(),
                "Yukon".into(),
                "New Brunswick".into(),
                "Prince Edward Island".into(),
                "Nova Scotia".into(),
            ],
            lake_names: vec![
                "Lake Superior".into(),
                "Lake Michigan".into(),
                "Lake Huron".into(),
                "Lake Erie".into(),
                "Lake Ontario".into(),
            ],
        }
    }
}

/// Immutable, filtered, Mercator-projected boundary geometry.
///
/// Loaded once per process and shared behind an `Arc`; every render borrows
/// the same territories.
#[derive(Debug, Clone)]
pub struct GeometryStore {
    territories: Vec<Territory>,
    lakes: Vec<WaterFeature>,
}

impl GeometryStore {
    /// Load with the default Natural Earth datasets and filters.
    pub async fn load(client: &reqwest::Client, data_dir: &Path) -> Result<Self, StoreError> {
        Self::load_with(client, data_dir, &StoreConfig::default()).await
    }

    /// Fetch (or read back from `data_dir`) both datasets, then filter and
    /// reproject them. The raw downloads are cached on disk, so only the
    /// first process start pays for the network round trip.
    pub async fn load_with(
        client: &reqwest::Client,
        data_dir: &Path,
        config: &StoreConfig,
    ) -> Result<Self, StoreError> {
        let boundaries_raw = fetch_cached(client, data_dir, &config.boundaries_url).await?;
        let lakes_raw = fetch_cached(client, data_dir, &config.lakes_url).await?;

        let territories = parse_boundaries(&boundaries_raw, config)?;
        let lakes = parse_lakes(&lakes_raw, config)?;
        info!(
            "loaded {} territories and {} lakes",
            territories.len(),
            lakes.len()
        );
        Ok(Self { territories, lakes })
    }

    /// Build a store from pre-projected geometry. Used by tests and by
    /// embedders that bring their own boundary data.
    pub fn from_parts(territories: Vec<Territory>, lakes: Vec<WaterFeature>) -> Self {
        Self { territories, lakes }
    }

    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    pub fn lakes(&self) -> &[WaterFeature] {
        &self.lakes
    }

    pub fn territory(&self, name: &str) -> Option<&Territory> {
        self.territories.iter().find(|t| t.name == name)
    }
}

/// Read a dataset from the on-disk cache, downloading it first if absent.
///
/// The cache write goes through a temp file and an atomic rename so a
/// concurrent first start never observes a truncated dataset.
async fn fetch_cached(
    client: &reqwest::Client,
    data_dir: &Path,
    url: &str,
) -> Result<String, StoreError> {
    let path = cache_path(data_dir, url);
    if let Ok(cached) = tokio::fs::read_to_string(&path).await {
        debug!("using cached {}", path.display());
        return Ok(cached);
    }

    info!("downloading {url}");
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    tokio::fs::create_dir_all(data_dir).await?;
    let tmp = path.with_extension(format!("part.{}", std::process::id()));
    tokio::fs::write(&tmp, &body).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(body)
}

fn cache_path(data_dir: &Path, url: &str) -> PathBuf {
    let filename = url.rsplit('/').next().unwrap_or("dataset.geojson");
    data_dir.join(filename)
}

fn parse_boundaries(raw: &str, config: &StoreConfig) -> Result<Vec<Territory>, StoreError> {
    let mut territories = Vec::new();
    for (properties, geometry) in feature_polygons(raw)? {
        let name = string_property(&properties, "name");
        let admin = string_property(&properties, "admin");
        if !config.retained_admins.iter().any(|a| *a == admin) {
            continue;
        }
        if config.excluded_territories.iter().any(|x| *x == name) {
            continue;
        }
        territories.push(Territory {
            name,
            admin,
            geometry: to_web_mercator(&geometry),
        });
    }
    Ok(territories)
}

fn parse_lakes(raw: &str, config: &StoreConfig) -> Result<Vec<WaterFeature>, StoreError> {
    let mut lakes = Vec::new();
    for (properties, geometry) in feature_polygons(raw)? {
        let name = string_property(&properties, "name");
        if !config.lake_names.iter().any(|l| *l == name) {
            continue;
        }
        lakes.push(WaterFeature {
            name,
            geometry: to_web_mercator(&geometry),
        });
    }
    Ok(lakes)
}

/// Iterate the polygonal features of a GeoJSON document as
/// (properties, geometry) pairs. Non-area geometries are skipped.
fn feature_polygons(
    raw: &str,
) -> Result<Vec<(serde_json::Map<String, serde_json::Value>, MultiPolygon<f64>)>, StoreError> {
    let geojson: GeoJson = raw
        .parse()
        .map_err(|e: geojson::Error| StoreError::Parse(e.to_string()))?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(StoreError::Parse(
            "expected a FeatureCollection document".to_owned(),
        ));
    };

    let mut features = Vec::new();
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let Some(multi_polygon) = to_multi_polygon(geometry) else {
            continue;
        };
        features.push((feature.properties.unwrap_or_default(), multi_polygon));
    }
    Ok(features)
}

fn string_property(
    properties: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> String {
    properties
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned()
}

fn to_multi_polygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geometry: geo::Geometry<f64> = geometry.value.try_into().ok()?;
    match geometry {
        geo::Geometry::Polygon(polygon) => Some(MultiPolygon(vec![polygon])),
        geo::Geometry::MultiPolygon(multi_polygon) => Some(multi_polygon),
        _ => None,
    }
}

/// Project WGS84 degrees to Web Mercator (EPSG:3857) meters.
fn to_web_mercator(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    geometry.map_coords(|coord| {
        let lon = coord.x.to_radians();
        let lat = coord
            .y
            .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
            .to_radians();
        geo::Coord {
            x: EARTH_RADIUS_M * lon,
            y: EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
        }
    })
}
