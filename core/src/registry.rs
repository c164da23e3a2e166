use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;

/// Fill for territories no region claims.
pub const UNASSIGNED_COLOR: &str = "#2C2C2C";

/// A named sales region: the territories it covers, its fill color, and the
/// rep credited on its callout label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub territories: Vec<String>,
    pub color: String,
    pub sales_rep: String,
    pub sales_number: i64,
}

/// Insertion-ordered set of regions keyed by name.
///
/// Registration order is the priority ranking: when two regions claim the
/// same territory, the earlier one colors it. Updating an existing region
/// keeps its original position, so its priority is stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionRegistry {
    regions: Vec<(String, Region)>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region, or replace the definition of an existing one.
    pub fn add_region(
        &mut self,
        name: &str,
        territories: Vec<String>,
        color: &str,
        sales_rep: &str,
        sales_number: i64,
    ) {
        let region = Region {
            territories,
            color: color.to_owned(),
            sales_rep: sales_rep.to_owned(),
            sales_number,
        };
        match self
            .regions
            .iter_mut()
            .find(|(existing, _)| existing.as_str() == name)
        {
            Some(slot) => slot.1 = region,
            None => self.regions.push((name.to_owned(), region)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions
            .iter()
            .find(|(existing, _)| existing.as_str() == name)
            .map(|(_, region)| region)
    }

    /// Regions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.regions
            .iter()
            .map(|(name, region)| (name.as_str(), region))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// First-registered region claiming the territory, if any.
    pub fn region_for(&self, territory: &str) -> Option<(&str, &Region)> {
        self.regions
            .iter()
            .find(|(_, region)| region.territories.iter().any(|t| t == territory))
            .map(|(name, region)| (name.as_str(), region))
    }

    /// Fill color for a territory. Registration order settles competing
    /// claims; unclaimed territories get [`UNASSIGNED_COLOR`].
    pub fn resolve_color(&self, territory: &str) -> &str {
        self.region_for(territory)
            .map(|(_, region)| region.color.as_str())
            .unwrap_or(UNASSIGNED_COLOR)
    }

    /// Write the registry as a pretty-printed JSON object, regions in
    /// registration order.
    pub fn export(&self, path: &Path) -> Result<(), RegistryError> {
        let mut document = serde_json::Map::new();
        for (name, region) in &self.regions {
            document.insert(name.clone(), serde_json::to_value(region)?);
        }
        let body = serde_json::to_string_pretty(&Value::Object(document))?;
        fs::write(path, body)?;
        Ok(())
    }

    /// Replace the registry with the contents of a region document.
    ///
    /// The whole document is validated up front; on any error the registry
    /// is left exactly as it was.
    pub fn import(&mut self, path: &Path) -> Result<(), RegistryError> {
        let raw = fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&raw)?;
        self.regions = parse_document(&document)?;
        Ok(())
    }
}

fn parse_document(document: &Value) -> Result<Vec<(String, Region)>, RegistryError> {
    let Some(object) = document.as_object() else {
        return Err(RegistryError::InvalidDocument);
    };
    let mut regions = Vec::with_capacity(object.len());
    for (name, value) in object {
        regions.push((name.clone(), parse_region(name, value)?));
    }
    Ok(regions)
}

fn parse_region(name: &str, value: &Value) -> Result<Region, RegistryError> {
    let object = value
        .as_object()
        .ok_or_else(|| RegistryError::validation(name, "is missing required fields"))?;
    for field in ["territories", "color", "sales_rep", "sales_number"] {
        if !object.contains_key(field) {
            return Err(RegistryError::validation(name, "is missing required fields"));
        }
    }

    let territories = object
        .get("territories")
        .and_then(Value::as_array)
        .ok_or_else(|| RegistryError::validation(name, "territories must be a list"))?
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| RegistryError::validation(name, "territories must be a list"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let color = object
        .get("color")
        .and_then(Value::as_str)
        .ok_or_else(|| RegistryError::validation(name, "color must be a string"))?
        .to_owned();
    let sales_rep = object
        .get("sales_rep")
        .and_then(Value::as_str)
        .ok_or_else(|| RegistryError::validation(name, "sales rep must be a string"))?
        .to_owned();
    let sales_number = object
        .get("sales_number")
        .and_then(Value::as_i64)
        .ok_or_else(|| RegistryError::validation(name, "sales number must be an integer"))?;

    Ok(Region {
        territories,
        color,
        sales_rep,
        sales_number,
    })
}
