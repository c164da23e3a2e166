pub use geo;

pub mod color;
pub mod error;
pub mod layout;
pub mod registry;
pub mod render;
pub mod store;
pub mod territory;

pub use color::Color;
pub use error::{RegistryError, RenderError, StoreError};
pub use layout::LayoutParams;
pub use registry::{Region, RegionRegistry};
pub use render::{
    MapStyle, RenderOptions, render_map, render_map_styled, render_map_to_file, render_svg,
};
pub use store::{GeometryStore, StoreConfig};
pub use territory::{Territory, WaterFeature, abbreviation_for};
