use std::collections::HashMap;
use std::fs;
use std::path::Path;

use geo::{Area, BoundingRect, Centroid, Coord, LineString, MultiPolygon, Rect};
use tracing::warn;

use crate::color::Color;
use crate::error::RenderError;
use crate::layout::{self, HAlign, LayoutParams, VAlign};
use crate::registry::RegionRegistry;
use crate::store::GeometryStore;
use crate::territory::{Territory, abbreviation_for};

/// Output size: a logical canvas in CSS pixels plus a raster density.
///
/// The PNG measures `width * dpi / 100` by `height * dpi / 100` device
/// pixels; dpi 100 renders at exactly the logical size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 1000.0,
            dpi: 300.0,
        }
    }
}

/// Colors, fixed text and margins. `Default` is the production dark theme.
#[derive(Debug, Clone)]
pub struct MapStyle {
    pub background: Color,
    /// Outline for territories no region claims.
    pub unassigned_stroke: Color,
    /// Outline for claimed territories.
    pub assigned_stroke: Color,
    pub lake_fill: Color,
    pub lake_stroke: Color,
    pub text_color: Color,
    /// Stroke painted under text and leader lines so they stay readable on
    /// any fill.
    pub halo_color: Color,
    /// View padding around the continental extent, map units.
    pub margin: f64,
    pub title: String,
    pub subtitle: String,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            background: Color::rgb(0x1C, 0x1C, 0x1C),
            unassigned_stroke: Color::rgb(0x40, 0x40, 0x40),
            assigned_stroke: Color::rgb(0xFF, 0xFF, 0xFF),
            lake_fill: Color::rgb(0x1E, 0x4C, 0x7C),
            lake_stroke: Color::rgb(0xFF, 0xFF, 0xFF),
            text_color: Color::rgb(0xFF, 0xFF, 0xFF),
            halo_color: Color::rgb(0x00, 0x00, 0x00),
            margin: 1_000_000.0,
            title: "INSIDE SALES REGIONS".to_owned(),
            subtitle: "U.S. & CANADA".to_owned(),
        }
    }
}

/// Text sizes and line widths are given in points (1/72 in); the logical
/// canvas is 100 px per inch.
const PT_TO_PX: f64 = 100.0 / 72.0;

const UNASSIGNED_STROKE_WIDTH: f64 = 0.5;
const ASSIGNED_STROKE_WIDTH: f64 = 0.8;
const LAKE_STROKE_WIDTH: f64 = 0.5;
const ABBR_HALO_WIDTH: f64 = 1.5;
const LEADER_WIDTH: f64 = 1.5;
const LEADER_HALO_WIDTH: f64 = 3.0;
const LABEL_FONT_SIZE: f64 = 10.0;
const LABEL_HALO_WIDTH: f64 = 2.0;
const TITLE_FONT_SIZE: f64 = 20.0;
const SUBTITLE_FONT_SIZE: f64 = 14.0;

const MAX_PIXEL_DIMENSION: f64 = 16_384.0;

/// Render the map to PNG bytes with the default style and layout.
pub fn render_map(
    store: &GeometryStore,
    registry: &RegionRegistry,
    options: &RenderOptions,
) -> Result<Vec<u8>, RenderError> {
    render_map_styled(
        store,
        registry,
        options,
        &MapStyle::default(),
        &LayoutParams::default(),
    )
}

/// Render the map to PNG bytes with explicit style and layout parameters.
pub fn render_map_styled(
    store: &GeometryStore,
    registry: &RegionRegistry,
    options: &RenderOptions,
    style: &MapStyle,
    params: &LayoutParams,
) -> Result<Vec<u8>, RenderError> {
    let svg = render_svg(store, registry, options, style, params)?;
    rasterize(&svg, options)
}

/// Render the map and also write the PNG to `path`, creating parent
/// directories as needed. Returns the bytes that were written.
pub fn render_map_to_file(
    store: &GeometryStore,
    registry: &RegionRegistry,
    options: &RenderOptions,
    path: &Path,
) -> Result<Vec<u8>, RenderError> {
    let png = render_map(store, registry, options)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &png)?;
    Ok(png)
}

/// Assemble the map as an SVG document.
///
/// Draw order, back to front: background, continental fills, lakes,
/// abbreviations, insets, leader lines, region labels, titles. Individual
/// territories that cannot be drawn are logged and skipped; the rest of the
/// map still renders.
pub fn render_svg(
    store: &GeometryStore,
    registry: &RegionRegistry,
    options: &RenderOptions,
    style: &MapStyle,
    params: &LayoutParams,
) -> Result<String, RenderError> {
    pixel_dimensions(options)?;

    let continental: Vec<&Territory> = store
        .territories()
        .iter()
        .filter(|t| !params.is_inset(&t.name))
        .collect();
    let map_bounds = layout::combined_bounds(continental.iter().map(|t| &t.geometry))
        .ok_or(RenderError::EmptyMap)?;
    let view = pad_bounds(&map_bounds, style.margin);
    if view.width() <= 0.0 || view.height() <= 0.0 {
        return Err(RenderError::EmptyMap);
    }
    let tf = CanvasTransform::fit(&view, options.width, options.height);

    let mut svg = String::with_capacity(1 << 20);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.2}" height="{h:.2}" viewBox="0 0 {w:.2} {h:.2}">"#,
        w = options.width,
        h = options.height,
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        style.background
    ));
    svg.push('\n');

    for territory in &continental {
        push_territory(&mut svg, territory, &territory.geometry, registry, style, None, &tf);
    }

    for lake in store.lakes() {
        let Some(d) = path_data(&lake.geometry, &tf) else {
            warn!("skipping lake {}: no drawable geometry", lake.name);
            continue;
        };
        svg.push_str(&format!(
            r#"<path d="{d}" fill="{}" fill-rule="evenodd" stroke="{}" stroke-width="{:.2}"/>"#,
            style.lake_fill,
            style.lake_stroke,
            LAKE_STROKE_WIDTH * PT_TO_PX,
        ));
        svg.push('\n');
    }

    let areas: Vec<f64> = continental
        .iter()
        .map(|t| t.geometry.unsigned_area())
        .collect();
    let min_area = areas.iter().copied().fold(f64::INFINITY, f64::min);
    let max_area = areas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for (territory, area) in continental.iter().zip(&areas) {
        let Some(abbr) = abbreviation_for(&territory.name) else {
            continue;
        };
        let Some(centroid) = territory.geometry.centroid() else {
            continue;
        };
        let size = layout::abbr_font_size(*area, min_area, max_area, params);
        let (x, y) = tf.apply(centroid.x(), centroid.y());
        push_text(
            &mut svg,
            x,
            y + 0.35 * size * PT_TO_PX,
            abbr,
            size,
            ABBR_HALO_WIDTH,
            "middle",
            style,
        );
    }

    if let Some(reference) = store.territory(&params.reference_territory)
        && let Some(reference_bounds) = reference.geometry.bounding_rect()
    {
        for (inset, anchor) in layout::inset_anchors(&reference_bounds, &params.insets) {
            let Some(territory) = store.territory(&inset.name) else {
                continue;
            };
            let Some(geometry) = layout::place_inset(&territory.geometry, inset.scale, anchor)
            else {
                warn!("skipping inset {}: no drawable geometry", inset.name);
                continue;
            };
            // Insets are outlined like assigned territories even when unclaimed.
            push_territory(
                &mut svg,
                territory,
                &geometry,
                registry,
                style,
                Some((style.assigned_stroke, ASSIGNED_STROKE_WIDTH)),
                &tf,
            );
            if let Some(abbr) = abbreviation_for(&territory.name)
                && let Some(centroid) = geometry.centroid()
            {
                let (x, y) = tf.apply(centroid.x(), centroid.y());
                push_text(
                    &mut svg,
                    x,
                    y + 0.35 * params.inset_abbr_size * PT_TO_PX,
                    abbr,
                    params.inset_abbr_size,
                    ABBR_HALO_WIDTH,
                    "middle",
                    style,
                );
            }
        }
    }

    let continental_by_name: HashMap<&str, &MultiPolygon<f64>> = continental
        .iter()
        .map(|t| (t.name.as_str(), &t.geometry))
        .collect();
    for (_, region) in registry.iter() {
        let geometries: Vec<&MultiPolygon<f64>> = region
            .territories
            .iter()
            .filter_map(|name| continental_by_name.get(name.as_str()).copied())
            .collect();
        // Regions with no continental presence go unlabeled.
        let Some(placement) = layout::region_label(&geometries, &map_bounds, params) else {
            continue;
        };
        let from = tf.apply(placement.centroid.x(), placement.centroid.y());
        let to = tf.apply(placement.anchor.x(), placement.anchor.y());
        push_leader(&mut svg, from, to, style);
        let lines = [
            region.sales_rep.clone(),
            format!("SALES {}", region.sales_number),
        ];
        push_label(
            &mut svg,
            to.0,
            to.1,
            &lines,
            placement.h_align,
            placement.v_align,
            style,
        );
    }

    let center_x = options.width / 2.0;
    let title_y = options.height * 0.05;
    push_text(
        &mut svg,
        center_x,
        title_y,
        &style.title,
        TITLE_FONT_SIZE,
        0.0,
        "middle",
        style,
    );
    push_text(
        &mut svg,
        center_x,
        title_y + SUBTITLE_FONT_SIZE * PT_TO_PX * 1.75,
        &style.subtitle,
        SUBTITLE_FONT_SIZE,
        0.0,
        "middle",
        style,
    );

    svg.push_str("</svg>");
    Ok(svg)
}

/// Uniform scale and translation from map coordinates onto the canvas,
/// flipping y (map is north-up, canvas is top-down).
#[derive(Debug, Clone, Copy)]
struct CanvasTransform {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl CanvasTransform {
    /// Fit `bounds` inside the canvas, preserving aspect ratio and centering
    /// the slack axis.
    fn fit(bounds: &Rect<f64>, width: f64, height: f64) -> Self {
        let scale = (width / bounds.width()).min(height / bounds.height());
        let offset_x = (width - bounds.width() * scale) / 2.0 - bounds.min().x * scale;
        let offset_y = (height - bounds.height() * scale) / 2.0 + bounds.max().y * scale;
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale + self.offset_x,
            self.offset_y - y * self.scale,
        )
    }
}

fn pad_bounds(bounds: &Rect<f64>, margin: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: bounds.min().x - margin,
            y: bounds.min().y - margin,
        },
        Coord {
            x: bounds.max().x + margin,
            y: bounds.max().y + margin,
        },
    )
}

fn pixel_dimensions(options: &RenderOptions) -> Result<(u32, u32), RenderError> {
    let scale = options.dpi / 100.0;
    let width = options.width * scale;
    let height = options.height * scale;
    if !width.is_finite() || !height.is_finite() || width < 1.0 || height < 1.0 {
        return Err(RenderError::InvalidDimensions(format!(
            "{} x {} at dpi {}",
            options.width, options.height, options.dpi
        )));
    }
    if width > MAX_PIXEL_DIMENSION || height > MAX_PIXEL_DIMENSION {
        return Err(RenderError::InvalidDimensions(format!(
            "{width:.0} x {height:.0} px exceeds the {MAX_PIXEL_DIMENSION:.0} px limit"
        )));
    }
    Ok((width.round() as u32, height.round() as u32))
}

/// Draw one territory with its resolved fill. The outline follows the
/// territory's assignment unless an explicit `stroke` is given.
/// Unresolvable fills and degenerate geometry are logged and skipped.
fn push_territory(
    svg: &mut String,
    territory: &Territory,
    geometry: &MultiPolygon<f64>,
    registry: &RegionRegistry,
    style: &MapStyle,
    stroke: Option<(Color, f64)>,
    tf: &CanvasTransform,
) {
    let fill_hex = registry.resolve_color(&territory.name);
    let Some(fill) = Color::from_hex(fill_hex) else {
        warn!(
            "skipping {}: invalid fill color {fill_hex:?}",
            territory.name
        );
        return;
    };
    let Some(d) = path_data(geometry, tf) else {
        warn!("skipping {}: no drawable geometry", territory.name);
        return;
    };
    let (stroke, stroke_width) = stroke.unwrap_or_else(|| {
        if registry.region_for(&territory.name).is_some() {
            (style.assigned_stroke, ASSIGNED_STROKE_WIDTH)
        } else {
            (style.unassigned_stroke, UNASSIGNED_STROKE_WIDTH)
        }
    });
    svg.push_str(&format!(
        r#"<path d="{d}" fill="{fill}" fill-rule="evenodd" stroke="{stroke}" stroke-width="{:.2}"/>"#,
        stroke_width * PT_TO_PX,
    ));
    svg.push('\n');
}

fn path_data(geometry: &MultiPolygon<f64>, tf: &CanvasTransform) -> Option<String> {
    let mut d = String::new();
    for polygon in &geometry.0 {
        append_ring(&mut d, polygon.exterior(), tf);
        for interior in polygon.interiors() {
            append_ring(&mut d, interior, tf);
        }
    }
    (!d.is_empty()).then_some(d)
}

fn append_ring(d: &mut String, ring: &LineString<f64>, tf: &CanvasTransform) {
    // Closed rings repeat their first coordinate; below a triangle there is
    // nothing to fill.
    if ring.0.len() < 4 {
        return;
    }
    for (i, coord) in ring.0[..ring.0.len() - 1].iter().enumerate() {
        let (x, y) = tf.apply(coord.x, coord.y);
        let command = if i == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{command}{x:.2} {y:.2} "));
    }
    d.push('Z');
    d.push(' ');
}

fn push_text(
    svg: &mut String,
    x: f64,
    y: f64,
    content: &str,
    size_pt: f64,
    halo_pt: f64,
    anchor: &str,
    style: &MapStyle,
) {
    let common = format!(
        r#"x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{:.2}" font-weight="bold" text-anchor="{anchor}" fill="{}""#,
        size_pt * PT_TO_PX,
        style.text_color,
    );
    let content = escape_xml(content);
    if halo_pt > 0.0 {
        svg.push_str(&format!(
            r#"<text {common} stroke="{}" stroke-width="{:.2}" paint-order="stroke" stroke-linejoin="round">{content}</text>"#,
            style.halo_color,
            halo_pt * PT_TO_PX,
        ));
    } else {
        svg.push_str(&format!("<text {common}>{content}</text>"));
    }
    svg.push('\n');
}

/// Leader line from a region's centroid to its label anchor: a wide dark
/// casing with a bright core on top.
fn push_leader(svg: &mut String, from: (f64, f64), to: (f64, f64), style: &MapStyle) {
    let segment = format!(
        r#"x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}""#,
        from.0, from.1, to.0, to.1
    );
    svg.push_str(&format!(
        r#"<line {segment} stroke="{}" stroke-width="{:.2}"/>"#,
        style.halo_color,
        LEADER_HALO_WIDTH * PT_TO_PX,
    ));
    svg.push_str(&format!(
        r#"<line {segment} stroke="{}" stroke-width="{:.2}"/>"#,
        style.text_color,
        LEADER_WIDTH * PT_TO_PX,
    ));
    svg.push('\n');
}

/// Multi-line callout text hung off the leader anchor according to the
/// layout alignment.
fn push_label(
    svg: &mut String,
    x: f64,
    y: f64,
    lines: &[String],
    h_align: HAlign,
    v_align: VAlign,
    style: &MapStyle,
) {
    if lines.is_empty() {
        return;
    }
    let size = LABEL_FONT_SIZE * PT_TO_PX;
    let line_height = size * 1.25;
    let anchor = match h_align {
        HAlign::Left => "start",
        HAlign::Right => "end",
    };
    let first_baseline = match v_align {
        VAlign::Top => y + size,
        VAlign::Bottom => y - line_height * (lines.len() - 1) as f64 - size * 0.25,
    };
    svg.push_str(&format!(
        r#"<text font-family="sans-serif" font-size="{size:.2}" font-weight="bold" text-anchor="{anchor}" fill="{}" stroke="{}" stroke-width="{:.2}" paint-order="stroke" stroke-linejoin="round">"#,
        style.text_color,
        style.halo_color,
        LABEL_HALO_WIDTH * PT_TO_PX,
    ));
    for (i, line) in lines.iter().enumerate() {
        let baseline = first_baseline + line_height * i as f64;
        svg.push_str(&format!(
            r#"<tspan x="{x:.2}" y="{baseline:.2}">{}</tspan>"#,
            escape_xml(line)
        ));
    }
    svg.push_str("</text>\n");
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rasterize(svg: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let (width, height) = pixel_dimensions(options)?;

    let mut usvg_options = resvg::usvg::Options::default();
    usvg_options.font_family = "sans-serif".to_owned();
    usvg_options.fontdb_mut().load_system_fonts();
    let tree = resvg::usvg::Tree::from_str(svg, &usvg_options)
        .map_err(|e| RenderError::Raster(e.to_string()))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Raster(format!("could not allocate a {width}x{height} surface")))?;
    let scale = (options.dpi / 100.0) as f32;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Raster(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::territory::WaterFeature;
    use geo::Polygon;

    fn square(x: f64, y: f64, side: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            vec![
                Coord { x, y },
                Coord { x: x + side, y },
                Coord { x: x + side, y: y + side },
                Coord { x, y: y + side },
                Coord { x, y },
            ]
            .into(),
            vec![],
        )])
    }

    fn territory(name: &str, geometry: MultiPolygon<f64>) -> Territory {
        Territory {
            name: name.to_owned(),
            admin: "United States of America".to_owned(),
            geometry,
        }
    }

    fn test_store() -> GeometryStore {
        GeometryStore::from_parts(
            vec![
                territory("Westland", square(0.0, 0.0, 40.0)),
                territory("Ohio", square(60.0, 0.0, 40.0)),
            ],
            vec![WaterFeature {
                name: "Lake Erie".to_owned(),
                geometry: square(45.0, 15.0, 10.0),
            }],
        )
    }

    fn small_options() -> RenderOptions {
        RenderOptions {
            width: 300.0,
            height: 200.0,
            dpi: 100.0,
        }
    }

    #[test]
    fn unassigned_map_uses_the_default_fill() {
        let store = test_store();
        let registry = RegionRegistry::new();
        let svg = render_svg(
            &store,
            &registry,
            &small_options(),
            &MapStyle::default(),
            &LayoutParams::default(),
        )
        .unwrap();

        assert_eq!(svg.matches(r##"fill="#2C2C2C""##).count(), 2);
        assert!(svg.contains(r##"fill="#1C1C1C""##));
        assert!(svg.contains(r##"fill="#1E4C7C""##));
        assert!(svg.contains(">OH<"));
        assert!(svg.contains("INSIDE SALES REGIONS"));
        assert!(svg.contains("U.S. &amp; CANADA"));
        // No regions, no leader lines.
        assert!(!svg.contains("<line"));
    }

    #[test]
    fn assigned_territories_use_the_region_color_and_label() {
        let store = test_store();
        let mut registry = RegionRegistry::new();
        registry.add_region("West", vec!["Westland".to_owned()], "#AA00BB", "Ada", 7);
        let svg = render_svg(
            &store,
            &registry,
            &small_options(),
            &MapStyle::default(),
            &LayoutParams::default(),
        )
        .unwrap();

        assert!(svg.contains(r##"fill="#AA00BB""##));
        // Ohio stays unassigned.
        assert_eq!(svg.matches(r##"fill="#2C2C2C""##).count(), 1);
        assert!(svg.contains(">Ada<"));
        assert!(svg.contains(">SALES 7<"));
        assert_eq!(svg.matches("<line").count(), 2);
    }

    #[test]
    fn invalid_region_colors_skip_only_that_territory() {
        let store = test_store();
        let mut registry = RegionRegistry::new();
        registry.add_region("West", vec!["Westland".to_owned()], "magenta", "Ada", 7);
        let svg = render_svg(
            &store,
            &registry,
            &small_options(),
            &MapStyle::default(),
            &LayoutParams::default(),
        )
        .unwrap();

        // Ohio and the lake still draw; Westland's path is dropped.
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(!svg.contains("magenta"));
        assert!(svg.contains(r##"fill="#2C2C2C""##));
    }

    #[test]
    fn regions_confined_to_insets_are_not_labeled() {
        let store = GeometryStore::from_parts(
            vec![
                territory("California", square(0.0, 0.0, 40.0)),
                territory("Alaska", square(100.0, 100.0, 20.0)),
            ],
            vec![],
        );
        let mut registry = RegionRegistry::new();
        registry.add_region("North", vec!["Alaska".to_owned()], "#123456", "Lin", 2);
        let svg = render_svg(
            &store,
            &registry,
            &small_options(),
            &MapStyle::default(),
            &LayoutParams::default(),
        )
        .unwrap();

        assert!(!svg.contains("<line"));
        assert!(!svg.contains(">Lin<"));
        // The inset itself is still drawn in the region color.
        assert!(svg.contains(r##"fill="#123456""##));
        assert!(svg.contains(">AK<"));
    }

    #[test]
    fn insets_are_scaled_and_anchored_off_the_reference() {
        let store = GeometryStore::from_parts(
            vec![
                territory("California", square(0.0, 0.0, 40.0)),
                territory("Alaska", square(100.0, 100.0, 20.0)),
                territory("Hawaii", square(200.0, 100.0, 10.0)),
            ],
            vec![],
        );
        let registry = RegionRegistry::new();
        let svg = render_svg(
            &store,
            &registry,
            &small_options(),
            &MapStyle::default(),
            &LayoutParams::default(),
        )
        .unwrap();

        // One continental territory plus two insets.
        assert_eq!(svg.matches("<path").count(), 3);
        // Insets are stroked white even though nothing claims them; the
        // continental territory keeps the unassigned outline.
        assert_eq!(svg.matches(r##"stroke="#FFFFFF" stroke-width="1.11""##).count(), 2);
        assert_eq!(svg.matches(r##"stroke="#404040" stroke-width="0.69""##).count(), 1);
        assert!(svg.contains(">AK<"));
        assert!(svg.contains(">HI<"));
        assert!(svg.contains(">CA<"));
    }

    #[test]
    fn missing_inset_territories_are_tolerated() {
        let store = GeometryStore::from_parts(
            vec![territory("California", square(0.0, 0.0, 40.0))],
            vec![],
        );
        let svg = render_svg(
            &store,
            &RegionRegistry::new(),
            &small_options(),
            &MapStyle::default(),
            &LayoutParams::default(),
        )
        .unwrap();
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn an_empty_store_cannot_render() {
        let store = GeometryStore::from_parts(vec![], vec![]);
        let err = render_svg(
            &store,
            &RegionRegistry::new(),
            &small_options(),
            &MapStyle::default(),
            &LayoutParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::EmptyMap));
    }

    #[test]
    fn rejects_unusable_dimensions() {
        let store = test_store();
        let registry = RegionRegistry::new();
        for options in [
            RenderOptions {
                width: 0.0,
                height: 200.0,
                dpi: 100.0,
            },
            RenderOptions {
                width: 300.0,
                height: -10.0,
                dpi: 100.0,
            },
            RenderOptions {
                width: 300.0,
                height: 200.0,
                dpi: 0.0,
            },
            RenderOptions {
                width: 100_000.0,
                height: 200.0,
                dpi: 100.0,
            },
        ] {
            let err = render_map(&store, &registry, &options).unwrap_err();
            assert!(matches!(err, RenderError::InvalidDimensions(_)));
        }
    }

    #[test]
    fn png_dimensions_follow_the_dpi() {
        let store = test_store();
        let registry = RegionRegistry::new();

        let png = render_map(&store, &registry, &small_options()).unwrap();
        let pixmap = resvg::tiny_skia::Pixmap::decode_png(&png).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (300, 200));

        let doubled = RenderOptions {
            dpi: 200.0,
            ..small_options()
        };
        let png = render_map(&store, &registry, &doubled).unwrap();
        let pixmap = resvg::tiny_skia::Pixmap::decode_png(&png).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (600, 400));
    }

    #[test]
    fn render_to_file_writes_the_same_bytes() {
        let store = test_store();
        let registry = RegionRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("map.png");

        let png = render_map_to_file(&store, &registry, &small_options(), &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), png);
        // PNG signature.
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn canvas_transform_centers_and_flips() {
        let bounds = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 100.0, y: 50.0 });
        let tf = CanvasTransform::fit(&bounds, 200.0, 200.0);

        // Width-limited: scale 2, vertical slack of 100 split evenly.
        assert_eq!(tf.apply(0.0, 50.0), (0.0, 50.0));
        assert_eq!(tf.apply(100.0, 0.0), (200.0, 150.0));
        assert_eq!(tf.apply(50.0, 25.0), (100.0, 100.0));
    }

    #[test]
    fn escape_xml_covers_markup_characters() {
        assert_eq!(
            escape_xml(r#"<Sales & "Ops">"#),
            "&lt;Sales &amp; &quot;Ops&quot;&gt;"
        );
    }
}
