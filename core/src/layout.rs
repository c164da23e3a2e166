use geo::{BoundingRect, Centroid, Coord, MultiPolygon, Point, Rect, Scale, Translate};

/// An off-map territory redrawn as a scaled inset (Alaska, Hawaii).
#[derive(Debug, Clone)]
pub struct InsetSpec {
    pub name: String,
    /// Shrink factor applied about the territory's own centroid.
    pub scale: f64,
    /// Anchor offset in map units, chained from the previous inset's anchor
    /// (the first inset offsets from the reference territory's southwest
    /// corner).
    pub offset: (f64, f64),
}

/// Tunable layout constants. `Default` reproduces the production map.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// Abbreviation size for the smallest continental territory.
    pub min_abbr_size: f64,
    /// Abbreviation size for the largest continental territory.
    pub max_abbr_size: f64,
    /// Abbreviation size inside insets, which opt out of area scaling.
    pub inset_abbr_size: f64,
    /// Leader-line length budget; labels sit half this distance outside the
    /// region's bounding box.
    pub label_offset: f64,
    /// Territory whose bounding box anchors the inset chain.
    pub reference_territory: String,
    pub insets: Vec<InsetSpec>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            min_abbr_size: 6.0,
            max_abbr_size: 12.0,
            inset_abbr_size: 8.0,
            label_offset: 400_000.0,
            reference_territory: "California".to_owned(),
            insets: vec![
                InsetSpec {
                    name: "Alaska".to_owned(),
                    scale: 0.3,
                    offset: (-3_000_000.0, -2_000_000.0),
                },
                InsetSpec {
                    name: "Hawaii".to_owned(),
                    scale: 0.8,
                    offset: (2_500_000.0, 0.0),
                },
            ],
        }
    }
}

impl LayoutParams {
    pub fn is_inset(&self, name: &str) -> bool {
        self.insets.iter().any(|inset| inset.name == name)
    }
}

/// Interpolate an abbreviation font size from a territory's area.
///
/// Linear between `min_abbr_size` and `max_abbr_size` over the observed
/// area range; a degenerate range (single territory) pins everything to the
/// minimum size.
pub fn abbr_font_size(area: f64, min_area: f64, max_area: f64, params: &LayoutParams) -> f64 {
    let span = max_area - min_area;
    let factor = if span > 0.0 {
        ((area - min_area) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    params.min_abbr_size + factor * (params.max_abbr_size - params.min_abbr_size)
}

/// Resolve each inset's anchor point by walking the offset chain from the
/// reference territory's southwest corner.
pub fn inset_anchors<'a>(
    reference_bounds: &Rect<f64>,
    insets: &'a [InsetSpec],
) -> Vec<(&'a InsetSpec, Point<f64>)> {
    let mut anchors = Vec::with_capacity(insets.len());
    let mut cursor = Point::new(reference_bounds.min().x, reference_bounds.min().y);
    for inset in insets {
        cursor = Point::new(cursor.x() + inset.offset.0, cursor.y() + inset.offset.1);
        anchors.push((inset, cursor));
    }
    anchors
}

/// Scale a geometry about its own centroid, then move it so the scaled
/// centroid lands exactly on `anchor`. Returns `None` for geometry with no
/// defined centroid.
pub fn place_inset(
    geometry: &MultiPolygon<f64>,
    scale: f64,
    anchor: Point<f64>,
) -> Option<MultiPolygon<f64>> {
    let centroid = geometry.centroid()?;
    let scaled = geometry.scale_around_point(scale, scale, centroid);
    Some(scaled.translate(anchor.x() - centroid.x(), anchor.y() - centroid.y()))
}

/// Which side of the anchor the label text extends toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    /// Anchor sits at the left edge of the text.
    Left,
    /// Anchor sits at the right edge of the text.
    Right,
}

/// Which edge of the text block the anchor pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    /// Anchor at the top; lines run downward.
    Top,
    /// Anchor at the bottom; the block sits above it.
    Bottom,
}

/// A resolved region label: where the leader line starts and ends, and how
/// the text hangs off the outer end.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    /// Area-weighted centroid of the region's continental territories.
    pub centroid: Point<f64>,
    /// Outer end of the leader line; the text block attaches here.
    pub anchor: Point<f64>,
    pub h_align: HAlign,
    pub v_align: VAlign,
}

/// Place a region's callout label outside its bounding box, pushed away
/// from the map center so labels fan outward.
///
/// `geometries` are the region's continental territories; an empty slice
/// (a region living entirely in insets or naming nothing drawable) yields
/// `None` and the region goes unlabeled.
pub fn region_label(
    geometries: &[&MultiPolygon<f64>],
    map_bounds: &Rect<f64>,
    params: &LayoutParams,
) -> Option<LabelPlacement> {
    let polygons: Vec<_> = geometries
        .iter()
        .flat_map(|geometry| geometry.0.iter().cloned())
        .collect();
    if polygons.is_empty() {
        return None;
    }
    // Territories never overlap, so the concatenated multipolygon has the
    // same centroid and bounds as the true union.
    let combined = MultiPolygon(polygons);
    let centroid = combined.centroid()?;
    let bounds = combined.bounding_rect()?;

    let center = map_bounds.center();
    let half = params.label_offset / 2.0;
    let (x, h_align) = if centroid.x() < center.x {
        (bounds.min().x - half, HAlign::Right)
    } else {
        (bounds.max().x + half, HAlign::Left)
    };
    let (y, v_align) = if centroid.y() < center.y {
        (bounds.min().y - half, VAlign::Top)
    } else {
        (bounds.max().y + half, VAlign::Bottom)
    };

    Some(LabelPlacement {
        centroid,
        anchor: Point::new(x, y),
        h_align,
        v_align,
    })
}

/// Bounding box of a whole set of geometries.
pub fn combined_bounds<'a, I>(geometries: I) -> Option<Rect<f64>>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    let mut bounds: Option<Rect<f64>> = None;
    for geometry in geometries {
        let Some(rect) = geometry.bounding_rect() else {
            continue;
        };
        bounds = Some(match bounds {
            None => rect,
            Some(acc) => Rect::new(
                Coord {
                    x: acc.min().x.min(rect.min().x),
                    y: acc.min().y.min(rect.min().y),
                },
                Coord {
                    x: acc.max().x.max(rect.max().x),
                    y: acc.max().y.max(rect.max().y),
                },
            ),
        });
    }
    bounds
}
