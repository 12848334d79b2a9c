//! Coordinate value types shared by the parser, the resolver and the operators.

use serde::{Deserialize, Serialize};

/// Default surface size used until a backend reports its own.
pub const DEFAULT_SCREEN_WIDTH: f64 = 1280.0;
pub const DEFAULT_SCREEN_HEIGHT: f64 = 800.0;

/// A point in some coordinate system. The system is implied by where the point lives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle given by its two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// A zero-area box, produced by two-number box notation.
    pub fn from_point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.x1 == self.x2 && self.y1 == self.y2
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// Multiply both axes independently.
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self::new(self.x1 * sx, self.y1 * sy, self.x2 * sx, self.y2 * sy)
    }
}

/// Which surface a coordinate is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSystem {
    Screen,
    Window,
    Page,
}

/// Structured coordinates as handed over by an orchestration layer.
///
/// The wire shape is sparse: only one of `raw`, `normalized` or `reference_box`
/// is expected to be set. When more than one is present, [`Coordinates::representation`]
/// picks by precedence raw > reference box > normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_box: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_system: Option<ReferenceSystem>,
}

/// The single representation a [`Coordinates`] value resolves through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Representation {
    Raw(Point),
    ReferenceBox(BoundingBox),
    Normalized(Point),
}

impl Coordinates {
    pub fn raw(x: f64, y: f64) -> Self {
        Self {
            raw: Some(Point::new(x, y)),
            ..Default::default()
        }
    }

    pub fn normalized(x: f64, y: f64) -> Self {
        Self {
            normalized: Some(Point::new(x, y)),
            ..Default::default()
        }
    }

    pub fn reference_box(bbox: BoundingBox) -> Self {
        Self {
            reference_box: Some(bbox),
            ..Default::default()
        }
    }

    pub fn with_reference_system(mut self, system: ReferenceSystem) -> Self {
        self.reference_system = Some(system);
        self
    }

    pub fn representation(&self) -> Option<Representation> {
        if let Some(p) = self.raw {
            return Some(Representation::Raw(p));
        }
        if let Some(b) = self.reference_box {
            return Some(Representation::ReferenceBox(b));
        }
        self.normalized.map(Representation::Normalized)
    }

    pub fn is_empty(&self) -> bool {
        self.representation().is_none()
    }
}

/// Pixel size and device scale of the surface an operator drives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenContext {
    pub width: f64,
    pub height: f64,
    pub scale_factor: f64,
}

impl ScreenContext {
    pub fn new(width: f64, height: f64, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    /// Scale factor with non-positive values treated as 1.0.
    pub fn effective_scale(&self) -> f64 {
        if self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        }
    }

    /// Convert screenshot pixels into the logical units input backends expect.
    pub fn to_logical(&self, x: f64, y: f64) -> Point {
        let scale = self.effective_scale();
        Point::new(x / scale, y / scale)
    }
}

impl Default for ScreenContext {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT, 1.0)
    }
}

/// Denominators of the model's own coordinate grid (e.g. 1000 x 1000).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factors(pub f64, pub f64);

impl Factors {
    pub fn x(&self) -> f64 {
        self.0
    }

    pub fn y(&self) -> f64 {
        self.1
    }
}

impl Default for Factors {
    fn default() -> Self {
        Factors(1000.0, 1000.0)
    }
}

impl From<(f64, f64)> for Factors {
    fn from((x, y): (f64, f64)) -> Self {
        Factors(x, y)
    }
}
