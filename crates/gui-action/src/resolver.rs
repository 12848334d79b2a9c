//! Turn model coordinates into surface pixels.
//!
//! Two scaling pipelines exist and must stay separate:
//! - box and point strings come from the model and are denominated in its own
//!   grid (`factors`); they are divided by the factors and multiplied by the
//!   screen size.
//! - normalized coordinates are fractions of the runtime [`ScreenContext`].
//!
//! Precedence on one target: point > box string > raw > reference box > normalized.

use crate::coordinates::{BoundingBox, Coordinates, Factors, Representation, ScreenContext};
use crate::errors::CoordinateError;
use crate::prediction::ActionInputs;
use serde::Serialize;

/// Model tokens that may wrap box or point notation.
const WRAPPER_TOKENS: &[&str] = &[
    "<|box_start|>",
    "<|box_end|>",
    "<|point_start|>",
    "<|point_end|>",
    "<point>",
    "</point>",
    "<bbox>",
    "</bbox>",
];

/// Everything resolution depends on besides the input itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveContext {
    /// Screen the model's box strings refer to.
    pub screen: ScreenContext,
    /// Surface the operator owns. Normalized coordinates scale against this.
    pub runtime: ScreenContext,
    /// Model grid for box strings. `None` means box strings are already pixels.
    pub factors: Option<Factors>,
}

impl ResolveContext {
    /// Model screen and runtime surface are the same.
    pub fn new(screen: ScreenContext, factors: Option<Factors>) -> Self {
        Self {
            screen,
            runtime: screen,
            factors,
        }
    }

    pub fn with_runtime(mut self, runtime: ScreenContext) -> Self {
        self.runtime = runtime;
        self
    }

    /// Box strings are taken as pixels.
    pub fn pixels(screen: ScreenContext) -> Self {
        Self::new(screen, None)
    }
}

/// A resolved target: the point to act on and the region it came from, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedPoint {
    pub x: f64,
    pub y: f64,
    pub bounds: Option<BoundingBox>,
}

/// The coordinate fields of one end of an action.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target<'a> {
    pub point: Option<&'a str>,
    pub box_str: Option<&'a str>,
    pub coords: Option<&'a Coordinates>,
}

impl<'a> Target<'a> {
    pub fn start(inputs: &'a ActionInputs) -> Self {
        Self {
            point: inputs.point.as_deref(),
            box_str: inputs.start_box.as_deref(),
            coords: inputs.start_coords.as_ref(),
        }
    }

    pub fn end(inputs: &'a ActionInputs) -> Self {
        Self {
            point: inputs.end_point.as_deref(),
            box_str: inputs.end_box.as_deref(),
            coords: inputs.end_coords.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_none()
            && self.box_str.is_none()
            && self.coords.map(|c| c.is_empty()).unwrap_or(true)
    }

    /// Whether [`resolve`] takes the normalized path, landing on the runtime surface.
    pub fn is_normalized(&self) -> bool {
        self.point.is_none()
            && self.box_str.is_none()
            && matches!(
                self.coords.and_then(Coordinates::representation),
                Some(Representation::Normalized(_))
            )
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Parse box notation into a rectangle in the notation's own units.
///
/// Accepts `[x,y]`, `(x,y)`, `x,y,x2,y2`, whitespace separators and the model's
/// wrapper tokens. Two numbers give a degenerate box.
pub fn parse_box(input: &str) -> Result<BoundingBox, CoordinateError> {
    let mut cleaned = input.to_string();
    for token in WRAPPER_TOKENS {
        cleaned = cleaned.replace(token, " ");
    }
    let cleaned: String = cleaned
        .chars()
        .map(|c| if matches!(c, '[' | ']' | '(' | ')') { ' ' } else { c })
        .collect();

    let numbers = cleaned
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| CoordinateError::Malformed(input.to_string()))?;

    match numbers.as_slice() {
        [x, y] => Ok(BoundingBox::from_point(*x, *y)),
        [x1, y1, x2, y2] => Ok(BoundingBox::new(*x1, *y1, *x2, *y2)),
        _ => Err(CoordinateError::Malformed(input.to_string())),
    }
}

/// Parse a model box string and scale it from the model grid into pixels.
pub fn resolve_box_str(
    input: &str,
    ctx: &ResolveContext,
) -> Result<ResolvedPoint, CoordinateError> {
    let bbox = parse_box(input)?;
    let bbox = match ctx.factors {
        Some(Factors(fx, fy)) => {
            if fx <= 0.0 || fy <= 0.0 {
                return Err(CoordinateError::InvalidFactors(fx, fy));
            }
            bbox.scale(ctx.screen.width / fx, ctx.screen.height / fy)
        }
        None => bbox,
    };
    let center = bbox.center();
    Ok(ResolvedPoint {
        x: round2(center.x),
        y: round2(center.y),
        bounds: Some(bbox),
    })
}

/// Resolve structured coordinates through their single representation.
pub fn resolve_coordinates(
    coords: &Coordinates,
    ctx: &ResolveContext,
) -> Result<ResolvedPoint, CoordinateError> {
    match coords.representation() {
        Some(Representation::Raw(p)) => Ok(ResolvedPoint {
            x: round2(p.x),
            y: round2(p.y),
            bounds: None,
        }),
        Some(Representation::ReferenceBox(b)) => {
            let center = b.center();
            Ok(ResolvedPoint {
                x: round2(center.x),
                y: round2(center.y),
                bounds: Some(b),
            })
        }
        Some(Representation::Normalized(p)) => Ok(ResolvedPoint {
            x: round2(p.x * ctx.runtime.width),
            y: round2(p.y * ctx.runtime.height),
            bounds: None,
        }),
        None => Err(CoordinateError::Missing("coordinates")),
    }
}

/// Resolve a target by precedence. Pure: the same input always gives the same output.
pub fn resolve(
    target: &Target<'_>,
    ctx: &ResolveContext,
) -> Result<ResolvedPoint, CoordinateError> {
    if let Some(point) = target.point {
        return resolve_box_str(point, ctx);
    }
    if let Some(box_str) = target.box_str {
        return resolve_box_str(box_str, ctx);
    }
    match target.coords {
        Some(coords) => resolve_coordinates(coords, ctx),
        None => Err(CoordinateError::Missing("target")),
    }
}

pub fn resolve_start(
    inputs: &ActionInputs,
    ctx: &ResolveContext,
) -> Result<ResolvedPoint, CoordinateError> {
    resolve(&Target::start(inputs), ctx).map_err(|e| match e {
        CoordinateError::Missing(_) => CoordinateError::Missing("start_box"),
        other => other,
    })
}

pub fn resolve_end(
    inputs: &ActionInputs,
    ctx: &ResolveContext,
) -> Result<ResolvedPoint, CoordinateError> {
    resolve(&Target::end(inputs), ctx).map_err(|e| match e {
        CoordinateError::Missing(_) => CoordinateError::Missing("end_box"),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::Point;

    fn pixels() -> ResolveContext {
        ResolveContext::pixels(ScreenContext::new(1000.0, 500.0, 1.0))
    }

    #[test]
    fn test_box_tolerance() {
        for input in ["[10, 20, 30, 40]", "(10,20,30,40)", "10, 20, 30, 40"] {
            let target = Target {
                box_str: Some(input),
                ..Default::default()
            };
            let p = resolve(&target, &pixels()).unwrap();
            assert_eq!((p.x, p.y), (20.0, 30.0), "{input}");
        }
    }

    #[test]
    fn test_degenerate_box() {
        let target = Target {
            box_str: Some("[15, 25]"),
            ..Default::default()
        };
        let p = resolve(&target, &pixels()).unwrap();
        assert_eq!((p.x, p.y), (15.0, 25.0));
        let b = p.bounds.unwrap();
        assert_eq!((b.x1, b.x2, b.y1, b.y2), (15.0, 15.0, 25.0, 25.0));
        assert!(b.is_degenerate());
    }

    #[test]
    fn test_model_tokens() {
        assert_eq!(
            parse_box("<|box_start|>(100,200)<|box_end|>").unwrap(),
            BoundingBox::from_point(100.0, 200.0)
        );
        assert_eq!(
            parse_box("<point>10 20</point>").unwrap(),
            BoundingBox::from_point(10.0, 20.0)
        );
        assert_eq!(
            parse_box("(1,2),(3,4)").unwrap(),
            BoundingBox::new(1.0, 2.0, 3.0, 4.0)
        );
    }

    #[test]
    fn test_malformed_box() {
        for input in ["", "[1, 2, 3]", "[a, b]", "[1, 2, 3, 4, 5]", "[NaN, 1]"] {
            assert!(
                matches!(parse_box(input), Err(CoordinateError::Malformed(_))),
                "{input}"
            );
        }
    }

    #[test]
    fn test_normalized_uses_screen_context() {
        let target_coords = Coordinates::normalized(0.5, 0.5);
        let target = Target {
            coords: Some(&target_coords),
            ..Default::default()
        };
        let p = resolve(&target, &pixels()).unwrap();
        assert_eq!((p.x, p.y), (500.0, 250.0));
    }

    #[test]
    fn test_normalized_ignores_model_screen() {
        let ctx = ResolveContext::new(
            ScreenContext::new(1000.0, 500.0, 1.0),
            Some(Factors(1000.0, 500.0)),
        )
        .with_runtime(ScreenContext::new(1280.0, 800.0, 1.0));

        let coords = Coordinates::normalized(0.5, 0.5);
        let normalized = Target {
            coords: Some(&coords),
            ..Default::default()
        };
        assert!(normalized.is_normalized());
        let p = resolve(&normalized, &ctx).unwrap();
        assert_eq!((p.x, p.y), (640.0, 400.0));

        let boxed = Target {
            box_str: Some("[500, 250]"),
            ..normalized
        };
        assert!(!boxed.is_normalized());
        let p = resolve(&boxed, &ctx).unwrap();
        assert_eq!((p.x, p.y), (500.0, 250.0));
    }

    #[test]
    fn test_box_strings_use_factors() {
        let ctx = ResolveContext::new(
            ScreenContext::new(1920.0, 1080.0, 1.0),
            Some(Factors(1000.0, 1000.0)),
        );
        let target = Target {
            box_str: Some("[500, 500, 500, 500]"),
            ..Default::default()
        };
        let p = resolve(&target, &ctx).unwrap();
        assert_eq!((p.x, p.y), (960.0, 540.0));

        let bad = ResolveContext::new(ScreenContext::default(), Some(Factors(0.0, 1000.0)));
        assert!(matches!(
            resolve(&target, &bad),
            Err(CoordinateError::InvalidFactors(..))
        ));
    }

    #[test]
    fn test_precedence() {
        let coords = Coordinates {
            raw: Some(Point::new(1.0, 1.0)),
            normalized: Some(Point::new(0.1, 0.1)),
            reference_box: Some(BoundingBox::new(0.0, 0.0, 4.0, 4.0)),
            reference_system: None,
        };
        let all = Target {
            point: Some("(7,7)"),
            box_str: Some("(9,9)"),
            coords: Some(&coords),
        };
        assert_eq!(resolve(&all, &pixels()).unwrap().x, 7.0);

        let no_point = Target { point: None, ..all };
        assert_eq!(resolve(&no_point, &pixels()).unwrap().x, 9.0);

        let structured = Target {
            box_str: None,
            ..no_point
        };
        assert_eq!(resolve(&structured, &pixels()).unwrap().x, 1.0);

        let without_raw = Coordinates {
            raw: None,
            ..coords.clone()
        };
        let refbox = Target {
            coords: Some(&without_raw),
            ..structured
        };
        assert_eq!(resolve(&refbox, &pixels()).unwrap().x, 2.0);
    }

    #[test]
    fn test_missing_representation() {
        assert_eq!(
            resolve_start(&ActionInputs::default(), &pixels()),
            Err(CoordinateError::Missing("start_box"))
        );
        let empty = Coordinates::default();
        let target = Target {
            coords: Some(&empty),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&target, &pixels()),
            Err(CoordinateError::Missing(_))
        ));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let inputs = ActionInputs {
            start_box: Some("[333, 667, 335, 669]".to_string()),
            ..Default::default()
        };
        let ctx = ResolveContext::new(
            ScreenContext::new(1366.0, 768.0, 1.25),
            Some(Factors::default()),
        );
        let first = resolve_start(&inputs, &ctx).unwrap();
        let second = resolve_start(&inputs, &ctx).unwrap();
        assert_eq!(first, second);
    }
}
