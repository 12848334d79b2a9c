//! Model action parsing and coordinate resolution
//!
//! This crate holds the pure half of the GUI action subsystem: it turns a
//! model's textual action call into a [`PredictionParsed`] value, describes the
//! closed set of supported actions, maps human key names onto keys, and
//! resolves every coordinate notation the model may emit into surface pixels.
//!
//! Nothing here performs I/O; the async operators live in `gui-operator`.

pub mod action;
pub mod coordinates;
pub mod errors;
pub mod keys;
pub mod parser;
pub mod prediction;
pub mod resolver;

pub use action::{validate, ActionKind, ActionSpec, Requirement, ACTION_TABLE};
pub use coordinates::{
    BoundingBox, Coordinates, Factors, Point, ReferenceSystem, Representation, ScreenContext,
};
pub use errors::{CoordinateError, UnknownKey, ValidationError};
pub use keys::{chord_down_order, chord_up_order, parse_chord, Key};
pub use parser::{parse_action_call, parse_prediction, parse_predictions, serialize};
pub use prediction::{ActionInputs, PredictionParsed};
pub use resolver::{
    parse_box, resolve, resolve_box_str, resolve_coordinates, resolve_end, resolve_start,
    ResolveContext, ResolvedPoint, Target,
};
