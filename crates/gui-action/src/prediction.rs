//! Parsed prediction values handed from the parser to the operators.

use crate::coordinates::Coordinates;
use serde::{Deserialize, Serialize};

/// Sparse argument record of one action.
///
/// Only the fields the model actually supplied are `Some`. Executors dispatch
/// on presence, so nothing here is ever filled with a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_box: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_box: Option<String>,
    /// `<point>x y</point>` style start position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_coords: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_coords: Option<Coordinates>,
}

impl ActionInputs {
    /// Names of the populated fields, in declaration order.
    pub fn present_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        let mut push = |present: bool, name: &'static str| {
            if present {
                keys.push(name);
            }
        };
        push(self.content.is_some(), "content");
        push(self.start_box.is_some(), "start_box");
        push(self.end_box.is_some(), "end_box");
        push(self.point.is_some(), "point");
        push(self.end_point.is_some(), "end_point");
        push(self.key.is_some(), "key");
        push(self.hotkey.is_some(), "hotkey");
        push(self.direction.is_some(), "direction");
        push(self.url.is_some(), "url");
        push(self.start_coords.is_some(), "start_coords");
        push(self.end_coords.is_some(), "end_coords");
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.present_keys().is_empty()
    }

    /// Set a string field by its argument name. Returns false for unknown names.
    pub(crate) fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "content" | "text" => &mut self.content,
            "start_box" | "box" => &mut self.start_box,
            "end_box" => &mut self.end_box,
            "point" | "start_point" => &mut self.point,
            "end_point" => &mut self.end_point,
            "key" => &mut self.key,
            "hotkey" | "keys" => &mut self.hotkey,
            "direction" => &mut self.direction,
            "url" => &mut self.url,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Whether any start-position input is present.
    pub fn has_start_target(&self) -> bool {
        self.point.is_some()
            || self.start_box.is_some()
            || self.start_coords.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn has_end_target(&self) -> bool {
        self.end_point.is_some()
            || self.end_box.is_some()
            || self.end_coords.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// `key` or, failing that, `hotkey`.
    pub fn key_spec(&self) -> Option<&str> {
        self.key.as_deref().or(self.hotkey.as_deref())
    }

    /// `hotkey` or, failing that, `key`.
    pub fn hotkey_spec(&self) -> Option<&str> {
        self.hotkey.as_deref().or(self.key.as_deref())
    }
}

/// One parsed model action. Produced once, executed at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionParsed {
    pub action_type: String,
    #[serde(default)]
    pub action_inputs: ActionInputs,
    #[serde(default)]
    pub thought: Option<String>,
    #[serde(default)]
    pub reflection: Option<String>,
}

impl PredictionParsed {
    pub fn new(action_type: impl Into<String>, action_inputs: ActionInputs) -> Self {
        Self {
            action_type: action_type.into(),
            action_inputs,
            thought: None,
            reflection: None,
        }
    }
}
