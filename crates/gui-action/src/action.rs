//! The closed set of actions a model may request, with their metadata.

use crate::errors::ValidationError;
use crate::prediction::PredictionParsed;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every action kind known to the subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    DoubleClick,
    RightClick,
    MiddleClick,
    Hover,
    Drag,
    MouseDown,
    MouseUp,
    Hotkey,
    Press,
    Release,
    Type,
    Scroll,
    Wait,
    Navigate,
    NavigateBack,
    Finished,
    CallUser,
    UserStop,
}

/// An input an action cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// `point`, `start_box` or `start_coords`.
    StartTarget,
    /// `end_point`, `end_box` or `end_coords`.
    EndTarget,
    /// `key` or `hotkey`.
    Key,
    Content,
    Direction,
    /// `url` or `content`.
    Url,
}

impl Requirement {
    pub fn field_name(&self) -> &'static str {
        match self {
            Requirement::StartTarget => "start_box",
            Requirement::EndTarget => "end_box",
            Requirement::Key => "key",
            Requirement::Content => "content",
            Requirement::Direction => "direction",
            Requirement::Url => "url",
        }
    }
}

/// Static metadata row for one action kind.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub required: &'static [Requirement],
    pub summary: &'static str,
    /// Call syntax shown to the model.
    pub template: &'static str,
}

pub const ACTION_TABLE: &[ActionSpec] = &[
    ActionSpec {
        kind: ActionKind::Click,
        name: "click",
        aliases: &["left_single", "left_click"],
        required: &[Requirement::StartTarget],
        summary: "Left click at the target",
        template: "click(start_box='[x1, y1, x2, y2]')",
    },
    ActionSpec {
        kind: ActionKind::DoubleClick,
        name: "left_double",
        aliases: &["double_click"],
        required: &[Requirement::StartTarget],
        summary: "Double left click at the target",
        template: "left_double(start_box='[x1, y1, x2, y2]')",
    },
    ActionSpec {
        kind: ActionKind::RightClick,
        name: "right_single",
        aliases: &["right_click"],
        required: &[Requirement::StartTarget],
        summary: "Right click at the target",
        template: "right_single(start_box='[x1, y1, x2, y2]')",
    },
    ActionSpec {
        kind: ActionKind::MiddleClick,
        name: "middle_click",
        aliases: &[],
        required: &[Requirement::StartTarget],
        summary: "Middle click at the target",
        template: "middle_click(start_box='[x1, y1, x2, y2]')",
    },
    ActionSpec {
        kind: ActionKind::Hover,
        name: "hover",
        aliases: &["mouse_move", "move_to"],
        required: &[Requirement::StartTarget],
        summary: "Move the pointer over the target",
        template: "hover(start_box='[x1, y1, x2, y2]')",
    },
    ActionSpec {
        kind: ActionKind::Drag,
        name: "drag",
        aliases: &["select", "left_click_drag"],
        required: &[Requirement::StartTarget, Requirement::EndTarget],
        summary: "Press at the start target, move to the end target and release",
        template: "drag(start_box='[x1, y1, x2, y2]', end_box='[x3, y3, x4, y4]')",
    },
    ActionSpec {
        kind: ActionKind::MouseDown,
        name: "mouse_down",
        aliases: &[],
        required: &[],
        summary: "Press the left button, optionally after moving to the target",
        template: "mouse_down(start_box='[x1, y1, x2, y2]')",
    },
    ActionSpec {
        kind: ActionKind::MouseUp,
        name: "mouse_up",
        aliases: &[],
        required: &[],
        summary: "Release the left button, optionally after moving to the target",
        template: "mouse_up(start_box='[x1, y1, x2, y2]')",
    },
    ActionSpec {
        kind: ActionKind::Hotkey,
        name: "hotkey",
        aliases: &[],
        required: &[Requirement::Key],
        summary: "Press a key chord; keys are released in reverse order",
        template: "hotkey(key='ctrl c')",
    },
    ActionSpec {
        kind: ActionKind::Press,
        name: "press",
        aliases: &["keydown"],
        required: &[Requirement::Key],
        summary: "Hold a key down until a matching release",
        template: "press(key='shift')",
    },
    ActionSpec {
        kind: ActionKind::Release,
        name: "release",
        aliases: &["keyup"],
        required: &[Requirement::Key],
        summary: "Release a held key",
        template: "release(key='shift')",
    },
    ActionSpec {
        kind: ActionKind::Type,
        name: "type",
        aliases: &[],
        required: &[Requirement::Content],
        summary: "Type text; a trailing \\n submits with Enter",
        template: "type(content='xxx')",
    },
    ActionSpec {
        kind: ActionKind::Scroll,
        name: "scroll",
        aliases: &[],
        required: &[Requirement::Direction],
        summary: "Scroll up, down, left or right, optionally over the target",
        template: "scroll(start_box='[x1, y1, x2, y2]', direction='down or up or right or left')",
    },
    ActionSpec {
        kind: ActionKind::Wait,
        name: "wait",
        aliases: &[],
        required: &[],
        summary: "Sleep for 5s and take a screenshot to check for any changes",
        template: "wait()",
    },
    ActionSpec {
        kind: ActionKind::Navigate,
        name: "navigate",
        aliases: &["open_url"],
        required: &[Requirement::Url],
        summary: "Open a URL in the current page",
        template: "navigate(url='https://example.com')",
    },
    ActionSpec {
        kind: ActionKind::NavigateBack,
        name: "navigate_back",
        aliases: &["go_back"],
        required: &[],
        summary: "Go back in page history",
        template: "navigate_back()",
    },
    ActionSpec {
        kind: ActionKind::Finished,
        name: "finished",
        aliases: &[],
        required: &[],
        summary: "The task is complete",
        template: "finished(content='xxx')",
    },
    ActionSpec {
        kind: ActionKind::CallUser,
        name: "call_user",
        aliases: &[],
        required: &[],
        summary: "Ask the user for help when the task cannot proceed",
        template: "call_user()",
    },
    ActionSpec {
        kind: ActionKind::UserStop,
        name: "user_stop",
        aliases: &[],
        required: &[],
        summary: "Stop because the user asked to",
        template: "user_stop()",
    },
];

impl ActionKind {
    /// Look up an action name or alias, ignoring case and surrounding whitespace.
    pub fn parse(name: &str) -> Option<ActionKind> {
        let lower = name.trim().to_ascii_lowercase();
        ACTION_TABLE
            .iter()
            .find(|spec| spec.name == lower || spec.aliases.contains(&lower.as_str()))
            .map(|spec| spec.kind)
    }

    pub fn spec(&self) -> &'static ActionSpec {
        ACTION_TABLE
            .iter()
            .find(|spec| spec.kind == *self)
            .unwrap_or(&ACTION_TABLE[0])
    }

    pub fn as_str(&self) -> &'static str {
        self.spec().name
    }

    /// Actions that end or pause the task and have no input side effect.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActionKind::Finished | ActionKind::CallUser | ActionKind::UserStop
        )
    }

    pub fn template(&self) -> &'static str {
        self.spec().template
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that a prediction names a known action and carries its required inputs.
pub fn validate(prediction: &PredictionParsed) -> Result<ActionKind, ValidationError> {
    let kind = ActionKind::parse(&prediction.action_type)
        .ok_or_else(|| ValidationError::UnknownAction(prediction.action_type.clone()))?;
    let inputs = &prediction.action_inputs;
    for requirement in kind.spec().required {
        let present = match requirement {
            Requirement::StartTarget => inputs.has_start_target(),
            Requirement::EndTarget => inputs.has_end_target(),
            Requirement::Key => inputs.key_spec().is_some(),
            Requirement::Content => inputs.content.is_some(),
            Requirement::Direction => inputs.direction.is_some(),
            Requirement::Url => inputs.url.is_some() || inputs.content.is_some(),
        };
        if !present {
            return Err(ValidationError::MissingInput {
                action: kind.as_str(),
                field: requirement.field_name(),
            });
        }
    }
    Ok(kind)
}
