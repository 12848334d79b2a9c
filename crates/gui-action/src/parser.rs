//! Parser for the model's action-call text.
//!
//! Input looks like
//!
//! ```text
//! Thought: The search box is at the top.
//! Action: type(content='rust async\n')
//! ```
//!
//! or just the call itself. Parsing never fails: anything that does not match
//! the argument grammar is left out of [`ActionInputs`] and the executor decides
//! whether the action can still run.

use crate::prediction::{ActionInputs, PredictionParsed};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// `name='value'`, `name="value"` or `name=[..]` / `name=(..)`.
static ARG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(?:'((?:\\.|[^'\\])*)'|"((?:\\.|[^"\\])*)"|(\[[^\]]*\]|\([^)]*\)))"#,
    )
    .expect("argument pattern is valid")
});

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(thought|reflection|action_summary|action)\s*:\s?(.*)$")
        .expect("header pattern is valid")
});

static CALL_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*[A-Za-z_][A-Za-z0-9_]*\s*\(").expect("call start pattern is valid")
});

#[derive(Debug, Default)]
struct Sections {
    thought: Option<String>,
    reflection: Option<String>,
    summary: Option<String>,
    action: Option<String>,
}

#[derive(Clone, Copy)]
enum Section {
    Thought,
    Reflection,
    Summary,
    Action,
}

fn split_sections(text: &str) -> Sections {
    let mut sections = Sections::default();
    let mut current: Option<Section> = None;

    for line in text.lines() {
        if let Some(caps) = HEADER_RE.captures(line) {
            let section = match caps[1].to_ascii_lowercase().as_str() {
                "thought" => Section::Thought,
                "reflection" => Section::Reflection,
                "action_summary" => Section::Summary,
                _ => Section::Action,
            };
            let first = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
            *slot(&mut sections, section) = Some(first);
            current = Some(section);
            continue;
        }
        if let Some(section) = current {
            if let Some(existing) = slot(&mut sections, section) {
                existing.push('\n');
                existing.push_str(line);
            }
        }
    }

    for value in [
        &mut sections.thought,
        &mut sections.reflection,
        &mut sections.summary,
        &mut sections.action,
    ] {
        if let Some(v) = value.take() {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                *value = Some(trimmed.to_string());
            }
        }
    }
    sections
}

fn slot(sections: &mut Sections, section: Section) -> &mut Option<String> {
    match section {
        Section::Thought => &mut sections.thought,
        Section::Reflection => &mut sections.reflection,
        Section::Summary => &mut sections.summary,
        Section::Action => &mut sections.action,
    }
}

/// Split an action block into individual call strings.
fn split_calls(block: &str) -> Vec<String> {
    let starts: Vec<usize> = CALL_START_RE.find_iter(block).map(|m| m.start()).collect();
    if starts.is_empty() {
        let trimmed = block.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let mut calls = Vec::with_capacity(starts.len());
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(block.len());
        let call = block[*start..end].trim();
        if !call.is_empty() {
            calls.push(call.to_string());
        }
    }
    calls
}

/// Pick the call text out of a response that has no `Action:` header.
fn find_bare_call(text: &str) -> Option<String> {
    let calls = split_calls(text);
    if let Some(last) = calls.last() {
        if CALL_START_RE.is_match(last) {
            return Some(last.clone());
        }
    }
    let trimmed = text.trim();
    let is_identifier = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_identifier.then(|| trimmed.to_string())
}

/// Parse one call string (`name(args)`) into its type and inputs.
pub fn parse_action_call(call: &str) -> (String, ActionInputs) {
    let call = call.trim();
    let name_len = call
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(call.len());
    let action_type = call[..name_len].to_string();

    let rest = call[name_len..].trim();
    let args = match rest.strip_prefix('(') {
        Some(inner) => inner.strip_suffix(')').unwrap_or(inner),
        None => rest,
    };

    (action_type, parse_arguments(args))
}

/// Parse a comma-separated `key='value'` list.
pub fn parse_arguments(args: &str) -> ActionInputs {
    let mut inputs = ActionInputs::default();
    for caps in ARG_RE.captures_iter(args) {
        let name = caps[1].to_ascii_lowercase();
        let value = if let Some(single) = caps.get(2) {
            single.as_str().replace("\\'", "'")
        } else if let Some(double) = caps.get(3) {
            double.as_str().replace("\\\"", "\"")
        } else if let Some(bare) = caps.get(4) {
            bare.as_str().to_string()
        } else {
            continue;
        };
        if !inputs.set(&name, value) {
            debug!("[parser] ignoring unknown argument '{}'", name);
        }
    }
    inputs
}

fn assemble(sections: &Sections, call: &str) -> PredictionParsed {
    let (action_type, action_inputs) = parse_action_call(call);
    PredictionParsed {
        action_type,
        action_inputs,
        thought: sections.thought.clone().or_else(|| sections.summary.clone()),
        reflection: sections.reflection.clone(),
    }
}

/// Parse a model response into a single prediction.
///
/// When the action block holds several calls, the first one is returned; use
/// [`parse_predictions`] to get all of them.
pub fn parse_prediction(text: &str) -> PredictionParsed {
    parse_predictions(text).into_iter().next().unwrap_or_else(|| {
        let sections = split_sections(text);
        debug!("[parser] no action call found in prediction");
        PredictionParsed {
            action_type: String::new(),
            action_inputs: ActionInputs::default(),
            thought: sections.thought.or(sections.summary),
            reflection: sections.reflection,
        }
    })
}

/// Parse every action call in a model response, in order.
pub fn parse_predictions(text: &str) -> Vec<PredictionParsed> {
    let sections = split_sections(text);
    let calls = match &sections.action {
        Some(block) => split_calls(block),
        None if sections.thought.is_some() || sections.reflection.is_some() => Vec::new(),
        None => find_bare_call(text).into_iter().collect(),
    };
    calls.iter().map(|call| assemble(&sections, call)).collect()
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "\\'"))
}

/// Render a prediction back into call syntax.
///
/// Only string inputs are emitted; structured `start_coords`/`end_coords` have
/// no call-syntax form.
pub fn serialize(prediction: &PredictionParsed) -> String {
    let inputs = &prediction.action_inputs;
    let fields: [(&str, &Option<String>); 9] = [
        ("start_box", &inputs.start_box),
        ("end_box", &inputs.end_box),
        ("point", &inputs.point),
        ("end_point", &inputs.end_point),
        ("key", &inputs.key),
        ("hotkey", &inputs.hotkey),
        ("direction", &inputs.direction),
        ("url", &inputs.url),
        ("content", &inputs.content),
    ];
    let args: Vec<String> = fields
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, quote(v))))
        .collect();
    format!("{}({})", prediction.action_type, args.join(", "))
}
