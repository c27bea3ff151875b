//! Template field values pulled out of `key: value` lines in report text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Opaque values substituted into the prompt templates. Every field is optional;
/// the formatter decides the fallbacks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotFields {
    pub subject: Option<String>,
    pub action: Option<String>,
    pub scene: Option<String>,
    pub background: Option<String>,
    pub background_movement: Option<String>,
    pub camera: Option<String>,
    pub camera_movement: Option<String>,
    pub lighting: Option<String>,
    pub palette: Option<String>,
    pub style: Option<String>,
    pub opening: Option<String>,
    pub closing: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Label {
    Title,
    Subject,
    Action,
    Scene,
    Background,
    BackgroundMovement,
    Camera,
    CameraMovement,
    Lighting,
    Palette,
    Style,
    Opening,
    Closing,
}

static LABEL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+|\d+\.\s+)?\**\s*([A-Za-z][A-Za-z /&()-]{0,40}?)\s*\**\s*:\s*\**\s*(.*?)\s*$")
        .expect("label regex")
});

pub(crate) fn classify_label(raw: &str) -> Option<Label> {
    let key = raw
        .trim()
        .trim_matches('*')
        .trim()
        .to_ascii_lowercase()
        .replace('&', "and");
    let label = match key.as_str() {
        "shot title" | "title" | "sequence title" => Label::Title,
        "subject" | "subjects" | "main subject" | "character" | "characters" => Label::Subject,
        "action" | "subject movement" | "subject motion" | "motion" => Label::Action,
        "scene" | "location" | "setting" | "environment" => Label::Scene,
        "background" | "background description" => Label::Background,
        "background movement" | "background motion" | "environmental change"
        | "environment movement" => Label::BackgroundMovement,
        "camera" | "framing" | "camera angle" | "camera framing" | "angle" => Label::Camera,
        "camera movement" | "camera motion" => Label::CameraMovement,
        "lighting" | "light" | "lighting style" | "light conditions" => Label::Lighting,
        "color palette" | "colour palette" | "palette" | "colors" | "colours" => Label::Palette,
        "style" | "film look" | "era" | "aesthetic" | "style and era" | "film stock" => {
            Label::Style
        }
        "opening frame" | "first frame" | "start frame" | "start state" | "opening state" => {
            Label::Opening
        }
        "closing frame" | "last frame" | "end frame" | "end state" | "closing state" => {
            Label::Closing
        }
        _ => return None,
    };
    Some(label)
}

/// Split a line into a recognised label and its value.
pub(crate) fn parse_label_line(line: &str) -> Option<(Label, String)> {
    let caps = LABEL_LINE.captures(line)?;
    let label = classify_label(caps.get(1)?.as_str())?;
    let value = clean_value(caps.get(2)?.as_str());
    if value.is_empty() {
        return None;
    }
    Some((label, value))
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches('*')
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

impl ShotFields {
    /// Collect labelled values from `text`. The first occurrence of a label wins.
    /// Returns the title separately since it is not a template field.
    pub fn extract(text: &str) -> (ShotFields, Option<String>) {
        let mut fields = ShotFields::default();
        let mut title = None;

        for line in text.lines() {
            let Some((label, value)) = parse_label_line(line) else {
                continue;
            };
            let slot = match label {
                Label::Title => &mut title,
                Label::Subject => &mut fields.subject,
                Label::Action => &mut fields.action,
                Label::Scene => &mut fields.scene,
                Label::Background => &mut fields.background,
                Label::BackgroundMovement => &mut fields.background_movement,
                Label::Camera => &mut fields.camera,
                Label::CameraMovement => &mut fields.camera_movement,
                Label::Lighting => &mut fields.lighting,
                Label::Palette => &mut fields.palette,
                Label::Style => &mut fields.style,
                Label::Opening => &mut fields.opening,
                Label::Closing => &mut fields.closing,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        (fields, title)
    }

    /// Fill any empty field from `other`.
    pub fn or(mut self, other: &ShotFields) -> ShotFields {
        fn fill(slot: &mut Option<String>, from: &Option<String>) {
            if slot.is_none() {
                slot.clone_from(from);
            }
        }
        fill(&mut self.subject, &other.subject);
        fill(&mut self.action, &other.action);
        fill(&mut self.scene, &other.scene);
        fill(&mut self.background, &other.background);
        fill(&mut self.background_movement, &other.background_movement);
        fill(&mut self.camera, &other.camera);
        fill(&mut self.camera_movement, &other.camera_movement);
        fill(&mut self.lighting, &other.lighting);
        fill(&mut self.palette, &other.palette);
        fill(&mut self.style, &other.style);
        fill(&mut self.opening, &other.opening);
        fill(&mut self.closing, &other.closing);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == ShotFields::default()
    }
}
