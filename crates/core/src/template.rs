//! Fixed prompt templates. Values are substituted as-is; nothing here generates text.

use std::{fmt, str::FromStr, time::Duration};

use crate::{fields::ShotFields, segment::Shot, timecode::format_seconds};

pub const QUALITY_TAGS: &str =
    "Professional photography, highly detailed, sharp focus, cinematic composition";

pub const NEGATIVE_PROMPT: &str = "blurry, out of focus, low quality, jpeg artifacts, watermark, text, distorted, deformed, bad anatomy";

const DEFAULT_CAMERA_MOVEMENT: &str = "static camera";
const DEFAULT_BACKGROUND_MOVEMENT: &str = "none";
const DEFAULT_ACTION: &str = "no significant subject movement";

/// Which field set the motion prompt is assembled from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemplateKind {
    /// `{subject, action, scene, camera_movement, lighting, style}`
    #[default]
    TextToVideo,
    /// `{subject, action, background, background_movement, camera_movement}`
    ImageToVideo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionField {
    Subject,
    Action,
    Scene,
    Background,
    BackgroundMovement,
    CameraMovement,
    Lighting,
    Style,
}

impl TemplateKind {
    pub fn motion_fields(&self) -> &'static [MotionField] {
        match self {
            TemplateKind::TextToVideo => &[
                MotionField::Subject,
                MotionField::Action,
                MotionField::Scene,
                MotionField::CameraMovement,
                MotionField::Lighting,
                MotionField::Style,
            ],
            TemplateKind::ImageToVideo => &[
                MotionField::Subject,
                MotionField::Action,
                MotionField::Background,
                MotionField::BackgroundMovement,
                MotionField::CameraMovement,
            ],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemplateKind::TextToVideo => "text-to-video",
            TemplateKind::ImageToVideo => "image-to-video",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t2v" | "text-to-video" => Ok(TemplateKind::TextToVideo),
            "i2v" | "image-to-video" => Ok(TemplateKind::ImageToVideo),
            other => Err(format!("unknown template {other:?}, expected t2v or i2v")),
        }
    }
}

/// Shot values after fallbacks. Static fields are the ones both frame prompts share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateValues {
    pub subject: String,
    pub opening: String,
    pub closing: String,
    pub action: String,
    pub scene: Option<String>,
    pub background: Option<String>,
    pub background_movement: String,
    pub camera: Option<String>,
    pub camera_movement: String,
    pub lighting: Option<String>,
    pub palette: Option<String>,
    pub style: Option<String>,
    /// Whether the report described the closing instant separately.
    pub distinct_closing: bool,
}

impl TemplateValues {
    pub fn resolve(shot: &Shot, anchors: &ShotFields) -> Self {
        let fields = shot.fields.clone().or(anchors);

        let subject = fields
            .subject
            .clone()
            .or_else(|| fields.opening.clone())
            .unwrap_or_else(|| shot.title.clone());
        let opening = fields.opening.clone().unwrap_or_else(|| subject.clone());
        let distinct_closing = fields.closing.as_ref().is_some_and(|c| *c != opening);
        let closing = fields.closing.clone().unwrap_or_else(|| subject.clone());

        Self {
            opening,
            closing,
            action: fields.action.unwrap_or_else(|| DEFAULT_ACTION.to_string()),
            scene: fields.scene.clone().or_else(|| fields.background.clone()),
            background: fields.background.or(fields.scene),
            background_movement: fields
                .background_movement
                .unwrap_or_else(|| DEFAULT_BACKGROUND_MOVEMENT.to_string()),
            camera: fields.camera,
            camera_movement: fields
                .camera_movement
                .unwrap_or_else(|| DEFAULT_CAMERA_MOVEMENT.to_string()),
            lighting: fields.lighting,
            palette: fields.palette,
            style: fields.style,
            subject,
            distinct_closing,
        }
    }

    /// Sentences repeated verbatim in both frame prompts.
    pub fn static_sentences(&self) -> Vec<String> {
        let mut out = Vec::new();
        push(&mut out, "Scene", self.scene.as_deref());
        if self.background != self.scene {
            push(&mut out, "Background", self.background.as_deref());
        }
        push(&mut out, "Lighting", self.lighting.as_deref());
        push(&mut out, "Color palette", self.palette.as_deref());
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instant {
    Opening,
    Closing,
}

/// First or last frame image prompt.
pub fn frame_prompt(values: &TemplateValues, instant: Instant) -> String {
    let (label, state) = match instant {
        Instant::Opening => ("Opening instant", &values.opening),
        Instant::Closing => ("Closing instant", &values.closing),
    };

    let mut sentences = Vec::new();
    push(&mut sentences, label, Some(state.as_str()));
    sentences.extend(values.static_sentences());
    push(&mut sentences, "Camera", values.camera.as_deref());
    push(&mut sentences, "Style", values.style.as_deref());
    sentences.push(format!("{}.", QUALITY_TAGS));
    sentences.join(" ")
}

/// Motion prompt over `duration`, assembled from the template's field set.
pub fn motion_prompt(values: &TemplateValues, kind: TemplateKind, duration: Duration) -> String {
    let over = format_seconds(duration);
    let mut sentences = Vec::new();

    for field in kind.motion_fields() {
        match field {
            MotionField::Subject => push(&mut sentences, "Subject", Some(values.subject.as_str())),
            MotionField::Action => push(
                &mut sentences,
                "Action",
                Some(format!("{}, over {}", trim(&values.action), over).as_str()),
            ),
            MotionField::Scene => push(&mut sentences, "Scene", values.scene.as_deref()),
            MotionField::Background => {
                push(&mut sentences, "Background", values.background.as_deref())
            }
            MotionField::BackgroundMovement => push(
                &mut sentences,
                "Background movement",
                Some(values.background_movement.as_str()),
            ),
            MotionField::CameraMovement => push(
                &mut sentences,
                "Camera movement",
                Some(values.camera_movement.as_str()),
            ),
            MotionField::Lighting => push(&mut sentences, "Lighting", values.lighting.as_deref()),
            MotionField::Style => push(&mut sentences, "Style", values.style.as_deref()),
        }
    }

    if !kind.motion_fields().contains(&MotionField::BackgroundMovement) {
        push(
            &mut sentences,
            "Environmental change",
            Some(values.background_movement.as_str()),
        );
    }
    sentences.push(format!(
        "All motion is physically plausible and completes within {}.",
        over
    ));
    sentences.join(" ")
}

fn push(out: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(trim).filter(|v| !v.is_empty()) {
        out.push(format!("{}: {}.", label, value));
    }
}

fn trim(value: &str) -> &str {
    value.trim().trim_end_matches('.').trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecode::Timecode;

    fn shot(fields: ShotFields) -> Shot {
        Shot::new("Doorway", Timecode::ZERO, Timecode::from_millis(2_000)).with_fields(fields)
    }

    #[test]
    fn subject_falls_back_to_opening_then_title() {
        let from_opening = TemplateValues::resolve(
            &shot(ShotFields {
                opening: Some("a man reaching for the handle".into()),
                ..Default::default()
            }),
            &ShotFields::default(),
        );
        assert_eq!(from_opening.subject, "a man reaching for the handle");

        let from_title = TemplateValues::resolve(&shot(ShotFields::default()), &ShotFields::default());
        assert_eq!(from_title.subject, "Doorway");
        assert_eq!(from_title.camera_movement, "static camera");
        assert_eq!(from_title.background_movement, "none");
        assert!(!from_title.distinct_closing);
    }

    #[test]
    fn scene_and_background_stand_in_for_each_other() {
        let values = TemplateValues::resolve(
            &shot(ShotFields {
                background: Some("brick wall".into()),
                ..Default::default()
            }),
            &ShotFields::default(),
        );
        assert_eq!(values.scene.as_deref(), Some("brick wall"));
        assert_eq!(values.background.as_deref(), Some("brick wall"));
        assert_eq!(values.static_sentences(), vec!["Scene: brick wall.".to_string()]);
    }

    #[test]
    fn frame_prompts_share_static_sentences() {
        let values = TemplateValues::resolve(
            &shot(ShotFields {
                subject: Some("a woman in a red sweater".into()),
                opening: Some("she faces the window".into()),
                closing: Some("she has turned toward the camera".into()),
                lighting: Some("soft window light.".into()),
                palette: Some("warm reds".into()),
                background: Some("bookshelves".into()),
                ..Default::default()
            }),
            &ShotFields::default(),
        );
        let first = frame_prompt(&values, Instant::Opening);
        let last = frame_prompt(&values, Instant::Closing);

        assert!(first.starts_with("Opening instant: she faces the window."));
        assert!(last.starts_with("Closing instant: she has turned toward the camera."));
        for sentence in values.static_sentences() {
            assert!(first.contains(&sentence) && last.contains(&sentence), "{sentence}");
        }
        assert!(first.contains("Lighting: soft window light."));
        assert!(values.distinct_closing);
    }

    #[test]
    fn motion_prompt_follows_the_field_set() {
        let values = TemplateValues::resolve(
            &shot(ShotFields {
                subject: Some("a cyclist".into()),
                action: Some("pedals left to right".into()),
                scene: Some("a canal towpath".into()),
                background: Some("moored boats".into()),
                background_movement: Some("water ripples".into()),
                camera_movement: Some("slow pan right".into()),
                lighting: Some("golden hour".into()),
                ..Default::default()
            }),
            &ShotFields::default(),
        );

        let t2v = motion_prompt(&values, TemplateKind::TextToVideo, Duration::from_secs(4));
        assert!(t2v.contains("Action: pedals left to right, over 4.0 seconds."));
        assert!(t2v.contains("Scene: a canal towpath."));
        assert!(t2v.contains("Lighting: golden hour."));
        assert!(t2v.contains("Environmental change: water ripples."));
        assert!(!t2v.contains("Background:"));

        let i2v = motion_prompt(&values, TemplateKind::ImageToVideo, Duration::from_secs(4));
        assert!(i2v.contains("Background: moored boats."));
        assert!(i2v.contains("Background movement: water ripples."));
        assert!(!i2v.contains("Lighting:"));
        assert!(!i2v.contains("Environmental change"));
    }

    #[test]
    fn template_names_parse() {
        assert_eq!("i2v".parse::<TemplateKind>(), Ok(TemplateKind::ImageToVideo));
        assert_eq!("Text-To-Video".parse::<TemplateKind>(), Ok(TemplateKind::TextToVideo));
        assert!("gif".parse::<TemplateKind>().is_err());
    }
}
