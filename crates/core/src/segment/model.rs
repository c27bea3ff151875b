use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::{Result, ShotlistError},
    fields::ShotFields,
    gemini::{GeminiClient, Part},
    report::AnalysisReport,
    segment::{Segmentation, Segmenter, Shot},
    timecode::Timecode,
};

const SEGMENTATION_PROMPT: &str = r#"You split a video analysis report into its shots.

INPUT: a markdown analysis of one video.

OUTPUT: ONLY valid JSON, no markdown, matching:
{
  "anchors": {"lighting": "...", "palette": "...", "style": "..."},
  "shots": [
    {
      "title": "Short descriptive label",
      "start": "MM:SS",
      "end": "MM:SS",
      "fields": {
        "subject": "appearance, clothing, posture, expression",
        "action": "what the subject does during the shot",
        "scene": "location, foreground, background",
        "background": "background description only",
        "background_movement": "what moves in the background, or none",
        "camera": "framing, angle, lens",
        "camera_movement": "pan/tilt/dolly/zoom/track or static",
        "lighting": "light sources, direction, quality",
        "palette": "dominant colours",
        "style": "film look, era, grain",
        "opening": "the subject at the first instant of the shot",
        "closing": "the subject at the last instant of the shot"
      }
    }
  ]
}

RULES:
- Shots are in time order, start at 00:00, and each shot starts exactly where the previous one ended
- The last shot ends at the end of the video
- Copy values from the report; do not invent details it does not contain
- Omit a field rather than guessing"#;

#[derive(Debug, Deserialize)]
struct ModelOutput {
    #[serde(default)]
    anchors: ShotFields,
    shots: Vec<ModelShot>,
}

#[derive(Debug, Deserialize)]
struct ModelShot {
    #[serde(default)]
    title: String,
    start: Timecode,
    end: Timecode,
    #[serde(default)]
    fields: ShotFields,
}

/// Asks the model for the shot list as JSON. Non-deterministic.
pub struct ModelSegmenter {
    client: GeminiClient,
}

impl ModelSegmenter {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Segmenter for ModelSegmenter {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn segment(&self, report: &AnalysisReport) -> Result<Segmentation> {
        info!(model = %self.client.model(), "segmenting report with a model pass");
        let content = self
            .client
            .generate(
                SEGMENTATION_PROMPT,
                &[Part::Text(format!(
                    "VIDEO ANALYSIS REPORT:\n\n{}",
                    report.text
                ))],
                true,
            )
            .await?;

        parse_model_output(&content)
    }
}

fn parse_model_output(content: &str) -> Result<Segmentation> {
    let json = strip_code_fence(content);
    let output: ModelOutput =
        serde_json::from_str(json).map_err(|e| ShotlistError::Unsegmentable {
            reason: format!("model returned unparsable shots: {}", e),
        })?;
    debug!(shots = output.shots.len(), "model segmentation parsed");

    let shots = output
        .shots
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let title = if s.title.trim().is_empty() {
                format!("Sequence {}", i + 1)
            } else {
                s.title.trim().to_string()
            };
            Shot::new(title, s.start, s.end).with_fields(s.fields)
        })
        .collect();

    Ok(Segmentation {
        shots,
        anchors: output.anchors,
    })
}

/// Models sometimes wrap JSON in a ```json fence despite being told not to.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
