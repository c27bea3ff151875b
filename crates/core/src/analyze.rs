use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::{
    error::{Result, ShotlistError},
    gemini::{GeminiClient, Part},
    paths::{ensure_dir, mime_type_for, report_path},
    report::AnalysisReport,
};

/// Above this the video goes through the File API instead of inline base64.
pub const INLINE_LIMIT_BYTES: u64 = 20 * 1024 * 1024;

const ANALYSIS_PROMPT: &str = r#"You are a video reconstruction analyst. Your report will be used to recreate this video with text-to-image and image-to-video models, so describe every visual variable in concrete, prompt-ready language.

Write a Markdown report with EXACTLY this structure and ordering:

# Video Analysis Report

Total Duration: MM:SS

## Scene Overview
Two or three sentences on what the video shows, where, and when.

## Timeline Breakdown
Cover 100% of the video from 00:00 to the final frame, shot by shot, strictly in time order. A new shot starts at every cut, transition or significant camera/scene change. Each shot starts exactly where the previous one ended.

For EVERY shot write:

### Shot [N]: [Concise descriptive title]
- Timestamp: MM:SS–MM:SS (plain digits, no brackets)
- Duration: [N.N seconds]
- Subject: [appearance, clothing, posture, expression of the main subject]
- Action: [what the subject does over the shot]
- Scene: [location, foreground and background layout]
- Background: [background only]
- Background Movement: [what moves in the background, or none]
- Camera: [shot size, angle, lens estimate, subject screen position]
- Camera Movement: [pan/tilt/dolly/track/zoom/handheld with direction and speed, or static]
- Lighting: [key/fill/rim direction, quality, colour temperature]
- Color Palette: [dominant, secondary and accent colours]
- Opening Frame: [the exact visual state at the first instant of the shot]
- Closing Frame: [the exact visual state at the last instant of the shot]

## Visual Composition
Framing, depth layers, leading lines, negative space.

## Lighting & Color
Light sources, contrast ratio, colour grading across the whole video.

## Characters & Objects
Every person, vehicle and significant object with consistent identifiers, appearance and where they appear.

## Textures & Environment
Surfaces, materials, weather, atmospheric particles.

## Cinematography Style
Movement patterns, pacing, editing rhythm.

## Visual Style Consistency
- Lighting: [lighting style shared by the whole video]
- Color Palette: [palette shared by the whole video]
- Film Look: [film stock or colour science, grain, era]

## Cinematography Quality Profile
- Camera/Sensor: [estimate]
- Lens: [focal lengths, aperture character, distortion]
- Film Stock/Color Science: [estimate]
- Exposure: [key, dynamic range, clipping]
- Motion Characteristics: [frame rate feel, shutter, motion blur]

RULES:
- Use MM:SS timestamps everywhere; never put two timestamp ranges on one Timestamp line
- Describe only what is visible; do not invent details
- Keep the labels exactly as written above"#;

const ANALYSIS_REQUEST: &str =
    "Analyze this video and write the report in the exact structure described.";

/// Video file in, free-text analysis out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    async fn analyze(&self, video: &Path) -> Result<String>;
}

pub struct GeminiAnalyzer {
    client: GeminiClient,
}

impl GeminiAnalyzer {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    async fn video_part(&self, video: &Path, size: u64) -> Result<Part> {
        let mime_type = mime_type_for(video).to_string();
        if size <= INLINE_LIMIT_BYTES {
            debug!(size, mime = %mime_type, "sending video inline");
            let data = fs::read(video).await?;
            return Ok(Part::InlineData { mime_type, data });
        }

        info!(size, "video too large for inline data, using the File API");
        let uploaded = self.client.upload_file(video, &mime_type).await?;
        let active = self.client.wait_until_active(uploaded).await?;
        Ok(Part::FileData {
            mime_type,
            file_uri: active.uri,
        })
    }
}

#[async_trait]
impl MediaAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, video: &Path) -> Result<String> {
        let metadata = fs::metadata(video)
            .await
            .map_err(|_| ShotlistError::VideoNotFound(video.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(ShotlistError::VideoNotFound(video.to_path_buf()));
        }

        info!(
            video = %video.display(),
            model = %self.client.model(),
            temperature = self.client.temperature(),
            "analyzing video"
        );
        let part = self.video_part(video, metadata.len()).await?;
        let text = self
            .client
            .generate(
                ANALYSIS_PROMPT,
                &[part, Part::Text(ANALYSIS_REQUEST.to_string())],
                false,
            )
            .await?;
        debug!(chars = text.len(), "analysis received");
        Ok(text)
    }
}

/// Write `text` to the reports directory and hand it back as a report.
pub async fn save_report(
    video: &Path,
    text: String,
    reports_dir: &Path,
    run_id: &str,
) -> Result<AnalysisReport> {
    ensure_dir(reports_dir).await?;
    let path = report_path(reports_dir, video, run_id);
    fs::write(&path, &text).await?;
    info!(path = %path.display(), "saved analysis report");

    let source_name = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    Ok(AnalysisReport {
        source_name,
        text,
        path: Some(path),
    })
}
