use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use tracing::debug;

use crate::{
    error::{Result, ShotlistError},
    fields::ShotFields,
    timecode::Timecode,
};

/// Free-text analysis of one video, as produced by the analyzer.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    /// Name of the video the report describes (file stem).
    pub source_name: String,
    pub text: String,
    pub path: Option<PathBuf>,
}

static DECLARED_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:[-*+]\s+)?\**\s*(?:total|video|overall|source)\s+duration\s*\**\s*:\s*\**\s*(?:(\d+(?::\d{2}){1,2}(?:\.\d+)?)|(\d+(?:\.\d+)?)\s*(?:s|sec|secs|seconds)\b)",
    )
    .expect("total duration regex")
});

impl AnalysisReport {
    pub fn new(source_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            text: text.into(),
            path: None,
        }
    }

    /// Read a report back from disk. The source name is the file stem with any
    /// `_analysis…` suffix removed.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).await?;
        debug!(path = %path.display(), chars = text.len(), "loaded analysis report");
        Ok(Self {
            source_name: base_name(path),
            text,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Fail with a content error unless there is something to segment.
    pub fn ensure_not_blank(&self) -> Result<()> {
        if self.is_blank() {
            return Err(ShotlistError::EmptyReport(
                self.path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(&self.source_name)),
            ));
        }
        Ok(())
    }

    /// Total video length if the report states one, e.g. `Total Duration: 00:06`
    /// or `Video duration: 6 seconds`.
    ///
    /// A clock that is present but unreadable is an error, not a missing total.
    pub fn declared_duration(&self) -> Result<Option<Timecode>> {
        let Some(caps) = DECLARED_TOTAL.captures(&self.text) else {
            return Ok(None);
        };
        if let Some(clock) = caps.get(1) {
            return clock.as_str().parse().map(Some);
        }
        Ok(caps
            .get(2)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(Timecode::from_secs_f64))
    }
}

/// Strip a trailing `_analysis…` from a report file stem.
pub fn base_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());
    match stem.find("_analysis") {
        Some(idx) if idx > 0 => stem[..idx].to_string(),
        _ => stem,
    }
}

/// Fields stated outside any shot, used as continuity anchors for every sequence.
pub fn continuity_anchors(text_outside_shots: &str) -> ShotFields {
    let (fields, _) = ShotFields::extract(text_outside_shots);
    ShotFields {
        lighting: fields.lighting,
        palette: fields.palette,
        style: fields.style,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_drops_analysis_suffix() {
        assert_eq!(
            base_name(Path::new("reports/street_night_analysis_20240101_120000_ab12cd34.md")),
            "street_night"
        );
        assert_eq!(base_name(Path::new("notes.md")), "notes");
        assert_eq!(base_name(Path::new("_analysis.md")), "_analysis");
    }

    #[test]
    fn declared_duration_accepts_clock_and_seconds() {
        let clock = AnalysisReport::new("a", "# Report\n**Total Duration**: 00:06\n");
        assert_eq!(clock.declared_duration().unwrap(), Some("00:06".parse().unwrap()));

        let seconds = AnalysisReport::new("a", "- Video duration: 12.5 seconds\n");
        assert_eq!(
            seconds.declared_duration().unwrap(),
            Some(Timecode::from_millis(12_500))
        );

        let none = AnalysisReport::new("a", "Duration: 4.0 seconds\n");
        assert_eq!(none.declared_duration().unwrap(), None);
    }

    #[test]
    fn oversized_declared_total_is_an_error() {
        let report = AnalysisReport::new("a", "Total Duration: 5124095576030432:00
");
        let err = report.declared_duration().unwrap_err();
        assert!(matches!(err, ShotlistError::InvalidTimecode(_)));
    }

    #[test]
    fn whitespace_report_is_blank() {
        let report = AnalysisReport::new("clip", " \n\t\n");
        let err = report.ensure_not_blank().unwrap_err();
        assert!(matches!(err, ShotlistError::EmptyReport(_)));
    }

    #[tokio::test]
    async fn load_reads_text_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip_analysis_20240101_000000.md");
        std::fs::write(&path, "# Video Analysis Report\n").unwrap();

        let report = AnalysisReport::load(&path).await.unwrap();
        assert_eq!(report.source_name, "clip");
        assert_eq!(report.path.as_deref(), Some(path.as_path()));
        assert!(!report.is_blank());
    }
}
