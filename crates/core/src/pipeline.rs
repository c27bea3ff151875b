use std::{
    fmt,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::{info, instrument};

use crate::{
    analyze::{MediaAnalyzer, save_report},
    download::MediaDownloader,
    error::{Result, ShotlistError},
    formatter::{SequenceDocument, SequenceFormatter},
    paths::{ensure_dir, new_run_id, sequences_path},
    render::save_sequences,
    report::{AnalysisReport, base_name},
};

/// Where a pipeline run gets its video from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    Url(String),
    Path(PathBuf),
}

impl VideoSource {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            VideoSource::Url(trimmed.to_string())
        } else {
            VideoSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::Url(url) => f.write_str(url),
            VideoSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Download,
    Analyze,
    Format,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => f.write_str("Downloading video..."),
            Stage::Analyze => f.write_str("Analyzing video..."),
            Stage::Format => f.write_str("Generating sequences..."),
        }
    }
}

/// Files produced by one run.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub run_id: String,
    pub video: PathBuf,
    pub report: PathBuf,
    pub sequences: PathBuf,
    pub sequence_count: usize,
}

/// Analyze a local video and save the report.
pub async fn analyze_video(
    analyzer: &dyn MediaAnalyzer,
    video: &Path,
    reports_dir: &Path,
    run_id: &str,
) -> Result<AnalysisReport> {
    let text = analyzer.analyze(video).await?;
    save_report(video, text, reports_dir, run_id).await
}

/// Format a report and save the sequences document next to the others.
pub async fn generate_sequences(
    formatter: &SequenceFormatter,
    report: &AnalysisReport,
    sequences_dir: &Path,
    run_id: &str,
) -> Result<(SequenceDocument, PathBuf)> {
    let doc = formatter.format(report).await?;

    ensure_dir(sequences_dir).await?;
    let base = match &report.path {
        Some(path) => base_name(path),
        None => report.source_name.clone(),
    };
    let path = sequences_path(sequences_dir, &base, run_id);
    save_sequences(&doc, &path).await?;
    Ok((doc, path))
}

/// download → analyze → format, strictly in order.
pub struct Pipeline {
    downloader: Box<dyn MediaDownloader>,
    analyzer: Box<dyn MediaAnalyzer>,
    formatter: SequenceFormatter,
    reports_dir: PathBuf,
    sequences_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        downloader: Box<dyn MediaDownloader>,
        analyzer: Box<dyn MediaAnalyzer>,
        formatter: SequenceFormatter,
        reports_dir: PathBuf,
        sequences_dir: PathBuf,
    ) -> Self {
        Self {
            downloader,
            analyzer,
            formatter,
            reports_dir,
            sequences_dir,
        }
    }

    pub async fn run(&self, source: &VideoSource) -> Result<PipelineOutput> {
        self.run_with(source, |_| {}).await
    }

    /// Same as [`Pipeline::run`], calling `on_stage` as each stage begins.
    #[instrument(skip_all, fields(source = %source))]
    pub async fn run_with(
        &self,
        source: &VideoSource,
        mut on_stage: impl FnMut(Stage) + Send,
    ) -> Result<PipelineOutput> {
        let run_id = new_run_id();

        let video = match source {
            VideoSource::Url(url) => {
                on_stage(Stage::Download);
                self.downloader.download(url).await?
            }
            VideoSource::Path(path) => {
                if !fs::try_exists(path).await.unwrap_or(false) {
                    return Err(ShotlistError::VideoNotFound(path.clone()));
                }
                path.clone()
            }
        };

        on_stage(Stage::Analyze);
        let report =
            analyze_video(self.analyzer.as_ref(), &video, &self.reports_dir, &run_id).await?;

        on_stage(Stage::Format);
        let (doc, sequences) =
            generate_sequences(&self.formatter, &report, &self.sequences_dir, &run_id).await?;

        info!(run_id, sequences = doc.sequences.len(), "pipeline finished");
        Ok(PipelineOutput {
            run_id,
            video,
            report: report.path.unwrap_or_default(),
            sequences,
            sequence_count: doc.sequences.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{analyze::MockMediaAnalyzer, download::MockMediaDownloader};

    const TWO_SHOTS: &str = "\
# Video Analysis Report

Total Duration: 00:06

## Timeline Breakdown
### Shot 1: Doorway
- Timestamp: 00:00–00:02
- Subject: a man in a grey coat
### Shot 2: Street
- Timestamp: 00:02–00:06
- Subject: the man crossing a wet street
## Visual Style Consistency
- Lighting: sodium street lamps
";

    fn pipeline(
        dir: &Path,
        downloader: MockMediaDownloader,
        analyzer: MockMediaAnalyzer,
    ) -> Pipeline {
        Pipeline::new(
            Box::new(downloader),
            Box::new(analyzer),
            SequenceFormatter::default(),
            dir.join("reports"),
            dir.join("sequences"),
        )
    }

    #[test]
    fn parses_sources() {
        assert_eq!(
            VideoSource::parse(" https://youtu.be/x "),
            VideoSource::Url("https://youtu.be/x".into())
        );
        assert_eq!(
            VideoSource::parse("HTTP://a"),
            VideoSource::Url("HTTP://a".into())
        );
        assert_eq!(
            VideoSource::parse("downloads/clip.mp4"),
            VideoSource::Path(PathBuf::from("downloads/clip.mp4"))
        );
    }

    #[tokio::test]
    async fn url_runs_every_stage_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"fake").unwrap();

        let mut downloader = MockMediaDownloader::new();
        let downloaded = video.clone();
        downloader
            .expect_download()
            .withf(|url| url == "https://example.com/v")
            .times(1)
            .returning(move |_| Ok(downloaded.clone()));

        let mut analyzer = MockMediaAnalyzer::new();
        let expected = video.clone();
        analyzer
            .expect_analyze()
            .withf(move |p| p == expected.as_path())
            .times(1)
            .returning(|_| Ok(TWO_SHOTS.to_string()));

        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = stages.clone();
        let output = pipeline(dir.path(), downloader, analyzer)
            .run_with(&VideoSource::parse("https://example.com/v"), move |s| {
                seen.lock().unwrap().push(s)
            })
            .await
            .unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![Stage::Download, Stage::Analyze, Stage::Format]
        );
        assert_eq!(output.video, video);
        assert_eq!(output.sequence_count, 2);
        assert_eq!(std::fs::read_to_string(&output.report).unwrap(), TWO_SHOTS);

        let sequences = std::fs::read_to_string(&output.sequences).unwrap();
        assert!(sequences.contains("## Sequence 2: Street"));
        let name = output.sequences.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("clip_sequences_"));
        assert!(name.ends_with(&format!("_{}.md", output.run_id)));
    }

    #[tokio::test]
    async fn missing_local_file_stops_before_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = MockMediaDownloader::new();
        downloader.expect_download().never();
        let mut analyzer = MockMediaAnalyzer::new();
        analyzer.expect_analyze().never();

        let err = pipeline(dir.path(), downloader, analyzer)
            .run(&VideoSource::parse("nowhere/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShotlistError::VideoNotFound(_)));
    }

    #[tokio::test]
    async fn analysis_failure_writes_no_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"fake").unwrap();

        let mut analyzer = MockMediaAnalyzer::new();
        analyzer.expect_analyze().returning(|_| {
            Err(ShotlistError::ServiceFailed {
                status: 429,
                body: "quota".into(),
            })
        });

        let err = pipeline(dir.path(), MockMediaDownloader::new(), analyzer)
            .run(&VideoSource::Path(video))
            .await
            .unwrap_err();
        assert!(matches!(err, ShotlistError::ServiceFailed { status: 429, .. }));
        assert!(!dir.path().join("reports").exists());
        assert!(!dir.path().join("sequences").exists());
    }

    #[tokio::test]
    async fn unsegmentable_report_keeps_the_report_but_no_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"fake").unwrap();

        let mut analyzer = MockMediaAnalyzer::new();
        analyzer
            .expect_analyze()
            .returning(|_| Ok("# Overview\nNothing timed here.\n".to_string()));

        let err = pipeline(dir.path(), MockMediaDownloader::new(), analyzer)
            .run(&VideoSource::Path(video))
            .await
            .unwrap_err();
        assert!(matches!(err, ShotlistError::Unsegmentable { .. }));
        assert_eq!(std::fs::read_dir(dir.path().join("reports")).unwrap().count(), 1);
        assert!(!dir.path().join("sequences").exists());
    }

    #[tokio::test]
    async fn repeated_runs_never_share_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.mp4");
        let second = dir.path().join("b.mp4");
        std::fs::write(&first, b"a").unwrap();
        std::fs::write(&second, b"b").unwrap();

        let mut analyzer = MockMediaAnalyzer::new();
        analyzer.expect_analyze().times(3).returning(|p| {
            let marker = p.file_stem().unwrap().to_string_lossy().to_string();
            Ok(format!("[00:00-00:03] {marker}\n- Subject: {marker} subject\n"))
        });
        let pipeline = pipeline(dir.path(), MockMediaDownloader::new(), analyzer);

        let mut outputs = Vec::new();
        for video in [&first, &second, &first] {
            outputs.push(pipeline.run(&VideoSource::Path(video.clone())).await.unwrap());
        }

        let mut files: Vec<&PathBuf> = outputs
            .iter()
            .flat_map(|o| [&o.report, &o.sequences])
            .collect();
        files.sort();
        files.dedup();
        assert_eq!(files.len(), 6);

        let b_sequences = std::fs::read_to_string(&outputs[1].sequences).unwrap();
        assert!(b_sequences.contains("b subject"));
        assert!(!b_sequences.contains("a subject"));
    }
}
