use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs;
use uuid::Uuid;

use crate::error::Result;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov", "avi"];

/// Create `dir` (and parents) if missing.
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).await?;
    Ok(())
}

/// Short id that keeps concurrent runs from writing the same file.
pub fn new_run_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `<reports_dir>/<stem>_analysis_<ts>_<run>.md`
pub fn report_path(reports_dir: &Path, video: &Path, run_id: &str) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    reports_dir.join(format!("{}_analysis_{}_{}.md", stem, timestamp(), run_id))
}

/// `<sequences_dir>/<base>_sequences_<ts>_<run>.md`
pub fn sequences_path(sequences_dir: &Path, base: &str, run_id: &str) -> PathBuf {
    sequences_dir.join(format!("{}_sequences_{}_{}.md", base, timestamp(), run_id))
}

/// Most recently modified video file in `dir`
pub fn find_video_in_dir(dir: &Path) -> Option<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return None;
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        })
        .max_by_key(|path| {
            std::fs::metadata(path)
                .and_then(|m| m.modified())
                .ok()
        })
}

pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "mpeg" => "video/mpeg",
        "mov" => "video/mov",
        "avi" => "video/avi",
        "flv" => "video/x-flv",
        "mpg" => "video/mpg",
        "webm" => "video/webm",
        "wmv" => "video/wmv",
        "3gp" => "video/3gpp",
        _ => "video/mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_short_and_distinct() {
        let a = new_run_id();
        let b = new_run_id();
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn output_names_follow_the_pattern() {
        let report = report_path(Path::new("reports"), Path::new("downloads/Clip.mp4"), "ab12cd34");
        let name = report.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Clip_analysis_"));
        assert!(name.ends_with("_ab12cd34.md"));
        assert_eq!(report.parent(), Some(Path::new("reports")));

        let seq = sequences_path(Path::new("sequences"), "Clip", "ab12cd34");
        let name = seq.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Clip_sequences_"));
        // Clip_sequences_YYYYmmdd_HHMMSS_ab12cd34.md
        assert_eq!(name.len(), "Clip_sequences_".len() + 15 + 1 + 8 + 3);
    }

    #[test]
    fn mime_types_by_extension() {
        assert_eq!(mime_type_for(Path::new("a.MOV")), "video/mov");
        assert_eq!(mime_type_for(Path::new("a.3gp")), "video/3gpp");
        assert_eq!(mime_type_for(Path::new("a.flv")), "video/x-flv");
        assert_eq!(mime_type_for(Path::new("a")), "video/mp4");
    }

    #[test]
    fn finds_videos_only() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_video_in_dir(dir.path()), None);

        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("clip.webm"), "x").unwrap();
        assert_eq!(
            find_video_in_dir(dir.path()),
            Some(dir.path().join("clip.webm"))
        );
    }

    #[tokio::test]
    async fn ensure_dir_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
