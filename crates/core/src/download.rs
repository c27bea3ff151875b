use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{fs, process::Command};
use tracing::{debug, info, warn};

use crate::{
    config::{CookieOptions, Settings},
    error::{Result, ShotlistError},
    paths::{ensure_dir, find_video_in_dir},
};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Video and audio merged to mp4, needs ffmpeg.
const MERGE_FORMAT: &str =
    "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best[height<=?1080]/best";
/// Single-file formats that already carry audio.
const PROGRESSIVE_FORMAT: &str = "best[ext=mp4][acodec!=none]/best[height<=?1080][acodec!=none]/best";

const BLOCKED_MARKERS: &[&str] = &[
    "sign in",
    "login required",
    "log in",
    "private video",
    "members-only",
    "not available in your country",
    "geo restrict",
    "http error 403",
    "forbidden",
];

/// URL in, local media file out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<PathBuf>;
}

/// Shells out to `yt-dlp`.
pub struct YtDlpDownloader {
    program: String,
    downloads_dir: PathBuf,
    timeout: Duration,
    cookies: CookieOptions,
}

impl YtDlpDownloader {
    pub fn new(settings: &Settings) -> Self {
        Self {
            program: "yt-dlp".to_string(),
            downloads_dir: settings.downloads_dir.clone(),
            timeout: settings.download_timeout,
            cookies: settings.cookies.clone(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, url: &str, merge: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            url.into(),
            "--no-playlist".into(),
            "--restrict-filenames".into(),
            "--no-progress".into(),
            "--print".into(),
            "after_move:filepath".into(),
            "--add-header".into(),
            format!("User-Agent:{}", USER_AGENT).into(),
            "-o".into(),
            self.downloads_dir.join("%(title)s.%(ext)s").into_os_string(),
            "-f".into(),
        ];
        if merge {
            args.push(MERGE_FORMAT.into());
            args.push("--merge-output-format".into());
            args.push("mp4".into());
        } else {
            args.push(PROGRESSIVE_FORMAT.into());
        }

        if let Some(browser) = &self.cookies.from_browser {
            let browser_arg = match &self.cookies.browser_profile {
                Some(profile) => format!("{}:{}", browser, profile),
                None => browser.clone(),
            };
            args.push("--cookies-from-browser".into());
            args.push(browser_arg.into());
        }
        if let Some(file) = &self.cookies.file {
            args.push("--cookies".into());
            args.push(file.clone().into_os_string());
        }
        args
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    async fn download(&self, url: &str) -> Result<PathBuf> {
        ensure_dir(&self.downloads_dir).await?;

        let merge = ffmpeg_available().await;
        if !merge {
            warn!("ffmpeg not found, falling back to progressive formats");
        }
        info!(url, dir = %self.downloads_dir.display(), merge, "downloading with yt-dlp");

        let mut command = Command::new(&self.program);
        command
            .args(self.args(url, merge))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(ShotlistError::Timeout {
                    stage: "download",
                    secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ShotlistError::DownloadFailed {
                    url: url.to_string(),
                    reason: format!("{} is not installed or not on PATH", self.program),
                });
            }
            Ok(result) => result?,
        };

        if !output.status.success() {
            return Err(classify_failure(
                url,
                &String::from_utf8_lossy(&output.stderr),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let printed = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(PathBuf::from);
        debug!(?printed, "yt-dlp finished");

        let path = printed
            .filter(|p| p.is_file())
            .or_else(|| find_video_in_dir(&self.downloads_dir))
            .ok_or_else(|| ShotlistError::DownloadFailed {
                url: url.to_string(),
                reason: "yt-dlp succeeded but no video file was found".to_string(),
            })?;

        info!(path = %path.display(), "download complete");
        Ok(path)
    }
}

async fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Map yt-dlp's stderr onto a source error.
pub fn classify_failure(url: &str, stderr: &str) -> ShotlistError {
    let reason = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR"))
        .last()
        .unwrap_or_else(|| stderr.trim())
        .to_string();
    let lower = stderr.to_lowercase();

    if lower.contains("unsupported url") {
        ShotlistError::UnsupportedSource {
            url: url.to_string(),
            reason,
        }
    } else if BLOCKED_MARKERS.iter().any(|m| lower.contains(m)) {
        ShotlistError::BlockedSource {
            url: url.to_string(),
            reason,
        }
    } else {
        ShotlistError::DownloadFailed {
            url: url.to_string(),
            reason,
        }
    }
}

/// URLs from a text file, one per line. Blank lines and `#` comments are skipped.
pub async fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).await?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
