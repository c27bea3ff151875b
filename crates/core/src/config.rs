//! Runtime settings gathered from the environment and `.env` files.

use std::{path::PathBuf, time::Duration};

pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Cookie options forwarded to yt-dlp for sites that gate media behind a login.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub from_browser: Option<String>,
    pub browser_profile: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub downloads_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub sequences_dir: PathBuf,
    pub download_timeout: Duration,
    pub request_timeout: Duration,
    pub temperature: f32,
    pub cookies: CookieOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            reports_dir: PathBuf::from("reports"),
            sequences_dir: PathBuf::from("sequences"),
            download_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temperature: DEFAULT_TEMPERATURE,
            cookies: CookieOptions::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, fallback: Duration| {
            non_empty(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            downloads_dir: non_empty("SHOTLIST_DOWNLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.downloads_dir),
            reports_dir: non_empty("SHOTLIST_REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.reports_dir),
            sequences_dir: non_empty("SHOTLIST_SEQUENCES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.sequences_dir),
            download_timeout: secs("SHOTLIST_DOWNLOAD_TIMEOUT_SECS", defaults.download_timeout),
            request_timeout: secs("SHOTLIST_REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            temperature: non_empty("SHOTLIST_TEMPERATURE")
                .and_then(|v| v.trim().parse::<f32>().ok())
                .filter(|t| (0.0..=2.0).contains(t))
                .unwrap_or(defaults.temperature),
            cookies: CookieOptions {
                from_browser: non_empty("YTDLP_COOKIES_FROM_BROWSER"),
                browser_profile: non_empty("YTDLP_COOKIES_PROFILE"),
                file: non_empty("YTDLP_COOKIES_FILE").map(PathBuf::from),
            },
        }
    }
}

/// Load `.env` from the working directory, then `<config_dir>/shotlist/.env`.
/// Variables already set in the process win.
///
/// Returns the files that were read. Call it before the tracing subscriber is
/// installed so `RUST_LOG` from a `.env` takes effect.
pub fn load_dotenv() -> Vec<PathBuf> {
    let mut loaded = Vec::new();
    if let Ok(path) = dotenv::dotenv() {
        loaded.push(path);
    }

    if let Some(dir) = dirs::config_dir() {
        let path = dir.join("shotlist").join(".env");
        if path.exists() && dotenv::from_path(&path).is_ok() {
            loaded.push(path);
        }
    }
    loaded
}
