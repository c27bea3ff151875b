pub mod analyze;
pub mod config;
pub mod download;
pub mod error;
pub mod fields;
pub mod formatter;
pub mod gemini;
pub mod paths;
pub mod pipeline;
pub mod provider;
pub mod render;
pub mod report;
pub mod segment;
pub mod sequence;
pub mod template;
pub mod timecode;

pub use analyze::{GeminiAnalyzer, MediaAnalyzer, save_report};
pub use config::{CookieOptions, Settings, load_dotenv};
pub use download::{MediaDownloader, YtDlpDownloader, read_url_file};
pub use error::{ErrorKind, Result, ShotlistError};
pub use fields::ShotFields;
pub use formatter::{SequenceDocument, SequenceFormatter};
pub use gemini::GeminiClient;
pub use pipeline::{
    Pipeline, PipelineOutput, Stage, VideoSource, analyze_video, generate_sequences,
};
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use render::{render_sequences, save_sequences};
pub use report::AnalysisReport;
pub use segment::{MarkerSegmenter, ModelSegmenter, Segmenter, Shot, StaticSegmenter};
pub use sequence::{FrameStrategy, Prompts, Sequence};
pub use template::TemplateKind;
pub use timecode::Timecode;
