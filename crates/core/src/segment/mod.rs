//! Segmentation strategies: report text in, ordered shots out.

pub mod markers;
pub mod model;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::Result, fields::ShotFields, report::AnalysisReport, timecode::Timecode};

pub use markers::MarkerSegmenter;
pub use model::ModelSegmenter;

/// One shot boundary plus whatever template values the strategy found for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub title: String,
    pub start: Timecode,
    pub end: Timecode,
    #[serde(default)]
    pub fields: ShotFields,
}

impl Shot {
    pub fn new(title: impl Into<String>, start: Timecode, end: Timecode) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            fields: ShotFields::default(),
        }
    }

    pub fn with_fields(mut self, fields: ShotFields) -> Self {
        self.fields = fields;
        self
    }
}

/// What a strategy hands back to the formatter.
#[derive(Clone, Debug, Default)]
pub struct Segmentation {
    pub shots: Vec<Shot>,
    /// Report-wide lighting/palette/style, shared by every sequence.
    pub anchors: ShotFields,
}

#[async_trait]
pub trait Segmenter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Shots in report order. Boundary validation is the formatter's job.
    async fn segment(&self, report: &AnalysisReport) -> Result<Segmentation>;
}

/// Hands back a fixed list of shots regardless of the report.
pub struct StaticSegmenter {
    segmentation: Segmentation,
}

impl StaticSegmenter {
    pub fn new(shots: Vec<Shot>) -> Self {
        Self {
            segmentation: Segmentation {
                shots,
                anchors: ShotFields::default(),
            },
        }
    }

    pub fn with_anchors(mut self, anchors: ShotFields) -> Self {
        self.segmentation.anchors = anchors;
        self
    }
}

#[async_trait]
impl Segmenter for StaticSegmenter {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn segment(&self, _report: &AnalysisReport) -> Result<Segmentation> {
        Ok(self.segmentation.clone())
    }
}
