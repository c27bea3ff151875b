use tracing::{debug, info};

use crate::{
    error::Result,
    fields::ShotFields,
    report::AnalysisReport,
    segment::{MarkerSegmenter, Segmenter},
    sequence::{FrameStrategy, Prompts, Sequence, validate_boundaries},
    template::{Instant, TemplateKind, TemplateValues, frame_prompt, motion_prompt},
    timecode::Timecode,
};

/// Everything that goes into one sequences file.
#[derive(Clone, Debug)]
pub struct SequenceDocument {
    pub source_name: String,
    pub total_duration: Timecode,
    pub anchors: ShotFields,
    pub template: TemplateKind,
    pub sequences: Vec<Sequence>,
}

/// Report in, ordered sequences with three prompts each out.
pub struct SequenceFormatter {
    segmenter: Box<dyn Segmenter>,
    template: TemplateKind,
}

impl Default for SequenceFormatter {
    fn default() -> Self {
        Self::new(Box::new(MarkerSegmenter), TemplateKind::default())
    }
}

impl SequenceFormatter {
    pub fn new(segmenter: Box<dyn Segmenter>, template: TemplateKind) -> Self {
        Self {
            segmenter,
            template,
        }
    }

    pub fn segmenter_name(&self) -> &'static str {
        self.segmenter.name()
    }

    pub fn template(&self) -> TemplateKind {
        self.template
    }

    pub async fn format(&self, report: &AnalysisReport) -> Result<SequenceDocument> {
        report.ensure_not_blank()?;

        let segmentation = self.segmenter.segment(report).await?;
        let declared = report.declared_duration()?;
        debug!(
            strategy = self.segmenter.name(),
            shots = segmentation.shots.len(),
            declared = ?declared.map(|d| d.to_string()),
            "segmented report"
        );
        validate_boundaries(&segmentation.shots, declared)?;

        let mut sequences = Vec::with_capacity(segmentation.shots.len());
        for (i, shot) in segmentation.shots.iter().enumerate() {
            // validate_boundaries guarantees end > start
            let duration = shot.end.since(shot.start).unwrap_or_default();
            let values = TemplateValues::resolve(shot, &segmentation.anchors);

            sequences.push(Sequence {
                index: i + 1,
                title: shot.title.clone(),
                start: shot.start,
                end: shot.end,
                duration,
                strategy: FrameStrategy::choose(duration, values.distinct_closing),
                prompts: Prompts {
                    first_frame: frame_prompt(&values, Instant::Opening),
                    last_frame: frame_prompt(&values, Instant::Closing),
                    motion: motion_prompt(&values, self.template, duration),
                },
            });
        }

        let total_duration = sequences.last().map(|s| s.end).unwrap_or_default();
        info!(
            source = %report.source_name,
            sequences = sequences.len(),
            total = %total_duration,
            "formatted sequences"
        );

        Ok(SequenceDocument {
            source_name: report.source_name.clone(),
            total_duration,
            anchors: segmentation.anchors,
            template: self.template,
            sequences,
        })
    }
}
