use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{
    error::Result,
    fields::ShotFields,
    report::{AnalysisReport, continuity_anchors},
    segment::{Segmentation, Segmenter, Shot},
    timecode::Timecode,
};

const CLOCK: &str = r"\d{1,2}(?::\d{2}){1,2}(?:\.\d+)?";

static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?P<start>{CLOCK})\s*(?:–|—|-|to)\s*(?P<end>{CLOCK})\b"
    ))
    .expect("range regex")
});

static MARKER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s|\[|(?:[-*+]\s+)?\**\s*(?:timestamp|time range|timecode|time)\b)")
        .expect("marker prefix regex")
});

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(#{1,6})\s+(.*?)\s*#*\s*$").expect("heading regex"));

/// `Shot 2:`, `Scene 3 -`, `Sequence 1.` and the like at the start of a title.
static SHOT_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:shot|scene|sequence)\s*#?\s*\d+\b\s*[:.\-–—|]?\s*")
        .expect("shot label regex")
});

/// Splits a report at lines that carry exactly one timestamp range and read like
/// a shot header: a markdown heading, a `[..]` prefix, or a `Timestamp:` label.
///
/// A shot runs until the next marker or the next `#`/`##` heading. Once shots
/// exist, a `#`/`##` heading that is neither a marker nor a `Shot N` heading
/// ends the timeline and later ranges are ignored. Labelled lines inside a shot
/// become template fields; labelled lines outside every shot become the
/// continuity anchors.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerSegmenter;

struct OpenShot {
    title: Option<String>,
    start: Timecode,
    end: Timecode,
    body: String,
}

impl OpenShot {
    fn close(self, index: usize) -> Shot {
        let (fields, labelled_title) = ShotFields::extract(&self.body);
        let title = labelled_title
            .or(self.title)
            .map(|t| strip_shot_label(&t))
            .unwrap_or_else(|| format!("Sequence {}", index + 1));
        Shot::new(title, self.start, self.end).with_fields(fields)
    }
}

impl MarkerSegmenter {
    pub fn segment_text(text: &str) -> Result<Segmentation> {
        let mut shots = Vec::new();
        let mut outside = String::new();
        let mut current: Option<OpenShot> = None;
        let mut pending_heading: Option<String> = None;
        let mut timeline_closed = false;

        for line in text.lines() {
            let marker = if timeline_closed {
                None
            } else {
                parse_marker(line)?
            };
            if let Some((start, end, marker_title)) = marker {
                if let Some(open) = current.take() {
                    shots.push(open.close(shots.len()));
                }
                current = Some(OpenShot {
                    title: marker_title.or_else(|| pending_heading.take()),
                    start,
                    end,
                    body: String::new(),
                });
                pending_heading = None;
                continue;
            }

            if let Some((level, heading)) = parse_heading(line) {
                if level <= 2 {
                    if let Some(open) = current.take() {
                        shots.push(open.close(shots.len()));
                    }
                    if !shots.is_empty() && !SHOT_LABEL.is_match(&heading) {
                        timeline_closed = true;
                    }
                }
                pending_heading = Some(heading).filter(|h| !h.is_empty());
            }

            let sink = match current.as_mut() {
                Some(open) => &mut open.body,
                None => &mut outside,
            };
            sink.push_str(line);
            sink.push('\n');
        }

        if let Some(open) = current.take() {
            shots.push(open.close(shots.len()));
        }

        debug!(shots = shots.len(), "marker segmentation finished");
        Ok(Segmentation {
            shots,
            anchors: continuity_anchors(&outside),
        })
    }
}

#[async_trait]
impl Segmenter for MarkerSegmenter {
    fn name(&self) -> &'static str {
        "markers"
    }

    async fn segment(&self, report: &AnalysisReport) -> Result<Segmentation> {
        Self::segment_text(&report.text)
    }
}

/// `Some((start, end, title))` when `line` is a shot marker. Only headings
/// contribute a title.
fn parse_marker(line: &str) -> Result<Option<(Timecode, Timecode, Option<String>)>> {
    if !MARKER_PREFIX.is_match(line) {
        return Ok(None);
    }
    let mut ranges = RANGE.captures_iter(line);
    let Some(caps) = ranges.next() else {
        return Ok(None);
    };
    if ranges.next().is_some() {
        return Ok(None);
    }

    let start: Timecode = caps["start"].parse()?;
    let end: Timecode = caps["end"].parse()?;

    let title = parse_heading(line).and_then(|(_, text)| {
        let without_range = RANGE.replace(&text, " ");
        let words: Vec<&str> = without_range
            .split(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')'))
            .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
            .collect();
        let joined = words.join(" ");
        let title = joined.trim_end_matches([':', '-', '–', '—', '|', ',']).trim();
        (!title.is_empty()).then(|| title.to_string())
    });

    Ok(Some((start, end, title)))
}

/// Drops a leading `Shot N:` so rendered headings are not numbered twice.
/// A title that is nothing but the label is kept as is.
fn strip_shot_label(title: &str) -> String {
    let rest = SHOT_LABEL.replace(title, "");
    let rest = rest.trim();
    if rest.is_empty() {
        title.trim().to_string()
    } else {
        rest.to_string()
    }
}

fn parse_heading(line: &str) -> Option<(usize, String)> {
    let caps = HEADING.captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let text = caps.get(2)?.as_str().replace('*', "");
    Some((level, text.trim().to_string()))
}
