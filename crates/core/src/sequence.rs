use std::{fmt, time::Duration};

use crate::{
    error::{Result, ShotlistError},
    segment::Shot,
    timecode::Timecode,
};

/// Shorter than this and without a distinct closing state, one keyframe is enough.
pub const SINGLE_ANCHOR_THRESHOLD: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStrategy {
    SingleAnchor,
    FirstAndLast,
}

impl FrameStrategy {
    pub fn choose(duration: Duration, distinct_closing: bool) -> Self {
        if duration < SINGLE_ANCHOR_THRESHOLD && !distinct_closing {
            FrameStrategy::SingleAnchor
        } else {
            FrameStrategy::FirstAndLast
        }
    }
}

impl fmt::Display for FrameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStrategy::SingleAnchor => f.write_str("Single Anchor Frame"),
            FrameStrategy::FirstAndLast => f.write_str("First+Last Frames"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompts {
    pub first_frame: String,
    pub last_frame: String,
    pub motion: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    /// 1-based
    pub index: usize,
    pub title: String,
    pub start: Timecode,
    pub end: Timecode,
    pub duration: Duration,
    pub strategy: FrameStrategy,
    pub prompts: Prompts,
}

/// Checks that the shots tile the timeline: first starts at 00:00, each
/// starts where the previous ended, every one is non-empty, and the last ends
/// at `declared_total` when the report states one.
pub fn validate_boundaries(shots: &[Shot], declared_total: Option<Timecode>) -> Result<()> {
    let invalid = |reason: String| Err(ShotlistError::InvalidBoundaries { reason });

    let Some(first) = shots.first() else {
        return Err(ShotlistError::Unsegmentable {
            reason: "no shots found".to_string(),
        });
    };
    if first.start != Timecode::ZERO {
        return invalid(format!(
            "first shot \"{}\" starts at {} instead of 00:00",
            first.title, first.start
        ));
    }

    let mut expected_start = Timecode::ZERO;
    for (i, shot) in shots.iter().enumerate() {
        if shot.start > expected_start {
            return invalid(format!(
                "gap between {} and {} before shot {} \"{}\"",
                expected_start,
                shot.start,
                i + 1,
                shot.title
            ));
        }
        if shot.start < expected_start {
            return invalid(format!(
                "shot {} \"{}\" starts at {} and overlaps the previous shot ending at {}",
                i + 1,
                shot.title,
                shot.start,
                expected_start
            ));
        }
        if shot.end <= shot.start {
            return invalid(format!(
                "shot {} \"{}\" has no duration ({}–{})",
                i + 1,
                shot.title,
                shot.start,
                shot.end
            ));
        }
        expected_start = shot.end;
    }

    if let Some(total) = declared_total {
        if expected_start != total {
            return invalid(format!(
                "shots end at {} but the video is {} long",
                expected_start, total
            ));
        }
    }

    Ok(())
}
