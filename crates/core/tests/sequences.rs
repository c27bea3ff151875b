use std::time::Duration;

use shotlist_core::{
    AnalysisReport, ErrorKind, SequenceFormatter, Shot, ShotFields, ShotlistError,
    StaticSegmenter, TemplateKind, Timecode, generate_sequences, template::TemplateValues,
};

const STREET_REPORT: &str = "\
# Video Analysis Report

Total Duration: 00:06

## Scene Overview
A man leaves a doorway and crosses a rain-soaked street at night.

## Timeline Breakdown

### Shot 1: Doorway
- Timestamp: 00:00–00:02
- Duration: 2.0 seconds
- Subject: a man in a grey wool coat, hands in pockets
- Action: steps out of the doorway
- Background: a dark brick facade with a lit shop window
- Camera Movement: static
- Opening Frame: the man stands inside the doorway, half in shadow
- Closing Frame: the man on the pavement, looking left

### Shot 2: Crossing
- Timestamp: 00:02–00:06
- Duration: 4.0 seconds
- Subject: the same man, collar turned up
- Action: walks across the street from left to right
- Scene: a wet asphalt street reflecting neon signs
- Background Movement: rain falling, a distant car passing
- Camera Movement: slow pan right following the man

## Visual Style Consistency
- Lighting: sodium street lamps with cyan neon fill
- Color Palette: teal and amber
- Film Look: Kodak Vision3 500T, visible grain
";

fn tc(s: &str) -> Timecode {
    s.parse().unwrap()
}

fn report(text: &str) -> AnalysisReport {
    AnalysisReport::new("street", text)
}

#[tokio::test]
async fn two_shot_report_becomes_two_contiguous_sequences() {
    let doc = SequenceFormatter::default()
        .format(&report(STREET_REPORT))
        .await
        .unwrap();

    assert_eq!(doc.sequences.len(), 2);
    let (first, second) = (&doc.sequences[0], &doc.sequences[1]);
    assert_eq!(first.start, tc("00:00"));
    assert_eq!(first.end, tc("00:02"));
    assert_eq!(second.start, first.end);
    assert_eq!(second.end, tc("00:06"));
    assert_eq!(doc.total_duration, tc("00:06"));
    assert_eq!(first.title, "Doorway");

    for seq in &doc.sequences {
        assert_eq!(Some(seq.duration), seq.end.since(seq.start));
        assert!(seq.duration > Duration::ZERO);
        assert!(!seq.prompts.first_frame.trim().is_empty());
        assert!(!seq.prompts.last_frame.trim().is_empty());
        assert!(!seq.prompts.motion.trim().is_empty());
    }
}

#[tokio::test]
async fn frame_prompts_agree_on_static_fields() {
    let doc = SequenceFormatter::default()
        .format(&report(STREET_REPORT))
        .await
        .unwrap();

    for seq in &doc.sequences {
        for static_line in [
            "Lighting: sodium street lamps with cyan neon fill.",
            "Color palette: teal and amber.",
        ] {
            assert!(seq.prompts.first_frame.contains(static_line));
            assert!(seq.prompts.last_frame.contains(static_line));
        }
    }
    let doorway = &doc.sequences[0];
    let background = "Scene: a dark brick facade with a lit shop window.";
    assert!(doorway.prompts.first_frame.contains(background));
    assert!(doorway.prompts.last_frame.contains(background));
    assert_ne!(doorway.prompts.first_frame, doorway.prompts.last_frame);
}

#[tokio::test]
async fn motion_prompt_states_duration_and_movement() {
    let doc = SequenceFormatter::default()
        .format(&report(STREET_REPORT))
        .await
        .unwrap();

    let crossing = &doc.sequences[1].prompts.motion;
    assert!(crossing.contains("over 4.0 seconds"));
    assert!(crossing.contains("Camera movement: slow pan right following the man."));
    assert!(crossing.contains("Environmental change: rain falling, a distant car passing."));

    let doorway = &doc.sequences[0].prompts.motion;
    assert!(doorway.contains("Environmental change: none."));
}

#[tokio::test]
async fn single_shot_spans_the_whole_video() {
    let text = "\
Total Duration: 0:03.5
### Shot 1: Close-up
- Timestamp: 0:00 - 0:03.5
- Subject: a cat on a windowsill
";
    let doc = SequenceFormatter::default()
        .format(&report(text))
        .await
        .unwrap();
    assert_eq!(doc.sequences.len(), 1);
    assert_eq!(doc.sequences[0].start, Timecode::ZERO);
    assert_eq!(doc.sequences[0].end, tc("00:03.5"));
    assert_eq!(doc.sequences[0].duration, Duration::from_millis(3_500));
}

#[tokio::test]
async fn whitespace_report_is_a_content_error() {
    let err = SequenceFormatter::default()
        .format(&report("  \n\n\t "))
        .await
        .unwrap_err();
    assert!(matches!(err, ShotlistError::EmptyReport(_)));
    assert_eq!(err.kind(), ErrorKind::Content);
}

#[tokio::test]
async fn unreadable_total_duration_is_a_content_error() {
    let err = SequenceFormatter::default()
        .format(&report(
            "Total Duration: 5124095576030432:00\n[00:00-00:02] a\n",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ShotlistError::InvalidTimecode(_)));
    assert_eq!(err.kind(), ErrorKind::Content);
}

#[tokio::test]
async fn boundary_violations_are_rejected() {
    let cases = [
        "[00:00-00:02]\n[00:03-00:05]\n",
        "[00:00-00:03]\n[00:02-00:05]\n",
        "[00:01-00:02]\n",
        "[00:00-00:02]\n[00:02-00:02]\n",
        "Total Duration: 00:10\n[00:00-00:02]\n[00:02-00:05]\n",
    ];
    for text in cases {
        let err = SequenceFormatter::default()
            .format(&report(text))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ShotlistError::InvalidBoundaries { .. }),
            "{text:?} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn static_fixture_with_image_to_video_template() {
    let shots = vec![
        Shot::new("Wave", tc("00:00"), tc("00:01.5")).with_fields(ShotFields {
            subject: Some("a child on a beach".into()),
            action: Some("waves at the camera".into()),
            background: Some("breaking surf".into()),
            ..Default::default()
        }),
        Shot::new("Run", tc("00:01.5"), tc("00:08")),
    ];
    let anchors = ShotFields {
        lighting: Some("overcast midday".into()),
        ..Default::default()
    };
    let formatter = SequenceFormatter::new(
        Box::new(StaticSegmenter::new(shots.clone()).with_anchors(anchors.clone())),
        TemplateKind::ImageToVideo,
    );

    let doc = formatter.format(&report("fixture")).await.unwrap();
    assert_eq!(doc.template, TemplateKind::ImageToVideo);

    let wave = &doc.sequences[0].prompts.motion;
    assert!(wave.contains("Background: breaking surf."));
    assert!(wave.contains("Background movement: none."));
    assert!(!wave.contains("Lighting"));

    // the untitled-field shot falls back to its title and the anchors
    let values = TemplateValues::resolve(&shots[1], &anchors);
    assert_eq!(values.subject, "Run");
    assert!(doc.sequences[1].prompts.first_frame.contains("Lighting: overcast midday."));
}

#[tokio::test]
async fn batch_outputs_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let formatter = SequenceFormatter::default();

    let mut paths = Vec::new();
    for (i, name) in ["one", "two", "one"].iter().enumerate() {
        let text = format!("[00:00-00:02] {name}\n- Subject: subject {name} {i}\n");
        let report = AnalysisReport::new(*name, text);
        let run_id = format!("run{i:05}");
        let (_, path) = generate_sequences(&formatter, &report, dir.path(), &run_id)
            .await
            .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(&format!("subject {name} {i}")));
        paths.push(path);
    }

    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 3);
}
