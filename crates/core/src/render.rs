use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::{
    error::Result,
    formatter::SequenceDocument,
    template::NEGATIVE_PROMPT,
    timecode::format_seconds,
};

pub fn render_sequences(doc: &SequenceDocument) -> String {
    let mut output = String::new();
    output.push_str(&format!("# Video Sequences: {}\n\n", doc.source_name));
    output.push_str(&format!(
        "**Total Duration:** {} | **Total Sequences:** {} | **Template:** {}\n\n",
        doc.total_duration,
        doc.sequences.len(),
        doc.template
    ));

    output.push_str("## Continuity Anchors\n\n");
    let anchors = [
        ("Film Look", doc.anchors.style.as_deref()),
        ("Lighting Style", doc.anchors.lighting.as_deref()),
        ("Color Palette", doc.anchors.palette.as_deref()),
    ];
    for (label, value) in anchors {
        output.push_str(&format!(
            "- **{}:** {}\n",
            label,
            value.unwrap_or("not specified")
        ));
    }
    output.push('\n');

    for seq in &doc.sequences {
        output.push_str("---\n\n");
        output.push_str(&format!("## Sequence {}: {}\n\n", seq.index, seq.title));
        output.push_str(&format!(
            "**Timestamp:** {}–{}\n",
            seq.start, seq.end
        ));
        output.push_str(&format!(
            "**Duration:** {}\n",
            format_seconds(seq.duration)
        ));
        output.push_str(&format!("**Frame Strategy:** {}\n\n", seq.strategy));

        output.push_str("### First Frame Image Prompt\n\n");
        output.push_str(&format!("{}\n\n", seq.prompts.first_frame));
        output.push_str(&format!("**Negative Prompt:** {}\n\n", NEGATIVE_PROMPT));

        output.push_str("### Last Frame Image Prompt\n\n");
        output.push_str(&format!("{}\n\n", seq.prompts.last_frame));
        output.push_str(&format!("**Negative Prompt:** {}\n\n", NEGATIVE_PROMPT));

        output.push_str("### Video Motion Prompt\n\n");
        output.push_str(&format!("{}\n\n", seq.prompts.motion));
    }

    output
}

pub async fn save_sequences(doc: &SequenceDocument, path: &Path) -> Result<()> {
    fs::write(path, render_sequences(doc)).await?;
    info!(path = %path.display(), sequences = doc.sequences.len(), "saved sequences");
    Ok(())
}
