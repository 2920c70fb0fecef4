use crate::transcribe::TranscriptSegment;
use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Zero-padded `HH:MM:SS` from a millisecond offset. The hour field widens
/// past 99 hours instead of wrapping; negative input clamps to zero.
pub fn format_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// One `(HH:MM:SS) text` line per segment.
pub fn render(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| {
            format!(
                "({}) {}",
                format_timestamp(segment.start),
                segment.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn save_text(path: &Path, text: &str) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", text)?;
    Ok(())
}

pub fn save_transcript_json(path: &Path, segments: &[TranscriptSegment]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, segments)?;
    Ok(())
}

/// `--output foo.json` saves the raw segments, anything else saves the
/// rendered lines.
pub fn save_transcript(path: &Path, segments: &[TranscriptSegment]) -> Result<()> {
    if path.extension().is_some_and(|ext| ext == "json") {
        save_transcript_json(path, segments)
    } else {
        save_text(path, &render(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: i64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end: start + 1_000,
            text: text.to_string(),
        }
    }

    #[test]
    fn timestamp_zero() {
        assert_eq!(format_timestamp(0), "00:00:00");
    }

    #[test]
    fn timestamp_pads_each_field() {
        assert_eq!(format_timestamp(5_000), "00:00:05");
        assert_eq!(format_timestamp(65_000), "00:01:05");
        assert_eq!(format_timestamp(3_661_000), "01:01:01");
    }

    #[test]
    fn timestamp_truncates_subsecond() {
        assert_eq!(format_timestamp(1_999), "00:00:01");
    }

    #[test]
    fn timestamp_hours_widen_past_99() {
        assert_eq!(format_timestamp(360_000_000), "100:00:00");
    }

    #[test]
    fn timestamp_clamps_negative() {
        assert_eq!(format_timestamp(-5_000), "00:00:00");
    }

    #[test]
    fn render_trims_and_joins() {
        let segments = vec![segment(0, " hello"), segment(61_000, "world ")];
        assert_eq!(render(&segments), "(00:00:00) hello\n(00:01:01) world");
    }

    #[test]
    fn render_empty_is_empty() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn save_transcript_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let segments = vec![segment(2_000, "hi")];

        let txt_path = dir.path().join("out.txt");
        save_transcript(&txt_path, &segments).unwrap();
        let text = std::fs::read_to_string(&txt_path).unwrap();
        assert_eq!(text, "(00:00:02) hi\n");

        let json_path = dir.path().join("out.json");
        save_transcript(&json_path, &segments).unwrap();
        let parsed: Vec<TranscriptSegment> =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].start, 2_000);
        assert_eq!(parsed[0].text, "hi");
    }
}
