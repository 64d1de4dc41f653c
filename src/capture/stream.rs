use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::provider::MediaTrack;
use crate::error::{CaptureError, Result};

/// Media track kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Video => write!(f, "video"),
        }
    }
}

/// One requested track: its kind plus provider-specific constraints
/// (device id, display source, resolution, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub kind: TrackKind,
    #[serde(default)]
    pub constraints: serde_json::Value,
}

impl TrackDescriptor {
    pub fn audio() -> Self {
        Self {
            kind: TrackKind::Audio,
            constraints: serde_json::Value::Null,
        }
    }

    pub fn video() -> Self {
        Self {
            kind: TrackKind::Video,
            constraints: serde_json::Value::Null,
        }
    }

    pub fn with_constraints(mut self, constraints: serde_json::Value) -> Self {
        self.constraints = constraints;
        self
    }
}

/// A named capture target: which tracks to record together and where the
/// resulting file goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSpecification {
    /// Stream identifier, also used as the filename label (e.g. "mic", "cam")
    #[serde(alias = "streamId")]
    pub id: String,

    pub tracks: Vec<TrackDescriptor>,

    /// Output filename; assigned from the id and a timestamp when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl StreamSpecification {
    pub fn new(id: impl Into<String>, tracks: Vec<TrackDescriptor>) -> Self {
        Self {
            id: id.into(),
            tracks,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Video)
    }

    /// Parse the `<id>=<kinds>` shorthand used on the command line,
    /// e.g. `mic=audio`, `screen=video+audio`
    pub fn from_shorthand(arg: &str) -> Result<Self> {
        let (id, kinds) = arg.split_once('=').ok_or_else(|| {
            CaptureError::InvalidSpecification(format!("expected <id>=<kinds>, got '{}'", arg))
        })?;

        let id = id.trim();
        if id.is_empty() {
            return Err(CaptureError::InvalidSpecification(format!(
                "missing stream id in '{}'",
                arg
            )));
        }

        let mut tracks = Vec::new();
        for kind in kinds.split('+').map(str::trim).filter(|k| !k.is_empty()) {
            match kind {
                "audio" => tracks.push(TrackDescriptor::audio()),
                "video" => tracks.push(TrackDescriptor::video()),
                other => {
                    return Err(CaptureError::InvalidSpecification(format!(
                        "unknown track kind '{}'",
                        other
                    )))
                }
            }
        }

        if tracks.is_empty() {
            return Err(CaptureError::InvalidSpecification(format!(
                "stream {} requests no tracks",
                id
            )));
        }

        Ok(Self::new(id, tracks))
    }
}

/// Build `<ISO8601-timestamp>-<label>.<extension>` with the time separators
/// replaced so the name is valid on every filesystem
pub fn output_filename(label: &str, extension: &str) -> String {
    output_filename_at(Utc::now(), label, extension)
}

pub fn output_filename_at(at: DateTime<Utc>, label: &str, extension: &str) -> String {
    format!(
        "{}-{}.{}",
        at.format("%Y-%m-%dT%H-%M-%S-%3fZ"),
        label,
        extension
    )
}

/// A set of live tracks recorded together
pub struct MediaStream {
    id: String,
    tracks: Vec<Box<dyn MediaTrack>>,
    released: bool,
}

impl MediaStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: Vec::new(),
            released: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_track(&mut self, track: Box<dyn MediaTrack>) {
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[Box<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Video)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stop every track. Safe to call any number of times; returns how many
    /// tracks were stopped by this call.
    pub fn release(&mut self) -> usize {
        if self.released {
            return 0;
        }

        for track in &mut self.tracks {
            track.stop();
        }
        self.released = true;

        self.tracks.len()
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_output_filename_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let name = output_filename_at(at, "mic", "webm");
        assert_eq!(name, "2024-03-09T14-05-07-000Z-mic.webm");
    }

    #[test]
    fn test_shorthand_parsing() {
        let spec = StreamSpecification::from_shorthand("screen=video+audio").unwrap();
        assert_eq!(spec.id, "screen");
        assert_eq!(spec.tracks.len(), 2);
        assert_eq!(spec.tracks[0].kind, TrackKind::Video);
        assert_eq!(spec.tracks[1].kind, TrackKind::Audio);
        assert!(spec.has_video());
        assert!(spec.filename.is_none());
    }

    #[test]
    fn test_shorthand_rejects_bad_input() {
        assert!(StreamSpecification::from_shorthand("mic").is_err());
        assert!(StreamSpecification::from_shorthand("=audio").is_err());
        assert!(StreamSpecification::from_shorthand("mic=").is_err());
        assert!(StreamSpecification::from_shorthand("mic=smell").is_err());
    }

    #[test]
    fn test_specification_accepts_stream_id_alias() {
        let json = r#"{"streamId": "cam", "tracks": [{"kind": "video"}]}"#;
        let spec: StreamSpecification = serde_json::from_str(json).unwrap();
        assert_eq!(spec.id, "cam");
        assert_eq!(spec.tracks, vec![TrackDescriptor::video()]);
    }
}
