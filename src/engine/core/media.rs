use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::{PlanError, PlanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Other,
}

impl TrackKind {
    /// Map a mediainfo `@type` value to a track kind
    pub fn from_mediainfo(s: &str) -> Self {
        match s {
            "Video" => TrackKind::Video,
            "Audio" => TrackKind::Audio,
            "Text" => TrackKind::Text,
            _ => TrackKind::Other,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Text => "subtitle",
            TrackKind::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScanType {
    Progressive,
    Interlaced,
    Mbaff,
    /// Not reported, or a value we don't know how to handle (raw value kept for diagnostics)
    Unknown(Option<String>),
}

impl ScanType {
    pub fn from_mediainfo(raw: Option<&str>) -> Self {
        match raw {
            Some("Progressive") => ScanType::Progressive,
            Some("Interlaced") => ScanType::Interlaced,
            Some("MBAFF") => ScanType::Mbaff,
            other => ScanType::Unknown(other.map(str::to_string)),
        }
    }

    pub fn needs_deinterlace(&self) -> bool {
        matches!(self, ScanType::Interlaced | ScanType::Mbaff)
    }
}

/// Exact ratio such as a frame rate or pixel aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: u64,
    pub den: u64,
}

impl Rational {
    pub fn new(num: u64, den: u64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num, den).max(1);
        Some(Self {
            num: num / g,
            den: den / g,
        })
    }

    /// Parse "30000/1001", "16:15", "23.976" or "25"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some((n, d)) = s.split_once('/').or_else(|| s.split_once(':')) {
            let num: u64 = n.trim().parse().ok()?;
            let den: u64 = d.trim().parse().ok()?;
            return Self::new(num, den);
        }

        match s.split_once('.') {
            Some((int_part, frac_part)) => {
                if frac_part.is_empty()
                    || frac_part.len() > 9
                    || !frac_part.bytes().all(|b| b.is_ascii_digit())
                {
                    return None;
                }
                let int: u64 = if int_part.is_empty() {
                    0
                } else {
                    int_part.parse().ok()?
                };
                let den = 10u64.pow(frac_part.len() as u32);
                let frac: u64 = frac_part.parse().ok()?;
                Self::new(int.checked_mul(den)?.checked_add(frac)?, den)
            }
            None => Self::new(s.parse().ok()?, 1),
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// One elementary stream as reported by the probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    /// Stream position in the container (mediainfo `StreamOrder`, ffmpeg `0:<n>`)
    pub global_index: u32,
    /// Position among tracks of the same kind; assigned by `MediaDocument::new`
    pub type_index: u32,
    pub kind: TrackKind,
    /// Normalized codec id: upper case, Matroska `A_` prefix stripped (`TRUEHD`, `DTS`, `AC3`)
    pub codec_id: Option<String>,
    pub compression_mode: Option<String>,
    pub channels: Option<u32>,
    pub bit_rate: Option<u64>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub scan_type: ScanType,
    /// Raw probe values; parsed on demand so malformed input surfaces where it is needed
    pub frame_rate: Option<String>,
    pub pixel_aspect_ratio: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Track {
    pub fn new(kind: TrackKind, global_index: u32) -> Self {
        Self {
            global_index,
            type_index: 0,
            kind,
            codec_id: None,
            compression_mode: None,
            channels: None,
            bit_rate: None,
            language: None,
            title: None,
            scan_type: ScanType::Unknown(None),
            frame_rate: None,
            pixel_aspect_ratio: None,
            width: None,
            height: None,
        }
    }

    pub fn is_lossless(&self) -> bool {
        self.compression_mode
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("Lossless"))
    }

    pub fn has_codec(&self, codec_id: &str) -> bool {
        self.codec_id.as_deref() == Some(codec_id)
    }

    pub fn frame_rate(&self) -> Option<Rational> {
        self.frame_rate.as_deref().and_then(Rational::parse)
    }

    /// Short human-readable summary used by `movmux probe` and log lines
    pub fn describe(&self) -> String {
        let mut parts = vec![format!(
            "#{} {}:{}",
            self.global_index,
            kind_tag(self.kind),
            self.type_index
        )];
        if let Some(codec) = &self.codec_id {
            parts.push(codec.clone());
        }
        match self.kind {
            TrackKind::Video => {
                if let (Some(w), Some(h)) = (self.width, self.height) {
                    parts.push(format!("{}x{}", w, h));
                }
                if let Some(fps) = &self.frame_rate {
                    parts.push(format!("{}fps", fps));
                }
            }
            TrackKind::Audio => {
                if let Some(ch) = self.channels {
                    parts.push(format!("{}ch", ch));
                }
                if let Some(br) = self.bit_rate {
                    parts.push(format!("{}kb/s", br / 1000));
                }
                if self.is_lossless() {
                    parts.push("lossless".to_string());
                }
            }
            _ => {}
        }
        if let Some(lang) = &self.language {
            parts.push(format!("[{}]", lang));
        }
        if let Some(title) = &self.title {
            parts.push(format!("\"{}\"", title));
        }
        parts.join(" ")
    }
}

fn kind_tag(kind: TrackKind) -> &'static str {
    match kind {
        TrackKind::Video => "v",
        TrackKind::Audio => "a",
        TrackKind::Text => "s",
        TrackKind::Other => "o",
    }
}

/// Reference to a track as written by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackRef {
    /// Container-wide stream index
    Global(u32),
    /// N-th track of one kind (`v:0`, `a:1`, `s:0`)
    Typed(TrackKind, u32),
}

impl FromStr for TrackRef {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PlanError::MalformedTrackReference(s.to_string());

        if let Ok(index) = s.parse::<u32>() {
            return Ok(TrackRef::Global(index));
        }

        let (tag, index) = s.split_once(':').ok_or_else(malformed)?;
        let kind = match tag {
            "v" => TrackKind::Video,
            "a" => TrackKind::Audio,
            "s" => TrackKind::Text,
            _ => return Err(malformed()),
        };
        let index = index.parse::<u32>().map_err(|_| malformed())?;
        Ok(TrackRef::Typed(kind, index))
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackRef::Global(i) => write!(f, "{}", i),
            TrackRef::Typed(kind, i) => write!(f, "{}:{}", kind_tag(*kind), i),
        }
    }
}

/// Immutable, ordered view over all tracks of one input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaDocument {
    tracks: Vec<Track>,
    duration_s: Option<f64>,
}

impl MediaDocument {
    /// Build a document from tracks in probe order.
    ///
    /// Type indices are (re)assigned here so they are always contiguous per kind.
    pub fn new(mut tracks: Vec<Track>, duration_s: Option<f64>) -> PlanResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for track in &tracks {
            if !seen.insert(track.global_index) {
                return Err(PlanError::MalformedProbeDocument(format!(
                    "stream index {} appears more than once",
                    track.global_index
                )));
            }
        }

        let mut counters = std::collections::HashMap::new();
        for track in &mut tracks {
            let counter = counters.entry(track.kind).or_insert(0u32);
            track.type_index = *counter;
            *counter += 1;
        }

        Ok(Self { tracks, duration_s })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Container duration in seconds, when the probe reported one
    pub fn duration_s(&self) -> Option<f64> {
        self.duration_s
    }

    pub fn tracks_of_kind(&self, kind: TrackKind) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }

    pub fn track_by_global_index(&self, index: u32) -> PlanResult<&Track> {
        self.tracks
            .iter()
            .find(|t| t.global_index == index)
            .ok_or_else(|| PlanError::UnresolvedTrackReference(index.to_string()))
    }

    pub fn track_by_type_index(&self, kind: TrackKind, index: u32) -> PlanResult<&Track> {
        self.tracks_of_kind(kind)
            .find(|t| t.type_index == index)
            .ok_or_else(|| {
                PlanError::UnresolvedTrackReference(TrackRef::Typed(kind, index).to_string())
            })
    }

    pub fn first_video_track(&self) -> PlanResult<&Track> {
        self.tracks_of_kind(TrackKind::Video)
            .next()
            .ok_or(PlanError::NoVideoTrack)
    }

    pub fn resolve(&self, reference: TrackRef) -> PlanResult<&Track> {
        match reference {
            TrackRef::Global(index) => self.track_by_global_index(index),
            TrackRef::Typed(kind, index) => self.track_by_type_index(kind, index),
        }
    }
}
