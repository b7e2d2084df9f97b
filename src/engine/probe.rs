// Input probing using mediainfo

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::process::Command;

use crate::engine::core::{MediaDocument, PlanError, PlanResult, ScanType, Track, TrackKind};

#[derive(Debug, Deserialize)]
struct MediaInfoOutput {
    media: Option<MediaInfoMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoMedia {
    #[serde(default)]
    track: Vec<RawTrack>,
}

/// One mediainfo track record. Every field is optional; mediainfo omits what it doesn't know.
#[derive(Debug, Default, Deserialize)]
struct RawTrack {
    #[serde(rename = "@type", default, deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(rename = "StreamOrder", default, deserialize_with = "lenient")]
    stream_order: Option<String>,
    #[serde(rename = "CodecID", default, deserialize_with = "lenient")]
    codec_id: Option<String>,
    #[serde(rename = "Format", default, deserialize_with = "lenient")]
    format: Option<String>,
    #[serde(rename = "Compression_Mode", default, deserialize_with = "lenient")]
    compression_mode: Option<String>,
    #[serde(rename = "Channels", default, deserialize_with = "lenient")]
    channels: Option<String>,
    #[serde(rename = "BitRate", default, deserialize_with = "lenient")]
    bit_rate: Option<String>,
    #[serde(rename = "Language", default, deserialize_with = "lenient")]
    language: Option<String>,
    #[serde(rename = "Title", default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(rename = "ScanType", default, deserialize_with = "lenient")]
    scan_type: Option<String>,
    #[serde(rename = "FrameRate", default, deserialize_with = "lenient")]
    frame_rate: Option<String>,
    #[serde(rename = "PixelAspectRatio", default, deserialize_with = "lenient")]
    pixel_aspect_ratio: Option<String>,
    #[serde(rename = "Width", default, deserialize_with = "lenient")]
    width: Option<String>,
    #[serde(rename = "Height", default, deserialize_with = "lenient")]
    height: Option<String>,
    #[serde(rename = "Duration", default, deserialize_with = "lenient")]
    duration: Option<String>,
}

/// Accept strings and numbers, drop null-like sentinels and anything else
fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let text = match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return Ok(None),
    };
    Ok(clean(&text))
}

/// Null-sentinel values some muxers write instead of omitting a tag
fn clean(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(s.to_string())
    }
}

/// First number of a possibly multi-valued field ("4608000 / 640000")
fn first_number<T: std::str::FromStr>(s: Option<&str>) -> Option<T> {
    s?.split('/').next()?.trim().parse().ok()
}

/// Upper-case codec id with the Matroska type prefix removed, falling back to Format
fn normalize_codec_id(
    kind: TrackKind,
    codec_id: Option<&str>,
    format: Option<&str>,
) -> Option<String> {
    if kind == TrackKind::Audio {
        if let Some(id) = codec_id.and_then(|id| id.strip_prefix("A_")) {
            return Some(id.to_ascii_uppercase());
        }
        if let Some(format) = format {
            let mapped = match format {
                "MLP FBA" => "TRUEHD",
                "AC-3" => "AC3",
                "E-AC-3" => "EAC3",
                other => return Some(other.to_ascii_uppercase()),
            };
            return Some(mapped.to_string());
        }
    }
    codec_id.or(format).map(str::to_ascii_uppercase)
}

fn parse_stream_order(raw: &str) -> PlanResult<u32> {
    // Transport streams report "<program>-<stream>"
    raw.rsplit('-')
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| PlanError::MalformedProbeDocument(format!("invalid StreamOrder {:?}", raw)))
}

impl RawTrack {
    fn into_track(self, kind: TrackKind, global_index: u32) -> Track {
        let mut track = Track::new(kind, global_index);
        track.codec_id = normalize_codec_id(kind, self.codec_id.as_deref(), self.format.as_deref());
        track.compression_mode = self.compression_mode;
        track.channels = first_number(self.channels.as_deref());
        track.bit_rate = first_number(self.bit_rate.as_deref());
        track.language = self.language;
        track.title = self.title;
        if kind == TrackKind::Video {
            track.scan_type = ScanType::from_mediainfo(self.scan_type.as_deref());
            track.frame_rate = self.frame_rate;
            track.pixel_aspect_ratio = self.pixel_aspect_ratio;
            track.width = first_number(self.width.as_deref());
            track.height = first_number(self.height.as_deref());
        }
        track
    }
}

/// Parse `mediainfo --Output=JSON` output into a media document.
///
/// Records without `StreamOrder` (General, Menu) are not streams and are skipped;
/// the General record only contributes the container duration.
pub fn parse_media_info(json: &str) -> PlanResult<MediaDocument> {
    let output: MediaInfoOutput = serde_json::from_str(json)
        .map_err(|e| PlanError::MalformedProbeDocument(e.to_string()))?;
    let media = output
        .media
        .ok_or_else(|| PlanError::MalformedProbeDocument("missing \"media\" object".to_string()))?;

    let mut duration_s = None;
    let mut tracks = Vec::new();

    for raw in media.track {
        let kind_name = raw.kind.clone().unwrap_or_default();
        if kind_name == "General" {
            duration_s = first_number(raw.duration.as_deref());
            continue;
        }
        let Some(order) = raw.stream_order.clone() else {
            tracing::debug!(kind = %kind_name, "skipping record without StreamOrder");
            continue;
        };
        let index = parse_stream_order(&order)?;
        tracks.push(raw.into_track(TrackKind::from_mediainfo(&kind_name), index));
    }

    MediaDocument::new(tracks, duration_s)
}

/// Probe an input file with mediainfo
pub fn probe_media(input_path: &Path, mediainfo: &str) -> Result<MediaDocument> {
    if !input_path.is_file() {
        anyhow::bail!("{} doesn't exist", input_path.display());
    }

    let output = Command::new(mediainfo)
        .arg("--Output=JSON")
        .arg(input_path)
        .output()
        .with_context(|| {
            format!("Failed to execute {}. Is mediainfo installed and in PATH?", mediainfo)
        })?;

    if !output.status.success() {
        anyhow::bail!(
            "mediainfo failed for {}: {}",
            input_path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let doc = parse_media_info(&json_str)
        .with_context(|| format!("Failed to read mediainfo output for {}", input_path.display()))?;

    tracing::debug!(
        input = %input_path.display(),
        tracks = doc.tracks().len(),
        "probed input"
    );
    Ok(doc)
}

/// Check if mediainfo is available and return its version
pub fn mediainfo_version(mediainfo: &str) -> Result<String> {
    let output = Command::new(mediainfo)
        .arg("--Version")
        .output()
        .with_context(|| {
            format!("Failed to execute {}. Is mediainfo installed and in PATH?", mediainfo)
        })?;

    if !output.status.success() {
        anyhow::bail!("mediainfo command failed with status: {}", output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    Ok(version_output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" "))
}
