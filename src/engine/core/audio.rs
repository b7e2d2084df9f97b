//! Audio track ranking and track-set selection.

use super::error::{PlanError, PlanResult};
use super::media::{MediaDocument, Track, TrackKind};
use super::request::{LanguageRequest, SelectionRequest};

type Predicate = fn(&Track, &[&Track]) -> bool;

fn lossless(t: &Track, _: &[&Track]) -> bool {
    t.is_lossless()
}

fn truehd(t: &Track, _: &[&Track]) -> bool {
    t.has_codec("TRUEHD")
}

fn dts(t: &Track, _: &[&Track]) -> bool {
    t.has_codec("DTS")
}

fn ac3(t: &Track, _: &[&Track]) -> bool {
    t.has_codec("AC3")
}

fn most_channels(t: &Track, all: &[&Track]) -> bool {
    t.channels.is_some() && t.channels == all.iter().filter_map(|c| c.channels).max()
}

fn highest_bitrate(t: &Track, all: &[&Track]) -> bool {
    t.bit_rate.is_some() && t.bit_rate == all.iter().filter_map(|c| c.bit_rate).max()
}

/// Quality preference, strongest first. Each step narrows the candidate set;
/// a step matching nothing leaves the set unchanged.
const CASCADE: &[(&str, Predicate)] = &[
    ("lossless", lossless),
    ("truehd", truehd),
    ("dts", dts),
    ("ac3", ac3),
    ("channels", most_channels),
    ("bitrate", highest_bitrate),
];

/// Pick the best track among `candidates`, falling back to the first one
pub fn select_best<'a>(candidates: &[&'a Track]) -> Option<&'a Track> {
    let mut current: Vec<&Track> = candidates.to_vec();

    for (name, predicate) in CASCADE {
        if current.len() <= 1 {
            break;
        }
        let matches: Vec<&Track> = current
            .iter()
            .copied()
            .filter(|t| predicate(t, &current))
            .collect();

        match matches.len() {
            0 => continue,
            1 => {
                tracing::debug!(
                    track = matches[0].global_index,
                    step = name,
                    "audio track chosen"
                );
                return Some(matches[0]);
            }
            _ => current = matches,
        }
    }

    current.first().copied()
}

/// Best audio track for one language (`None` = any language).
///
/// Returns `Ok(None)` when nothing matches an optional request.
pub fn select_for_language<'a>(
    doc: &'a MediaDocument,
    language: Option<&str>,
    required: bool,
) -> PlanResult<Option<&'a Track>> {
    let candidates: Vec<&Track> = doc
        .tracks_of_kind(TrackKind::Audio)
        .filter(|t| language.is_none() || t.language.as_deref() == language)
        .collect();

    if candidates.is_empty() {
        let label = language.unwrap_or("any");
        if required {
            return Err(PlanError::RequiredStreamNotFound(label.to_string()));
        }
        tracing::info!(language = label, "no audio track for optional language, skipping");
        return Ok(None);
    }

    Ok(select_best(&candidates))
}

/// Tracks kept in the output, in output order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionPlan {
    /// Pinned video track; `None` means the first video track
    pub video: Option<u32>,
    /// Global indices; the first one becomes the default audio track
    pub audio: Vec<u32>,
    pub subtitles: Vec<u32>,
}

impl SelectionPlan {
    pub fn contains(&self, index: u32) -> bool {
        self.video == Some(index) || self.audio.contains(&index) || self.subtitles.contains(&index)
    }

    /// The video track that gets encoded and mapped
    pub fn video_track<'a>(&self, doc: &'a MediaDocument) -> PlanResult<&'a Track> {
        match self.video {
            Some(index) => doc.track_by_global_index(index),
            None => doc.first_video_track(),
        }
    }
}

/// Resolve pinned tracks, then fill in audio per language request
pub fn select_tracks(doc: &MediaDocument, request: &SelectionRequest) -> PlanResult<SelectionPlan> {
    let mut plan = SelectionPlan::default();

    for reference in &request.tracks {
        let track = doc.resolve(*reference)?;
        if plan.contains(track.global_index) {
            tracing::debug!(%reference, "track already selected, ignoring duplicate");
            continue;
        }
        match track.kind {
            TrackKind::Video => {
                if let Some(first) = plan.video {
                    return Err(PlanError::MultipleVideoTracks {
                        first,
                        second: track.global_index,
                    });
                }
                plan.video = Some(track.global_index);
            }
            TrackKind::Audio => plan.audio.push(track.global_index),
            TrackKind::Text => plan.subtitles.push(track.global_index),
            kind => {
                return Err(PlanError::UnsupportedTrackKind {
                    index: track.global_index,
                    kind: kind.to_string(),
                });
            }
        }
    }

    let language_selection = !request.languages.contains(&LanguageRequest::None);
    if !language_selection {
        tracing::info!("language-based audio selection disabled");
    }

    let languages: &[LanguageRequest] = if language_selection {
        &request.languages
    } else {
        &[]
    };

    for language in languages {
        let (code, required) = match language {
            LanguageRequest::Code { code, required } => (Some(code.as_str()), *required),
            LanguageRequest::Any { required } => (None, *required),
            LanguageRequest::None => continue,
        };

        if let Some(covering) = covering_track(doc, &plan, code) {
            tracing::info!(
                %language,
                track = covering,
                "language already covered by a selected track"
            );
            continue;
        }

        if let Some(track) = select_for_language(doc, code, required)? {
            if !plan.contains(track.global_index) {
                tracing::info!(%language, track = %track.describe(), "selected audio track");
                plan.audio.push(track.global_index);
            }
        }
    }

    if plan.audio.is_empty() && language_selection {
        let all: Vec<&Track> = doc.tracks_of_kind(TrackKind::Audio).collect();
        if let Some(track) = select_best(&all) {
            tracing::info!(
                track = %track.describe(),
                "no audio selected, using best available track"
            );
            plan.audio.push(track.global_index);
        }
    }

    Ok(plan)
}

/// Already selected audio track that satisfies the language (any track for the wildcard)
fn covering_track(
    doc: &MediaDocument,
    plan: &SelectionPlan,
    language: Option<&str>,
) -> Option<u32> {
    plan.audio.iter().copied().find(|&index| match language {
        None => true,
        Some(code) => doc
            .track_by_global_index(index)
            .is_ok_and(|t| t.language.as_deref() == Some(code)),
    })
}
