use super::audio::SelectionPlan;
use super::error::PlanResult;
use super::media::{MediaDocument, Track};

/// Source metadata fields copied onto output streams, in output order
const COPIED_TAGS: &[&str] = &["Language", "Title"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedTrack {
    /// Global index of the source stream
    pub source: u32,
    /// `Some(true)` for the default track of its kind, `None` when disposition is left alone
    pub default: Option<bool>,
    /// (key, value) pairs, keys lower-case
    pub tags: Vec<(String, String)>,
}

/// Output stream layout and tags for the muxer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDirectives {
    pub video: u32,
    pub audio: Vec<MappedTrack>,
    pub subtitles: Vec<MappedTrack>,
}

fn copied_tags(track: &Track) -> Vec<(String, String)> {
    COPIED_TAGS
        .iter()
        .filter_map(|&key| {
            let value = match key {
                "Language" => track.language.as_ref(),
                "Title" => track.title.as_ref(),
                _ => None,
            };
            value.map(|v| (key.to_lowercase(), v.clone()))
        })
        .collect()
}

/// Plan the output mapping for the selected tracks.
///
/// The first selected audio track is the only one flagged default.
pub fn plan(doc: &MediaDocument, selection: &SelectionPlan) -> PlanResult<MappingDirectives> {
    let video = selection.video_track(doc)?.global_index;

    let audio = selection
        .audio
        .iter()
        .enumerate()
        .map(|(position, &index)| {
            let track = doc.track_by_global_index(index)?;
            Ok(MappedTrack {
                source: index,
                default: Some(position == 0),
                tags: copied_tags(track),
            })
        })
        .collect::<PlanResult<Vec<_>>>()?;

    let subtitles = selection
        .subtitles
        .iter()
        .map(|&index| {
            let track = doc.track_by_global_index(index)?;
            Ok(MappedTrack {
                source: index,
                default: None,
                tags: copied_tags(track),
            })
        })
        .collect::<PlanResult<Vec<_>>>()?;

    Ok(MappingDirectives {
        video,
        audio,
        subtitles,
    })
}

impl MappingDirectives {
    /// ffmpeg output options: global metadata kept, automatic per-stream
    /// metadata dropped, then one `-map` per output stream with its flags.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-map_metadata", "0", "-map_metadata:s", "-1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.push("-map".to_string());
        args.push(format!("0:{}", self.video));

        for (kind, tracks) in [("a", &self.audio), ("s", &self.subtitles)] {
            for (out_index, track) in tracks.iter().enumerate() {
                args.push("-map".to_string());
                args.push(format!("0:{}", track.source));

                if let Some(default) = track.default {
                    args.push(format!("-disposition:{}:{}", kind, out_index));
                    args.push(if default { "default" } else { "0" }.to_string());
                }

                for (key, value) in &track.tags {
                    args.push(format!("-metadata:s:{}:{}", kind, out_index));
                    args.push(format!("{}={}", key, value));
                }
            }
        }

        args
    }
}
