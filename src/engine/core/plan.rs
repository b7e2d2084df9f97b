use std::path::{Path, PathBuf};

use super::audio::{SelectionPlan, select_tracks};
use super::command::assemble;
use super::error::{PlanError, PlanResult};
use super::filters::{self, FilterChain};
use super::mapping::{self, MappingDirectives};
use super::media::MediaDocument;
use super::request::{CropRect, CropSpec, SelectionRequest};
use super::video::{self, VideoCodec, VideoProfile};

/// Everything derived for one input, ready for the encode executor
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub selection: SelectionPlan,
    pub video: VideoProfile,
    pub filters: FilterChain,
    pub mapping: MappingDirectives,
    /// ffmpeg arguments, in executor order
    pub args: Vec<String>,
}

/// Derive the full plan. The crop must already be resolved.
pub fn build_plan(
    doc: &MediaDocument,
    request: &SelectionRequest,
    input: &Path,
    output: &Path,
) -> PlanResult<EncodePlan> {
    let selection = select_tracks(doc, request)?;
    let video_track = selection.video_track(doc)?;

    let video = video::resolve(request.video_codec, &request.tune, video_track, &request.crop)?;
    let filters = match video {
        VideoProfile::Copy => {
            if request.crop != CropSpec::None {
                tracing::warn!("video is stream-copied, crop ignored");
            }
            FilterChain::default()
        }
        VideoProfile::Encode(_) => filters::build(video_track, &request.crop)?,
    };

    let mapping = mapping::plan(doc, &selection)?;
    let args = assemble(input, output, &video, &filters, &request.audio, &mapping);

    Ok(EncodePlan {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        selection,
        video,
        filters,
        mapping,
        args,
    })
}

/// Filters that run ahead of the crop; crop detection must see the same frame
pub fn pre_crop_chain(doc: &MediaDocument, selection: &SelectionPlan) -> PlanResult<FilterChain> {
    filters::build(selection.video_track(doc)?, &CropSpec::None)
}

/// Whether the request still needs the crop-detection collaborator
pub fn needs_crop_detection(request: &SelectionRequest) -> bool {
    request.crop == CropSpec::Pending && request.video_codec != VideoCodec::Copy
}

/// Validate the crop-detection result (`w:h:x:y`, non-negative integers)
pub fn accept_detected_crop(raw: &str) -> PlanResult<CropRect> {
    CropRect::parse(raw).ok_or_else(|| PlanError::MalformedCropDetection(raw.to_string()))
}
