mod audio;
mod command;
mod error;
mod filters;
mod mapping;
mod media;
mod plan;
mod request;
mod types;
mod video;

pub use audio::{SelectionPlan, select_best, select_for_language, select_tracks};
pub use command::{assemble, format_command};
pub use error::{ErrorCategory, PlanError, PlanResult};
pub use filters::{FilterChain, FilterSpec, build as build_filter_chain};
pub use mapping::{MappedTrack, MappingDirectives, plan as plan_mapping};
pub use media::{MediaDocument, Rational, ScanType, Track, TrackKind, TrackRef};
pub use plan::{
    EncodePlan, accept_detected_crop, build_plan, needs_crop_detection, pre_crop_chain,
};
pub use request::{AudioEncode, CropRect, CropSpec, LanguageRequest, SelectionRequest};
pub use types::{EncodeJob, ProgressParser, ProgressUpdate};
pub use video::{
    CodecStrategy, EncodeProfile, MAX_GOP, ResolutionClass, STRATEGIES, Tune, VideoCodec,
    VideoProfile, compute_gop, resolve as resolve_video_profile, strategy_for,
};
