//! Error types for plan derivation.
//!
//! Every failure the planning core can produce is a `PlanError`. None of them
//! are retried: the first error aborts the pipeline and the partially built
//! plan is dropped, so no command ever reaches the encode executor.

use thiserror::Error;

/// Coarse grouping used for the final diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad user input: unsupported codec/tune, malformed crop or language
    Configuration,
    /// A referenced or required stream does not exist
    Resolution,
    /// Probe or crop-detection output could not be interpreted
    DataQuality,
    /// Caller violated a stage precondition
    Contract,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Configuration => "configuration error",
            ErrorCategory::Resolution => "resolution error",
            ErrorCategory::DataQuality => "data quality error",
            ErrorCategory::Contract => "internal contract violation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("Unsupported video codec '{0}' (expected x264, x265, av1 or copy)")]
    UnsupportedCodec(String),

    #[error("Tune '{tune}' is not implemented for codec {codec}")]
    UnsupportedTune { codec: String, tune: String },

    #[error("Malformed crop '{0}' (expected auto, none or W:H:X:Y)")]
    MalformedCropSpec(String),

    #[error("Invalid language request '{0}' (expected 2-letter code, optionally suffixed with '?', or any/any?/none)")]
    MalformedLanguage(String),

    #[error("Malformed track reference '{0}' (expected <index>, v:<index>, a:<index> or s:<index>)")]
    MalformedTrackReference(String),

    #[error("Track {index} is a {kind} track; only video, audio and subtitle tracks can be selected manually")]
    UnsupportedTrackKind { index: u32, kind: String },

    #[error("Video tracks {first} and {second} both selected; only one video track can be kept")]
    MultipleVideoTracks { first: u32, second: u32 },

    #[error("Couldn't find track {0}")]
    UnresolvedTrackReference(String),

    #[error("Could not find required audio track for language '{0}'")]
    RequiredStreamNotFound(String),

    #[error("No video track found in input")]
    NoVideoTrack,

    #[error("Invalid pixel aspect ratio {0:?}")]
    InvalidAspectRatio(Option<String>),

    #[error("Malformed crop detection output: {0}")]
    MalformedCropDetection(String),

    #[error("Video track {index} is missing required field {field}")]
    MissingField { index: u32, field: &'static str },

    #[error("Malformed probe document: {0}")]
    MalformedProbeDocument(String),

    #[error("Crop must be resolved before the filter chain is built")]
    PendingCrop,
}

impl PlanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlanError::UnsupportedCodec(_)
            | PlanError::UnsupportedTune { .. }
            | PlanError::MalformedCropSpec(_)
            | PlanError::MalformedLanguage(_)
            | PlanError::MalformedTrackReference(_)
            | PlanError::UnsupportedTrackKind { .. }
            | PlanError::MultipleVideoTracks { .. } => ErrorCategory::Configuration,
            PlanError::UnresolvedTrackReference(_)
            | PlanError::RequiredStreamNotFound(_)
            | PlanError::NoVideoTrack => ErrorCategory::Resolution,
            PlanError::InvalidAspectRatio(_)
            | PlanError::MalformedCropDetection(_)
            | PlanError::MissingField { .. }
            | PlanError::MalformedProbeDocument(_) => ErrorCategory::DataQuality,
            PlanError::PendingCrop => ErrorCategory::Contract,
        }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
