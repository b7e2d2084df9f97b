//! Video encoder parameter table.
//!
//! Each supported codec is described by one `CodecStrategy` record holding its
//! per-resolution preset/CRF pairs and the tunes it understands. `resolve`
//! only looks values up; the numbers themselves live in `STRATEGIES`.

use std::fmt;
use std::str::FromStr;

use super::error::{PlanError, PlanResult};
use super::media::{Rational, Track};
use super::request::CropSpec;

/// Longest allowed keyframe interval in frames
pub const MAX_GOP: u32 = 300;

/// Target keyframe spacing in seconds
const GOP_SECONDS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// 8-bit H.264 via libx264
    X264,
    /// 10-bit HEVC via libx265
    X265,
    /// 10-bit AV1 via libsvtav1
    SvtAv1,
    /// Stream copy, no re-encode
    Copy,
}

impl VideoCodec {
    /// Short name used in output file names and diagnostics
    pub fn suffix(&self) -> &'static str {
        match self {
            VideoCodec::X264 => "x264",
            VideoCodec::X265 => "x265",
            VideoCodec::SvtAv1 => "av1",
            VideoCodec::Copy => "copy",
        }
    }
}

impl FromStr for VideoCodec {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x264" | "libx264" | "h264" => Ok(VideoCodec::X264),
            "x265" | "libx265" | "hevc" => Ok(VideoCodec::X265),
            "av1" | "svtav1" | "libsvtav1" => Ok(VideoCodec::SvtAv1),
            "copy" => Ok(VideoCodec::Copy),
            _ => Err(PlanError::UnsupportedCodec(s.to_string())),
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Psychovisual bias requested by the user.
///
/// Whether a tune is valid depends on the codec, so parsing never fails here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Tune {
    #[default]
    Film,
    Animation,
    Grain,
    None,
    Other(String),
}

impl Tune {
    pub fn as_str(&self) -> &str {
        match self {
            Tune::Film => "film",
            Tune::Animation => "animation",
            Tune::Grain => "grain",
            Tune::None => "none",
            Tune::Other(name) => name,
        }
    }
}

impl FromStr for Tune {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "film" => Tune::Film,
            "animation" => Tune::Animation,
            "grain" => Tune::Grain,
            "none" => Tune::None,
            other => Tune::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionClass {
    Uhd,
    Hd,
    Sd,
}

impl ResolutionClass {
    pub fn from_height(height: u32) -> Self {
        match height {
            h if h > 1080 => ResolutionClass::Uhd,
            h if h > 576 => ResolutionClass::Hd,
            _ => ResolutionClass::Sd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSettings {
    pub preset: &'static str,
    pub crf: u32,
}

/// How one tune name is expressed on the ffmpeg command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuneArg {
    /// `-tune <name>`
    Passthrough,
    /// Codec private parameter string (`-x265-params`, `-svtav1-params`)
    Params(&'static str),
    /// Nothing emitted
    Omit,
}

#[derive(Debug)]
pub struct CodecStrategy {
    pub codec: VideoCodec,
    pub encoder: &'static str,
    pub pix_fmt: &'static str,
    /// Flag that carries `TuneArg::Params` values
    pub params_flag: Option<&'static str>,
    pub uhd: RateSettings,
    pub hd: RateSettings,
    pub sd: RateSettings,
    pub tunes: &'static [(&'static str, TuneArg)],
}

impl CodecStrategy {
    pub fn rate(&self, class: ResolutionClass) -> RateSettings {
        match class {
            ResolutionClass::Uhd => self.uhd,
            ResolutionClass::Hd => self.hd,
            ResolutionClass::Sd => self.sd,
        }
    }

    pub fn tune_arg(&self, tune: &Tune) -> Option<TuneArg> {
        self.tunes
            .iter()
            .find(|(name, _)| *name == tune.as_str())
            .map(|(_, arg)| *arg)
    }
}

const fn rate(preset: &'static str, crf: u32) -> RateSettings {
    RateSettings { preset, crf }
}

pub static STRATEGIES: &[CodecStrategy] = &[
    CodecStrategy {
        codec: VideoCodec::X264,
        encoder: "libx264",
        pix_fmt: "yuv420p",
        params_flag: None,
        uhd: rate("slow", 18),
        hd: rate("slower", 17),
        sd: rate("veryslow", 16),
        tunes: &[
            ("film", TuneArg::Passthrough),
            ("animation", TuneArg::Passthrough),
            ("grain", TuneArg::Passthrough),
            ("none", TuneArg::Omit),
        ],
    },
    CodecStrategy {
        codec: VideoCodec::X265,
        encoder: "libx265",
        pix_fmt: "yuv420p10le",
        params_flag: Some("-x265-params"),
        uhd: rate("medium", 18),
        hd: rate("slow", 17),
        sd: rate("slow", 16),
        tunes: &[
            (
                "film",
                TuneArg::Params("psy-rd=2.0:psy-rdoq=1.0:aq-mode=3:no-sao=1"),
            ),
            (
                "animation",
                TuneArg::Params("psy-rd=0.4:aq-strength=0.4:deblock=1,1:bframes=8"),
            ),
            (
                "grain",
                TuneArg::Params(
                    "psy-rd=4.0:psy-rdoq=10.0:aq-mode=3:no-sao=1:deblock=-2,-2:ipratio=1.1:pbratio=1.0:qcomp=0.8",
                ),
            ),
            ("psnr", TuneArg::Passthrough),
            ("ssim", TuneArg::Passthrough),
            ("fastdecode", TuneArg::Passthrough),
            ("zerolatency", TuneArg::Passthrough),
            ("none", TuneArg::Omit),
        ],
    },
    CodecStrategy {
        codec: VideoCodec::SvtAv1,
        encoder: "libsvtav1",
        pix_fmt: "yuv420p10le",
        params_flag: Some("-svtav1-params"),
        uhd: rate("5", 10),
        hd: rate("5", 10),
        sd: rate("5", 10),
        tunes: &[
            (
                "film",
                TuneArg::Params("tune=0:film-grain=8:film-grain-denoise=0:enable-qm=1:qm-min=0"),
            ),
            ("none", TuneArg::Omit),
        ],
    },
];

pub fn strategy_for(codec: VideoCodec) -> Option<&'static CodecStrategy> {
    STRATEGIES.iter().find(|s| s.codec == codec)
}

/// Resolved encoder settings for the output video stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeProfile {
    pub encoder: &'static str,
    pub preset: &'static str,
    pub crf: u32,
    pub pix_fmt: &'static str,
    pub resolution: ResolutionClass,
    /// `-tune` value, when the tune is passed through verbatim
    pub tune: Option<String>,
    /// Codec private parameters as (flag, value)
    pub codec_params: Option<(&'static str, &'static str)>,
    pub gop: u32,
}

impl EncodeProfile {
    /// Codec and quality arguments, without GOP
    pub fn codec_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.encoder.to_string(),
            "-preset".to_string(),
            self.preset.to_string(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pix_fmt.to_string(),
        ];
        if let Some(tune) = &self.tune {
            args.push("-tune".to_string());
            args.push(tune.clone());
        }
        if let Some((flag, value)) = self.codec_params {
            args.push(flag.to_string());
            args.push(value.to_string());
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoProfile {
    /// Video is stream-copied; no profile, no filters
    Copy,
    Encode(EncodeProfile),
}

/// Keyframe interval targeting ~10 seconds, doubled when the deinterlacer
/// emits one frame per field, capped at `MAX_GOP`.
pub fn compute_gop(frame_rate: Rational, deinterlaced: bool) -> u32 {
    let factor = if deinterlaced { 2.0 } else { 1.0 };
    let gop = (frame_rate.as_f64() * GOP_SECONDS * factor).round();
    (gop as u32).min(MAX_GOP)
}

/// Height of the encoded picture: the crop height when cropping, else the source height
pub fn output_height(video: &Track, crop: &CropSpec) -> PlanResult<u32> {
    match crop {
        CropSpec::Explicit(rect) => Ok(rect.height),
        CropSpec::Pending => Err(PlanError::PendingCrop),
        CropSpec::None => video.height.ok_or(PlanError::MissingField {
            index: video.global_index,
            field: "Height",
        }),
    }
}

/// Look up encoder parameters for the given codec, tune and video track
pub fn resolve(
    codec: VideoCodec,
    tune: &Tune,
    video: &Track,
    crop: &CropSpec,
) -> PlanResult<VideoProfile> {
    if codec == VideoCodec::Copy {
        return Ok(VideoProfile::Copy);
    }

    let strategy =
        strategy_for(codec).ok_or_else(|| PlanError::UnsupportedCodec(codec.to_string()))?;

    let tune_arg = strategy
        .tune_arg(tune)
        .ok_or_else(|| PlanError::UnsupportedTune {
            codec: codec.to_string(),
            tune: tune.as_str().to_string(),
        })?;

    let height = output_height(video, crop)?;
    let resolution = ResolutionClass::from_height(height);
    let rate = strategy.rate(resolution);

    let frame_rate = video.frame_rate().ok_or(PlanError::MissingField {
        index: video.global_index,
        field: "FrameRate",
    })?;
    let gop = compute_gop(frame_rate, video.scan_type.needs_deinterlace());

    let (tune, codec_params) = match (tune_arg, strategy.params_flag) {
        (TuneArg::Passthrough, _) => (Some(tune.as_str().to_string()), None),
        (TuneArg::Params(value), Some(flag)) => (None, Some((flag, value))),
        (TuneArg::Params(_), None) | (TuneArg::Omit, _) => (None, None),
    };

    tracing::debug!(
        encoder = strategy.encoder,
        height,
        ?resolution,
        preset = rate.preset,
        crf = rate.crf,
        gop,
        "resolved video profile"
    );

    Ok(VideoProfile::Encode(EncodeProfile {
        encoder: strategy.encoder,
        preset: rate.preset,
        crf: rate.crf,
        pix_fmt: strategy.pix_fmt,
        resolution,
        tune,
        codec_params,
        gop,
    }))
}
