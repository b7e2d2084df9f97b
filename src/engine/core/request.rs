use std::fmt;
use std::str::FromStr;

use super::error::PlanError;
use super::media::TrackRef;
use super::video::{Tune, VideoCodec};

/// One entry of the `--langs` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageRequest {
    /// Two-letter language code
    Code { code: String, required: bool },
    /// Any language; picks the best audio track if nothing is selected yet
    Any { required: bool },
    /// Disable language-based selection (and the best-track fallback)
    None,
}

impl LanguageRequest {
    pub fn required(code: &str) -> Self {
        LanguageRequest::Code {
            code: code.to_string(),
            required: true,
        }
    }

    pub fn optional(code: &str) -> Self {
        LanguageRequest::Code {
            code: code.to_string(),
            required: false,
        }
    }
}

impl FromStr for LanguageRequest {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, required) = match s.strip_suffix('?') {
            Some(body) => (body, false),
            None => (s, true),
        };

        match body {
            "any" => Ok(LanguageRequest::Any { required }),
            "none" if required => Ok(LanguageRequest::None),
            code if code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase()) => {
                Ok(LanguageRequest::Code {
                    code: code.to_string(),
                    required,
                })
            }
            _ => Err(PlanError::MalformedLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for LanguageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = |required: bool| if required { "" } else { "?" };
        match self {
            LanguageRequest::Code { code, required } => write!(f, "{}{}", code, suffix(*required)),
            LanguageRequest::Any { required } => write!(f, "any{}", suffix(*required)),
            LanguageRequest::None => f.write_str("none"),
        }
    }
}

/// Region of the source frame to keep (`w:h:x:y`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CropRect {
    /// Parse exactly four non-negative integers separated by ':'
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let mut next = || -> Option<u32> {
            let part = parts.next()?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse().ok()
        };
        let rect = CropRect {
            width: next()?,
            height: next()?,
            x: next()?,
            y: next()?,
        };
        if parts.next().is_some() || rect.width == 0 || rect.height == 0 {
            return None;
        }
        Some(rect)
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropSpec {
    #[default]
    None,
    Explicit(CropRect),
    /// Must be replaced by the detected rectangle before the filter chain is built
    Pending,
}

impl FromStr for CropSpec {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CropSpec::None),
            "auto" => Ok(CropSpec::Pending),
            other => CropRect::parse(other)
                .map(CropSpec::Explicit)
                .ok_or_else(|| PlanError::MalformedCropSpec(other.to_string())),
        }
    }
}

/// Output audio encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEncode {
    /// ffmpeg encoder name, or "copy"
    pub codec: String,
    pub bitrate_kbps: Option<u32>,
}

impl Default for AudioEncode {
    fn default() -> Self {
        Self {
            codec: "copy".to_string(),
            bitrate_kbps: None,
        }
    }
}

/// Everything the planner needs besides the probe document
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    /// Manually pinned tracks, honored before any language matching
    pub tracks: Vec<TrackRef>,
    pub languages: Vec<LanguageRequest>,
    pub crop: CropSpec,
    pub video_codec: VideoCodec,
    pub tune: Tune,
    pub audio: AudioEncode,
}

impl Default for SelectionRequest {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            languages: vec![LanguageRequest::Any { required: false }],
            crop: CropSpec::None,
            video_codec: VideoCodec::X264,
            tune: Tune::Film,
            audio: AudioEncode::default(),
        }
    }
}
