use std::fmt;

use super::error::{PlanError, PlanResult};
use super::media::{Rational, ScanType, Track};
use super::request::CropSpec;

/// One ffmpeg video filter (`name=params`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: &'static str,
    pub params: String,
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.params)
    }
}

/// Ordered video filter chain: aspect-ratio correction, deinterlace, crop.
///
/// Crop comes last because its coordinates refer to the deinterlaced,
/// square-pixel frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterChain {
    filters: Vec<FilterSpec>,
}

impl FilterChain {
    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name).collect()
    }

    /// `-vf` argument value
    pub fn render(&self) -> String {
        self.filters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Same chain with one more filter appended (used to feed `cropdetect`)
    pub fn with(&self, filter: FilterSpec) -> Self {
        let mut filters = self.filters.clone();
        filters.push(filter);
        Self { filters }
    }
}

/// Resample to square pixels; width follows the pixel aspect ratio, height is kept
fn aspect_ratio_filter(video: &Track) -> PlanResult<FilterSpec> {
    let raw = video.pixel_aspect_ratio.as_deref();
    let par = raw
        .and_then(Rational::parse)
        .filter(|r| r.num > 0)
        .ok_or_else(|| PlanError::InvalidAspectRatio(raw.map(str::to_string)))?;

    Ok(FilterSpec {
        name: "scale",
        params: format!("trunc(iw*{}/2)*2:ih", par),
    })
}

fn deinterlace_filter(video: &Track) -> Option<FilterSpec> {
    match &video.scan_type {
        ScanType::Interlaced | ScanType::Mbaff => Some(FilterSpec {
            name: "bwdif",
            params: "mode=send_field:parity=auto:deint=all".to_string(),
        }),
        ScanType::Progressive => None,
        ScanType::Unknown(raw) => {
            tracing::warn!(
                track = video.global_index,
                scan_type = raw.as_deref().unwrap_or("<not reported>"),
                "unrecognized scan type, not deinterlacing; crop or deinterlace manually if needed"
            );
            None
        }
    }
}

/// Build the video filter chain for an already resolved crop
pub fn build(video: &Track, crop: &CropSpec) -> PlanResult<FilterChain> {
    let crop = match crop {
        CropSpec::None => None,
        CropSpec::Explicit(rect) => Some(FilterSpec {
            name: "crop",
            params: rect.to_string(),
        }),
        CropSpec::Pending => return Err(PlanError::PendingCrop),
    };

    let mut filters = vec![aspect_ratio_filter(video)?];
    filters.extend(deinterlace_filter(video));
    filters.extend(crop);

    Ok(FilterChain { filters })
}
