// Crop detection via ffmpeg's cropdetect filter

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use crate::config::CropDetectConfig;
use crate::engine::core::{FilterChain, FilterSpec};

/// Source of a crop rectangle for an input file.
///
/// Implementations return the raw `w:h:x:y` text; validation happens in the
/// planner (`accept_detected_crop`).
pub trait CropDetector {
    fn detect(&self, input: &Path, pre_crop: &FilterChain) -> Result<String>;
}

/// Runs `ffmpeg -vf <pre-crop chain>,cropdetect` over a sample window
pub struct FfmpegCropDetector {
    pub ffmpeg: String,
    pub settings: CropDetectConfig,
}

impl FfmpegCropDetector {
    pub fn new(ffmpeg: impl Into<String>, settings: CropDetectConfig) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            settings,
        }
    }

    pub fn build_args(&self, input: &Path, pre_crop: &FilterChain) -> Vec<String> {
        let chain = pre_crop.with(FilterSpec {
            name: "cropdetect",
            params: format!(
                "limit={}:round={}:reset=0",
                self.settings.limit, self.settings.round
            ),
        });

        let mut args = vec!["-hide_banner".to_string(), "-nostdin".to_string()];
        if self.settings.skip_secs > 0 {
            args.push("-ss".to_string());
            args.push(self.settings.skip_secs.to_string());
        }
        args.push("-i".to_string());
        args.push(input.to_string_lossy().to_string());
        if self.settings.duration_secs > 0 {
            args.push("-t".to_string());
            args.push(self.settings.duration_secs.to_string());
        }
        args.extend(
            ["-map", "0:v:0", "-an", "-sn", "-vf"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(chain.render());
        args.extend(["-f", "null", "-"].iter().map(|s| s.to_string()));
        args
    }
}

impl CropDetector for FfmpegCropDetector {
    fn detect(&self, input: &Path, pre_crop: &FilterChain) -> Result<String> {
        let args = self.build_args(input, pre_crop);
        tracing::info!(input = %input.display(), "detecting crop");
        tracing::debug!(
            cmd = %crate::engine::core::format_command(&self.ffmpeg, &args),
            "cropdetect"
        );

        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .output()
            .with_context(|| {
                format!("Failed to execute {}. Is ffmpeg installed and in PATH?", self.ffmpeg)
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            anyhow::bail!(
                "crop detection failed for {}: {}",
                input.display(),
                stderr.lines().last().unwrap_or("no output")
            );
        }

        parse_cropdetect_output(&stderr)
            .with_context(|| format!("cropdetect produced no crop values for {}", input.display()))
    }
}

/// Most frequent `crop=` value in cropdetect log output; ties go to the latest.
///
/// The value is returned verbatim so malformed results can be reported as such.
pub fn parse_cropdetect_output(stderr: &str) -> Option<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (line_no, line) in stderr.lines().enumerate() {
        if !line.contains("cropdetect") {
            continue;
        }
        let Some(value) = line
            .rsplit_once("crop=")
            .map(|(_, rest)| rest.split_whitespace().next().unwrap_or(""))
        else {
            continue;
        };
        let entry = counts.entry(value).or_insert((0, line_no));
        entry.0 += 1;
        entry.1 = line_no;
    }

    counts
        .into_iter()
        .max_by_key(|(_, (count, last_seen))| (*count, *last_seen))
        .map(|(value, _)| value.to_string())
}
