use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::DefaultsConfig;
use crate::engine::core::{
    AudioEncode, CropSpec, LanguageRequest, PlanResult, SelectionRequest, TrackRef, Tune,
    VideoCodec,
};

#[derive(Parser)]
#[command(name = "movmux")]
#[command(
    about = "Picks audio/subtitle tracks and video settings from mediainfo metadata and drives ffmpeg",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode one file
    Encode {
        #[command(flatten)]
        plan: PlanArgs,

        /// Print the ffmpeg command instead of running it
        #[arg(long)]
        pretend: bool,
    },

    /// Show the ffmpeg command that would be run (dry run)
    Plan {
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// List the tracks mediainfo reports for a file
    Probe {
        /// Path to the media file
        file: PathBuf,

        /// Print the parsed tracks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg, mediainfo and mkvpropedit are installed
    CheckTools,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Input media file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to <input stem>.<codec>.<container> next to the input)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Audio languages in priority order: en, en? (optional), any, any?, none
    #[arg(long, value_delimiter = ',', value_name = "LANG")]
    pub langs: Vec<String>,

    /// Tracks to keep: global index (3) or typed index (v:1, a:1, s:0); one video at most
    #[arg(long, value_delimiter = ',', value_name = "TRACK")]
    pub tracks: Vec<String>,

    /// none, auto or W:H:X:Y
    #[arg(long)]
    pub crop: Option<String>,

    /// x264, x265, av1 or copy
    #[arg(long)]
    pub vcodec: Option<String>,

    #[arg(long)]
    pub tune: Option<String>,

    /// ffmpeg audio encoder, or copy
    #[arg(long)]
    pub acodec: Option<String>,

    /// Audio bitrate in kbit/s (ignored for copy)
    #[arg(long, value_name = "KBPS")]
    pub abitrate: Option<u32>,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,
}

impl PlanArgs {
    /// Merge command-line values over the config defaults and parse them
    pub fn to_request(&self, defaults: &DefaultsConfig) -> PlanResult<SelectionRequest> {
        let langs = if self.langs.is_empty() {
            &defaults.languages
        } else {
            &self.langs
        };
        let languages = langs
            .iter()
            .map(|l| l.trim().parse::<LanguageRequest>())
            .collect::<PlanResult<Vec<_>>>()?;

        let tracks = self
            .tracks
            .iter()
            .map(|t| t.trim().parse::<TrackRef>())
            .collect::<PlanResult<Vec<_>>>()?;

        let crop: CropSpec = self.crop.as_deref().unwrap_or(&defaults.crop).parse()?;
        let video_codec: VideoCodec = self
            .vcodec
            .as_deref()
            .unwrap_or(&defaults.video_codec)
            .parse()?;
        let tune: Tune = self
            .tune
            .as_deref()
            .unwrap_or(&defaults.tune)
            .parse()
            .unwrap_or_default();

        let audio = AudioEncode {
            codec: self
                .acodec
                .clone()
                .unwrap_or_else(|| defaults.audio_codec.clone()),
            bitrate_kbps: self.abitrate.or(defaults.audio_bitrate_kbps),
        };

        Ok(SelectionRequest {
            tracks,
            languages,
            crop,
            video_codec,
            tune,
            audio,
        })
    }

    pub fn overwrite(&self, defaults: &DefaultsConfig) -> bool {
        self.overwrite || defaults.overwrite
    }

    pub fn output_path(&self, codec: VideoCodec, container: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input, codec, container))
    }
}

/// `<dir>/<stem>.<codec suffix>.<container>`, so the output never shadows the input
pub fn default_output_path(input: &Path, codec: VideoCodec, container: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let file_name = format!("{}.{}.{}", stem, codec.suffix(), container.trim_start_matches('.'));
    input.with_file_name(file_name)
}

pub fn parse() -> Cli {
    Cli::parse()
}
