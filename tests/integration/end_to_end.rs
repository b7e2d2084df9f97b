use crate::common::assertions::{assert_cmd_contains, flag_value};
use crate::common::fixtures::{MediaInfoBuilder, feature_film};
use anyhow::Result;
use movmux::cli::PlanArgs;
use movmux::config::DefaultsConfig;
use movmux::engine::core::{
    EncodeJob, FilterChain, MappedTrack, PlanError, SelectionRequest, VideoProfile,
};
use movmux::engine::crop::CropDetector;
use movmux::engine::runner::{encode_args, prepare_plan};
use std::cell::Cell;
use std::path::{Path, PathBuf};

/// Stands in for ffmpeg cropdetect
struct ScriptedCrop {
    result: &'static str,
    calls: Cell<usize>,
}

impl ScriptedCrop {
    fn new(result: &'static str) -> Self {
        Self {
            result,
            calls: Cell::new(0),
        }
    }
}

impl CropDetector for ScriptedCrop {
    fn detect(&self, _input: &Path, _pre_crop: &FilterChain) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.result.to_string())
    }
}

fn cli_request(argv: &[&str]) -> (PlanArgs, SelectionRequest) {
    use clap::Parser;
    let mut full = vec!["movmux", "encode", "/media/film.mkv"];
    full.extend_from_slice(argv);
    let cli = movmux::cli::Cli::try_parse_from(full).unwrap();
    let movmux::cli::Commands::Encode { plan, .. } = cli.command else {
        panic!("expected encode");
    };
    let request = plan.to_request(&DefaultsConfig::default()).unwrap();
    (plan, request)
}

#[test]
fn test_english_ac3_selected_and_default() {
    let (args, request) = cli_request(&["--langs", "en", "--vcodec", "x264"]);
    let detector = ScriptedCrop::new("unused");
    let output = args.output_path(request.video_codec, "mkv");
    assert_eq!(output, PathBuf::from("/media/film.x264.mkv"));

    let plan = prepare_plan(&feature_film(), &request, &args.input, &output, &detector).unwrap();

    assert_eq!(plan.selection.audio, vec![1]);
    assert_eq!(
        plan.mapping.audio,
        vec![MappedTrack {
            source: 1,
            default: Some(true),
            tags: vec![("language".to_string(), "en".to_string())],
        }]
    );
    assert_eq!(detector.calls.get(), 0);

    let VideoProfile::Encode(profile) = &plan.video else {
        panic!("expected encode profile");
    };
    assert_eq!((profile.preset, profile.crf, profile.gop), ("slower", 17, 240));

    let cmd = plan.args.join(" ");
    assert_cmd_contains(&cmd, "-map 0:0 -map 0:1 -disposition:a:0 default");
    assert!(!cmd.contains("0:2"));
    assert!(!cmd.contains("0:3"));
}

#[test]
fn test_auto_crop_runs_detector_once() {
    let (args, request) = cli_request(&["--crop", "auto", "--vcodec", "x265", "--tune", "none"]);
    let detector = ScriptedCrop::new("1920:800:0:140");
    let output = PathBuf::from("/tmp/out.mkv");

    let plan = prepare_plan(&feature_film(), &request, &args.input, &output, &detector).unwrap();
    assert_eq!(detector.calls.get(), 1);
    assert_eq!(
        flag_value(&plan.args, "-vf"),
        Some("scale=trunc(iw*1/2)*2:ih,crop=1920:800:0:140")
    );
    let VideoProfile::Encode(profile) = &plan.video else {
        panic!("expected encode profile");
    };
    assert_eq!(profile.preset, "slow");
}

#[test]
fn test_auto_crop_skipped_for_stream_copy() {
    let (args, request) = cli_request(&["--crop", "auto", "--vcodec", "copy"]);
    let detector = ScriptedCrop::new("1920:800:0:140");
    let output = Path::new("o.mkv");
    let plan = prepare_plan(&feature_film(), &request, &args.input, output, &detector).unwrap();
    assert_eq!(detector.calls.get(), 0);
    assert!(plan.filters.is_empty());
}

#[test]
fn test_garbage_detection_aborts() {
    let (args, request) = cli_request(&["--crop", "auto"]);
    let detector = ScriptedCrop::new("1920:800");
    let err = prepare_plan(&feature_film(), &request, &args.input, Path::new("o.mkv"), &detector)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<PlanError>(),
        Some(&PlanError::MalformedCropDetection("1920:800".to_string()))
    );
}

#[test]
fn test_missing_video_track() {
    let doc = MediaInfoBuilder::new().audio("en", "AAC", 2, 128_000).build();
    let (args, request) = cli_request(&[]);
    let err = prepare_plan(&doc, &request, &args.input, Path::new("o.mkv"), &ScriptedCrop::new(""))
        .unwrap_err();
    assert_eq!(err.downcast_ref::<PlanError>(), Some(&PlanError::NoVideoTrack));
}

#[test]
fn test_executor_args_wrap_plan() {
    let (args, request) = cli_request(&["--overwrite"]);
    let plan = prepare_plan(
        &feature_film(),
        &request,
        &args.input,
        Path::new("/tmp/o.mkv"),
        &ScriptedCrop::new(""),
    )
    .unwrap();

    let mut job = EncodeJob::new(args.input.clone(), PathBuf::from("/tmp/o.mkv"));
    job.overwrite = args.overwrite(&DefaultsConfig::default());
    let full = encode_args(&job, &plan);
    assert_eq!(&full[..6], ["-hide_banner", "-nostdin", "-y", "-progress", "-", "-nostats"]);
    assert_eq!(&full[6..], plan.args.as_slice());
}

#[test]
fn test_plan_is_deterministic() {
    let (args, request) = cli_request(&["--langs", "fr,en?", "--tracks", "s:1"]);
    let derive = || {
        let detector = ScriptedCrop::new("");
        prepare_plan(&feature_film(), &request, &args.input, Path::new("o.mkv"), &detector)
            .unwrap()
    };
    assert_eq!(derive(), derive());
}

#[test]
fn test_pinned_video_angle_is_encoded_and_mapped() {
    let doc = MediaInfoBuilder::new()
        .video(1080, "23.976", "Progressive")
        .video_anamorphic("1.422")
        .audio("en", "AC-3", 6, 640_000)
        .build();
    let (args, request) = cli_request(&["--langs", "en", "--tracks", "v:1", "--crop", "auto"]);
    let detector = ScriptedCrop::new("704:560:8:8");
    let plan = prepare_plan(&doc, &request, &args.input, Path::new("o.mkv"), &detector).unwrap();

    assert_eq!(detector.calls.get(), 1);
    assert_eq!(plan.selection.video, Some(1));
    let VideoProfile::Encode(profile) = &plan.video else {
        panic!("expected encode profile");
    };
    // 576i at 25 fps: SD settings, doubled GOP capped at 300
    assert_eq!((profile.preset, profile.crf, profile.gop), ("veryslow", 16, 300));
    assert_eq!(
        flag_value(&plan.args, "-vf"),
        Some(
            "scale=trunc(iw*711/500/2)*2:ih,bwdif=mode=send_field:parity=auto:deint=all,\
             crop=704:560:8:8"
        )
    );
    assert_cmd_contains(&plan.args.join(" "), "-map 0:1 -map 0:2 -disposition:a:0 default");
    assert!(!plan.args.iter().any(|a| a == "0:0"));
}

#[test]
fn test_without_video_pin_first_video_is_used() {
    let doc = MediaInfoBuilder::new()
        .video(1080, "23.976", "Progressive")
        .video_anamorphic("1.422")
        .audio("en", "AC-3", 6, 640_000)
        .build();
    let (args, request) = cli_request(&["--langs", "en"]);
    let detector = ScriptedCrop::new("");
    let plan = prepare_plan(&doc, &request, &args.input, Path::new("o.mkv"), &detector).unwrap();
    assert_eq!(plan.selection.video, None);
    assert_eq!(plan.mapping.video, 0);
    assert!(!plan.args.iter().any(|a| a == "0:1"));
}
