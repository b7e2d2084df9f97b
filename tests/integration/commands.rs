use crate::common::assertions::{
    assert_cmd_contains, assert_cmd_not_contains, assert_flag_order, flag_value,
};
use crate::common::fixtures::{MediaInfoBuilder, feature_film};
use movmux::engine::core::{
    AudioEncode, CropRect, CropSpec, SelectionRequest, Tune, VideoCodec, build_plan,
    format_command,
};
use std::path::Path;

fn plan_args(request: &SelectionRequest) -> Vec<String> {
    build_plan(
        &feature_film(),
        request,
        Path::new("/media/in.mkv"),
        Path::new("/media/out.mkv"),
    )
    .unwrap()
    .args
}

#[test]
fn test_sections_in_fixed_order() {
    let request = SelectionRequest {
        languages: vec!["en".parse().unwrap()],
        tracks: vec!["s:0".parse().unwrap()],
        crop: CropSpec::Explicit(CropRect {
            width: 1920,
            height: 800,
            x: 0,
            y: 140,
        }),
        ..SelectionRequest::default()
    };
    let args = plan_args(&request);
    assert_eq!(args.first().map(String::as_str), Some("-i"));
    assert_eq!(args.last().map(String::as_str), Some("/media/out.mkv"));
    assert_flag_order(
        &args,
        &["-i", "-c:v", "-crf", "-g", "-vf", "-c:a", "-c:s", "-map_metadata", "-map"],
    );
    assert_eq!(flag_value(&args, "-vf"), Some("scale=trunc(iw*1/2)*2:ih,crop=1920:800:0:140"));
    assert_eq!(flag_value(&args, "-c:s"), Some("copy"));
}

#[test]
fn test_audio_bitrate_only_when_encoding() {
    let copy = SelectionRequest {
        audio: AudioEncode {
            codec: "copy".to_string(),
            bitrate_kbps: Some(640),
        },
        ..SelectionRequest::default()
    };
    assert_eq!(flag_value(&plan_args(&copy), "-b:a"), None);

    let opus = SelectionRequest {
        audio: AudioEncode {
            codec: "libopus".to_string(),
            bitrate_kbps: Some(256),
        },
        ..SelectionRequest::default()
    };
    let args = plan_args(&opus);
    assert_eq!(flag_value(&args, "-c:a"), Some("libopus"));
    assert_eq!(flag_value(&args, "-b:a"), Some("256k"));
}

#[test]
fn test_video_copy_has_no_quality_or_filters() {
    let request = SelectionRequest {
        video_codec: VideoCodec::Copy,
        crop: CropSpec::Explicit(CropRect {
            width: 1920,
            height: 800,
            x: 0,
            y: 140,
        }),
        ..SelectionRequest::default()
    };
    let cmd = plan_args(&request).join(" ");
    assert_cmd_contains(&cmd, "-c:v copy");
    assert_cmd_not_contains(&cmd, "-crf");
    assert_cmd_not_contains(&cmd, "-g ");
    assert_cmd_not_contains(&cmd, "-vf");
}

#[test]
fn test_first_audio_is_default_others_cleared() {
    let request = SelectionRequest {
        languages: vec!["en".parse().unwrap(), "fr".parse().unwrap()],
        ..SelectionRequest::default()
    };
    let args = plan_args(&request);
    assert_eq!(flag_value(&args, "-disposition:a:0"), Some("default"));
    assert_eq!(flag_value(&args, "-disposition:a:1"), Some("0"));
    assert_eq!(flag_value(&args, "-metadata:s:a:0"), Some("language=en"));
    assert_eq!(flag_value(&args, "-metadata:s:a:1"), Some("language=fr"));
}

#[test]
fn test_subtitle_tags_without_disposition() {
    let request = SelectionRequest {
        languages: vec!["en".parse().unwrap()],
        tracks: vec!["s:0".parse().unwrap(), "s:1".parse().unwrap()],
        ..SelectionRequest::default()
    };
    let cmd = plan_args(&request).join(" ");
    assert_cmd_contains(&cmd, "-map 0:4 -metadata:s:s:0 language=en -metadata:s:s:0 title=SDH");
    assert_cmd_contains(&cmd, "-map 0:5 -metadata:s:s:1 language=fr");
    assert_cmd_not_contains(&cmd, "-metadata:s:s:1 title");
    assert_cmd_not_contains(&cmd, "-disposition:s");
}

#[test]
fn test_untitled_track_gets_no_title_tag() {
    let doc = MediaInfoBuilder::new()
        .video(1080, "24.000", "Progressive")
        .audio_titled("en", "AC-3", 6, "null")
        .build();
    let plan = build_plan(
        &doc,
        &SelectionRequest::default(),
        Path::new("in.mkv"),
        Path::new("out.mkv"),
    )
    .unwrap();
    let cmd = plan.args.join(" ");
    assert_cmd_contains(&cmd, "-metadata:s:a:0 language=en");
    assert_cmd_not_contains(&cmd, "title=");
}

#[test]
fn test_format_command_quotes_paths() {
    let request = SelectionRequest {
        tune: Tune::None,
        ..SelectionRequest::default()
    };
    let args = build_plan(
        &feature_film(),
        &request,
        Path::new("/media/My Movie (1999).mkv"),
        Path::new("/out/it's.mkv"),
    )
    .unwrap()
    .args;
    let line = format_command("ffmpeg", &args);
    assert!(line.starts_with("ffmpeg -i '/media/My Movie (1999).mkv' -c:v libx264"));
    assert!(line.ends_with(r#""/out/it's.mkv""#), "{}", line);
}
