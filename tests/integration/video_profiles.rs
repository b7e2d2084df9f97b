use crate::common::fixtures::MediaInfoBuilder;
use movmux::engine::core::{
    CropRect, CropSpec, EncodeProfile, MAX_GOP, PlanError, ResolutionClass, Tune, VideoCodec,
    VideoProfile, build_filter_chain, resolve_video_profile,
};

fn profile(codec: VideoCodec, tune: Tune, height: u32, fps: &str, scan: &str) -> EncodeProfile {
    let doc = MediaInfoBuilder::new().video(height, fps, scan).build();
    let video = doc.first_video_track().unwrap();
    match resolve_video_profile(codec, &tune, video, &CropSpec::None).unwrap() {
        VideoProfile::Encode(p) => p,
        VideoProfile::Copy => panic!("expected an encode profile"),
    }
}

#[test]
fn test_resolution_class_boundaries() {
    let cases = [
        (2160, ResolutionClass::Uhd),
        (1081, ResolutionClass::Uhd),
        (1080, ResolutionClass::Hd),
        (577, ResolutionClass::Hd),
        (576, ResolutionClass::Sd),
        (480, ResolutionClass::Sd),
    ];
    for (height, expected) in cases {
        assert_eq!(
            profile(VideoCodec::X264, Tune::Film, height, "24.000", "Progressive").resolution,
            expected,
            "height {}",
            height
        );
    }
}

#[test]
fn test_x264_table() {
    let uhd = profile(VideoCodec::X264, Tune::Film, 2160, "24.000", "Progressive");
    assert_eq!((uhd.preset, uhd.crf), ("slow", 18));
    let hd = profile(VideoCodec::X264, Tune::Film, 1080, "24.000", "Progressive");
    assert_eq!((hd.preset, hd.crf), ("slower", 17));
    let sd = profile(VideoCodec::X264, Tune::Film, 576, "25.000", "Progressive");
    assert_eq!((sd.preset, sd.crf), ("veryslow", 16));
    assert_eq!(sd.encoder, "libx264");
    assert_eq!(sd.pix_fmt, "yuv420p");
    assert_eq!(sd.tune.as_deref(), Some("film"));
}

#[test]
fn test_x265_tunes_become_codec_params() {
    let p = profile(VideoCodec::X265, Tune::Grain, 1080, "24.000", "Progressive");
    assert_eq!(p.encoder, "libx265");
    assert_eq!(p.pix_fmt, "yuv420p10le");
    assert_eq!(p.tune, None);
    let (flag, value) = p.codec_params.unwrap();
    assert_eq!(flag, "-x265-params");
    assert!(value.contains("psy-rdoq=10.0"));

    let psnr = profile(
        VideoCodec::X265,
        Tune::Other("psnr".to_string()),
        1080,
        "24.000",
        "Progressive",
    );
    assert_eq!(psnr.tune.as_deref(), Some("psnr"));
    assert_eq!(psnr.codec_params, None);
}

#[test]
fn test_svtav1_same_settings_at_every_resolution() {
    for height in [480, 1080, 2160] {
        let p = profile(VideoCodec::SvtAv1, Tune::Film, height, "24.000", "Progressive");
        assert_eq!((p.encoder, p.preset, p.crf), ("libsvtav1", "5", 10));
        assert_eq!(p.codec_params.map(|(flag, _)| flag), Some("-svtav1-params"));
    }
}

#[test]
fn test_tune_none_is_omitted() {
    for codec in [VideoCodec::X264, VideoCodec::X265, VideoCodec::SvtAv1] {
        let p = profile(codec, Tune::None, 1080, "24.000", "Progressive");
        assert_eq!(p.tune, None, "{}", codec);
        assert_eq!(p.codec_params, None, "{}", codec);
        assert!(!p.codec_args().iter().any(|a| a == "-tune"));
    }
}

#[test]
fn test_unsupported_tune() {
    let doc = MediaInfoBuilder::new().video(1080, "24.000", "Progressive").build();
    let video = doc.first_video_track().unwrap();
    let err = resolve_video_profile(VideoCodec::SvtAv1, &Tune::Animation, video, &CropSpec::None)
        .unwrap_err();
    assert_eq!(
        err,
        PlanError::UnsupportedTune {
            codec: "av1".to_string(),
            tune: "animation".to_string()
        }
    );
    assert!(
        resolve_video_profile(VideoCodec::X264, &Tune::Other("psnr".into()), video, &CropSpec::None)
            .is_err()
    );
}

#[test]
fn test_gop_follows_frame_rate() {
    assert_eq!(profile(VideoCodec::X264, Tune::Film, 1080, "24.000", "Progressive").gop, 240);
    assert_eq!(profile(VideoCodec::X264, Tune::Film, 1080, "23.976", "Progressive").gop, 240);
    assert_eq!(profile(VideoCodec::X264, Tune::Film, 1080, "24000/1001", "Progressive").gop, 240);
    assert_eq!(profile(VideoCodec::X264, Tune::Film, 576, "25.000", "Interlaced").gop, MAX_GOP);
    assert_eq!(profile(VideoCodec::X264, Tune::Film, 1080, "29.970", "Progressive").gop, 300);
    assert_eq!(profile(VideoCodec::X264, Tune::Film, 1080, "59.940", "Progressive").gop, MAX_GOP);
    assert_eq!(profile(VideoCodec::X264, Tune::Film, 480, "12.500", "Interlaced").gop, 250);
}

#[test]
fn test_crop_height_decides_resolution_class() {
    let doc = MediaInfoBuilder::new().video(1080, "24.000", "Progressive").build();
    let video = doc.first_video_track().unwrap();
    let crop = CropSpec::Explicit(CropRect {
        width: 720,
        height: 544,
        x: 600,
        y: 268,
    });
    match resolve_video_profile(VideoCodec::X264, &Tune::Film, video, &crop).unwrap() {
        VideoProfile::Encode(p) => assert_eq!(p.resolution, ResolutionClass::Sd),
        VideoProfile::Copy => unreachable!(),
    }
}

#[test]
fn test_copy_has_no_profile() {
    let doc = MediaInfoBuilder::new().video(1080, "24.000", "Progressive").build();
    let video = doc.first_video_track().unwrap();
    assert_eq!(
        resolve_video_profile(VideoCodec::Copy, &Tune::Grain, video, &CropSpec::Pending),
        Ok(VideoProfile::Copy)
    );
}

#[test]
fn test_filter_chain_order() {
    let doc = MediaInfoBuilder::new().video_anamorphic("1.422").build();
    let video = doc.first_video_track().unwrap();
    let crop = CropSpec::Explicit(CropRect {
        width: 1024,
        height: 560,
        x: 0,
        y: 8,
    });
    let chain = build_filter_chain(video, &crop).unwrap();
    assert_eq!(chain.names(), vec!["scale", "bwdif", "crop"]);
    assert_eq!(
        chain.render(),
        "scale=trunc(iw*711/500/2)*2:ih,bwdif=mode=send_field:parity=auto:deint=all,crop=1024:560:0:8"
    );
}

#[test]
fn test_filter_chain_rejects_bad_aspect_ratio() {
    let doc = MediaInfoBuilder::new().video_anamorphic("0").build();
    let video = doc.first_video_track().unwrap();
    assert_eq!(
        build_filter_chain(video, &CropSpec::None),
        Err(PlanError::InvalidAspectRatio(Some("0".to_string())))
    );
}
