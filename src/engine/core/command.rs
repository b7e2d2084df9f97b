use std::path::Path;

use super::filters::FilterChain;
use super::mapping::MappingDirectives;
use super::request::AudioEncode;
use super::video::VideoProfile;

fn audio_args(audio: &AudioEncode) -> Vec<String> {
    let mut args = vec!["-c:a".to_string(), audio.codec.clone()];
    if audio.codec != "copy" {
        if let Some(kbps) = audio.bitrate_kbps {
            args.push("-b:a".to_string());
            args.push(format!("{}k", kbps));
        }
    }
    args
}

/// Linearize a plan into ffmpeg arguments.
///
/// The order is fixed: input, video codec and quality, GOP, filters, audio,
/// subtitles, mapping, output. Callers must not reorder the result.
pub fn assemble(
    input: &Path,
    output: &Path,
    video: &VideoProfile,
    filters: &FilterChain,
    audio: &AudioEncode,
    mapping: &MappingDirectives,
) -> Vec<String> {
    let mut args = vec!["-i".to_string(), input.to_string_lossy().to_string()];

    match video {
        VideoProfile::Copy => {
            args.push("-c:v".to_string());
            args.push("copy".to_string());
        }
        VideoProfile::Encode(profile) => {
            args.extend(profile.codec_args());
            args.push("-g".to_string());
            args.push(profile.gop.to_string());
            if !filters.is_empty() {
                args.push("-vf".to_string());
                args.push(filters.render());
            }
        }
    }

    args.extend(audio_args(audio));

    args.push("-c:s".to_string());
    args.push("copy".to_string());

    args.extend(mapping.to_args());

    args.push(output.to_string_lossy().to_string());
    args
}

/// Render a program and its arguments as a copy-pasteable shell line
pub fn format_command(program: &str, args: &[String]) -> String {
    let words = std::iter::once(program).chain(args.iter().map(String::as_str));
    shlex::try_join(words.clone())
        .unwrap_or_else(|_| words.collect::<Vec<_>>().join(" "))
}
