// Plan resolution and ffmpeg/mkvpropedit execution

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::engine::core::{
    CropSpec, EncodeJob, EncodePlan, MediaDocument, ProgressParser, ProgressUpdate,
    SelectionRequest, accept_detected_crop, build_plan, format_command, needs_crop_detection,
    pre_crop_chain,
};
use crate::engine::crop::CropDetector;

/// Containers mkvpropedit can rewrite in place
const MATROSKA_EXTENSIONS: &[&str] = &["mkv", "mka", "mks", "webm"];

/// Derive the plan, running crop detection first when the request asks for it.
///
/// The request is validated with the crop disabled before the (slow) detector
/// runs, so a bad language or track pin fails fast.
pub fn prepare_plan(
    doc: &MediaDocument,
    request: &SelectionRequest,
    input: &Path,
    output: &Path,
    detector: &dyn CropDetector,
) -> Result<EncodePlan> {
    if !needs_crop_detection(request) {
        return Ok(build_plan(doc, request, input, output)?);
    }

    let uncropped = SelectionRequest {
        crop: CropSpec::None,
        ..request.clone()
    };
    let validated = build_plan(doc, &uncropped, input, output)?;

    let pre_crop = pre_crop_chain(doc, &validated.selection)?;
    let raw = detector.detect(input, &pre_crop)?;
    let rect = accept_detected_crop(&raw)?;
    tracing::info!(crop = %rect, "detected crop");

    let cropped = SelectionRequest {
        crop: CropSpec::Explicit(rect),
        ..request.clone()
    };
    Ok(build_plan(doc, &cropped, input, output)?)
}

/// Probe the job's input and derive its plan.
///
/// With `writes_output` set, the output preconditions are checked before the
/// probe and crop detection run.
pub fn prepare_job<P>(
    mut job: EncodeJob,
    request: &SelectionRequest,
    probe: P,
    detector: &dyn CropDetector,
    writes_output: bool,
) -> Result<(MediaDocument, EncodeJob, EncodePlan)>
where
    P: FnOnce(&Path) -> Result<MediaDocument>,
{
    if writes_output {
        check_output(&job)?;
    }

    let doc = probe(&job.input_path)?;
    job.duration_s = doc.duration_s();
    let plan = prepare_plan(&doc, request, &job.input_path, &job.output_path, detector)?;
    Ok((doc, job, plan))
}

/// Options placed ahead of the plan's own arguments
pub fn global_args(overwrite: bool) -> Vec<String> {
    [
        "-hide_banner",
        "-nostdin",
        if overwrite { "-y" } else { "-n" },
        "-progress",
        "-",
        "-nostats",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Full ffmpeg argument list for a job
pub fn encode_args(job: &EncodeJob, plan: &EncodePlan) -> Vec<String> {
    let mut args = global_args(job.overwrite);
    args.extend(plan.args.iter().cloned());
    args
}

/// Refuse to start when the output would clobber a file or has nowhere to go
pub fn check_output(job: &EncodeJob) -> Result<()> {
    if job.output_path.exists() && !job.overwrite {
        anyhow::bail!(
            "{} already exists (pass --overwrite to replace it)",
            job.output_path.display()
        );
    }
    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            anyhow::bail!("output directory {} doesn't exist", parent.display());
        }
    }
    Ok(())
}

/// Run ffmpeg for a plan, reporting each progress block to `callback`.
///
/// Returns the last progress block ffmpeg wrote. A non-zero exit is an error
/// carrying the tail of ffmpeg's stderr.
pub fn run_encode<F>(
    job: &EncodeJob,
    plan: &EncodePlan,
    ffmpeg: &str,
    mut callback: F,
) -> Result<Option<ProgressUpdate>>
where
    F: FnMut(&ProgressUpdate),
{
    check_output(job)?;

    let args = encode_args(job, plan);
    tracing::info!(
        input = %job.input_path.display(),
        output = %job.output_path.display(),
        "starting encode"
    );
    tracing::debug!(cmd = %format_command(ffmpeg, &args), "ffmpeg");

    let mut child = Command::new(ffmpeg)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn {}. Is ffmpeg installed and in PATH?", ffmpeg))?;

    let stderr = child.stderr.take().context("Failed to capture stderr")?;
    let stderr_thread = std::thread::spawn(move || {
        let mut stderr_output = String::new();
        let reader = BufReader::new(stderr);
        for line in reader.lines().map_while(Result::ok) {
            stderr_output.push_str(&line);
            stderr_output.push('\n');
        }
        stderr_output
    });

    let stdout = child.stdout.take().context("Failed to capture stdout")?;
    let reader = BufReader::new(stdout);
    let mut parser = ProgressParser::new();

    for line in reader.lines().map_while(Result::ok) {
        if let Some(update) = parser.parse_line(&line) {
            tracing::trace!(
                out_time_s = update.out_time_s(),
                fps = ?update.fps,
                speed = ?update.speed,
                "progress"
            );
            callback(update);
        }
    }

    let status = child.wait().context("Failed to wait for ffmpeg")?;
    let stderr_output = stderr_thread
        .join()
        .unwrap_or_else(|_| "Failed to capture stderr".to_string());

    if !status.success() {
        let tail: Vec<&str> = stderr_output.lines().rev().take(5).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        anyhow::bail!(
            "ffmpeg exited with {} while encoding {}:\n{}",
            status,
            job.input_path.display(),
            tail.join("\n")
        );
    }

    if !parser.finished() {
        tracing::warn!("ffmpeg exited without reporting the end of its progress stream");
    }
    tracing::info!(output = %job.output_path.display(), "encode finished");
    Ok(parser.latest().cloned())
}

/// Whether the output is a Matroska-family file mkvpropedit can patch
pub fn is_matroska(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MATROSKA_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Regenerate per-track statistics tags (bitrate, duration, frame count).
///
/// Callers treat a failure here as a warning; the encode itself succeeded.
pub fn patch_container_stats(output: &Path, mkvpropedit: &str) -> Result<()> {
    if !is_matroska(output) {
        tracing::debug!(
            output = %output.display(),
            "not a Matroska file, skipping statistics tags"
        );
        return Ok(());
    }

    let result = Command::new(mkvpropedit)
        .arg("--add-track-statistics-tags")
        .arg(output)
        .output()
        .with_context(|| format!("Failed to execute {}. Is mkvtoolnix installed?", mkvpropedit))?;

    if !result.status.success() {
        anyhow::bail!(
            "mkvpropedit failed for {}: {}",
            output.display(),
            String::from_utf8_lossy(&result.stdout).trim()
        );
    }
    Ok(())
}

fn first_line_of_version(program: &str, flag: &str, hint: &str) -> Result<String> {
    let output = Command::new(program)
        .arg(flag)
        .output()
        .with_context(|| format!("Failed to execute {}. {}", program, hint))?;

    if !output.status.success() {
        anyhow::bail!("{} command failed with status: {}", program, output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check if ffmpeg is available and return its version
pub fn ffmpeg_version(ffmpeg: &str) -> Result<String> {
    first_line_of_version(ffmpeg, "-version", "Is ffmpeg installed and in PATH?")
}

/// Check if mkvpropedit is available and return its version
pub fn mkvpropedit_version(mkvpropedit: &str) -> Result<String> {
    first_line_of_version(mkvpropedit, "--version", "Is mkvtoolnix installed?")
}
