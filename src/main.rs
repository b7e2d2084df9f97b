use anyhow::{Context, Result};
use std::io::Write;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

use movmux::cli::{self, Cli, Commands, PlanArgs};
use movmux::config::Config;
use movmux::engine::core::{
    EncodeJob, EncodePlan, MediaDocument, PlanError, VideoProfile, format_command,
};
use movmux::engine::crop::FfmpegCropDetector;
use movmux::engine::{probe, runner};

fn main() -> ExitCode {
    let cli = cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.chain().find_map(|e| e.downcast_ref::<PlanError>()) {
                Some(plan_err) => eprintln!("error ({}): {:#}", plan_err.category(), err),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::ERROR
    } else {
        match cli.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Encode { plan, pretend } => {
            let config = load_config(&cli)?;
            let (doc, job, encode_plan) = derive(&config, plan, !*pretend)?;

            if *pretend {
                print_plan(&doc, &encode_plan);
                println!(
                    "{}",
                    format_command(&config.tools.ffmpeg, &runner::encode_args(&job, &encode_plan))
                );
                return Ok(());
            }

            println!(
                "Encoding: {} → {}",
                job.input_path.display(),
                job.output_path.display()
            );
            if let Some(dur) = job.duration_s {
                println!("Duration: {:.2}s", dur);
            }

            let last_update =
                runner::run_encode(&job, &encode_plan, &config.tools.ffmpeg, |update| {
                    if let Some(pct) = update.percent_of(job.duration_s) {
                        print!("\rProgress: {:.1}%", pct);
                        if let Some(fps) = update.fps {
                            print!(" | FPS: {:.1}", fps);
                        }
                        if let Some(speed) = update.speed {
                            print!(" | Speed: {:.2}x", speed);
                        }
                        std::io::stdout().flush().ok();
                    }
                })?;
            println!();

            if let Some(size) = last_update.and_then(|u| u.total_size) {
                let mib = size as f64 / 1048576.0;
                println!("Wrote {} ({:.1} MiB)", job.output_path.display(), mib);
            }

            if config.post.patch_statistics {
                if let Err(e) =
                    runner::patch_container_stats(&job.output_path, &config.tools.mkvpropedit)
                {
                    tracing::warn!("could not update track statistics: {:#}", e);
                }
            }
        }

        Commands::Plan { plan } => {
            let config = load_config(&cli)?;
            let (doc, job, encode_plan) = derive(&config, plan, false)?;
            print_plan(&doc, &encode_plan);
            println!(
                "{}",
                format_command(&config.tools.ffmpeg, &runner::encode_args(&job, &encode_plan))
            );
        }

        Commands::Probe { file, json } => {
            let config = load_config(&cli)?;
            let doc = probe::probe_media(file, &config.tools.mediainfo)?;
            if *json {
                let rendered =
                    serde_json::to_string_pretty(&doc).context("Failed to serialize tracks")?;
                println!("{}", rendered);
                return Ok(());
            }
            println!("File: {}", file.display());
            if let Some(dur) = doc.duration_s() {
                println!("Duration: {:.2}s", dur);
            }
            for track in doc.tracks() {
                println!("  {}", track.describe());
            }
        }

        Commands::CheckTools => {
            let config = load_config(&cli)?;
            let checks = [
                ("ffmpeg", runner::ffmpeg_version(&config.tools.ffmpeg)),
                ("mediainfo", probe::mediainfo_version(&config.tools.mediainfo)),
                ("mkvpropedit", runner::mkvpropedit_version(&config.tools.mkvpropedit)),
            ];
            let mut missing = 0;
            for (name, result) in checks {
                match result {
                    Ok(version) => println!("✓ {}: {}", name, version),
                    Err(e) => {
                        println!("✗ {}: {:#}", name, e);
                        missing += 1;
                    }
                }
            }
            if missing > 0 {
                anyhow::bail!("{} required tool(s) unavailable", missing);
            }
        }

        Commands::InitConfig => {
            let (path, existed) = match &cli.config {
                Some(path) => {
                    let existed = path.exists();
                    if !existed {
                        Config::default()
                            .save_to(path)
                            .context("Failed to create default config")?;
                    }
                    (path.clone(), existed)
                }
                None => {
                    let existed = Config::exists();
                    Config::ensure_default().context("Failed to create default config")?;
                    (Config::config_path()?, existed)
                }
            };
            if existed {
                println!("Config file already exists at {}", path.display());
            } else {
                println!("Created default config at {}", path.display());
            }
        }
    }

    Ok(())
}

/// Probe the input and derive its plan (running crop detection when asked)
fn derive(
    config: &Config,
    args: &PlanArgs,
    writes_output: bool,
) -> Result<(MediaDocument, EncodeJob, EncodePlan)> {
    let request = args.to_request(&config.defaults)?;
    let output = args.output_path(request.video_codec, &config.defaults.container);

    let mut job = EncodeJob::new(args.input.clone(), output);
    job.overwrite = args.overwrite(&config.defaults);

    let detector =
        FfmpegCropDetector::new(config.tools.ffmpeg.clone(), config.crop_detect.clone());
    runner::prepare_job(
        job,
        &request,
        |input| probe::probe_media(input, &config.tools.mediainfo),
        &detector,
        writes_output,
    )
}

fn print_plan(doc: &MediaDocument, plan: &EncodePlan) {
    println!("Input:  {}", plan.input.display());
    println!("Output: {}", plan.output.display());

    match &plan.video {
        VideoProfile::Copy => println!("Video:  copy"),
        VideoProfile::Encode(profile) => println!(
            "Video:  {} preset={} crf={} gop={}",
            profile.encoder, profile.preset, profile.crf, profile.gop
        ),
    }
    if let Some(index) = plan.selection.video {
        if let Ok(track) = doc.track_by_global_index(index) {
            println!("Source: {}", track.describe());
        }
    }
    if !plan.filters.is_empty() {
        println!("Filters: {}", plan.filters.render());
    }

    let tracks = [
        ("Audio", &plan.selection.audio),
        ("Subs", &plan.selection.subtitles),
    ];
    for (label, indices) in tracks {
        for index in indices {
            if let Ok(track) = doc.track_by_global_index(*index) {
                println!("{:<7} {}", format!("{}:", label), track.describe());
            }
        }
    }
}
