use std::path::PathBuf;

/// One input/output pair handed to the executor
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,

    /// Whether to overwrite an existing output file
    pub overwrite: bool,

    /// Container duration from the probe, used for progress percentages
    pub duration_s: Option<f64>,
}

impl EncodeJob {
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            input_path,
            output_path,
            overwrite: false,
            duration_s: None,
        }
    }
}

/// Snapshot of one ffmpeg `-progress` block
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub out_time_us: u64,
    pub fps: Option<f64>,
    pub speed: Option<f64>,
    /// Bytes written to the output so far
    pub total_size: Option<u64>,
    /// The block was closed by `progress=end`
    pub last: bool,
}

impl ProgressUpdate {
    pub fn out_time_s(&self) -> f64 {
        self.out_time_us as f64 / 1_000_000.0
    }

    /// Share of `duration_s` encoded so far, capped at 100
    pub fn percent_of(&self, duration_s: Option<f64>) -> Option<f64> {
        duration_s
            .filter(|d| *d > 0.0)
            .map(|d| (self.out_time_s() / d * 100.0).min(100.0))
    }
}

/// Folds ffmpeg `-progress` key=value lines into per-block updates.
///
/// ffmpeg reports `N/A` while a value is not known yet; such values keep
/// whatever the previous block said.
#[derive(Debug, Default)]
pub struct ProgressParser {
    pending: ProgressUpdate,
    latest: Option<ProgressUpdate>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one output line. Returns the finished block when the line is
    /// ffmpeg's `progress=continue|end` terminator.
    pub fn parse_line(&mut self, line: &str) -> Option<&ProgressUpdate> {
        let (key, value) = line.split_once('=')?;
        let value = value.trim();
        match key.trim() {
            "out_time_us" => {
                if let Ok(us) = value.parse() {
                    self.pending.out_time_us = us;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    self.pending.fps = Some(fps);
                }
            }
            "speed" => {
                if let Ok(speed) = value.trim_end_matches('x').parse() {
                    self.pending.speed = Some(speed);
                }
            }
            "total_size" => {
                if let Ok(size) = value.parse() {
                    self.pending.total_size = Some(size);
                }
            }
            "progress" => {
                let mut update = self.pending.clone();
                update.last = value == "end";
                return Some(&*self.latest.insert(update));
            }
            _ => {}
        }
        None
    }

    /// Most recent complete block
    pub fn latest(&self) -> Option<&ProgressUpdate> {
        self.latest.as_ref()
    }

    /// Whether ffmpeg signalled the end of its progress stream
    pub fn finished(&self) -> bool {
        self.latest.as_ref().is_some_and(|u| u.last)
    }
}
