use clap::Parser;
use serde::{Deserialize, Serialize};
use speedscan::{
    scan_frames, Detector, DetectorSet, FrameRate, ImageSequence, MarkerPolicy, RunSummary,
    Template, TemplateLibrary, ZnccMatcher,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "speedscan CLI: time a speedrun from extracted frames")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Log detector transitions and scan progress.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PolicyConfig {
    FirstAppearance,
    DependentAppearance,
    FirstDisappearance,
    LastDisappearance,
    MultipleInstances,
}

#[derive(Debug, Deserialize)]
struct MarkerConfig {
    name: String,
    template: String,
    policy: PolicyConfig,
    #[serde(default)]
    threshold: Option<f32>,
    #[serde(default)]
    depends_on: Option<String>,
    #[serde(default = "default_max_instances")]
    max_instances: usize,
    #[serde(default)]
    nms_radius: Option<usize>,
}

fn default_max_instances() -> usize {
    8
}

impl MarkerConfig {
    fn new(name: &str, template: &str, policy: PolicyConfig) -> Self {
        Self {
            name: name.to_string(),
            template: template.to_string(),
            policy,
            threshold: None,
            depends_on: None,
            max_instances: default_max_instances(),
            nms_radius: None,
        }
    }

    fn marker_policy(&self) -> Result<MarkerPolicy, Box<dyn std::error::Error>> {
        Ok(match self.policy {
            PolicyConfig::FirstAppearance => MarkerPolicy::FirstAppearance,
            PolicyConfig::DependentAppearance => {
                let depends_on = self.depends_on.clone().ok_or_else(|| {
                    format!("marker '{}' needs depends_on for dependent_appearance", self.name)
                })?;
                MarkerPolicy::DependentAppearance { depends_on }
            }
            PolicyConfig::FirstDisappearance => MarkerPolicy::FirstDisappearance,
            PolicyConfig::LastDisappearance => MarkerPolicy::LastDisappearance,
            PolicyConfig::MultipleInstances => MarkerPolicy::MultipleInstances {
                max_instances: self.max_instances,
                nms_radius: self.nms_radius,
            },
        })
    }
}

fn default_markers() -> Vec<MarkerConfig> {
    let mut start = MarkerConfig::new("start", "reward_flare", PolicyConfig::DependentAppearance);
    start.depends_on = Some("hades_door".to_string());
    let mut end = MarkerConfig::new("end", "hades_title", PolicyConfig::LastDisappearance);
    end.threshold = Some(0.6);
    vec![
        MarkerConfig::new("hades_door", "hades_door", PolicyConfig::FirstAppearance),
        start,
        end,
    ]
}

#[derive(Debug, Deserialize)]
struct FrameRateConfig {
    num: u32,
    den: u32,
}

impl Default for FrameRateConfig {
    fn default() -> Self {
        Self { num: 60, den: 1 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    frames_dir: String,
    frame_rate: FrameRateConfig,
    start_index: u64,
    templates_dir: String,
    resolution: Option<usize>,
    markers: Vec<MarkerConfig>,
    start_marker: String,
    end_marker: String,
    parallel: bool,
    min_var_i: f32,
    export_dir: Option<String>,
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let matcher = ZnccMatcher::default();
        Self {
            frames_dir: String::new(),
            frame_rate: FrameRateConfig::default(),
            start_index: 0,
            templates_dir: "templates".to_string(),
            resolution: None,
            markers: default_markers(),
            start_marker: "start".to_string(),
            end_marker: "end".to_string(),
            parallel: matcher.parallel(),
            min_var_i: matcher.min_var_i(),
            export_dir: None,
            output_path: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct TimestampRecord {
    seconds: f64,
    pretty: String,
}

#[derive(Debug, Serialize)]
struct DetectorRecord {
    name: String,
    kind: &'static str,
    triggered: bool,
    trigger_index: Option<u64>,
    timestamp: Option<TimestampRecord>,
    failure: Option<String>,
}

impl DetectorRecord {
    fn new(detector: &Detector, rate: FrameRate) -> Self {
        Self {
            name: detector.name().to_string(),
            kind: detector.state().kind(),
            triggered: detector.triggered(),
            trigger_index: detector.trigger_index(),
            timestamp: detector.timestamp(rate).ok().map(|ts| TimestampRecord {
                seconds: ts.seconds(),
                pretty: ts.to_string(),
            }),
            failure: detector.failure().map(|err| err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRecord {
    start_frame: u64,
    end_frame: u64,
    start: TimestampRecord,
    end: TimestampRecord,
    duration: TimestampRecord,
}

impl From<&RunSummary> for SummaryRecord {
    fn from(value: &RunSummary) -> Self {
        let record = |ts: speedscan::Timestamp| TimestampRecord {
            seconds: ts.seconds(),
            pretty: ts.to_string(),
        };
        Self {
            start_frame: value.start_frame,
            end_frame: value.end_frame,
            start: record(value.start),
            end: record(value.end),
            duration: record(value.duration),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    frames: u64,
    frames_per_second: f64,
    detectors: Vec<DetectorRecord>,
    summary: Option<SummaryRecord>,
    error: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("speedscan=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frames_dir.is_empty() {
        return Err("frames_dir must be set in the config".into());
    }
    if config.markers.is_empty() {
        return Err("at least one marker must be configured".into());
    }

    let rate = FrameRate::new(config.frame_rate.num, config.frame_rate.den)?;
    let frames = ImageSequence::open(&config.frames_dir, rate)?.starting_at(config.start_index);
    let resolution = match config.resolution {
        Some(resolution) => resolution,
        None => frames.dimensions()?.1,
    };

    // Every indicator is loaded before the first frame is read.
    let library = TemplateLibrary::new(&config.templates_dir, resolution);
    let templates = config
        .markers
        .iter()
        .map(|marker| library.load(&marker.template))
        .collect::<Result<Vec<Template>, _>>()?;

    let matcher = ZnccMatcher::new()
        .with_min_var_i(config.min_var_i)
        .with_parallel(config.parallel);
    let mut set = DetectorSet::with_matcher(matcher).with_parallel(config.parallel);
    for (marker, template) in config.markers.iter().zip(templates) {
        set.add(marker.name.clone(), template, marker.threshold, marker.marker_policy()?)?;
    }

    let report = scan_frames(frames, &mut set)?;

    if let Some(dir) = &config.export_dir {
        set.export_captures(dir)?;
    }

    let summary = RunSummary::from_set(&set, &config.start_marker, &config.end_marker, rate);
    let output = Output {
        frames: report.frames,
        frames_per_second: report.frames_per_second(),
        detectors: set
            .iter()
            .map(|detector| DetectorRecord::new(detector, rate))
            .collect(),
        summary: summary.as_ref().ok().map(SummaryRecord::from),
        error: summary.as_ref().err().map(|err| err.to_string()),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    for detector in set.iter() {
        eprintln!("{detector}");
    }
    let summary = summary?;
    eprintln!("{summary}");

    Ok(())
}
