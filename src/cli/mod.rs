use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod annotation;
mod color;
mod config;
mod hmm;
mod mapping;
mod resources;
mod time;

pub use config::Config;

/// cecog - plate mapping, annotation and class-track tooling
#[derive(Parser)]
#[command(name = "cecog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect, validate or create plate mapping files
    Mapping {
        #[command(subcommand)]
        command: MappingCommand,
    },

    /// Inspect, validate or import marker annotation files
    Annotation {
        #[command(subcommand)]
        command: AnnotationCommand,
    },

    /// Convert a time value between frames, seconds, minutes and hours
    Time {
        /// Value to convert
        #[arg(value_name = "VALUE", allow_negative_numbers = true)]
        value: f64,

        /// Unit of VALUE (frames, seconds, minutes, hours)
        #[arg(long, default_value = "frames")]
        from: String,

        /// Target unit; all units are printed when omitted
        #[arg(long)]
        to: Option<String>,

        /// Seconds between frames (overrides [timing] in the config)
        #[arg(short = 't', long)]
        timelapse: Option<f64>,
    },

    /// Convert a colour between hex and RGB notation
    Color {
        /// `#rrggbb`, `#rgb` or `r,g,b`
        #[arg(value_name = "COLOR")]
        value: String,
    },

    /// Correct classification tracks with a hidden Markov model
    Hmm {
        #[command(subcommand)]
        command: HmmCommand,
    },

    /// Show where resource files are looked up
    Resources,
}

#[derive(Subcommand)]
enum MappingCommand {
    /// Validate a mapping file
    Validate {
        /// Mapping file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Comma-separated positions the mapping must cover
        #[arg(long, value_delimiter = ',')]
        positions: Vec<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the records of a mapping file
    Show {
        /// Mapping file path, or a plate id when --mapping-dir is used
        #[arg(value_name = "FILE_OR_PLATE")]
        file: PathBuf,

        /// Directory holding one mapping file per plate (overrides [paths])
        #[arg(long)]
        mapping_dir: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a mapping file skeleton for a set of positions
    Template {
        /// Output file path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Comma-separated position identifiers
        #[arg(long, value_delimiter = ',', required = true)]
        positions: Vec<String>,

        /// Comma-separated wells, one per position; without them the wells
        /// are left blank and `mapping validate` warns until they are filled in
        #[arg(long, value_delimiter = ',')]
        wells: Vec<String>,
    },
}

/// Frame mapping flags shared by annotation commands
#[derive(clap::Args, Clone, Copy)]
struct FrameArgs {
    /// Frame of the first marker slice (overrides [annotation])
    #[arg(long)]
    first_frame: Option<u32>,

    /// Frames between marker slices (overrides [annotation])
    #[arg(long)]
    frame_step: Option<u32>,
}

#[derive(Subcommand)]
enum AnnotationCommand {
    /// Print the markers of one annotation file per frame
    Show {
        /// Marker XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Class definition file for label names (overrides [paths])
        #[arg(long)]
        classes: Option<PathBuf>,

        #[command(flatten)]
        frames: FrameArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate one annotation file
    Validate {
        /// Marker XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Class definition file (overrides [paths])
        #[arg(long)]
        classes: Option<PathBuf>,

        #[command(flatten)]
        frames: FrameArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import a directory of PL<plate>___P<position>.xml files
    Import {
        /// Directory with marker files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Class definition file for per-class counts (overrides [paths])
        #[arg(long)]
        classes: Option<PathBuf>,

        #[command(flatten)]
        frames: FrameArgs,
    },
}

#[derive(Subcommand)]
enum HmmCommand {
    /// Viterbi-smooth label tracks (one `track_id<TAB>l1,l2,...` per line)
    Smooth {
        /// Track file
        #[arg(value_name = "TRACKS")]
        tracks: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Class definition file fixing the label set (overrides [paths])
        #[arg(long)]
        classes: Option<PathBuf>,

        /// Refine the model on the tracks with Baum-Welch before decoding
        #[arg(long)]
        fit: bool,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Mapping { command } => match command {
            MappingCommand::Validate {
                file,
                positions,
                json,
            } => mapping::validate(file, positions, json),
            MappingCommand::Show {
                file,
                mapping_dir,
                json,
            } => mapping::show(file, mapping_dir.or(config.paths.mapping_dir.clone()), json),
            MappingCommand::Template {
                output,
                positions,
                wells,
            } => mapping::template(output, positions, wells),
        },
        Commands::Annotation { command } => match command {
            AnnotationCommand::Show {
                file,
                classes,
                frames,
                json,
            } => annotation::show(
                file,
                classes.or(config.paths.class_definitions.clone()),
                config.frame_mapping(frames.first_frame, frames.frame_step)?,
                json,
            ),
            AnnotationCommand::Validate {
                file,
                classes,
                frames,
                json,
            } => annotation::validate(
                file,
                classes.or(config.paths.class_definitions.clone()),
                config.frame_mapping(frames.first_frame, frames.frame_step)?,
                json,
            ),
            AnnotationCommand::Import {
                dir,
                classes,
                frames,
            } => annotation::import(
                dir,
                classes.or(config.paths.class_definitions.clone()),
                config.frame_mapping(frames.first_frame, frames.frame_step)?,
            ),
        },
        Commands::Time {
            value,
            from,
            to,
            timelapse,
        } => time::run(value, &from, to.as_deref(), config.timelapse(timelapse)?),
        Commands::Color { value } => color::run(&value),
        Commands::Hmm { command } => match command {
            HmmCommand::Smooth {
                tracks,
                output,
                classes,
                fit,
            } => hmm::smooth(
                tracks,
                output,
                classes.or(config.paths.class_definitions.clone()),
                fit,
                &config,
            ),
        },
        Commands::Resources => resources::run(),
    }
}
