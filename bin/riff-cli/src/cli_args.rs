//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use riff_studio::ComposeOptions;
use riff_types::{Contrast, LyricsDensity, SynthesisKnobs, TaskType};

/// riff - generate two takes of a song from a prompt
#[derive(Parser)]
#[command(name = "riff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Origin of the riff-server proxy
    #[arg(long, global = true, env = "RIFF_SERVER", default_value = "http://127.0.0.1:3000")]
    pub server: String,

    /// SQLite URL of the local track library
    #[arg(long, global = true, env = "RIFF_LIBRARY", default_value = "sqlite://riff_library.db")]
    pub library: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Write lyrics (unless instrumental), generate two takes and save them
    Generate(GenerateArgs),

    /// Inspect the local track library
    #[command(subcommand)]
    Library(LibraryCommand),
}

#[derive(Subcommand)]
pub(crate) enum LibraryCommand {
    /// List saved tracks, newest first
    List,

    /// Write a saved track's audio to disk
    Export {
        /// Track id (the job id it was generated under)
        id: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Args)]
pub(crate) struct GenerateArgs {
    /// Free-form description of the song (smart mode)
    #[arg(
        required_unless_present = "caption",
        conflicts_with_all = ["caption", "lyrics", "lyrics_file"]
    )]
    pub prompt: Option<String>,

    /// Explicit style caption (pro mode)
    #[arg(long)]
    pub caption: Option<String>,

    /// Lyrics for pro mode; left blank, the lyrics writer drafts them
    #[arg(long, requires = "caption", conflicts_with = "lyrics_file")]
    pub lyrics: Option<String>,

    /// Read pro-mode lyrics from a file
    #[arg(long, requires = "caption")]
    pub lyrics_file: Option<PathBuf>,

    /// Track length in seconds
    #[arg(short, long, default_value_t = riff_types::generate::DEFAULT_DURATION)]
    pub duration: f64,

    /// No vocals
    #[arg(long)]
    pub instrumental: bool,

    /// Mood hint for the lyrics writer
    #[arg(long)]
    pub vibe: Option<String>,

    #[arg(long, value_enum, default_value_t = DensityArg::Moderate)]
    pub density: DensityArg,

    /// Ask for a distinct set of lyrics for the second take
    #[arg(long)]
    pub alt_lyrics: bool,

    /// How far the second take strays from the first
    #[arg(long, value_enum, default_value_t = ContrastArg::Balanced)]
    pub contrast: ContrastArg,

    /// Seed for the first take; the second uses seed + 1
    #[arg(long)]
    pub seed: Option<i64>,

    #[arg(long)]
    pub bpm: Option<u32>,

    /// Key and scale, e.g. "C major"
    #[arg(long)]
    pub key: Option<String>,

    /// Time signature, e.g. "4"
    #[arg(long)]
    pub time_signature: Option<String>,

    /// Vocal language code passed to the model ("auto" lets it decide)
    #[arg(long)]
    pub vocal_language: Option<String>,

    /// Language the lyrics are written in
    #[arg(long)]
    pub language: Option<String>,

    /// "male" or "female"
    #[arg(long)]
    pub voice_gender: Option<String>,

    /// Comma-separated tags folded into a pro-mode caption
    #[arg(long)]
    pub style_tags: Option<String>,

    /// Comma-separated tags to avoid in a pro-mode caption
    #[arg(long)]
    pub negative_tags: Option<String>,

    #[arg(long, value_enum)]
    pub task: Option<TaskArg>,

    /// Source audio uploaded for cover, repaint, extend or extract tasks
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Diffusion steps
    #[arg(long)]
    pub steps: Option<i64>,

    /// Replace each take's chorus with a freshly written one before generating
    #[arg(long)]
    pub rewrite_chorus: bool,

    /// Do not add the takes to the library
    #[arg(long)]
    pub no_save: bool,

    /// Directory the audio files are written to
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum DensityArg {
    Light,
    Moderate,
    Heavy,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ContrastArg {
    Subtle,
    Balanced,
    Bold,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum TaskArg {
    Text2music,
    Cover,
    Repaint,
    Extend,
    Extract,
}

impl From<DensityArg> for LyricsDensity {
    fn from(arg: DensityArg) -> Self {
        match arg {
            DensityArg::Light => LyricsDensity::Light,
            DensityArg::Moderate => LyricsDensity::Moderate,
            DensityArg::Heavy => LyricsDensity::Heavy,
        }
    }
}

impl From<ContrastArg> for Contrast {
    fn from(arg: ContrastArg) -> Self {
        match arg {
            ContrastArg::Subtle => Contrast::Subtle,
            ContrastArg::Balanced => Contrast::Balanced,
            ContrastArg::Bold => Contrast::Bold,
        }
    }
}

impl From<TaskArg> for TaskType {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::Text2music => TaskType::Text2music,
            TaskArg::Cover => TaskType::Cover,
            TaskArg::Repaint => TaskType::Repaint,
            TaskArg::Extend => TaskType::Extend,
            TaskArg::Extract => TaskType::Extract,
        }
    }
}

impl GenerateArgs {
    /// Composition settings; `source_path` is the uploaded source, if any.
    pub fn compose_options(&self, source_path: Option<String>) -> ComposeOptions {
        ComposeOptions {
            duration: self.duration,
            instrumental: self.instrumental,
            vibe: self.vibe.clone(),
            lyrics_density: self.density.into(),
            alt_lyrics: self.alt_lyrics,
            contrast: self.contrast.into(),
            seed: self.seed,
            bpm: self.bpm,
            keyscale: self.key.clone(),
            timesignature: self.time_signature.clone(),
            vocal_language: self.vocal_language.clone(),
            language: self.language.clone(),
            voice_gender: self.voice_gender.clone(),
            style_tags: self.style_tags.clone(),
            negative_tags: self.negative_tags.clone(),
            knobs: SynthesisKnobs {
                task_type: self.task.map(Into::into),
                src_audio_path: source_path,
                inference_steps: self.steps,
                ..SynthesisKnobs::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_prompt_with_defaults() {
        let cli = Cli::try_parse_from(["riff", "generate", "a rainy lo-fi afternoon"]).unwrap();
        assert_eq!(cli.server, "http://127.0.0.1:3000");
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };
        assert_eq!(args.prompt.as_deref(), Some("a rainy lo-fi afternoon"));

        let options = args.compose_options(None);
        assert_eq!(options.duration, riff_types::generate::DEFAULT_DURATION);
        assert_eq!(options.contrast, Contrast::Balanced);
        assert_eq!(options.lyrics_density, LyricsDensity::Moderate);
        assert!(options.knobs.task_type.is_none());
    }

    #[test]
    fn pro_mode_options_map_through() {
        let cli = Cli::try_parse_from([
            "riff", "generate", "--caption", "synthwave, driving", "--lyrics", "[Verse]\nneon",
            "--contrast", "bold", "--density", "heavy", "--seed", "7", "--task", "cover",
            "--server", "http://studio:8080",
        ])
        .unwrap();
        assert_eq!(cli.server, "http://studio:8080");
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };

        let options = args.compose_options(Some("/audio/uploads/src.mp3".into()));
        assert_eq!(options.contrast, Contrast::Bold);
        assert_eq!(options.lyrics_density, LyricsDensity::Heavy);
        assert_eq!(options.seeds(), (Some(7), Some(8)));
        assert_eq!(options.knobs.task_type, Some(TaskType::Cover));
        assert_eq!(options.knobs.src_audio_path.as_deref(), Some("/audio/uploads/src.mp3"));
    }

    #[test]
    fn prompt_or_caption_is_required() {
        assert!(Cli::try_parse_from(["riff", "generate"]).is_err());
        assert!(Cli::try_parse_from(["riff", "generate", "x", "--caption", "y"]).is_err());
        assert!(Cli::try_parse_from(["riff", "generate", "x", "--lyrics", "la"]).is_err());
        assert!(Cli::try_parse_from(["riff", "generate", "x", "--lyrics-file", "la.txt"]).is_err());
        assert!(Cli::try_parse_from(["riff", "generate", "--lyrics", "la"]).is_err());
    }

    #[test]
    fn library_export() {
        let cli = Cli::try_parse_from(["riff", "library", "export", "job-1", "-o", "/tmp"]).unwrap();
        let Commands::Library(LibraryCommand::Export { id, out }) = cli.command else {
            panic!("expected export")
        };
        assert_eq!(id, "job-1");
        assert_eq!(out, PathBuf::from("/tmp"));
    }
}
