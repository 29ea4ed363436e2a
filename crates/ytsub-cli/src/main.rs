//! `ytsub` converts subtitle files for YouTube
//!
//! ```text
//! ytsub movie.ass                 # writes movie.ytt
//! ytsub movie.ytt                 # writes movie.reverse.ass
//! ytsub movie.ytt check.ass -v    # explicit destination, debug logging
//! ytsub movie.ass out.ass --visual
//! ```

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use ytsub_core::formats::{self, ConversionOptions, SubtitleFormat};
use ytsub_core::StyleOptionsList;

/// File looked up next to the executable when `--style-options` is absent
const STYLE_OPTIONS_FILE: &str = "StyleOptions.toml";

/// Convert between ASS, YouTube timed text (srv3), SRT and SBV
#[derive(Parser, Debug)]
#[command(name = "ytsub", author, version, about, long_about = None)]
struct Cli {
    /// Input file (.ass, .ytt, .srv3, .srt or .sbv)
    source: PathBuf,

    /// Output file; its extension selects the format
    destination: Option<PathBuf>,

    /// Write .ass output that shows what the YouTube player draws
    #[arg(long)]
    visual: bool,

    /// Style options TOML (karaoke types, shadow types, current word colors)
    #[arg(long, value_name = "PATH")]
    style_options: Option<PathBuf>,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn destination(&self) -> PathBuf {
        self.destination
            .clone()
            .unwrap_or_else(|| formats::default_destination(&self.source))
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let destination = cli.destination();
    let target = SubtitleFormat::from_path(&destination)
        .with_context(|| format!("cannot write {}", destination.display()))?;
    if !target.can_write() {
        bail!("writing {target} files is not supported");
    }

    let options = ConversionOptions {
        style_options: load_style_options(cli.style_options.as_deref())?,
        visual: cli.visual,
        ..ConversionOptions::default()
    };

    let document = formats::load(&cli.source, &options)
        .with_context(|| format!("failed to read {}", cli.source.display()))?;
    info!(lines = document.lines.len(), source = %cli.source.display(), "loaded");

    let text = formats::write(&document, target, &options)
        .with_context(|| format!("failed to convert {}", cli.source.display()))?;
    save_atomically(&destination, &text)?;
    info!(destination = %destination.display(), "written");
    Ok(())
}

/// Built-in style options overlaid with the user's file, if any
fn load_style_options(explicit: Option<&Path>) -> Result<StyleOptionsList> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::current_exe()
            .ok()
            .map(|exe| exe.with_file_name(STYLE_OPTIONS_FILE))
            .filter(|path| path.is_file()),
    };

    let user = match &path {
        Some(path) => {
            debug!(path = %path.display(), "loading style options");
            let options = StyleOptionsList::load(path)
                .with_context(|| format!("failed to load style options from {}", path.display()))?;
            Some(options)
        }
        None => None,
    };
    StyleOptionsList::with_builtin_defaults(user).context("invalid built-in style options")
}

/// Write through a temporary file in the destination directory so that a
/// failed conversion never leaves a partial file behind
fn save_atomically(destination: &Path, text: &str) -> Result<()> {
    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(directory)
        .with_context(|| format!("failed to create a temporary file in {}", directory.display()))?;
    file.write_all(text.as_bytes())
        .context("failed to write the temporary file")?;
    file.persist(destination)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", destination.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n";

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ytsub").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn arguments_are_parsed() {
        let cli = cli(&["in.ass", "out.ytt", "--visual", "-vv"]);
        assert_eq!(cli.source, PathBuf::from("in.ass"));
        assert_eq!(cli.destination(), PathBuf::from("out.ytt"));
        assert!(cli.visual);
        assert_eq!(cli.verbose, 2);
        assert!(Cli::try_parse_from(["ytsub"]).is_err());
    }

    #[test]
    fn destination_defaults_from_source() {
        assert_eq!(cli(&["show.ytt"]).destination(), PathBuf::from("show.reverse.ass"));
        assert_eq!(cli(&["show.sbv"]).destination(), PathBuf::from("show.srt"));
    }

    #[test]
    fn srt_is_converted_next_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("show.srt");
        fs::write(&source, SRT).unwrap();

        run(&cli(&[source.to_str().unwrap()])).unwrap();

        let ytt = fs::read_to_string(dir.path().join("show.ytt")).unwrap();
        assert!(ytt.contains("<timedtext format=\"3\">"));
        assert!(ytt.contains("Hello"));
    }

    #[test]
    fn explicit_destination_and_reverse_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("show.srt");
        let ytt = dir.path().join("show.ytt");
        let ass = dir.path().join("check.ass");
        fs::write(&source, SRT).unwrap();

        run(&cli(&[source.to_str().unwrap(), ytt.to_str().unwrap()])).unwrap();
        run(&cli(&[ytt.to_str().unwrap(), ass.to_str().unwrap()])).unwrap();

        let script = fs::read_to_string(&ass).unwrap();
        assert!(script.contains("[Events]"));
        assert!(script.contains("Hello"));
    }

    #[test]
    fn failures_leave_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("show.srt");
        fs::write(&source, SRT).unwrap();

        let sbv = dir.path().join("show.sbv");
        let err = run(&cli(&[source.to_str().unwrap(), sbv.to_str().unwrap()])).unwrap_err();
        assert!(format!("{err:#}").contains("not supported"));
        assert!(!sbv.exists());

        let missing = dir.path().join("missing.ass");
        let err = run(&cli(&[missing.to_str().unwrap()])).unwrap_err();
        assert!(format!("{err:#}").starts_with("failed to read"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn user_style_options_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("StyleOptions.toml");
        fs::write(
            &path,
            "[[style]]\nname = \"Karaoke\"\nkaraoke = true\nshadow_types = [\"glow\"]\n",
        )
        .unwrap();

        let options = load_style_options(Some(&path)).unwrap();
        let karaoke = options.get("Karaoke").unwrap();
        assert!(karaoke.is_karaoke);
        assert!(options.get("Default").is_some());

        fs::write(&path, "[[style]\n").unwrap();
        assert!(load_style_options(Some(&path)).is_err());
    }
}
