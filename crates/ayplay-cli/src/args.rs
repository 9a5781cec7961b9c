//! Command-line argument parsing.

use std::env;
use std::fmt;

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    /// Path of the module to play.
    pub file: String,
    /// Stop after this many passes through the song.
    pub loops: u32,
    /// Master volume in [0, 1].
    pub volume: f32,
    /// Stereo spread for channels A/C (0 = mono-centred).
    pub spread: f32,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Render to this WAV file instead of the audio device.
    pub export: Option<String>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            file: String::new(),
            loops: 1,
            volume: 1.0,
            spread: 0.5,
            sample_rate: 44_100,
            export: None,
        }
    }
}

/// Argument error with the offending token.
#[derive(Debug, Clone)]
pub struct ArgsError(pub String);

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ArgsError {}

/// Usage text printed for `--help` and argument errors.
pub const USAGE: &str = "\
Usage: ayplay [OPTIONS] <FILE>

Plays YM (YM2/YM3/YM3b/YM5/YM6) and PT3 chiptune files.

Options:
  --loops <N>        stop after N passes through the song (default 1, 0 = forever)
  --volume <0-100>   master volume percentage (default 100)
  --spread <0-100>   stereo spread of channels A/C (default 50)
  --rate <HZ>        output sample rate (default 44100)
  --export <FILE>    render to a 16-bit WAV file instead of playing
  -h, --help         show this help
";

/// Parse process arguments. Returns `Ok(None)` when help was requested.
pub fn parse() -> Result<Option<CliArgs>, ArgsError> {
    parse_from(env::args().skip(1))
}

fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Result<Option<CliArgs>, ArgsError> {
    let mut parsed = CliArgs::default();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--loops" => parsed.loops = number(&mut iter, "--loops")?,
            "--volume" => {
                parsed.volume = (number::<u32, _>(&mut iter, "--volume")? as f32 / 100.0).min(1.0)
            }
            "--spread" => {
                parsed.spread = (number::<u32, _>(&mut iter, "--spread")? as f32 / 100.0).min(1.0)
            }
            "--rate" => parsed.sample_rate = number(&mut iter, "--rate")?,
            "--export" => {
                parsed.export = Some(
                    iter.next()
                        .ok_or_else(|| ArgsError("--export needs a file name".into()))?,
                )
            }
            other if other.starts_with('-') => {
                return Err(ArgsError(format!("unknown option {other}")));
            }
            _ => {
                if !parsed.file.is_empty() {
                    return Err(ArgsError("more than one input file given".into()));
                }
                parsed.file = arg;
            }
        }
    }

    if parsed.file.is_empty() {
        return Err(ArgsError("no input file given".into()));
    }
    if parsed.sample_rate < 32_000 || parsed.sample_rate > 96_000 {
        return Err(ArgsError("sample rate must be within 32000-96000".into()));
    }
    Ok(Some(parsed))
}

fn number<T: std::str::FromStr, I: Iterator<Item = String>>(
    iter: &mut I,
    option: &str,
) -> Result<T, ArgsError> {
    iter.next()
        .ok_or_else(|| ArgsError(format!("{option} needs a value")))?
        .parse()
        .map_err(|_| ArgsError(format!("{option} needs a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_vec(args: &[&str]) -> Result<Option<CliArgs>, ArgsError> {
        parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn file_with_defaults() {
        let args = parse_vec(&["song.ym"]).unwrap().unwrap();
        assert_eq!(args.file, "song.ym");
        assert_eq!(args.loops, 1);
        assert_eq!(args.sample_rate, 44_100);
        assert!(args.export.is_none());
    }

    #[test]
    fn options_are_applied() {
        let args = parse_vec(&[
            "--loops", "3", "--volume", "50", "--rate", "48000", "--export", "out.wav",
            "tune.pt3",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(args.loops, 3);
        assert!((args.volume - 0.5).abs() < 1e-6);
        assert_eq!(args.sample_rate, 48_000);
        assert_eq!(args.export.as_deref(), Some("out.wav"));
        assert_eq!(args.file, "tune.pt3");
    }

    #[test]
    fn help_short_circuits() {
        assert!(parse_vec(&["--help"]).unwrap().is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_vec(&[]).is_err());
        assert!(parse_vec(&["--loops", "2"]).is_err());
    }

    #[test]
    fn unknown_option_is_an_error() {
        assert!(parse_vec(&["--frobnicate", "x.ym"]).is_err());
    }

    #[test]
    fn out_of_range_rate_is_an_error() {
        assert!(parse_vec(&["--rate", "8000", "x.ym"]).is_err());
    }
}
