use std::io::{self, Read, Write};
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use regex::Regex;

use pickline::config::{bg_color_code, fg_color_code, EnvConfig, Options};
use pickline::core::filter::{Line, MatchSegment};
use pickline::core::tty::TtyGuard;
use pickline::render::HighlightStyle;
use pickline::runtime::{self, Outcome};

#[derive(Parser)]
#[command(name = "pickline")]
#[command(version)]
#[command(about = "Pick lines interactively: pipe in, choose, pipe out", long_about = None)]
struct Cli {
    /// Filter the list with an incremental query line
    #[arg(short, long)]
    query: bool,

    /// Toggle multiple rows with Ctrl-V before confirming
    #[arg(short, long)]
    multi: bool,

    /// Match the query case-insensitively
    #[arg(short, long)]
    ignore_case: bool,

    /// Split each line once: text before the delimiter is shown, text
    /// after it is emitted
    #[arg(short, long, value_name = "SEP")]
    delimiter: Option<String>,

    /// Match the query against the emitted segment instead of the shown one
    #[arg(long, requires = "delimiter")]
    search_payload: bool,

    /// Pin the first N lines as unselectable headers
    #[arg(long, value_name = "N", default_value_t = 0)]
    header: usize,

    /// Highlight the cursor row across the full terminal width
    #[arg(long)]
    cursor_line: bool,

    /// Cursor row foreground color
    #[arg(long, value_name = "COLOR", default_value = "black")]
    line_fg: String,

    /// Cursor row background color
    #[arg(long, value_name = "COLOR", default_value = "white")]
    line_bg: String,

    /// Reduce each emitted line to the regex's first capture group
    #[arg(short, long, value_name = "REGEX")]
    pattern: Option<String>,
}

fn main() {
    match run(Cli::parse()) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("pickline: {err:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let pattern = cli
        .pattern
        .as_deref()
        .map(|raw| Regex::new(raw).with_context(|| format!("invalid pattern {raw:?}")))
        .transpose()?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    let lines = parse_input(&input, cli.delimiter.as_deref())?;

    let opts = Options {
        query_mode: cli.query,
        multi_select: cli.multi,
        case_insensitive: cli.ignore_case,
        separator: cli.delimiter.clone(),
        match_segment: if cli.search_payload {
            MatchSegment::Payload
        } else {
            MatchSegment::Display
        },
        header_rows: cli.header,
        highlight: HighlightStyle {
            fg: fg_color_code(&cli.line_fg),
            bg: bg_color_code(&cli.line_bg),
            cursor_line: cli.cursor_line,
        },
    };

    let outcome = select(&opts, &lines).context("terminal session failed")?;

    let picked = match outcome {
        Outcome::Selected(picked) => picked,
        Outcome::Cancelled => return Ok(1),
    };
    if picked.is_empty() {
        return Ok(1);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for text in &picked {
        writeln!(out, "{}", apply_pattern(pattern.as_ref(), text))?;
    }
    Ok(0)
}

#[cfg(unix)]
fn select(opts: &Options, lines: &[Line]) -> io::Result<Outcome> {
    use pickline::platform::{install_signal_handlers, DevTty};

    let tty = DevTty::open(&EnvConfig::from_env())?;
    let restore = tty.restore_handle();
    // The watcher restores the terminal itself because process::exit skips
    // every destructor, the session's guard included.
    let _signals = install_signal_handlers(move || {
        let _ = restore.restore_now();
        process::exit(1);
    });

    let mut guard = TtyGuard::new(tty);
    runtime::run(guard.tty_mut(), opts, lines)
}

#[cfg(windows)]
fn select(opts: &Options, lines: &[Line]) -> io::Result<Outcome> {
    use pickline::platform::ConsoleTty;

    let tty = ConsoleTty::open(&EnvConfig::from_env())?;
    let mut guard = TtyGuard::new(tty);
    runtime::run(guard.tty_mut(), opts, lines)
}

/// Splits stdin into lines. A single trailing newline is not a final empty
/// line; interior empty lines are kept so list positions stay aligned with
/// the producer's output. CRLF input sheds its carriage returns.
fn parse_input(input: &str, separator: Option<&str>) -> Result<Vec<Line>> {
    let trimmed = input.strip_suffix('\n').unwrap_or(input);
    if trimmed.is_empty() {
        bail!("empty input");
    }
    Ok(trimmed
        .split('\n')
        .map(|raw| Line::parse(raw.strip_suffix('\r').unwrap_or(raw), separator))
        .collect())
}

/// With a pattern, each emitted line is reduced to its first capture group;
/// lines the pattern does not match (or where group 1 did not participate)
/// pass through unchanged.
fn apply_pattern<'a>(pattern: Option<&Regex>, text: &'a str) -> &'a str {
    match pattern.and_then(|re| re.captures(text)).and_then(|c| c.get(1)) {
        Some(group) => group.as_str(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::{apply_pattern, parse_input};

    #[test]
    fn trailing_newline_is_not_an_extra_line() {
        let lines = parse_input("a\nb\n", None).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].display(), "b");
    }

    #[test]
    fn interior_empty_lines_are_kept() {
        let lines = parse_input("a\n\nb", None).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].display(), "");
    }

    #[test]
    fn crlf_input_sheds_carriage_returns() {
        let lines = parse_input("a\r\nb\r\n", None).unwrap();
        assert_eq!(lines[0].display(), "a");
        assert_eq!(lines[1].display(), "b");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_input("", None).is_err());
        assert!(parse_input("\n", None).is_err());
    }

    #[test]
    fn pattern_reduces_to_first_capture_group() {
        let re = Regex::new(r"^(\S+)").unwrap();
        assert_eq!(apply_pattern(Some(&re), "abc def"), "abc");
    }

    #[test]
    fn non_matching_pattern_passes_line_through() {
        let re = Regex::new(r"^(\d+)").unwrap();
        assert_eq!(apply_pattern(Some(&re), "abc"), "abc");
        assert_eq!(apply_pattern(None, "abc"), "abc");
    }
}
