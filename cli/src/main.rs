//! panstyle CLI - pandoc with styles

use clap::{ArgAction, Parser};
use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};
use panstyle::diagnostics::SENDER;
use panstyle::options::{STDIO, SUPPORT_ENV};
use panstyle::{Diagnostics, Options, Pandoc, StdinStage};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "panstyle")]
#[command(author = "panstyle contributors")]
#[command(version)]
#[command(
    about = "Run pandoc with styles",
    long_about = "Run pandoc with styles.\n\n\
        Styles named in a document's metadata are resolved against the style \
        definitions in the support directory, and the resulting filters, \
        scripts and postprocessors run around the conversion.\n\n\
        Arguments after `--` are passed to pandoc unchanged."
)]
struct Cli {
    /// Input files (`-` or none for standard input)
    #[arg(value_name = "FILE")]
    input: Vec<String>,

    /// Output file (`-` for standard output)
    #[arg(short, long, value_name = "FILE", default_value = STDIO)]
    output: String,

    /// Writer (output format)
    #[arg(short = 't', long = "to", visible_alias = "write", visible_short_alias = 'w')]
    to: Option<String>,

    /// Reader (input format)
    #[arg(short = 'f', long = "from", visible_alias = "read", visible_short_alias = 'r')]
    from: Option<String>,

    /// Template, overriding any style template
    #[arg(long, value_name = "FILE")]
    template: Option<String>,

    /// Filter to run before the styled filters (repeatable)
    #[arg(short = 'F', long = "filter", value_name = "PROGRAM")]
    filter: Vec<String>,

    /// Support directory
    #[arg(long, value_name = "DIR", env = SUPPORT_ENV)]
    support: Option<PathBuf>,

    /// Abort after the first error
    #[arg(long)]
    strict: bool,

    /// Show debug messages
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,

    /// Write a log (PREFIX.log) and the final control message (PREFIX.json)
    #[arg(long, value_name = "PREFIX")]
    debug: Option<String>,

    /// Arguments passed through to pandoc
    #[arg(last = true, value_name = "PANDOC_ARGS")]
    pandoc_args: Vec<String>,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Info,
            (false, _) => LevelFilter::Debug,
        }
    }

    fn options(&self) -> Options {
        let input = if self.input.is_empty() {
            vec![STDIO.to_string()]
        } else {
            self.input.clone()
        };
        let mut options = Options::new()
            .with_strict(self.strict)
            .with_input(input)
            .with_output(self.output.as_str())
            .with_engine_args(self.pandoc_args.iter().cloned());
        if let Some(support) = &self.support {
            options = options.with_support(support);
        }
        if let Some(prefix) = &self.debug {
            options = options.with_debug(prefix.as_str());
        }
        if let Some(reader) = &self.from {
            options = options.with_reader(reader.as_str());
        }
        if let Some(writer) = &self.to {
            options = options.with_writer(writer.as_str());
        }
        if let Some(template) = &self.template {
            options = options.with_template(template.as_str());
        }
        for filter in &self.filter {
            options = options.with_filter(filter.as_str());
        }
        options.finalize()
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let diag = Diagnostics::new();
    let mut options = cli.options();

    let mut stage = if options.engine.input.iter().any(|i| i == STDIO) {
        let stage = StdinStage::capture(io::stdin().lock(), &std::env::current_dir()?)?;
        stage.substitute(&mut options);
        Some(stage)
    } else {
        None
    };

    let mut result = panstyle::run(&Pandoc::new(), options, &diag);
    if let Some(stage) = stage.as_mut() {
        result = keep_pipeline_error(result, stage.teardown(&diag), &diag);
    }
    result?;

    if diag.error_count() > 0 || diag.warning_count() > 0 {
        log::debug!(
            "finished with {} error(s) and {} warning(s)",
            diag.error_count(),
            diag.warning_count()
        );
    }
    Ok(())
}

/// The pipeline's own result; a failed teardown is only reported.
fn keep_pipeline_error<T>(
    result: panstyle::Result<T>,
    teardown: panstyle::Result<()>,
    diag: &Diagnostics,
) -> panstyle::Result<T> {
    if let Err(e) = teardown {
        diag.error(format!("could not remove captured stdin: {}", e));
    }
    result
}

/// Logger writing colored messages to stderr and, with `--debug`, a plain
/// timestamped copy of every message to `PREFIX.log`.
struct CliLogger {
    console: env_logger::Logger,
    file: Option<Mutex<File>>,
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.file.is_some() || self.console.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console.matches(record) {
            self.console.log(record);
        }
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(
                    file,
                    "{} - {} - {} - {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.target(),
                    record.level(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Whether a log target is panstyle itself rather than an external program.
fn is_own_target(target: &str) -> bool {
    target == SENDER || target.starts_with(&format!("{}::", SENDER))
}

fn init_logging(cli: &Cli) -> io::Result<()> {
    let console = env_logger::Builder::new()
        .filter_level(cli.level())
        .parse_default_env()
        .format(|buf, record| {
            let sender = record.target();
            let prefix = match record.level() {
                Level::Error => format!("{:>8}", "ERROR").red().bold(),
                Level::Warn => format!("{:>8}", "WARNING").yellow(),
                Level::Info => format!("{:>8}", "").normal(),
                Level::Debug | Level::Trace => format!("{:>8}", "DEBUG").dimmed(),
            };
            if is_own_target(sender) {
                writeln!(buf, "{} {}", prefix, record.args())
            } else {
                writeln!(buf, "{} [{}] {}", prefix, sender.cyan(), record.args())
            }
        })
        .build();

    let file = match &cli.debug {
        Some(prefix) => Some(Mutex::new(File::create(format!("{}.log", prefix))?)),
        None => None,
    };
    let max_level = if file.is_some() {
        LevelFilter::Debug
    } else {
        console.filter()
    };

    log::set_boxed_logger(Box::new(CliLogger { console, file }))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    log::set_max_level(max_level);
    Ok(())
}
