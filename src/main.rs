use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::Level;

use localize_html::config::{ConfigManager, ContentMode, LocalizeConfig};
use localize_html::core::{localize_html_files, LocalizeError, LocalizeResult};
use localize_html::diagnostics::Diagnostics;
use localize_html::env::{logging, EnvVar};

#[derive(Parser, Debug)]
#[command(
    name = "localize-html",
    version,
    about = "Generate per-language copies of HTML templates"
)]
struct Cli {
    /// Directory containing the HTML templates
    output_dir: PathBuf,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Translations JSON file or directory of <lang>.json files
    #[arg(short, long)]
    translations: Option<PathBuf>,

    /// Selector for elements to translate
    #[arg(short, long)]
    selector: Option<String>,

    /// Attribute holding the translation key
    #[arg(short, long)]
    key_attribute: Option<String>,

    /// Template file pattern relative to OUTPUT_DIR (repeatable)
    #[arg(short, long = "glob")]
    glob: Vec<String>,

    /// Delete templates after all languages are written
    #[arg(short = 'D', long)]
    delete_source: bool,

    /// Do not report missing translations or print the summary
    #[arg(short, long)]
    quiet: bool,

    /// Insert translations as escaped text instead of HTML
    #[arg(long)]
    text: bool,

    /// Set the lang attribute of <html> in every output
    #[arg(long)]
    set_lang: bool,

    /// Charset of the templates
    #[arg(short, long)]
    encoding: Option<String>,
}

impl Cli {
    /// CLI 参数覆盖配置文件和环境变量
    fn apply_to(&self, config: &mut LocalizeConfig) {
        if let Some(translations) = &self.translations {
            config.translations = Some(translations.clone());
        }
        if let Some(selector) = &self.selector {
            config.selector = selector.clone();
        }
        if let Some(key_attribute) = &self.key_attribute {
            config.key_attribute = key_attribute.clone();
        }
        if !self.glob.is_empty() {
            config.glob = self.glob.clone();
        }
        if self.delete_source {
            config.delete_source_html_files = true;
        }
        if self.quiet {
            config.verbose = false;
        }
        if self.text {
            config.content = ContentMode::Text;
        }
        if self.set_lang {
            config.set_lang_attribute = true;
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = Some(encoding.clone());
        }
    }
}

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// Prints an error message to stderr, in red unless `NO_COLOR` is set
fn print_error_message(msg: &str) {
    if logging::NoColor::get_or_default(false) {
        eprintln!("{msg}");
    } else {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    }
}

/// Prints an info message to stdout
fn print_info_message(msg: &str) {
    println!("{msg}");
}

fn main() {
    let cli = Cli::parse();

    init_logging();

    if let Err(e) = run(&cli) {
        print_error_message(&format!("Error: {}", e));
        process::exit(1);
    }
}

fn init_logging() {
    let level = match logging::LogLevel::get() {
        Ok(level) => level.parse::<Level>().unwrap_or(Level::INFO),
        Err(e) => {
            print_error_message(&e.to_string());
            Level::INFO
        }
    };
    let no_color = logging::NoColor::get_or_default(false);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!no_color)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> LocalizeResult<()> {
    let mut config = ConfigManager::load(cli.config.as_deref())?.into_config();
    cli.apply_to(&mut config);

    let output_dir = fs::canonicalize(&cli.output_dir).map_err(|e| LocalizeError::Read {
        path: cli.output_dir.clone(),
        source: e,
    })?;

    let options = config.build_options()?;
    let diagnostics = localize_html_files(&output_dir, &options)?;

    if !cli.quiet {
        print_summary(&diagnostics);
    }

    Ok(())
}

fn print_summary(diagnostics: &Diagnostics) {
    if diagnostics.is_discovery_empty() {
        print_info_message("No HTML files found, nothing was generated");
        return;
    }

    for (source, outputs) in diagnostics.summary() {
        print_info_message(&source.display().to_string());
        for output in outputs {
            print_info_message(&format!("  -> {}", output.display()));
        }
    }

    let missing = diagnostics.missing_translations().count();
    print_info_message(&format!(
        "{} file(s) written, {} missing translation(s)",
        diagnostics.artifact_count(),
        missing
    ));
}
