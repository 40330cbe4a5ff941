//! Pretty printer for Move source files.
//!
//! Source text is parsed into a lossless syntax tree by `move-syntax`, every
//! node is turned into a [`doc::Doc`] by the print procedure registered for
//! its kind, and the document is laid out within the configured width.

pub mod comments;
pub mod common;
pub mod doc;
pub mod items;
pub mod list;
pub mod printer;
pub mod render;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use move_syntax::error::{Span, report};
use move_syntax::{ParserError, ReportableError, parse_source};
use thiserror::Error;

pub use printer::{PrintError, Printer};

/// Layout settings, passed explicitly to every formatting call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    /// Target line width
    pub width: usize,
    /// Spaces per indentation level
    pub indent_size: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            width: 100,
            indent_size: 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("source has {} syntax error(s)", .0.len())]
    Parse(Vec<ParserError>),
    #[error(transparent)]
    Print(#[from] PrintError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReportableError for PrintError {
    fn get_labels(&self) -> Vec<(Span, String)> {
        let offset = self.offset();
        vec![(offset..offset + 1, "while printing this".to_string())]
    }
}

impl FormatError {
    /// Errors that can be pointed at in the source
    pub fn reportables(&self) -> Vec<&dyn ReportableError> {
        match self {
            FormatError::Parse(errors) => errors
                .iter()
                .map(|e| e as &dyn ReportableError)
                .collect(),
            FormatError::Print(error) => vec![error as &dyn ReportableError],
            FormatError::Io(_) => vec![],
        }
    }
}

/// Format a whole source file. Sources with syntax errors are refused.
/// The result always ends with a newline.
pub fn format_source(source: &str, config: &FormatConfig) -> Result<String, FormatError> {
    let (tree, errors) = parse_source(source);
    if !errors.is_empty() {
        log::warn!("refusing to format a source with {} syntax error(s)", errors.len());
        return Err(FormatError::Parse(errors));
    }
    log::debug!("formatting {} bytes at width {}", source.len(), config.width);
    let printer = Printer::new(&tree);
    let doc = printer.print(tree.root())?;
    let mut formatted = render::render(&doc, config)?;
    if !formatted.ends_with('\n') {
        formatted.push('\n');
    }
    Ok(formatted)
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// File to format (if not specified, reads from stdin)
    #[clap(value_parser)]
    pub file: Option<PathBuf>,
    /// Width of the editor
    #[arg(long, default_value = "100")]
    pub width: usize,
    /// Indentation size
    #[arg(long, default_value = "4")]
    pub indent_size: usize,
    /// Exit with an error if the input is not formatted, print nothing
    #[arg(long)]
    pub check: bool,
    /// Overwrite the file instead of printing to stdout
    #[arg(long, short, requires = "file")]
    pub write: bool,
}

impl Args {
    pub fn config(&self) -> FormatConfig {
        FormatConfig {
            width: self.width,
            indent_size: self.indent_size,
        }
    }
}

pub fn lib_main() -> Result<(), Box<dyn std::error::Error>> {
    if cfg!(debug_assertions) {
        colog::default_builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        colog::default_builder().init();
    }

    let args = Args::parse();
    let code = match args.file.as_ref() {
        Some(path) => fs::read_to_string(path)?,
        None => {
            log::info!("No file specified. Reading from stdin...");
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let path = args
        .file
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());

    let formatted = match format_source(&code, &args.config()) {
        Ok(formatted) => formatted,
        Err(e) => {
            log::error!("{e}");
            report(&code, &path, &e.reportables());
            return Err(format!("failed to format {path}: {e}").into());
        }
    };

    if args.check {
        if formatted != code {
            log::error!("{path} is not formatted");
            return Err(format!("{path} is not formatted").into());
        }
        return Ok(());
    }
    match args.file.as_ref() {
        Some(file) if args.write => {
            if formatted != code {
                fs::write(file, &formatted)?;
                log::debug!("rewrote {path}");
            }
        }
        _ => print!("{formatted}"),
    }
    Ok(())
}
