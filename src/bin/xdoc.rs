//! Command-line front end: parse XML files and report on their trees.
//!
//! Each file is loaded into a [`Document`]; by default a one-line summary is
//! printed, `--debug` dumps the whole tree and `--attr` prints attributes of
//! the root element.

use std::fmt::Write as _;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use xdoc::encoding::decode_to_utf8;
use xdoc::error::SourceLocation;
use xdoc::parser::{self, ParseOptions};
use xdoc::{Document, ErrorKind, NodeId, NodeKind, ParseError};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xdoc -- parse XML files into an element tree.
#[derive(Parser, Debug)]
#[command(name = "xdoc", version, about, long_about = None)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Keep comments as tree nodes.
    #[arg(long)]
    comments: bool,

    /// Maximum element nesting depth.
    #[arg(long, value_name = "N", default_value_t = 256)]
    max_depth: u32,

    /// Print the value of this attribute of the root element (repeatable).
    #[arg(long = "attr", value_name = "NAME")]
    attrs: Vec<String>,

    /// Print a debug representation of the document tree.
    #[arg(long)]
    debug: bool,

    /// Do not print the summary or tree.
    #[arg(long)]
    noout: bool,

    /// Print timing information for loading and parsing.
    #[arg(long)]
    timing: bool,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(long)]
    verbose: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = ParseOptions::default()
        .load_comments(cli.comments)
        .max_depth(cli.max_depth);

    let mut worst_exit = EXIT_SUCCESS;
    for file in &cli.files {
        worst_exit = worst_exit.max(process_file(&cli, &options, file));
    }
    ExitCode::from(worst_exit)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "xdoc=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, options: &ParseOptions, filename: &str) -> u8 {
    let start = Instant::now();

    let doc = match load(options, filename) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_PARSE_ERROR;
        }
    };

    if cli.timing {
        let elapsed = start.elapsed();
        eprintln!("Loading and parsing {filename} took {elapsed:?}");
    }

    let Some(root) = doc.root() else {
        eprintln!("{filename}: no root element");
        return EXIT_PARSE_ERROR;
    };

    let mut out = String::new();
    for key in &cli.attrs {
        match doc.attribute_value(root, key) {
            Some(value) => {
                let _ = writeln!(out, "{key}={value}");
            }
            None => eprintln!("{filename}: root element has no attribute '{key}'"),
        }
    }

    if !cli.noout {
        if cli.debug {
            format_debug_node(&doc, root, 0, &mut out);
        } else {
            out.push_str(&format_summary(filename, &doc, root));
        }
    }

    write_output(&out);
    EXIT_SUCCESS
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Loads a document from a file, or from stdin when `filename` is `-`.
fn load(options: &ParseOptions, filename: &str) -> Result<Document, ParseError> {
    if filename != "-" {
        let mut doc = Document::new();
        doc.load_with_options(filename, options)?;
        return Ok(doc);
    }

    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf).map_err(|e| ParseError {
        kind: ErrorKind::BadFile,
        message: format!("stdin: {e}"),
        location: SourceLocation::default(),
    })?;
    if buf.is_empty() {
        return Err(ParseError {
            kind: ErrorKind::EmptyFile,
            message: "stdin: no input".to_string(),
            location: SourceLocation::default(),
        });
    }
    let utf8 = decode_to_utf8(&buf)?;
    parser::parse_bytes_with_options(&utf8, options)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn format_summary(filename: &str, doc: &Document, root: NodeId) -> String {
    let mut elements = 1;
    let mut texts = 0;
    let mut comments = 0;
    for node in doc.descendants(root) {
        match doc.node(node).kind {
            NodeKind::Element { .. } => elements += 1,
            NodeKind::Text { .. } => texts += 1,
            NodeKind::Comment { .. } => comments += 1,
            NodeKind::ListHead => {}
        }
    }
    format!(
        "{filename}: <{}> {elements} elements, {texts} text nodes, {comments} comments\n",
        doc.name(root).unwrap_or_default()
    )
}

/// Recursively formats a node for debug output.
fn format_debug_node(doc: &Document, id: NodeId, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);

    match &doc.node(id).kind {
        NodeKind::Element { name, .. } => {
            out.push_str(&indent);
            out.push_str("ELEMENT ");
            out.push_str(name);
            out.push('\n');
            for attr in doc.attributes(id) {
                out.push_str(&indent);
                out.push_str("  ATTRIBUTE ");
                out.push_str(attr.key());
                out.push('=');
                out.push_str(attr.value());
                out.push('\n');
            }
            for child in doc.children(id) {
                format_debug_node(doc, child, depth + 1, out);
            }
        }
        NodeKind::Text { content } => {
            out.push_str(&indent);
            out.push_str("TEXT ");
            out.push_str(&content.replace('\n', "\\n"));
            out.push('\n');
        }
        NodeKind::Comment { content } => {
            out.push_str(&indent);
            out.push_str("COMMENT ");
            out.push_str(content);
            out.push('\n');
        }
        NodeKind::ListHead => {}
    }
}

fn write_output(content: &str) {
    let mut stdout = io::stdout().lock();
    // A closed pipe is not worth reporting.
    let _ = stdout.write_all(content.as_bytes());
    let _ = stdout.flush();
}
