use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use xmlx::{Document, EncodingRs, SaveOptions};

#[derive(Debug, Parser)]
#[command(
    name = "xmlx",
    version,
    about = "Reformat XML documents and query them by qualified name"
)]
struct Args {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Indent nested elements with this string (minified when omitted)
    #[arg(long, value_name = "STR")]
    indent: Option<String>,
    /// Do not write the <?xml ...?> declaration
    #[arg(long)]
    no_decl: bool,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Print every element with this local name instead of the document
    #[arg(long, value_name = "NAME")]
    select: Option<String>,
    /// Namespace alias the selected elements must carry
    #[arg(long, value_name = "NS", default_value = "")]
    ns: String,
    /// Search all descendants, not only the top-level elements
    #[arg(short, long)]
    recursive: bool,
    /// Resolve HTML named entities such as &nbsp;
    #[arg(long)]
    entities: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let input = read_input(&args.input)?;

    let mut doc = Document::new();
    if args.entities {
        doc.load_extended_entity_map();
    }
    if let Some(indent) = &args.indent {
        doc.options = SaveOptions::default().indent(indent.as_str());
    }
    doc.save_doctype = !args.no_decl;
    doc.load_bytes(&input, Some(&EncodingRs))
        .context("failed to load document")?;

    let output = match &args.select {
        Some(name) => select(&doc, &args.ns, name, args.recursive),
        None => doc.save_string(),
    };
    write_output(&args.output, output.as_bytes())
}

/// One serialized match per line
fn select(doc: &Document, ns: &str, name: &str, recursive: bool) -> String {
    let found = if recursive {
        doc.select_nodes_recursive(ns, name)
    } else {
        doc.select_nodes(ns, name)
    };
    debug!(matches = found.len(), "selection done");

    found
        .iter()
        .map(|node| node.to_xml(&doc.options) + "\n")
        .collect()
}

fn read_input(path: &Option<PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.iter().all(u8::is_ascii_whitespace) {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
