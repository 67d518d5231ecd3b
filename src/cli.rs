use crate::config::load_config;
use crate::context::LayoutContext;
use crate::ir::PersonId;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::parser::parse_person_graph;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kintree", version, about = "Family tree layout from person records")]
pub struct Args {
    /// People file (.json / .json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Root person id
    #[arg(short = 'r', long = "root")]
    pub root: String,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Ancestor generations
    #[arg(short = 'a', long = "ancestors")]
    pub ancestors: Option<u8>,

    /// Descendant generations
    #[arg(short = 'd', long = "descendants")]
    pub descendants: Option<u8>,

    /// Cousin depth
    #[arg(short = 'C', long = "cousins")]
    pub cousins: Option<u8>,

    /// Show the parents of partners
    #[arg(long = "in-laws")]
    pub in_laws: bool,

    /// Log at debug level unless KINTREE_LOG says otherwise
    #[arg(long = "verbose")]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(v) = args.ancestors {
        config.depth.ancestors = v;
    }
    if let Some(v) = args.descendants {
        config.depth.descendants = v;
    }
    if let Some(v) = args.cousins {
        config.depth.cousins = v;
    }
    if args.in_laws {
        config.depth.in_laws = true;
    }
    let settings = config.depth.clamped(config.layout.max_generations);

    let input = read_input(args.input.as_deref())?;
    let graph = parse_person_graph(&input)?;
    let root = PersonId::new(args.root);
    if !graph.contains(&root) {
        return Err(anyhow::anyhow!("Root person {root} not found in input"));
    }

    let mut ctx = LayoutContext::with_settings(root, settings);
    let layout = crate::layout_tree(&graph, &mut ctx, &config.layout);
    let pending = ctx.pending_levels();
    if !pending.is_empty() {
        debug!(?pending, "levels requested but not reported as loaded");
    }

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &ctx, &layout)?,
        None => {
            let json = LayoutDump::from_layout(&ctx, &layout).to_json()?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("KINTREE_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
