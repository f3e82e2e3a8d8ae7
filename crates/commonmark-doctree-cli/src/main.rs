use anyhow::{Context, Result, bail};
use commonmark_doctree_config::Config;
use commonmark_doctree_engine::tree::{pformat::pformat, snapshot::snapshot};
use commonmark_doctree_engine::{
    DocTree, Pipeline, StandaloneHost, TransformReport, apply, normalize_path, parse,
};
use std::{env, path::PathBuf, process};

const USAGE: &str =
    "Usage: commonmark-doctree <file.md> [--root DIR] [--config FILE] [--html] [--no-transform] [--json]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    file: PathBuf,
    root: Option<PathBuf>,
    config: Option<PathBuf>,
    html: bool,
    no_transform: bool,
    json: bool,
}

impl Args {
    fn parse(args: &[String]) -> Result<Self> {
        let mut parsed = Args::default();
        let mut file = None;
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--root" => {
                    let value = iter.next().context("--root needs a directory")?;
                    parsed.root = Some(PathBuf::from(value));
                }
                "--config" => {
                    let value = iter.next().context("--config needs a file")?;
                    parsed.config = Some(PathBuf::from(value));
                }
                "--html" => parsed.html = true,
                "--no-transform" => parsed.no_transform = true,
                "--json" => parsed.json = true,
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                path => {
                    if file.is_some() {
                        bail!("only one input file is supported");
                    }
                    file = Some(PathBuf::from(path));
                }
            }
        }
        parsed.file = file.context("no input file given")?;
        Ok(parsed)
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let loaded = match &args.config {
        Some(path) => {
            let config = Config::load_from_path(path)?;
            if config.is_none() {
                bail!("config file '{}' does not exist", path.display());
            }
            config
        }
        None => Config::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

/// Absolute, normalized project root and the document's source name.
///
/// The source is root-relative when the file lies under the root, so links in
/// it resolve from the file's own directory.
fn document_paths(args: &Args, config: &Config) -> Result<(PathBuf, String)> {
    let file = std::path::absolute(&args.file)
        .with_context(|| format!("Invalid input path '{}'", args.file.display()))?;
    let file = normalize_path(&file);

    let root = match args.root.clone().or_else(|| config.root_dir.clone()) {
        Some(root) => std::path::absolute(&root)
            .with_context(|| format!("Invalid root directory '{}'", root.display()))?,
        None => file.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("/")),
    };
    let root = normalize_path(&root);

    let source = match file.strip_prefix(&root) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => file.to_string_lossy().into_owned(),
    };
    Ok((root, source))
}

fn convert(args: &Args, config: &Config) -> Result<(DocTree, TransformReport)> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read '{}'", args.file.display()))?;
    let (root, source) = document_paths(args, config)?;

    let mut options = config.to_parser_options();
    if args.html {
        options.pipeline = Pipeline::Html;
    }
    let mut tree = parse(&text, &source, &options);

    let report = if args.no_transform {
        TransformReport::default()
    } else {
        let transform = config.to_transform_config()?;
        let mut host = StandaloneHost::new(&root);
        log::debug!("transforming {source} under {}", root.display());
        apply(&mut tree, &mut host, &transform, &root)?
    };
    Ok((tree, report))
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let (tree, report) = convert(args, &config)?;

    for diagnostic in tree.diagnostics().iter() {
        eprintln!("{diagnostic}");
    }

    if args.json {
        let output = serde_json::json!({
            "tree": snapshot(&tree),
            "diagnostics": tree.diagnostics(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", pformat(&tree));
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match Args::parse(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
