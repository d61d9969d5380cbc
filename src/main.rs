use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use pure_blocks::keymap::{intent_for_key, parse_key_spec};
use pure_blocks::markup::{parse_markdown, write_markdown};
use pure_blocks::{Editor, EditorConfig};

const USAGE: &str = "Usage: pure-blocks [--json] [--config FILE] <file.md> [KEY ...]";

struct Options {
    json: bool,
    config: Option<PathBuf>,
    path: PathBuf,
    keys: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let Some(options) = parse_args(env::args().skip(1))? else {
        eprintln!("{USAGE}");
        return Ok(());
    };
    run(options)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>> {
    let mut json = false;
    let mut config = None;
    let mut path = None;
    let mut keys = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" if path.is_none() => json = true,
            "--config" if path.is_none() => {
                let Some(file) = args.next() else {
                    bail!("--config needs a file name");
                };
                config = Some(PathBuf::from(file));
            }
            "-h" | "--help" => return Ok(None),
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => keys.push(arg),
        }
    }
    Ok(path.map(|path| Options {
        json,
        config,
        path,
        keys,
    }))
}

fn load_config(path: Option<&PathBuf>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    EditorConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn run(options: Options) -> Result<()> {
    let config = load_config(options.config.as_ref())?;
    let blocks = if options.path.exists() {
        let content = fs::read_to_string(&options.path)
            .with_context(|| format!("failed to read {}", options.path.display()))?;
        parse_markdown(&content)
            .with_context(|| format!("failed to load {}", options.path.display()))?
    } else {
        log::info!("{} does not exist, starting empty", options.path.display());
        Vec::new()
    };

    let mut editor = Editor::with_config(pure_blocks::Document::from_blocks(blocks), config);
    for spec in &options.keys {
        let Some(events) = parse_key_spec(spec) else {
            bail!("unknown key {spec:?}");
        };
        for event in events {
            let Some(intent) = intent_for_key(event) else {
                log::debug!("key {spec:?} has no binding");
                continue;
            };
            let outcome = editor.handle(intent);
            log::debug!("{spec}: {outcome:?}");
        }
    }

    let tree = editor.cleaned_tree();
    if options.json {
        let json = serde_json::to_string_pretty(&tree).context("failed to serialize tree")?;
        println!("{json}");
    } else {
        print!("{}", write_markdown(&tree)?);
    }
    Ok(())
}
