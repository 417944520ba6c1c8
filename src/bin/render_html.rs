use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use carousel_terminal::config::LoaderConfig;
use carousel_terminal::listing::placeholder_cards;
use carousel_terminal::loader::ListingLoader;
use carousel_terminal::render::{render_page, safe_text};

const TITLE: &str = "Our Games";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = LoaderConfig::from_env()?;
    let placeholders = if config.static_fallback {
        placeholder_cards(&config.universe_ids)
    } else {
        Vec::new()
    };
    let loader = ListingLoader::from_config(config)?;
    let report = loader.load();
    for line in &report.logs {
        eprintln!("{line}");
    }

    let page = render_page(&report.outcome, &placeholders);
    let html = format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}</body></html>\n",
        safe_text(TITLE),
        page.to_html()
    );

    match parse_out_arg() {
        Some(path) => {
            fs::write(&path, html)
                .with_context(|| format!("failed writing {}", path.display()))?;
            eprintln!("[INFO] Wrote {}", path.display());
        }
        None => print!("{html}"),
    }
    Ok(())
}

fn parse_out_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--out=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--out" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
