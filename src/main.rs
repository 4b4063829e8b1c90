use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::PathBuf;

use tally_config::TallyConfig;
use tally_dom::Document;
use tally_scene::{Page, auto_init, registered};

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        eprintln!(
            "Usage: tally <page.html> [--config <tally.toml>] [--toggle <selector> ...] [--frames]"
        );
        bail!("missing <page.html>");
    }

    let input = PathBuf::from(args.remove(0));
    if !input.exists() {
        bail!("input file not found: {}", input.display());
    }

    let mut config_path: Option<PathBuf> = None;
    let mut toggles: Vec<String> = Vec::new();
    let mut print_frames = false;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 >= args.len() {
                    bail!("--config expects a path");
                }
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--toggle" => {
                if i + 1 >= args.len() {
                    bail!("--toggle expects a selector");
                }
                toggles.push(args[i + 1].clone());
                i += 2;
            }
            "--frames" => {
                print_frames = true;
                i += 1;
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    let mut config = match &config_path {
        Some(path) => TallyConfig::load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => TallyConfig::load_or_default(),
    };
    config.merge_with_env();

    let markup = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let page = Page::from_config(Document::parse(&markup), &config);

    let report = auto_init(&page);
    log::info!(
        "auto init: {} created, {} failed",
        report.created.len(),
        report.failures.len()
    );
    for (element, err) in &report.failures {
        let id = page.document().attribute(*element, "id").unwrap_or_default();
        eprintln!("skipped #{id}: {err}");
    }
    print_counters(&page, "init", None);

    let mut clock = 0.0f64;
    for selector in &toggles {
        let Some(control) = page.document().query_selector(selector) else {
            bail!("no control matches {selector}");
        };
        let checked = page.document().toggle(control);
        log::info!("toggled {selector} -> {checked}");

        let interval = config.frames.interval_ms;
        let last = page
            .frames()
            .run_until_idle_with(clock, interval, config.frames.max_ticks, |t| {
                if print_frames {
                    print_counters(&page, selector, Some(t));
                }
            });
        if let Some(last) = last {
            clock = last + interval;
        }
        if !print_frames {
            print_counters(&page, selector, None);
        }
    }

    Ok(())
}

fn print_counters(page: &Page, label: &str, timestamp: Option<f64>) {
    for counter in registered() {
        let id = page
            .document()
            .attribute(counter.element(), "id")
            .unwrap_or_else(|| "-".to_string());
        let value = counter.displayed().unwrap_or_default();
        match timestamp {
            Some(t) => println!("{label}\t{t:.0}ms\t{id}\t{value}"),
            None => println!("{label}\t{id}\t{value}"),
        }
    }
}
