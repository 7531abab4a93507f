use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use serp_preview::{
    render_preview, DeviceMode, FailingMetadataProvider, FontFile, Level, MetadataProvider,
    MockMetadataProvider, OverflowReport, PreviewConfig, Session, SnippetModel,
};

/// Preview a page as a search result and check it against pixel budgets
#[derive(Parser, Debug)]
#[command(name = "serp-preview", version, about)]
struct Cli {
    /// Page URL
    #[arg(long)]
    url: Option<String>,

    /// Page title
    #[arg(long)]
    title: Option<String>,

    /// Meta description
    #[arg(long)]
    description: Option<String>,

    /// Search query
    #[arg(long)]
    query: Option<String>,

    /// Device layout
    #[arg(long, value_enum)]
    device: Option<DeviceMode>,

    /// Hide the date
    #[arg(long)]
    no_date: bool,

    /// Hide the rating
    #[arg(long)]
    no_rating: bool,

    /// Hide the favicon
    #[arg(long)]
    no_favicon: bool,

    /// Description character budget
    #[arg(long)]
    max_chars: Option<usize>,

    /// Fetch title and description for --url before applying overrides
    #[arg(long)]
    fetch: bool,

    /// Make the fetch fail (exercises the error path)
    #[arg(long)]
    fail_fetch: bool,

    /// Simulated fetch latency in milliseconds
    #[arg(long)]
    fetch_delay_ms: Option<u64>,

    /// Write a JSON export into this directory
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Register a font file, FAMILY=PATH (repeatable)
    #[arg(long = "font", value_name = "FAMILY=PATH", value_parser = parse_font)]
    fonts: Vec<FontFile>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the budget report as JSON instead of the text preview
    #[arg(long)]
    json: bool,
}

fn parse_font(s: &str) -> std::result::Result<FontFile, String> {
    let (family, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FAMILY=PATH, got '{}'", s))?;
    if family.trim().is_empty() || path.trim().is_empty() {
        return Err(format!("expected FAMILY=PATH, got '{}'", s));
    }
    Ok(FontFile {
        family: family.trim().to_string(),
        path: PathBuf::from(path.trim()),
    })
}

fn load_config(cli: &Cli) -> Result<PreviewConfig> {
    let mut config = match &cli.config {
        Some(path) => PreviewConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PreviewConfig::default(),
    };
    config.font_files.extend(cli.fonts.iter().cloned());
    if let Some(device) = cli.device {
        config.device = device;
    }
    if let Some(max) = cli.max_chars {
        config.description_max_characters = max;
    }
    if let Some(ms) = cli.fetch_delay_ms {
        config.fetch_delay_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

fn print_report(report: &OverflowReport) {
    let verdict = |overflow: bool| if overflow { "TRUNCATED" } else { "ok" };
    println!(
        "{:<12} {:>7.1} / {:>4} px  {:<9}  {:>3}/{} chars",
        "title",
        report.title.pixel_width,
        report.title.max_pixel_width.unwrap_or_default(),
        verdict(report.title.overflow),
        report.title_chars.count,
        report.title_chars.max,
    );
    println!(
        "{:<12} {:>7.1} / {:>4} px  {}",
        "url",
        report.url.pixel_width,
        report.url.max_pixel_width.unwrap_or_default(),
        verdict(report.url.overflow),
    );
    println!(
        "{:<12} {:>7.1} / {:>4} px  {:<9}  {:>3}/{} chars{}",
        "description",
        report.description.pixel_width,
        report.description.max_pixel_width.unwrap_or_default(),
        verdict(report.description.overflow),
        report.description_chars.count,
        report.description_chars.max,
        if report.description_chars.overflow {
            " (over budget)"
        } else {
            ""
        },
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let measurer =
        serp_preview::new_measurer(&config).context("no usable font for text measurement")?;
    let model = SnippetModel::with_config(measurer, &config)?;
    let provider: Arc<dyn MetadataProvider> = if cli.fail_fetch {
        Arc::new(FailingMetadataProvider::new("simulated provider failure"))
    } else {
        Arc::new(MockMetadataProvider::new(Duration::from_millis(
            config.fetch_delay_ms,
        )))
    };
    let mut session = Session::new(model, provider);

    if let Some(url) = &cli.url {
        session.model_mut().set_url(url.as_str())?;
    }
    if cli.fetch {
        let url = session.model().state().url.value().to_string();
        // failures are reported through the notification log below
        if let Ok(res) = session.fetch(&url).await {
            info!("Fetched '{}'", res.title);
        }
    }

    let model = session.model_mut();
    if let Some(title) = &cli.title {
        model.set_title(title.as_str())?;
    }
    if let Some(description) = &cli.description {
        model.set_description(description.as_str())?;
    }
    if let Some(query) = &cli.query {
        model.set_search_query(query.as_str())?;
    }
    model.set_show_date(!cli.no_date);
    model.set_show_rating(!cli.no_rating);
    model.set_show_favicon(!cli.no_favicon);

    let report = session.model().overflow_report();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let preview = render_preview(session.model())?;
        println!("{}", preview.to_text());
        print_report(&report);
    }

    if let Some(dir) = &cli.export {
        if let Ok(path) = session.export_to(dir, chrono::Utc::now()) {
            println!("\nExported to {}", path.display());
        }
    }

    for n in session.drain_notifications() {
        match n.level {
            Level::Success => println!("{}: {}", n.title, n.message),
            Level::Error => eprintln!("{}: {}", n.title, n.message),
        }
    }

    Ok(())
}
