//! CLI binary for md2page.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use md2page::batch::convert_batch_with;
use md2page::pipeline::input;
use md2page::{
    default_output_path, derive_title, AssetBundle, BatchProgressCallback, BundledAssets,
    ConversionConfig, Converter, DirectoryAssets, ExtensionProfile, ExtensionProfileBuilder,
    MediaTypePolicy, ParserBackend, ProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar for `md2page batch`: one line per finished document plus a
/// bar that counts documents.
struct CliProgressCallback {
    bar: ProgressBar,
    inputs: Mutex<HashMap<usize, (String, Instant)>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Preparing…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            inputs: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn take(&self, index: usize) -> (String, u128) {
        let entry = self
            .inputs
            .lock()
            .ok()
            .and_then(|mut map| map.remove(&index));
        match entry {
            Some((name, start)) => (name, start.elapsed().as_millis()),
            None => (format!("#{}", index + 1), 0),
        }
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos}/{len}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        self.bar.set_prefix("Converting");
        self.bar.set_message("");
    }

    fn on_document_start(&self, index: usize, _total: usize, input: &Path) {
        let name = input.display().to_string();
        self.bar.set_message(name.clone());
        if let Ok(mut map) = self.inputs.lock() {
            map.insert(index, (name, Instant::now()));
        }
    }

    fn on_document_complete(&self, index: usize, total: usize, output_bytes: usize) {
        let (name, elapsed_ms) = self.take(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format!("{} bytes  {}ms", output_bytes, elapsed_ms)),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let (name, elapsed_ms) = self.take(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep one line per document.
        let first_line = error.lines().next().unwrap_or("");
        let msg = if first_line.chars().count() > 80 {
            let cut: String = first_line.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index + 1,
            total,
            name,
            red(&msg),
            dim(&format!("{}ms", elapsed_ms)),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} document(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} document(s) converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # notes.md → notes.html (same directory)
  md2page html notes.md

  # Explicit output path and title
  md2page html notes.md site/index.html --title "Release notes"

  # Write the page to stdout
  md2page html notes.md -

  # Full extension set on the comrak backend
  md2page html --backend comrak --profile full wiki.md

  # Convert a directory's worth of files, four at a time
  md2page batch docs/*.md --out-dir site -j 4

  # Statistics and image warnings as JSON
  md2page html --json notes.md > stats.json

BACKENDS:
  pulldown   pulldown-cmark; CommonMark plus tables, task lists, footnotes
  comrak     comrak; adds bare autolinks, wiki-links and front matter

PROFILES:
  default    GFM + heading anchors + [TOC] marker
  commonmark every extension off
  gfm        tables, strikethrough, task lists, autolinks
  full       everything except hard wraps

ENVIRONMENT VARIABLES:
  MD2PAGE_BACKEND         Parser backend (pulldown, comrak)
  MD2PAGE_PROFILE         Extension profile (default, commonmark, gfm, full)
  MD2PAGE_TITLE           Page title for `html`
  MD2PAGE_IMAGE_BASE_DIR  Resolve relative images against this directory
  MD2PAGE_ASSETS_DIR      Directory whose files override the packaged assets
  MD2PAGE_CONCURRENCY     Worker count for `batch`
  RUST_LOG                Log filter (overrides --verbose / --quiet)
"#;

/// Convert Markdown documents to self-contained HTML pages.
#[derive(Parser, Debug)]
#[command(
    name = "md2page",
    version,
    about = "Convert Markdown documents to self-contained HTML pages",
    long_about = "Convert Markdown documents to single-file HTML pages. Local images are \
embedded as data: URIs and the stylesheets and scripts are packaged into the page, so \
the output renders identically wherever it is copied.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MD2PAGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MD2PAGE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one Markdown file to an HTML page.
    #[command(visible_alias = "h")]
    Html {
        /// Markdown file to convert.
        input: PathBuf,

        /// Output file; defaults to INPUT with its extension replaced by `.html`.
        /// Use `-` for stdout.
        output: Option<PathBuf>,

        /// Page title; defaults to the output file's base name.
        #[arg(short, long, env = "MD2PAGE_TITLE")]
        title: Option<String>,

        #[command(flatten)]
        opts: ConvertArgs,
    },

    /// Convert several Markdown files on a worker pool.
    #[command(visible_alias = "b")]
    Batch {
        /// Markdown files to convert.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write pages into this directory instead of beside each input.
        #[arg(short, long, env = "MD2PAGE_OUT_DIR")]
        out_dir: Option<PathBuf>,

        /// Number of documents converted in parallel.
        #[arg(short = 'j', long, env = "MD2PAGE_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// Disable progress bar.
        #[arg(long, env = "MD2PAGE_NO_PROGRESS")]
        no_progress: bool,

        #[command(flatten)]
        opts: ConvertArgs,
    },
}

/// Options shared by every conversion command.
#[derive(Args, Debug)]
struct ConvertArgs {
    /// Markdown parser backend.
    #[arg(long, env = "MD2PAGE_BACKEND", value_enum, default_value = "pulldown")]
    backend: BackendArg,

    /// Extension profile preset.
    #[arg(long, env = "MD2PAGE_PROFILE", value_enum, default_value = "default")]
    profile: ProfileArg,

    /// Enable footnotes on top of the chosen profile.
    #[arg(long)]
    footnotes: bool,

    /// Render every soft line break as `<br />`.
    #[arg(long)]
    hard_wraps: bool,

    /// Do not expand the `[TOC]` marker.
    #[arg(long)]
    no_toc: bool,

    /// Do not add `id` anchors to headings.
    #[arg(long)]
    no_anchors: bool,

    /// Escape raw HTML in the source instead of passing it through.
    #[arg(long)]
    no_raw_html: bool,

    /// Resolve relative image paths against this directory.
    #[arg(long, env = "MD2PAGE_IMAGE_BASE_DIR")]
    image_base_dir: Option<PathBuf>,

    /// Leave every image reference untouched.
    #[arg(long)]
    no_inline_images: bool,

    /// Tag every embedded image as image/jpeg regardless of content.
    #[arg(long)]
    legacy_media_type: bool,

    /// Leave images larger than this many bytes referenced.
    #[arg(long, env = "MD2PAGE_MAX_IMAGE_BYTES")]
    max_image_bytes: Option<u64>,

    /// Omit the collapsible outline widget.
    #[arg(long)]
    no_outline: bool,

    /// Keep line breaks in embedded stylesheets and scripts.
    #[arg(long)]
    keep_asset_newlines: bool,

    /// Files in this directory replace the packaged template, stylesheets and scripts.
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Print conversion statistics as JSON on stdout.
    #[arg(long, env = "MD2PAGE_JSON")]
    json: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Pulldown,
    Comrak,
}

impl From<BackendArg> for ParserBackend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Pulldown => ParserBackend::Pulldown,
            BackendArg::Comrak => ParserBackend::Comrak,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ProfileArg {
    Default,
    Commonmark,
    Gfm,
    Full,
}

impl From<ProfileArg> for ExtensionProfile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Default => ExtensionProfile::default(),
            ProfileArg::Commonmark => ExtensionProfile::commonmark(),
            ProfileArg::Gfm => ExtensionProfile::gfm(),
            ProfileArg::Full => ExtensionProfile::full(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar owns the terminal while it is shown; only errors
    // are logged underneath it.
    let show_progress = match &cli.command {
        Command::Batch {
            no_progress, opts, ..
        } => !cli.quiet && !no_progress && !opts.json,
        Command::Html { .. } => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Html {
            input,
            output,
            title,
            opts,
        } => run_html(&cli, input, output.as_deref(), title.as_deref(), opts),
        Command::Batch {
            inputs,
            out_dir,
            concurrency,
            opts,
            ..
        } => {
            let progress: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
            } else {
                None
            };
            run_batch(&cli, inputs, out_dir.as_deref(), *concurrency, progress, opts)
        }
    }
}

fn run_html(
    cli: &Cli,
    input_path: &Path,
    output: Option<&Path>,
    title: Option<&str>,
    opts: &ConvertArgs,
) -> Result<()> {
    let config = build_config(opts, 1, None)?;
    let converter = build_converter(config, opts)?;
    let to_stdout = output.is_some_and(|p| p.as_os_str() == "-");

    if to_stdout {
        let markdown = input::read_markdown(input_path).context("Conversion failed")?;
        let title = derive_title(title, &default_output_path(input_path));
        let base_dir = input::parent_dir(input_path);
        let result = converter
            .convert_str(&markdown, &title, &base_dir)
            .context("Conversion failed")?;

        if opts.json {
            // stdout carries the page; statistics go to stderr.
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&result.stats).context("Failed to serialise stats")?
            );
        }
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(result.html.as_bytes())
            .and_then(|()| handle.flush())
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    let (written, result) = converter
        .convert_file(input_path, output, title)
        .with_context(|| format!("Conversion of {} failed", input_path.display()))?;

    if opts.json {
        let json = serde_json::json!({
            "input": input_path,
            "output": written,
            "title": result.title,
            "stats": result.stats,
            "warnings": result.images.warnings,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        let stats = &result.stats;
        eprintln!(
            "{}  {} bytes  {}ms  →  {}",
            if result.images.warnings.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.output_bytes,
            stats.total_duration_ms,
            bold(&written.display().to_string()),
        );
        eprintln!(
            "   {} image(s) inlined  /  {} remote  /  {} failed",
            dim(&stats.images_inlined.to_string()),
            dim(&stats.images_skipped_remote.to_string()),
            dim(&stats.images_failed.to_string()),
        );
    }
    Ok(())
}

fn run_batch(
    cli: &Cli,
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    concurrency: usize,
    progress: Option<ProgressCallback>,
    opts: &ConvertArgs,
) -> Result<()> {
    let config = build_config(opts, concurrency, progress.clone())?;
    let converter = build_converter(config, opts)?;

    let items = convert_batch_with(&converter, inputs, out_dir).context("Batch failed to start")?;
    let failed = items.iter().filter(|item| !item.is_success()).count();

    if opts.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&items).context("Failed to serialise results")?
        );
    } else {
        // Image warnings were logged below the bar's error filter.
        if progress.is_some() && !cli.quiet {
            for item in &items {
                for warning in &item.warnings {
                    eprintln!("  {} {}", cyan("⚠"), warning);
                }
            }
        }
        // Without the bar nothing has reported per-document results yet.
        if progress.is_none() && !cli.quiet {
            for item in &items {
                match &item.error {
                    None => eprintln!("  {} {}", green("✓"), item.output.display()),
                    Some(e) => eprintln!("  {} {}  {}", red("✗"), item.input.display(), red(e)),
                }
            }
            eprintln!("Converted {}/{} document(s)", items.len() - failed, items.len());
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} document(s) failed", failed, items.len());
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    opts: &ConvertArgs,
    concurrency: usize,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let base: ExtensionProfile = opts.profile.into();
    let mut profile = ExtensionProfileBuilder::from_profile(base);
    if opts.footnotes {
        profile = profile.footnotes(true);
    }
    if opts.hard_wraps {
        profile = profile.hard_wraps(true);
    }
    if opts.no_toc {
        profile = profile.table_of_contents(false);
    }
    if opts.no_anchors {
        profile = profile.anchor_links(false);
    }
    if opts.no_raw_html {
        profile = profile.raw_html(false);
    }
    let profile = profile.build().context("Invalid extension profile")?;

    let mut builder = ConversionConfig::builder()
        .backend(opts.backend.into())
        .profile(profile)
        .inline_images(!opts.no_inline_images)
        .include_outline(!opts.no_outline)
        .compact_assets(!opts.keep_asset_newlines)
        .concurrency(concurrency);

    if opts.legacy_media_type {
        builder = builder.media_type(MediaTypePolicy::legacy());
    }
    if let Some(limit) = opts.max_image_bytes {
        builder = builder.max_image_bytes(limit);
    }
    if let Some(ref dir) = opts.image_base_dir {
        builder = builder.image_base_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn build_converter(config: ConversionConfig, opts: &ConvertArgs) -> Result<Converter> {
    let assets: Arc<dyn AssetBundle> = match opts.assets_dir {
        Some(ref dir) => Arc::new(DirectoryAssets::new(dir)),
        None => Arc::new(BundledAssets),
    };
    Converter::with_assets(config, assets).context("Failed to set up the converter")
}
