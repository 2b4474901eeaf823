use clap::{Parser, Subcommand};
use simple_posts::pipeline::{self, BuildEvent, BuildOutcome, Pipeline};
use simple_posts::{config, index, load, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::Sender;

#[derive(Parser)]
#[command(name = "simple-posts")]
#[command(about = "Static site builder for Markdown posts and tutorial series")]
#[command(long_about = "\
Static site builder for Markdown posts and tutorial series

Every Markdown file becomes a page. Posts sharing a `collection` front matter
value form an ordered series with previous/next links and an index page.

Content structure:

  content/
  ├── config.toml                          # Site config (optional)
  ├── about.md                             # layout: page
  └── _posts/
      ├── 2019-05-04-wrap-model-in-api.md  # Date from the file name
      └── 2019-05-11-containerize.md

Front matter (all optional):
  title:       falls back to the first '# ' heading, then the file name
  layout:      post (default) | page | default
  collection:  series name ('series' also accepted)
  classes:     CSS classes for the article element
  date:        YYYY-MM-DD, falls back to the file name prefix
  published:   false hides the post unless build.drafts is set

Run 'simple-posts gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "_site", global = true)]
    output: PathBuf,

    /// Override `url` from config.toml
    #[arg(long, global = true)]
    url: Option<String>,

    /// Override `baseurl` from config.toml
    #[arg(long, global = true)]
    baseurl: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline and publish: load → index → render → assemble
    Build,
    /// Load, index and render without writing anything
    Check,
    /// Print the collection index as JSON
    Index,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build => {
            let site_config = load_config(cli)?;
            pipeline::init_thread_pool(&site_config.processing);

            println!(
                "==> Building {} \u{2192} {}",
                cli.source.display(),
                cli.output.display()
            );
            let outcome = run_pipeline(cli, &site_config)?;
            output::print_assemble_output(&outcome.site, &outcome.documents, &outcome.index);

            println!("==> Publishing \u{2192} {}", cli.output.display());
            pipeline::publish(&outcome.site, &cli.output)
                .map_err(pipeline::BuildError::Publish)?;
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let site_config = load_config(cli)?;
            pipeline::init_thread_pool(&site_config.processing);

            println!("==> Checking {}", cli.source.display());
            let outcome = run_pipeline(cli, &site_config)?;
            output::print_index_output(&outcome.documents, &outcome.index);
            println!("==> Content is valid");
        }
        Command::Index => {
            let site_config = load_config(cli)?;
            let loaded = load::load(&cli.source, &site_config, &skip_list(&cli.output))?;
            output::print_warnings(&loaded.warnings);
            let collections = index::index(&loaded.documents);
            output::print_warnings(collections.warnings());
            println!("{}", serde_json::to_string_pretty(&collections)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<config::SiteConfig, config::ConfigError> {
    let overrides = config::cli_overrides(cli.url.as_deref(), cli.baseurl.as_deref());
    config::load_config_with_overrides(&cli.source, overrides)
}

/// Run the pipeline with progress printing. Warnings are printed whether or
/// not the build succeeds.
fn run_pipeline(
    cli: &Cli,
    site_config: &config::SiteConfig,
) -> Result<BuildOutcome, pipeline::BuildError> {
    let (result, warnings) = with_printer(|tx| {
        let mut pipeline = Pipeline::new(&cli.source, site_config)
            .skip(&cli.output)
            .with_events(tx);
        let result = pipeline.run();
        (result, pipeline.warnings().to_vec())
    });
    output::print_warnings(&warnings);
    result
}

fn skip_list(output_dir: &Path) -> Vec<PathBuf> {
    vec![output_dir.to_path_buf()]
}

/// Run `f` with a channel whose events are printed from a dedicated thread.
///
/// The printer drains until every sender is dropped, so all progress lines
/// are out before this returns.
fn with_printer<T>(f: impl FnOnce(Sender<BuildEvent>) -> T) -> T {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_build_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = f(tx);
    printer.join().ok();
    result
}
