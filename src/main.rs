use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sleep_health_dashboard::{aggregate, explore, loader, report};
use sleep_health_dashboard::{Dataset, FilterSelection, FilteredView};

#[derive(Parser)]
#[command(name = "sleep-dashboard")]
#[command(about = "Explore sleep health and lifestyle metrics by cohort", long_about = None)]
struct Cli {
    /// Path to the sleep health CSV
    #[arg(long, global = true, default_value = loader::DEFAULT_SOURCE)]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Occupation and BMI filters. An absent flag selects every value.
#[derive(Args)]
struct FilterArgs {
    /// Occupation to include (repeatable)
    #[arg(long = "occupation")]
    occupations: Vec<String>,
    /// BMI category to include (repeatable)
    #[arg(long = "bmi")]
    bmi_categories: Vec<String>,
}

impl FilterArgs {
    fn selection(self, dataset: &Dataset) -> FilterSelection {
        let choice = |values: Vec<String>| (!values.is_empty()).then_some(values);
        FilterSelection::from_choices(
            dataset,
            choice(self.occupations),
            choice(self.bmi_categories),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the distinct occupations, BMI categories and age groups
    Categories {
        #[arg(long)]
        json: bool,
    },
    /// Headline averages for one occupation
    Insights {
        #[arg(long, default_value = report::FEATURED_OCCUPATION)]
        occupation: String,
        #[arg(long)]
        json: bool,
    },
    /// Render the full dashboard for a selection
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Pairwise correlation of the numeric attributes
    Correlations {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Change filters interactively from stdin
    Explore,
}

fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    loader::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Explore => {
            let mut session = explore::Session::new(cli.data);
            let stdin = io::stdin();
            session.run(stdin.lock(), io::stdout())?;
        }
        Commands::Categories { json } => {
            let dataset = load_dataset(&cli.data)?;
            let categories = report::Categories::of(&dataset);
            if json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                print!("{}", report::render_categories(&categories));
            }
        }
        Commands::Insights { occupation, json } => {
            let dataset = load_dataset(&cli.data)?;
            let insights =
                aggregate::occupation_insights(&FilteredView::all(&dataset), &occupation);
            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else {
                print!("{}", report::render_insights(&insights));
            }
        }
        Commands::Report { filters, out, json } => {
            let dataset = load_dataset(&cli.data)?;
            let selection = filters.selection(&dataset);
            let dashboard = report::build_dashboard(
                &dataset,
                &selection,
                report::FEATURED_OCCUPATION,
                chrono::Utc::now(),
            );
            let rendered = if json {
                serde_json::to_string_pretty(&dashboard)?
            } else {
                report::render_markdown(&dashboard)
            };

            match out {
                Some(out) => {
                    std::fs::write(&out, rendered)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Report written to {}.", out.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Correlations { filters, json } => {
            let dataset = load_dataset(&cli.data)?;
            let selection = filters.selection(&dataset);
            let view = selection.apply(&dataset);
            if view.is_empty() {
                println!("No records match the current filters.");
                return Ok(());
            }

            let matrix = aggregate::correlation_matrix(&view);
            if json {
                println!("{}", serde_json::to_string_pretty(&matrix)?);
            } else {
                print!("{}", report::render_correlations(&matrix));
            }
        }
    }

    Ok(())
}
