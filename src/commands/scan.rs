use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args as ClapArgs;
use miette::{Context as _, IntoDiagnostic as _};

use crate::config::RootConfig;
use crate::service::{Command, Event, Service};
use crate::store::ResultsSnapshot;

const REPORT_TEMPLATE: &str = include_str!("../../templates/recon/report.md");

#[derive(ClapArgs)]
pub struct Args {
    /// URL of the page whose scripts should be analyzed
    pub url: String,

    /// Path where a markdown report of the findings will be written
    #[arg(long)]
    pub report_out: Option<PathBuf>,
}

pub fn run(args: Args, config: &RootConfig) -> miette::Result<()> {
    let state_path = crate::home::state_path()?;
    let config = config.clone();

    println!("Scanning scripts on {}", args.url);

    super::block_on_runtime_aware(async move {
        let service = Arc::new(Service::open(config, state_path));
        let mut events = service.bus().subscribe(&args.url);

        service.handle(Command::StartAnalysis {
            target: args.url.clone(),
        });

        while let Some(event) = events.recv().await {
            match event {
                Event::UpdateProgress {
                    progress,
                    current_file,
                    total_files,
                    current_file_index,
                } => {
                    println!("[x] file {current_file_index}/{total_files} '{current_file}' ({progress}%)");
                }
                Event::UpdateResults { .. } => {}
                Event::AnalysisComplete { results } => {
                    print_summary(&results);

                    if let Some(path) = &args.report_out {
                        write_report(path, &args.url, &results)?;
                    }

                    return Ok(());
                }
                Event::AnalysisError { error } => {
                    return Err(miette::miette!("analysis failed: {error}"));
                }
            }
        }

        Err(miette::miette!("analysis ended without completing"))
    })
}

fn print_summary(results: &ResultsSnapshot) {
    println!();
    println!("Probable routes ({}):", results.routes.len());
    print_list(&results.routes);

    println!();
    println!("Vulnerability indicators ({}):", results.vulnerabilities.len());
    print_list(&results.vulnerabilities);
}

fn print_list(items: &[String]) {
    if items.is_empty() {
        println!("  (none)");
        return;
    }

    for item in items {
        println!("  {item}");
    }
}

fn write_report(path: &Path, target: &str, results: &ResultsSnapshot) -> miette::Result<()> {
    let markdown = REPORT_TEMPLATE
        .replace("{{ generated_at }}", &chrono::Utc::now().to_rfc3339())
        .replace("{{ target }}", target)
        .replace("{{ routes_markdown }}", &render_list_markdown(&results.routes))
        .replace(
            "{{ vulnerabilities_markdown }}",
            &render_list_markdown(&results.vulnerabilities),
        );

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    std::fs::write(path, markdown)
        .into_diagnostic()
        .with_context(|| format!("failed to write report {}", path.display()))?;

    println!();
    println!("Report written to: {}", path.display());

    Ok(())
}

fn render_list_markdown(items: &[String]) -> String {
    if items.is_empty() {
        return "- *(none)*".to_string();
    }

    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<String>>()
        .join("\n")
}
