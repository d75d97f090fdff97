//! The analysis loop: discover scripts, retrieve each body, ask the model,
//! accumulate results.
//!
//! Strictly sequential: one file is fully retrieved, analyzed, and accounted
//! before the next begins. Cancellation is polled at the loop top and around
//! each retry attempt; an in-flight request is never aborted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use miette::{Context as _, IntoDiagnostic as _};
use tracing::{debug, warn};
use url::Url;

use crate::llm::LlmClient;
use crate::page::{PageSnapshot, ScriptRef, locate_scripts};
use crate::prompt::build_analysis_prompt;
use crate::retrieve::Retriever;
use crate::service::{Event, Service};
use crate::store::ResultsSnapshot;

const MAX_RETRIEVE_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_UNIT: Duration = Duration::from_secs(1);
const FILE_THROTTLE: Duration = Duration::from_secs(1);

pub(crate) async fn run_analysis(service: Arc<Service>, target: String, cancel: Arc<AtomicBool>) {
    if let Err(error) = analyze_target(&service, &target, &cancel).await {
        service.publish(
            &target,
            Event::AnalysisError {
                error: format!("{error}"),
            },
        );
    }

    service.finish_run(&cancel);
}

async fn analyze_target(
    service: &Arc<Service>,
    target: &str,
    cancel: &Arc<AtomicBool>,
) -> miette::Result<()> {
    let page = capture_page(target).await?;

    let scripts = locate_scripts(&page);

    if scripts.is_empty() {
        miette::bail!("no scripts discovered on {target}");
    }

    let total = scripts.len();
    service.with_session(|session| session.begin(total));
    debug!(total, %target, "analysis session started");

    let llm = LlmClient::new(service.api().clone());
    let retriever = Retriever::new();

    for script in &scripts {
        if cancel.load(Ordering::SeqCst) {
            debug!("analysis cancelled");
            break;
        }

        let key = script.identity().to_string();

        if service.with_session(|session| session.is_analyzed(&key)) {
            continue;
        }

        let content = match script {
            ScriptRef::Inline(text) => Some(text.clone()),
            ScriptRef::Url(url) => retrieve_with_retry(&retriever, url, &page, cancel).await,
        };

        // progress is reported for every file, successful or not
        let (progress, completed) = service.with_session(|session| {
            session.completed_files += 1;
            (session.progress_percent(), session.completed_files)
        });

        service.publish(
            target,
            Event::UpdateProgress {
                progress,
                current_file: script.display_name(),
                total_files: total,
                current_file_index: completed,
            },
        );

        if let Some(content) = content {
            if !cancel.load(Ordering::SeqCst) {
                analyze_file(service, target, &llm, &key, script, &content).await?;
            }
        }

        tokio::time::sleep(FILE_THROTTLE).await;
    }

    if !cancel.load(Ordering::SeqCst) {
        let results = service.with_session(|session| ResultsSnapshot::from(&session.results));
        service.publish(target, Event::AnalysisComplete { results });
    }

    Ok(())
}

/// Analyze one script body. Model and parse failures are local to the file:
/// it is skipped, never marked analyzed, and the session moves on.
async fn analyze_file(
    service: &Arc<Service>,
    target: &str,
    llm: &LlmClient,
    key: &str,
    script: &ScriptRef,
    content: &str,
) -> miette::Result<()> {
    match llm.analyze(&build_analysis_prompt(content)).await {
        Ok(reply) => {
            let snapshot = service.with_session(|session| {
                session.results.absorb(reply.routes, reply.vulnerabilities);
                session.mark_analyzed(key);
                ResultsSnapshot::from(&session.results)
            });

            service.persist_results(snapshot.clone())?;
            service.publish(
                target,
                Event::UpdateResults { results: snapshot },
            );
        }
        Err(error) => {
            warn!(file = %script.display_name(), %error, "analysis failed, skipping file");
        }
    }

    Ok(())
}

async fn capture_page(target: &str) -> miette::Result<PageSnapshot> {
    let page_url = Url::parse(target)
        .into_diagnostic()
        .with_context(|| format!("invalid target URL {target}"))?;

    let response = reqwest::get(page_url.clone())
        .await
        .into_diagnostic()
        .with_context(|| format!("failed to fetch {target}"))?;

    let status = response.status();
    if !status.is_success() {
        miette::bail!("target page returned HTTP {status}");
    }

    let html = response.text().await.into_diagnostic()?;

    Ok(PageSnapshot::capture(page_url, html))
}

/// The retriever's fallback chain wrapped in the session's own retry loop:
/// up to 3 attempts with a linear back-off before the file is given up on.
async fn retrieve_with_retry(
    retriever: &Retriever,
    url: &str,
    page: &PageSnapshot,
    cancel: &Arc<AtomicBool>,
) -> Option<String> {
    for attempt in 1..=MAX_RETRIEVE_ATTEMPTS {
        if cancel.load(Ordering::SeqCst) {
            return None;
        }

        match retriever.fetch_script(url, page).await {
            Ok(body) => return Some(body),
            Err(error) => {
                warn!(%url, attempt, %error, "script retrieval failed");

                if attempt < MAX_RETRIEVE_ATTEMPTS {
                    tokio::time::sleep(RETRY_BACKOFF_UNIT * attempt).await;
                }
            }
        }
    }

    None
}
