//! End-to-end reconciliation pipeline: pages → extract → organize →
//! validate identity → merge.
//!
//! The pipeline moves through Collecting → Validating → Merging → Done,
//! with Validating → Rejected as the error exit. A single-page batch goes
//! straight from Collecting to Done; there is nothing to compare.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, instrument};

use docstitch_extract::ExtractionClient;
use docstitch_recon::{compare, merge, organize};
use docstitch_schema::{CompareStrategy, DocumentProfile, OrganizedRecord};
use docstitch_shared::{BatchId, DocstitchError, MismatchReport, PageSource, Result};

/// File extensions accepted for page uploads, checked before any
/// provider call.
const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "tif", "tiff", "bmp", "heif"];

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Configuration for one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Extraction profile selecting schema, model, and policies.
    pub profile: DocumentProfile,
    /// Which page pairs are identity-checked.
    pub strategy: CompareStrategy,
    /// Maximum concurrent provider calls.
    pub fan_out: usize,
}

/// One uploaded page, in upload order.
#[derive(Debug, Clone)]
pub struct PageUpload {
    /// Original filename.
    pub filename: String,
    /// Raw page bytes.
    pub bytes: Vec<u8>,
}

/// One page's organized extraction result plus its trace.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// Trace of the received page.
    pub source: PageSource,
    /// The organized record extracted from it.
    pub record: OrganizedRecord,
}

/// Successful outcome of a reconciliation run.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// One page: its record, untouched by matcher or reducer.
    Single {
        record: OrganizedRecord,
        page: PageSource,
    },
    /// Several pages judged same-document, folded into one record.
    Merged {
        record: OrganizedRecord,
        pages: Vec<PageSource>,
    },
}

impl BatchOutcome {
    /// The resulting record, single-page or merged.
    pub fn record(&self) -> &OrganizedRecord {
        match self {
            Self::Single { record, .. } => record,
            Self::Merged { record, .. } => record,
        }
    }

    /// Contributing filenames, in upload order.
    pub fn filenames(&self) -> Vec<&str> {
        match self {
            Self::Single { page, .. } => vec![page.filename.as_str()],
            Self::Merged { pages, .. } => pages.iter().map(|p| p.filename.as_str()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a page's extraction completes.
    fn page_extracted(&self, filename: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, outcome: &BatchOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_extracted(&self, _filename: &str, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &BatchOutcome) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full reconciliation pipeline.
///
/// 1. Collecting: validate filenames, extract+organize each page
///    concurrently (bounded fan-out), reassemble in upload order
/// 2. Validating: identity-check page pairs per the strategy
/// 3. Merging: fold records under the profile's fill policy
/// 4. Done: return the record plus contributing page traces
///
/// Any single page failure fails the whole batch; a partially available
/// document must never silently merge into an incomplete record.
#[instrument(skip_all, fields(profile = %config.profile, pages = pages.len()))]
pub async fn reconcile(
    client: &ExtractionClient,
    config: &ReconcileConfig,
    pages: Vec<PageUpload>,
    progress: &dyn ProgressReporter,
) -> Result<BatchOutcome> {
    let batch_id = BatchId::new();

    if pages.is_empty() {
        return Err(DocstitchError::EmptyBatch);
    }
    validate_extensions(&pages)?;

    info!(%batch_id, strategy = %config.strategy, "starting reconciliation batch");

    // --- Collecting ---
    progress.phase("Extracting pages");
    let results = collect_pages(client, config, pages, progress).await?;

    if results.len() == 1 {
        // Collecting → Done: no comparison is possible with one record.
        let result = results.into_iter().next().expect("one result");
        let outcome = BatchOutcome::Single {
            record: result.record,
            page: result.source,
        };
        progress.done(&outcome);
        info!(%batch_id, "single-page batch complete");
        return Ok(outcome);
    }

    // --- Validating ---
    progress.phase("Validating page identity");
    validate_identity(config, &results)?;

    // --- Merging ---
    progress.phase("Merging pages");
    let records: Vec<OrganizedRecord> = results.iter().map(|r| r.record.clone()).collect();
    let merged = merge(config.profile, &records, config.profile.fill_policy());

    // --- Done ---
    let outcome = BatchOutcome::Merged {
        record: merged,
        pages: results.into_iter().map(|r| r.source).collect(),
    };
    progress.done(&outcome);
    info!(
        %batch_id,
        pages = outcome.filenames().len(),
        populated = outcome.record().populated_count(),
        "reconciliation batch complete"
    );

    Ok(outcome)
}

/// Reject the batch if any filename has an unaccepted extension.
fn validate_extensions(pages: &[PageUpload]) -> Result<()> {
    for page in pages {
        let extension = page
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty());
        let Some(extension) = extension else {
            return Err(DocstitchError::unsupported_file_type(
                &page.filename,
                "(no extension)",
            ));
        };
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(DocstitchError::unsupported_file_type(
                &page.filename,
                extension,
            ));
        }
    }
    Ok(())
}

/// Extract and organize every page concurrently, preserving upload order.
///
/// Provider calls run under a semaphore so a large batch cannot overwhelm
/// the rate-limited provider. Results are reassembled by upload index:
/// completion order must not leak into merge precedence.
async fn collect_pages(
    client: &ExtractionClient,
    config: &ReconcileConfig,
    pages: Vec<PageUpload>,
    progress: &dyn ProgressReporter,
) -> Result<Vec<PageResult>> {
    let semaphore = Arc::new(Semaphore::new(config.fan_out.max(1)));
    let total = pages.len();
    let model_id = config.profile.model_id();
    let profile = config.profile;

    let mut handles = Vec::with_capacity(total);
    for page in pages {
        let client = client.clone();
        let semaphore = semaphore.clone();
        let source = PageSource::from_bytes(&page.filename, &page.bytes);

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            let raw = client.analyze(&page.bytes, model_id).await?;
            let record = organize(&raw, profile);
            Ok::<PageResult, DocstitchError>(PageResult { source, record })
        }));
    }

    // Awaiting handles in spawn order restores upload order regardless of
    // completion order. The first error aborts the whole batch, including
    // still-running sibling calls against the rate-limited provider.
    let mut results = Vec::with_capacity(total);
    let mut first_error = None;
    for (index, handle) in handles.into_iter().enumerate() {
        if first_error.is_some() {
            handle.abort();
            continue;
        }
        let result = handle
            .await
            .map_err(|e| DocstitchError::extraction(format!("extraction task failed: {e}")))
            .and_then(|r| r);
        match result {
            Ok(result) => {
                progress.page_extracted(&result.source.filename, index + 1, total);
                results.push(result);
            }
            Err(e) => first_error = Some(e),
        }
    }
    if let Some(error) = first_error {
        return Err(error);
    }

    Ok(results)
}

/// Identity-check page pairs according to the configured strategy.
///
/// The first failing pair rejects the batch with a mismatch report.
fn validate_identity(config: &ReconcileConfig, results: &[PageResult]) -> Result<()> {
    let policy = config.profile.match_policy();

    let pairs: Vec<(usize, usize)> = match config.strategy {
        CompareStrategy::PairwiseAdjacent => (1..results.len()).map(|i| (i - 1, i)).collect(),
        CompareStrategy::Anchor => (1..results.len()).map(|i| (0, i)).collect(),
    };

    for (left, right) in pairs {
        let outcome = compare(&results[left].record, &results[right].record, &policy);
        if !outcome.matched {
            return Err(DocstitchError::Mismatch(MismatchReport {
                left_file: results[left].source.filename.clone(),
                right_file: results[right].source.filename.clone(),
                disputes: outcome.disputes(),
                comparisons: outcome.identifier_comparisons(),
                agreements: outcome.agreements,
                threshold: outcome.threshold,
            }));
        }
    }

    Ok(())
}
