//! Concurrent asset enrichment
//!
//! Runs only after the whole deck has been generated and built. Every asset
//! slot the slide types call for is collected up front, fetched concurrently
//! under one global bound, and written back by slot, so completion order
//! never affects placement. A failed fetch downgrades that slot to a bundled
//! placeholder and records a warning; it never fails the deck. Dropping the
//! future returned by [`EnrichmentEngine::enrich`] aborts all in-flight jobs.

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::AssetError;
use crate::icons::IconLibrary;
use crate::types::{AssetProvider, ImageRequest};
use deckgen_config::{AssetConfig, DeckRequest};
use deckgen_model::Presentation;
use deckgen_redaction::redact;
use deckgen_registry::spec_for;

/// Where a fetched asset lands in the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    SlideImage { slide: usize },
    ItemImage { slide: usize, item: usize },
    ItemIcon { slide: usize, item: usize },
}

impl Slot {
    fn describe(self) -> String {
        match self {
            Self::SlideImage { slide } => format!("image for slide {slide}"),
            Self::ItemImage { slide, item } => format!("image for slide {slide} item {item}"),
            Self::ItemIcon { slide, item } => format!("icon for slide {slide} item {item}"),
        }
    }
}

/// One unit of fetch work
enum Job {
    Image(ImageRequest),
    Icon(Vec<String>),
}

/// Outcome summary for one enrichment run
#[derive(Debug, Default)]
pub struct EnrichmentReport {
    /// Slots filled with a real asset
    pub fetched: usize,
    /// Slots downgraded to a placeholder
    pub placeholders: usize,
    /// One warning per downgraded slot
    pub warnings: Vec<String>,
}

/// Fetches every asset a deck needs, bounded and cancel-safe
pub struct EnrichmentEngine {
    provider: Arc<dyn AssetProvider>,
    icons: Option<Arc<IconLibrary>>,
    max_concurrent: usize,
    job_timeout: Duration,
    placeholder_image: Utf8PathBuf,
    placeholder_icon: Utf8PathBuf,
}

impl EnrichmentEngine {
    #[must_use]
    pub fn new(
        provider: Arc<dyn AssetProvider>,
        icons: Option<Arc<IconLibrary>>,
        config: &AssetConfig,
    ) -> Self {
        Self {
            provider,
            icons,
            max_concurrent: config.max_concurrent_fetches,
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            placeholder_image: config.placeholder_image.clone(),
            placeholder_icon: config.placeholder_icon.clone(),
        }
    }

    /// Fetch all assets the deck calls for and write them back by slot
    pub async fn enrich(
        &self,
        presentation: &mut Presentation,
        request: &DeckRequest,
    ) -> EnrichmentReport {
        let jobs = collect_jobs(presentation, request);
        debug!(
            jobs = jobs.len(),
            provider = self.provider.name(),
            bound = self.max_concurrent,
            "Starting asset enrichment"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set: JoinSet<(Slot, Result<Utf8PathBuf, AssetError>)> = JoinSet::new();

        for (slot, job) in jobs {
            let semaphore = Arc::clone(&semaphore);
            let provider = Arc::clone(&self.provider);
            let icons = self.icons.clone();
            let job_timeout = self.job_timeout;
            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (
                        slot,
                        Err(AssetError::Provider(
                            "concurrency limiter closed".to_string(),
                        )),
                    );
                };
                let result = match job {
                    Job::Image(image_request) => {
                        match tokio::time::timeout(job_timeout, provider.fetch(&image_request))
                            .await
                        {
                            Ok(inner) => inner,
                            Err(_) => Err(AssetError::Timeout {
                                budget: job_timeout,
                            }),
                        }
                    }
                    Job::Icon(terms) => resolve_icon(icons.as_deref(), &terms),
                };
                (slot, result)
            });
        }

        let mut report = EnrichmentReport::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((slot, Ok(path))) => {
                    report.fetched += 1;
                    assign(presentation, slot, path);
                }
                Ok((slot, Err(error))) => {
                    report.placeholders += 1;
                    let placeholder = match slot {
                        Slot::ItemIcon { .. } => self.placeholder_icon.clone(),
                        _ => self.placeholder_image.clone(),
                    };
                    let label = slot.describe();
                    warn!(slot = %label, error = %error, "Asset fetch failed, using placeholder");
                    report
                        .warnings
                        .push(format!("{label}: {}", redact(&error.to_string())));
                    assign(presentation, slot, placeholder);
                }
                Err(join_error) => {
                    // Panicked or aborted task; its slot stays empty
                    warn!(error = %join_error, "Asset task did not complete");
                    report.warnings.push(format!("asset task failed: {join_error}"));
                }
            }
        }

        debug!(
            fetched = report.fetched,
            placeholders = report.placeholders,
            "Asset enrichment finished"
        );
        report
    }
}

/// Collect every asset slot the deck's slide types call for
fn collect_jobs(presentation: &Presentation, request: &DeckRequest) -> Vec<(Slot, Job)> {
    let mut jobs = Vec::new();
    for (slide_index, slide) in presentation.slides.iter().enumerate() {
        let Ok(spec) = spec_for(i64::from(slide.slide_type)) else {
            continue;
        };

        if spec.slide_image {
            if let Some(prompt) = slide.content.image_prompt.as_deref() {
                if !prompt.is_empty() {
                    jobs.push((
                        Slot::SlideImage { slide: slide_index },
                        Job::Image(ImageRequest::new(
                            prompt,
                            request.aspect_ratio.clone(),
                            request.asset_dir.clone(),
                        )),
                    ));
                }
            }
        }

        if !(spec.item_images || spec.item_icons) {
            continue;
        }
        let Some(items) = slide.content.body.as_items() else {
            continue;
        };
        for (item_index, item) in items.iter().enumerate() {
            if spec.item_images {
                if let Some(prompt) = item.image_prompt.as_deref() {
                    if !prompt.is_empty() {
                        jobs.push((
                            Slot::ItemImage {
                                slide: slide_index,
                                item: item_index,
                            },
                            Job::Image(ImageRequest::new(
                                prompt,
                                request.aspect_ratio.clone(),
                                request.asset_dir.clone(),
                            )),
                        ));
                    }
                }
            }
            if spec.item_icons {
                if let Some(terms) = &item.icon_query {
                    if !terms.is_empty() {
                        jobs.push((
                            Slot::ItemIcon {
                                slide: slide_index,
                                item: item_index,
                            },
                            Job::Icon(terms.clone()),
                        ));
                    }
                }
            }
        }
    }
    jobs
}

fn resolve_icon(
    icons: Option<&IconLibrary>,
    terms: &[String],
) -> Result<Utf8PathBuf, AssetError> {
    let Some(library) = icons else {
        return Err(AssetError::NotFound("no icon library configured".to_string()));
    };
    library
        .resolve(terms)
        .cloned()
        .ok_or_else(|| AssetError::NotFound(terms.join(", ")))
}

/// Write one fetched asset into its slot
fn assign(presentation: &mut Presentation, slot: Slot, path: Utf8PathBuf) {
    match slot {
        Slot::SlideImage { slide } => {
            if let Some(slide) = presentation.slides.get_mut(slide) {
                slide.image = Some(path);
            }
        }
        Slot::ItemImage { slide, item } => {
            if let Some(item) = slot_item(presentation, slide, item) {
                item.image = Some(path);
            }
        }
        Slot::ItemIcon { slide, item } => {
            if let Some(item) = slot_item(presentation, slide, item) {
                item.icon = Some(path);
            }
        }
    }
}

fn slot_item(
    presentation: &mut Presentation,
    slide: usize,
    item: usize,
) -> Option<&mut deckgen_model::ContentItem> {
    presentation
        .slides
        .get_mut(slide)?
        .content
        .body
        .as_items_mut()?
        .get_mut(item)
}
