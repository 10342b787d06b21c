//! Fan image regions out to services on the tokio runtime.
//!
//! Every `(region, service)` pair becomes one unit of work: a blocking
//! task wrapped in a timeout. Units share nothing; each sends exactly one
//! [`Completion`] through an unbounded channel whose single receiver is
//! returned by [`RegionDispatcher::new`]. Completions carry the
//! [`Token`] they were dispatched with, so arrival order never decides
//! where a result belongs.

use std::any::Any;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vizor_pipeline::{RgbImage, Selection};

use crate::config::DispatchConfig;
use crate::region::{RegionLabel, regions_for};
use crate::service::{Describer, Recognizer, ServiceError, Translator};
use crate::token::{Generation, GenerationCounter, PassKind, ResultLabel, Token};

/// One processed image and its selections, ready for region extraction.
#[derive(Debug, Clone)]
pub struct RegionJob {
    pub image_index: usize,
    pub image: Arc<RgbImage>,
    pub selections: Vec<Selection>,
}

/// Text to be translated, keyed by the recognition slot it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSource {
    pub image_index: usize,
    pub label: ResultLabel,
    pub text: String,
}

/// The outcome of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub token: Token,
    pub result: Result<String, ServiceError>,
}

/// Summary of one dispatch call, used to start a pass on the
/// [`ResultBoard`](crate::ResultBoard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTicket {
    pub pass: PassKind,
    pub generation: Generation,
    /// Number of completions that will arrive for this generation.
    pub units: usize,
    /// Slots to fill with a placeholder because their image had no
    /// regions to recognize.
    pub placeholders: Vec<(usize, ResultLabel)>,
}

/// Dispatches regions to registered services.
pub struct RegionDispatcher {
    handle: Handle,
    sender: mpsc::UnboundedSender<Completion>,
    config: DispatchConfig,
    generations: GenerationCounter,
    recognizers: Vec<(String, Arc<dyn Recognizer>)>,
    describer: Option<(String, Arc<dyn Describer>)>,
    translator: Option<(String, Arc<dyn Translator>)>,
}

impl std::fmt::Debug for RegionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionDispatcher")
            .field("config", &self.config)
            .field("generations", &self.generations)
            .field(
                "recognizers",
                &self.recognizers.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("describer", &self.describer.as_ref().map(|(n, _)| n))
            .field("translator", &self.translator.as_ref().map(|(n, _)| n))
            .finish_non_exhaustive()
    }
}

impl RegionDispatcher {
    /// Create a dispatcher that spawns onto `handle`, and the receiver its
    /// completions arrive on.
    #[must_use]
    pub fn new(
        handle: Handle,
        config: DispatchConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let dispatcher = Self {
            handle,
            sender,
            config,
            generations: GenerationCounter::default(),
            recognizers: Vec::new(),
            describer: None,
            translator: None,
        };
        (dispatcher, receiver)
    }

    /// Register a recognizer. Every recognition pass runs all of them.
    #[must_use]
    pub fn with_recognizer(
        mut self,
        name: impl Into<String>,
        recognizer: impl Recognizer + 'static,
    ) -> Self {
        self.recognizers.push((name.into(), Arc::new(recognizer)));
        self
    }

    /// Register the describer used by description passes.
    #[must_use]
    pub fn with_describer(
        mut self,
        name: impl Into<String>,
        describer: impl Describer + 'static,
    ) -> Self {
        self.describer = Some((name.into(), Arc::new(describer)));
        self
    }

    /// Register the translator used by translation passes.
    #[must_use]
    pub fn with_translator(
        mut self,
        name: impl Into<String>,
        translator: impl Translator + 'static,
    ) -> Self {
        self.translator = Some((name.into(), Arc::new(translator)));
        self
    }

    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Names of the registered recognizers, in registration order.
    pub fn recognizer_names(&self) -> impl Iterator<Item = &str> {
        self.recognizers.iter().map(|(name, _)| name.as_str())
    }

    /// Start a recognition pass over `jobs`.
    ///
    /// Each region of each job goes to every recognizer. An image whose
    /// selections all crop to nothing gets a placeholder slot per
    /// recognizer instead.
    pub fn dispatch_recognition(&mut self, jobs: &[RegionJob]) -> DispatchTicket {
        let pass = PassKind::Recognition;
        let generation = self.generations.next(pass);
        let mut units = 0;
        let mut placeholders = Vec::new();

        for job in jobs {
            let regions = regions_for(&job.image, &job.selections);
            if regions.is_empty() {
                debug!(image_index = job.image_index, "no regions to recognize");
                placeholders.extend(self.recognizers.iter().map(|(name, _)| {
                    (job.image_index, ResultLabel::new(pass, name.clone(), RegionLabel::Whole))
                }));
                continue;
            }
            for region in &regions {
                for (name, recognizer) in &self.recognizers {
                    let token = Token {
                        generation,
                        image_index: job.image_index,
                        label: ResultLabel::new(pass, name.clone(), region.label),
                    };
                    let recognizer = Arc::clone(recognizer);
                    let pixels = Arc::clone(&region.pixels);
                    self.spawn_unit(token, move || recognizer.recognize(&pixels));
                    units += 1;
                }
            }
        }

        info!(%pass, generation = generation.0, units, "dispatched");
        DispatchTicket {
            pass,
            generation,
            units,
            placeholders,
        }
    }

    /// Start a description pass over `jobs` with the configured prompt.
    ///
    /// Without a registered describer no units are spawned.
    pub fn dispatch_description(&mut self, jobs: &[RegionJob]) -> DispatchTicket {
        let pass = PassKind::Description;
        let generation = self.generations.next(pass);
        let mut units = 0;

        if let Some((name, describer)) = self.describer.clone() {
            for job in jobs {
                for region in regions_for(&job.image, &job.selections) {
                    let token = Token {
                        generation,
                        image_index: job.image_index,
                        label: ResultLabel::new(pass, name.clone(), region.label),
                    };
                    let describer = Arc::clone(&describer);
                    let prompt = self.config.describe_prompt.clone();
                    self.spawn_unit(token, move || describer.describe(&region.pixels, &prompt));
                    units += 1;
                }
            }
        } else {
            warn!("description requested but no describer is registered");
        }

        info!(%pass, generation = generation.0, units, "dispatched");
        DispatchTicket {
            pass,
            generation,
            units,
            placeholders: Vec::new(),
        }
    }

    /// Start a translation pass over `sources` into the configured target
    /// language.
    ///
    /// Each translation lands in a slot named after its source: same image,
    /// same service, same region. Empty texts are skipped.
    pub fn dispatch_translation(&mut self, sources: &[TranslationSource]) -> DispatchTicket {
        let pass = PassKind::Translation;
        let generation = self.generations.next(pass);
        let mut units = 0;

        if let Some((_, translator)) = self.translator.clone() {
            for source in sources.iter().filter(|s| !s.text.is_empty()) {
                let token = Token {
                    generation,
                    image_index: source.image_index,
                    label: ResultLabel::new(
                        pass,
                        source.label.service.clone(),
                        source.label.region,
                    ),
                };
                let translator = Arc::clone(&translator);
                let text = source.text.clone();
                let language = self.config.target_language.clone();
                self.spawn_unit(token, move || translator.translate(&text, &language));
                units += 1;
            }
        } else {
            warn!("translation requested but no translator is registered");
        }

        info!(%pass, generation = generation.0, units, "dispatched");
        DispatchTicket {
            pass,
            generation,
            units,
            placeholders: Vec::new(),
        }
    }

    /// Run `work` on the blocking pool under the configured timeout and
    /// report its outcome tagged with `token`.
    fn spawn_unit<F>(&self, token: Token, work: F)
    where
        F: FnOnce() -> Result<String, ServiceError> + Send + 'static,
    {
        let sender = self.sender.clone();
        let timeout = self.config.timeout;
        self.handle.spawn(async move {
            let blocking = tokio::task::spawn_blocking(work);
            let result = match tokio::time::timeout(timeout, blocking).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_error)) if join_error.is_panic() => {
                    let message = panic_message(&*join_error.into_panic());
                    warn!(
                        label = %token.label,
                        image_index = token.image_index,
                        %message,
                        "service panicked"
                    );
                    Err(ServiceError::Panicked(message))
                }
                Ok(Err(_)) => Err(ServiceError::Cancelled),
                Err(_) => {
                    warn!(
                        label = %token.label,
                        image_index = token.image_index,
                        ?timeout,
                        "service timed out"
                    );
                    Err(ServiceError::Timeout(timeout))
                }
            };
            if sender.send(Completion { token, result }).is_err() {
                debug!("completion receiver dropped");
            }
        });
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
