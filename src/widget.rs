//! The async driver around [`UploadMachine`].
//!
//! [`CvUploadWidget`] is what a rendering layer holds on to. It applies
//! events to the machine, runs the resulting commands as tokio tasks, and
//! feeds their completions back in. State is published three ways:
//!
//! * [`CvUploadWidget::snapshot`] / [`CvUploadWidget::current_state`] for polling,
//! * [`CvUploadWidget::subscribe`] / [`CvUploadWidget::updates`] for a
//!   `watch` channel or a `Stream` of snapshots,
//! * [`UploadObserver`] callbacks.
//!
//! The widget is cheap to clone; clones share one session.

use crate::config::{SiteConfig, UploadConfig};
use crate::error::{ExtractionError, SubmitError, TransitionError};
use crate::machine::{Command, UploadEvent, UploadMachine, UploadSnapshot, UploadStatus};
use crate::messages::{Locale, Notice};
use crate::observer::{SharedObserver, UploadObserver};
use crate::pipeline::extract::{DocumentExtractor, ExtractionResult, TextExtractor};
use crate::pipeline::submit::{HttpProfileClient, ProfileSubmitter};
use crate::pipeline::validate::FileValidator;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

/// One CV upload card.
#[derive(Clone)]
pub struct CvUploadWidget {
    inner: Arc<Inner>,
}

struct Inner {
    machine: Mutex<UploadMachine>,
    observers: Mutex<Vec<SharedObserver>>,
    snapshots: watch::Sender<UploadSnapshot>,
    extractor: Arc<dyn TextExtractor>,
    submitter: Arc<dyn ProfileSubmitter>,
    site: SiteConfig,
    locale: Locale,
}

/// What changed while applying one event, for observer fan-out.
struct Changes {
    from: UploadStatus,
    to: UploadStatus,
    notice: Option<Notice>,
    profile_url: Option<String>,
}

impl CvUploadWidget {
    /// A widget with the production extractor and the HTTP profile client.
    pub fn new(config: UploadConfig) -> Self {
        let extractor = Arc::new(DocumentExtractor::from_config(&config));
        let submitter = Arc::new(HttpProfileClient::from_site(&config.site));
        Self::from_parts(config, extractor, submitter)
    }

    /// A widget with custom stages, e.g. [`crate::SimulatedProfileService`].
    pub fn from_parts(
        config: UploadConfig,
        extractor: Arc<dyn TextExtractor>,
        submitter: Arc<dyn ProfileSubmitter>,
    ) -> Self {
        let machine = UploadMachine::new(FileValidator::from_config(&config));
        let (snapshots, _) = watch::channel(machine.snapshot());
        Self {
            inner: Arc::new(Inner {
                machine: Mutex::new(machine),
                observers: Mutex::new(Vec::new()),
                snapshots,
                extractor,
                submitter,
                site: config.site,
                locale: config.locale,
            }),
        }
    }

    pub fn locale(&self) -> Locale {
        self.inner.locale
    }

    /// Demo profile linked from the upload card, if configured.
    pub fn sample_profile_url(&self) -> Option<&str> {
        self.inner
            .site
            .sample_profile_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
    }

    pub fn add_observer(&self, observer: Arc<dyn UploadObserver>) {
        lock(&self.inner.observers).push(observer);
    }

    pub fn current_state(&self) -> UploadStatus {
        self.inner.snapshots.borrow().status
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Current notice rendered in the widget's locale.
    pub fn notice_text(&self) -> Option<String> {
        self.inner
            .snapshots
            .borrow()
            .notice
            .as_ref()
            .map(|n| n.render(self.inner.locale))
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Snapshots as a `Stream`. Yields the current snapshot first.
    pub fn updates(&self) -> WatchStream<UploadSnapshot> {
        WatchStream::new(self.subscribe())
    }

    /// Wait until no extraction or submission is in flight.
    pub async fn settled(&self) -> UploadSnapshot {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let snapshot = match rx.wait_for(|s| !s.status.is_busy()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    /// Apply a user event.
    ///
    /// Commands triggered by the event run on the current tokio runtime;
    /// this must be called from within one.
    pub fn dispatch(&self, event: UploadEvent) -> Result<(), TransitionError> {
        let (command, changes) = self.apply(event)?;
        self.notify(changes);
        if let Some(command) = command {
            self.spawn(command);
        }
        Ok(())
    }

    fn apply(&self, event: UploadEvent) -> Result<(Option<Command>, Changes), TransitionError> {
        let mut machine = lock(&self.inner.machine);
        let from = machine.current_state();
        let notices_before = machine.notices_raised();

        let command = machine.apply(event)?;

        let snapshot = machine.snapshot();
        let to = snapshot.status;
        let notice = if machine.notices_raised() != notices_before {
            snapshot.notice.clone()
        } else {
            None
        };
        let profile_url = if from != to && to == UploadStatus::Success {
            snapshot.generated_site_url.clone()
        } else {
            None
        };
        // Published under the lock so concurrent completions cannot reorder
        // snapshots.
        self.inner.snapshots.send_replace(snapshot);

        Ok((
            command,
            Changes {
                from,
                to,
                notice,
                profile_url,
            },
        ))
    }

    fn notify(&self, changes: Changes) {
        let observers = lock(&self.inner.observers).clone();
        for observer in &observers {
            if changes.from != changes.to {
                observer.on_state_change(changes.from, changes.to);
            }
            if let Some(notice) = &changes.notice {
                observer.on_notice(notice);
            }
            if let Some(url) = &changes.profile_url {
                observer.on_profile_created(url);
            }
        }
    }

    fn complete(&self, event: UploadEvent) {
        if let Err(e) = self.dispatch(event) {
            warn!("Completion rejected: {e}");
        }
    }

    fn spawn(&self, command: Command) {
        let widget = self.clone();
        match command {
            Command::Extract { generation, file } => {
                debug!(generation, file = %file.name, "Spawning extraction");
                let extractor = Arc::clone(&self.inner.extractor);
                tokio::spawn(async move {
                    let work = tokio::spawn(async move { extractor.extract(&file).await });
                    let result = work.await.unwrap_or_else(|e| {
                        warn!(generation, "Extraction task failed: {e}");
                        ExtractionResult::Failure(ExtractionError::Parse(format!(
                            "extraction task failed: {e}"
                        )))
                    });
                    widget.complete(UploadEvent::ExtractionFinished { generation, result });
                });
            }
            Command::Submit {
                generation,
                text,
                file_name,
            } => {
                debug!(generation, file = %file_name, "Spawning submission");
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    let work = tokio::spawn(async move {
                        let site = inner.site.resolve().inspect_err(|e| {
                            warn!("Submission refused: {e}");
                        })?;
                        let id = inner.submitter.submit(&text, &file_name).await?;
                        Ok::<_, SubmitError>(site.profile_url(inner.locale, id.as_str()))
                    });
                    let result = work.await.unwrap_or_else(|e| {
                        warn!(generation, "Submission task failed: {e}");
                        Err(SubmitError::Network(format!("submission task failed: {e}")))
                    });
                    widget.complete(UploadEvent::SubmissionFinished { generation, result });
                });
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
