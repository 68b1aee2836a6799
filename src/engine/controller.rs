// src/engine/controller.rs

//! The compose controller: glue between the change provider, the recursive
//! listener and the rebuild backend.
//!
//! Two throttled inputs drive the loop:
//! - compose service updates from the provider: the listener is replaced by
//!   a fresh one watching the new set of roots, then the project is rebuilt
//! - change events from the current listener: the project is rebuilt
//!
//! Errors from either input are logged and the loop keeps going. It ends when
//! the provider stream closes or the shutdown future resolves.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::compose::{ComposeServices, translate, watch_roots};
use crate::errors::{ComposeWatchError, Result};
use crate::exec::RebuildBackend;
use crate::fs::FileSystem;
use crate::listener::RecursiveListener;
use crate::provider::{ChangeProvider, Reader, ReaderResult};
use crate::throttle::Throttle;
use crate::types::ChangeEvent;
use crate::watch::WatcherFactory;
use crate::watch::path_utils::normalize;

/// The listener currently in use plus its throttled event stream.
struct ActiveListener {
    listener: RecursiveListener,
    events: Throttle<ChangeEvent>,
}

pub struct ComposeController<R, B>
where
    R: Reader<Value = ComposeServices>,
    B: RebuildBackend,
{
    provider: ChangeProvider<R>,
    services: Throttle<ReaderResult<ComposeServices>>,
    listener: Option<ActiveListener>,
    factory: WatcherFactory,
    fs: Arc<dyn FileSystem>,
    backend: B,
    window: Duration,
}

impl<R, B> ComposeController<R, B>
where
    R: Reader<Value = ComposeServices>,
    B: RebuildBackend,
{
    /// Build the provider over `reader` and register every compose file.
    ///
    /// Registration queues the initial read, so the first loop iteration
    /// starts the project.
    pub fn new(
        reader: R,
        files: &[PathBuf],
        factory: WatcherFactory,
        fs: Arc<dyn FileSystem>,
        backend: B,
        window: Duration,
    ) -> Result<Self> {
        let (provider, values) = ChangeProvider::new(reader, factory()?)?;
        for file in files {
            provider.add(file)?;
        }
        info!(files = files.len(), ?window, "compose controller ready");

        Ok(Self {
            provider,
            services: Throttle::new(window, values),
            listener: None,
            factory,
            fs,
            backend,
            window,
        })
    }

    /// Drive the controller until the provider closes or `shutdown`
    /// resolves, then release everything.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                value = self.services.next() => match value {
                    Some(Ok(services)) => self.services_updated(services).await,
                    Some(Err(err)) => warn!(error = %err, "failed to read compose files"),
                    None => {
                        info!("compose provider closed");
                        break;
                    }
                },
                event = next_event(&mut self.listener) => match event {
                    Some(ChangeEvent { error: Some(err), .. }) => {
                        warn!(error = %err, "file watch error");
                    }
                    Some(event) => {
                        info!(path = ?event.path, op = ?event.op, "change detected; rebuilding");
                        self.rebuild().await;
                    }
                    None => {
                        warn!("listener stream closed; file changes are no longer watched");
                        self.drop_listener().await;
                    }
                },
            }
        }

        self.shutdown().await
    }

    async fn services_updated(&mut self, services: ComposeServices) {
        let roots = watch_roots(&translate(&services));
        info!(
            services = services.len(),
            roots = roots.len(),
            "compose services updated"
        );

        self.drop_listener().await;
        match self.start_listener(roots).await {
            Ok(active) => self.listener = Some(active),
            Err(err) => warn!(error = %err, "could not start listener"),
        }

        self.rebuild().await;
    }

    /// Fresh listener over `roots`. A root that cannot be added is skipped.
    ///
    /// Adding a root walks its whole tree, so that happens off the async
    /// workers.
    async fn start_listener(&self, roots: Vec<PathBuf>) -> Result<ActiveListener> {
        let (listener, events) = RecursiveListener::new((self.factory)()?, Arc::clone(&self.fs))?;
        let listener = tokio::task::spawn_blocking(move || {
            for root in roots {
                let root = normalize(&root);
                if let Err(err) = listener.add_root(&root) {
                    warn!(?root, error = %err, "skipping watch root");
                }
            }
            listener
        })
        .await
        .map_err(|join_err| {
            ComposeWatchError::Other(anyhow::anyhow!("adding watch roots failed: {join_err}"))
        })?;
        debug!(roots = ?listener.roots(), "listener started");

        Ok(ActiveListener {
            listener,
            events: Throttle::new(self.window, events),
        })
    }

    async fn drop_listener(&mut self) {
        if let Some(active) = self.listener.take() {
            if let Err(err) = active.listener.close().await {
                warn!(error = %err, "failed to close listener");
            }
        }
    }

    async fn rebuild(&mut self) {
        if let Err(err) = self.backend.rebuild_and_restart().await {
            warn!(error = %err, "rebuild failed");
        }
    }

    /// Close listener, provider and backend in that order; first error wins.
    async fn shutdown(self) -> Result<()> {
        let Self {
            provider,
            listener,
            mut backend,
            ..
        } = self;

        let mut first_err = None;
        if let Some(active) = listener {
            if let Err(err) = active.listener.close().await {
                first_err.get_or_insert(err);
            }
        }
        if let Err(err) = provider.close().await {
            first_err.get_or_insert(err);
        }
        if let Err(err) = backend.shutdown().await {
            first_err.get_or_insert(err);
        }

        info!("compose controller stopped");
        first_err.map_or(Ok(()), Err)
    }
}

/// Next throttled listener event; never resolves while there is no listener.
async fn next_event(listener: &mut Option<ActiveListener>) -> Option<ChangeEvent> {
    match listener {
        Some(active) => active.events.next().await,
        None => std::future::pending().await,
    }
}
