//! Tokio runtime wrapper shared by Mimic binaries.
//!
//! One [`CancellationToken`] lives next to the runtime; every handle clones
//! it, so a single `cancel()` (or Ctrl-C, see [`MimicHandle::cancel_on_ctrl_c`])
//! interrupts all pending humanized sleeps and replays.
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct MimicHandle {
    inner: Handle,
    cancel: CancellationToken,
}

pub struct MimicRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl MimicRuntime {
    /// Build a multi-threaded Tokio runtime with timers and IO enabled.
    ///
    /// ```
    /// use mimic_runtime::MimicRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = MimicRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        debug!(target: "mimic.runtime", thread_name, ?worker_threads, "runtime started");
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    /// Cloneable handle for spawning tasks and sharing cancellation.
    ///
    /// ```
    /// use mimic_runtime::MimicRuntime;
    ///
    /// let runtime = MimicRuntime::build("handle-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// assert!(!handle.cancellation().is_cancelled());
    /// ```
    pub fn handle(&self) -> MimicHandle {
        MimicHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run a future to completion on the runtime.
    ///
    /// ```
    /// use mimic_runtime::MimicRuntime;
    ///
    /// let runtime = MimicRuntime::build("block-on-example", Some(1)).unwrap();
    /// let result = runtime.block_on(async { "done" });
    /// assert_eq!(result, "done");
    /// ```
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel outstanding work, then wait up to `graceful` for tasks to stop.
    ///
    /// ```
    /// use mimic_runtime::MimicRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = MimicRuntime::build("shutdown-example", Some(1)).unwrap();
    /// let token = runtime.cancellation();
    /// runtime.shutdown(Duration::from_millis(5));
    /// assert!(token.is_cancelled());
    /// ```
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
        debug!(target: "mimic.runtime", "runtime stopped");
    }
}

impl MimicHandle {
    /// Spawn a future onto the shared runtime.
    ///
    /// ```
    /// use mimic_runtime::MimicRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = MimicRuntime::build("handle-doctest", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let task = handle.spawn(async { 21 * 2 });
    /// let result = runtime.block_on(async move { task.await.unwrap() });
    /// assert_eq!(result, 42);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// The shared cancellation token.
    ///
    /// ```
    /// use mimic_runtime::MimicRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = MimicRuntime::build("cancel-example", Some(1)).unwrap();
    /// let cancel = runtime.handle().cancellation();
    /// cancel.cancel();
    /// assert!(runtime.cancellation().is_cancelled());
    /// runtime.shutdown(Duration::from_millis(5));
    /// ```
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the shared token on the first Ctrl-C.
    ///
    /// The watcher ends quietly when the token is cancelled some other way.
    pub fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let cancel = self.cancel.clone();
        self.inner.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => info!(target: "mimic.runtime", "interrupt received, cancelling"),
                        Err(e) => {
                            warn!(target: "mimic.runtime", error = %e, "ctrl-c listener failed")
                        }
                    }
                    cancel.cancel();
                }
            }
        })
    }
}
