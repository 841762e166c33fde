//! Lifecycle of the shared generation collaborator.
//!
//! The generator is built once per process, either in a background task at
//! startup or on the first request that needs it. Concurrent first callers
//! wait on the same initialization instead of racing to build two.

use crate::services::providers::{GeneratorError, TextGenerator};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Builds the generator; may perform I/O such as a warm-up request.
pub type GeneratorFactory =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn TextGenerator>, GeneratorError>> + Send + Sync>;

pub struct GeneratorHandle {
    model: String,
    cell: OnceCell<Arc<dyn TextGenerator>>,
    factory: GeneratorFactory,
}

impl GeneratorHandle {
    pub fn new(model: impl Into<String>, factory: GeneratorFactory) -> Self {
        Self {
            model: model.into(),
            cell: OnceCell::new(),
            factory,
        }
    }

    /// A handle whose generator is already initialized.
    pub fn ready(generator: Arc<dyn TextGenerator>) -> Self {
        let model = generator.model_name().to_string();
        let for_factory = generator.clone();
        Self {
            model,
            cell: OnceCell::new_with(Some(generator)),
            factory: Arc::new(move || {
                let generator = for_factory.clone();
                async move { Ok::<_, GeneratorError>(generator) }.boxed()
            }),
        }
    }

    /// Get the generator, initializing it on first use.
    ///
    /// A failed initialization leaves the handle empty; the next caller tries
    /// again.
    pub async fn acquire(&self) -> Result<Arc<dyn TextGenerator>, GeneratorError> {
        let generator = self
            .cell
            .get_or_try_init(|| async {
                tracing::info!(model = %self.model, "Initializing text generator");
                let result = (self.factory)().await;
                match &result {
                    Ok(_) => tracing::info!(model = %self.model, "Text generator ready"),
                    Err(e) => tracing::error!(model = %self.model, error = %e, "Text generator initialization failed"),
                }
                result
            })
            .await?;

        Ok(generator.clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockTextGenerator;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_factory(builds: Arc<AtomicUsize>) -> GeneratorFactory {
        Arc::new(move || {
            let builds = builds.clone();
            async move {
                builds.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok::<_, GeneratorError>(Arc::new(MockTextGenerator::default()) as Arc<dyn TextGenerator>)
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn concurrent_first_acquires_build_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let handle = Arc::new(GeneratorHandle::new("mock", counting_factory(builds.clone())));
        assert!(!handle.is_initialized());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.acquire().await.is_ok() })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn failed_initialization_is_retried_on_next_acquire() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let factory: GeneratorFactory = Arc::new(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(GeneratorError::InitFailed("cold start".to_string()))
                } else {
                    Ok(Arc::new(MockTextGenerator::default()) as Arc<dyn TextGenerator>)
                }
            }
            .boxed()
        });
        let handle = GeneratorHandle::new("mock", factory);

        assert!(handle.acquire().await.is_err());
        assert!(!handle.is_initialized());
        assert!(handle.acquire().await.is_ok());
        assert!(handle.is_initialized());
    }

    #[test]
    fn ready_handle_reports_initialized() {
        let handle = GeneratorHandle::ready(Arc::new(MockTextGenerator::default()));
        assert!(handle.is_initialized());
        assert_eq!(handle.model_name(), "mock");
    }
}
