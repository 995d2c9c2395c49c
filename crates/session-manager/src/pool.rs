//! Model handle pool
//!
//! Handles are moved out of the pool for the duration of a run and moved
//! back when the [`Checkout`] drops, so no handle is ever shared by two
//! runs. A semaphore with one permit per handle bounds concurrency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use inference_engine::{InferenceError, ModelHandle};
use tensor_encoder::EncodedTensor;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

pub(crate) struct HandlePool {
    idle: Mutex<Vec<ModelHandle>>,
    permits: Arc<Semaphore>,
    size: usize,
    loaded: AtomicBool,
}

impl HandlePool {
    pub(crate) fn new(handles: Vec<ModelHandle>) -> Self {
        let size = handles.len();
        Self {
            idle: Mutex::new(handles),
            permits: Arc::new(Semaphore::new(size)),
            size,
            loaded: AtomicBool::new(true),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Wait for an idle handle and take exclusive ownership of it
    pub(crate) async fn checkout(self: &Arc<Self>) -> Result<Checkout, InferenceError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| InferenceError::NotLoaded)?;

        let handle = self
            .lock_idle()
            .pop()
            .ok_or_else(|| InferenceError::RunError("no idle model handle".to_string()))?;

        Ok(Checkout {
            handle: Some(handle),
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    /// Wait for in-flight runs, then unload every handle
    pub(crate) async fn unload(&self) {
        let Ok(_all) = Arc::clone(&self.permits)
            .acquire_many_owned(self.size as u32)
            .await
        else {
            debug!("Handle pool already unloaded");
            return;
        };

        self.loaded.store(false, Ordering::Release);
        for handle in self.lock_idle().iter_mut() {
            handle.unload();
        }
        self.permits.close();
        info!("Unloaded {} model handle(s)", self.size);
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<ModelHandle>> {
        // A panic while holding the lock cannot leave the Vec half-updated
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive use of one handle; returns it to the pool on drop
pub(crate) struct Checkout {
    handle: Option<ModelHandle>,
    pool: Arc<HandlePool>,
    _permit: OwnedSemaphorePermit,
}

impl Checkout {
    pub(crate) fn run_scalar(&mut self, tensor: &EncodedTensor) -> Result<f32, InferenceError> {
        self.handle
            .as_mut()
            .ok_or(InferenceError::NotLoaded)?
            .run_scalar(tensor)
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.lock_idle().push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_encoder::TensorEncoder;

    #[tokio::test]
    async fn test_checkout_returns_handle_on_drop() {
        let pool = Arc::new(HandlePool::new(vec![ModelHandle::mock(2)]));

        {
            let mut checkout = pool.checkout().await.unwrap();
            let tensor = TensorEncoder::new(2).encode(&[255, 255]).unwrap();
            assert_eq!(checkout.run_scalar(&tensor).unwrap(), 1.0);
            assert!(pool.lock_idle().is_empty());
        }

        assert_eq!(pool.lock_idle().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_after_unload_is_not_loaded() {
        let pool = Arc::new(HandlePool::new(vec![ModelHandle::mock(2)]));
        pool.unload().await;
        pool.unload().await;

        assert!(!pool.is_loaded());
        assert!(matches!(pool.checkout().await, Err(InferenceError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_unload_waits_for_checkout() {
        let pool = Arc::new(HandlePool::new(vec![ModelHandle::mock(1)]));
        let checkout = pool.checkout().await.unwrap();

        let unloading = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.unload().await })
        };
        tokio::task::yield_now().await;
        assert!(pool.is_loaded());

        drop(checkout);
        unloading.await.unwrap();
        assert!(!pool.is_loaded());
        assert!(pool.lock_idle().iter().all(|h| !h.is_loaded()));
    }
}
