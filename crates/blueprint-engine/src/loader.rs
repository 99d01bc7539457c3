use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    task::{Context, Poll},
};

use futures_util::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use serde_json::Value;

use crate::{EngineError, RequestContext};

pub(crate) type Dispatch =
    Arc<dyn Fn(Vec<Value>, Arc<RequestContext>) -> BoxFuture<'static, Result<Vec<Value>, EngineError>> + Send + Sync>;

type SharedResults = Shared<BoxFuture<'static, Result<Arc<Vec<Value>>, EngineError>>>;

/// Coalesces the loads of one tick into a single dispatch.
///
/// A load enqueues its key and yields once, so that sibling futures polled in the same
/// pass enqueue theirs. The first load polled again closes the batch and starts the
/// dispatch, every load of the batch then awaits the same shared result and picks its
/// value by position.
pub(crate) struct BatchLoader {
    name: String,
    max_batch_size: Option<usize>,
    dispatch: Dispatch,
    current: Mutex<Option<Arc<Batch>>>,
}

#[derive(Default)]
struct Batch {
    keys: Mutex<Vec<Value>>,
    results: Mutex<Option<SharedResults>>,
}

impl BatchLoader {
    pub(crate) fn new(name: String, max_batch_size: Option<usize>, dispatch: Dispatch) -> Self {
        BatchLoader {
            name,
            max_batch_size,
            dispatch,
            current: Mutex::default(),
        }
    }

    pub(crate) async fn load(&self, key: Value, context: &Arc<RequestContext>) -> Result<Value, EngineError> {
        let (batch, index) = self.enqueue(key);

        YieldNow::default().await;

        self.close(&batch);
        let results = self.results(&batch, context).await?;

        Ok(results.get(index).cloned().unwrap_or(Value::Null))
    }

    fn enqueue(&self, key: Value) -> (Arc<Batch>, usize) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let batch = current.get_or_insert_with(Arc::default).clone();

        let index = {
            let mut keys = batch.keys.lock().unwrap_or_else(PoisonError::into_inner);
            keys.push(key);
            keys.len() - 1
        };

        if self.max_batch_size.is_some_and(|max| index + 1 >= max) {
            *current = None;
        }

        (batch, index)
    }

    fn close(&self, batch: &Arc<Batch>) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|open| Arc::ptr_eq(open, batch)) {
            *current = None;
        }
    }

    fn results(&self, batch: &Batch, context: &Arc<RequestContext>) -> SharedResults {
        let mut results = batch.results.lock().unwrap_or_else(PoisonError::into_inner);

        results
            .get_or_insert_with(|| {
                let keys = std::mem::take(&mut *batch.keys.lock().unwrap_or_else(PoisonError::into_inner));
                let expected = keys.len();
                let name = self.name.clone();

                tracing::debug!(loader = name.as_str(), keys = expected, "dispatching batch");

                (self.dispatch)(keys, context.clone())
                    .map(move |result| {
                        let values = result?;
                        if values.len() != expected {
                            let (type_name, field) = name.split_once('.').unwrap_or((name.as_str(), ""));
                            return Err(EngineError::BatchLength {
                                type_name: type_name.to_owned(),
                                field: field.to_owned(),
                                expected,
                                returned: values.len(),
                            });
                        }
                        Ok(Arc::new(values))
                    })
                    .boxed()
                    .shared()
            })
            .clone()
    }
}

/// Returns `Pending` once, after asking to be polled again.
#[derive(Default)]
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
