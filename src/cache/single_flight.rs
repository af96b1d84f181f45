use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::core::Result;

type SharedComputation<T> = Shared<BoxFuture<'static, Result<T>>>;

/// De-duplicates concurrent computations per key: while one is in flight,
/// later callers for the same key await the same future instead of starting
/// another. Entries are dropped once settled, so a failed attempt does not
/// poison the key and a later request retries fresh.
pub struct SingleFlight<T: Clone> {
    in_flight: Mutex<HashMap<String, SharedComputation<T>>>,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn run<F>(&self, key: &str, compute: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (computation, leader) = {
            let mut in_flight = self.in_flight.lock()?;
            if let Some(existing) = in_flight.get(key) {
                (existing.clone(), false)
            } else {
                let computation = compute.boxed().shared();
                in_flight.insert(key.to_string(), computation.clone());
                (computation, true)
            }
        };

        let result = computation.await;
        // Only the leader removes the entry; followers already hold a clone
        // of the shared future.
        if leader && let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(key);
        }
        result
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().map(|map| map.len()).unwrap_or(0)
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}
