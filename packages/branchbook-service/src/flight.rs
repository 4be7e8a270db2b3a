use std::{
	collections::HashMap,
	future::Future,
	sync::{Arc, Mutex},
};

use tokio::sync::OnceCell;

/// Coalesces concurrent computations that share a key.
///
/// The first caller for a key runs its future; callers arriving while it is in flight wait for
/// the same value. If the running caller is dropped, one of the waiters runs its own future in
/// its place. The key is released once a value exists, or once its last caller is dropped, so
/// later callers start fresh.
pub struct Flights<T> {
	inflight: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}
impl<T> Flights<T>
where
	T: Clone,
{
	pub fn new() -> Self {
		Self { inflight: Mutex::new(HashMap::new()) }
	}

	pub async fn run<F, Fut>(&self, key: &str, f: F) -> T
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T>,
	{
		let cell = {
			let mut inflight = self.inflight.lock().unwrap_or_else(|err| err.into_inner());

			inflight.entry(key.to_string()).or_insert_with(|| Arc::new(OnceCell::new())).clone()
		};
		let guard = Release { flights: self, key, cell };

		guard.cell.get_or_init(f).await.clone()
	}
}
impl<T> Default for Flights<T>
where
	T: Clone,
{
	fn default() -> Self {
		Self::new()
	}
}

// Releases the key on completion, or on cancellation when no other caller holds the cell.
struct Release<'a, T> {
	flights: &'a Flights<T>,
	key: &'a str,
	cell: Arc<OnceCell<T>>,
}
impl<T> Drop for Release<'_, T> {
	fn drop(&mut self) {
		let mut inflight = self.flights.inflight.lock().unwrap_or_else(|err| err.into_inner());
		let Some(current) = inflight.get(self.key) else {
			return;
		};

		// The map and this guard hold the only references when nobody else is waiting.
		if Arc::ptr_eq(current, &self.cell)
			&& (self.cell.initialized() || Arc::strong_count(&self.cell) == 2)
		{
			inflight.remove(self.key);
		}
	}
}
