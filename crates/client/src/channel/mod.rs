//! Live update channel: one websocket subscription per analysis job.
//!
//! The channel abstracts a best-effort persistent connection. Both the
//! initial handshake and recovery from an unexpected drop go through the
//! same bounded retry loop; exhausting it emits exactly one `Failed` event
//! and settles the terminal `Closed` state. Event delivery adds nothing on
//! top of the transport: messages arrive at-most-once and in transport
//! order, with no deduplication or gap detection, so a consumer that needs
//! exactly-once semantics across a reconnect must treat `Completed` as
//! idempotent and tolerate gaps.

mod transport;

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;
use vox_protocol::{StreamKind, StreamMessage};

use crate::config::ReconnectPolicy;
use crate::error::{Error, Result};

/// Lifecycle of a channel subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
	Idle,
	Connecting,
	Open,
	Reconnecting,
	Closed,
}

/// Handle returned by [`LiveChannel::on`], used to deregister the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&StreamMessage) + Send + Sync>;

struct ChannelCore {
	state: ChannelState,
	job_id: Option<String>,
	/// Bumped on every `open`/`close`; a connection task whose generation no
	/// longer matches must not touch state or deliver events. This is what
	/// discards a late handshake completing after `close()`.
	generation: u64,
	listeners: HashMap<StreamKind, Vec<(ListenerId, Listener)>>,
	next_listener: u64,
	task: Option<JoinHandle<()>>,
}

struct ChannelInner {
	ws_url: Url,
	policy: ReconnectPolicy,
	core: Mutex<ChannelCore>,
}

/// One logical streaming subscription per analysis job.
///
/// Cheap to clone; all clones share the same subscription.
#[derive(Clone)]
pub struct LiveChannel {
	inner: Arc<ChannelInner>,
}

impl LiveChannel {
	pub fn new(ws_url: Url, policy: ReconnectPolicy) -> Self {
		Self {
			inner: Arc::new(ChannelInner {
				ws_url,
				policy,
				core: Mutex::new(ChannelCore {
					state: ChannelState::Idle,
					job_id: None,
					generation: 0,
					listeners: HashMap::new(),
					next_listener: 0,
					task: None,
				}),
			}),
		}
	}

	/// Opens a subscription for `job_id`, retiring any prior connection.
	///
	/// Listeners survive re-opening; only `close()` releases them.
	pub fn open(&self, job_id: &str) -> Result<()> {
		let url = self
			.inner
			.ws_url
			.join(&format!("/ws/analyze/{job_id}"))
			.map_err(|err| Error::Protocol(format!("invalid job id {job_id:?}: {err}")))?;

		let (generation, stale) = {
			let mut core = self.inner.core.lock();
			let stale = core.task.take();
			core.generation += 1;
			core.job_id = Some(job_id.to_string());
			core.state = ChannelState::Connecting;
			(core.generation, stale)
		};
		if let Some(task) = stale {
			task.abort();
		}

		debug!(target = "vox.channel", job_id, %url, "opening subscription");
		let inner = Arc::clone(&self.inner);
		let task = tokio::spawn(run_connection(inner, url, generation));

		let mut core = self.inner.core.lock();
		if core.generation == generation {
			core.task = Some(task);
		} else {
			// A close() or newer open() raced us.
			task.abort();
		}
		Ok(())
	}

	/// Registers a listener for one event kind.
	///
	/// Listeners for a kind run in registration order; a panicking listener
	/// does not prevent later ones from running.
	pub fn on(&self, kind: StreamKind, listener: impl Fn(&StreamMessage) + Send + Sync + 'static) -> ListenerId {
		let mut core = self.inner.core.lock();
		let id = ListenerId(core.next_listener);
		core.next_listener += 1;
		core.listeners.entry(kind).or_default().push((id, Arc::new(listener)));
		id
	}

	/// Deregisters a listener. Returns `false` if it was already removed.
	///
	/// Safe to call from inside a listener callback: dispatch iterates over
	/// a snapshot taken before delivery.
	pub fn off(&self, kind: StreamKind, id: ListenerId) -> bool {
		let mut core = self.inner.core.lock();
		let Some(listeners) = core.listeners.get_mut(&kind) else {
			return false;
		};
		let before = listeners.len();
		listeners.retain(|(existing, _)| *existing != id);
		listeners.len() < before
	}

	/// Tears the subscription down. Idempotent, effective immediately from
	/// any state; a pending reconnect attempt is abandoned, not awaited.
	pub fn close(&self) {
		let task = {
			let mut core = self.inner.core.lock();
			core.state = ChannelState::Closed;
			core.generation += 1;
			core.job_id = None;
			core.listeners.clear();
			core.task.take()
		};
		if let Some(task) = task {
			task.abort();
		}
		debug!(target = "vox.channel", "subscription closed");
	}

	pub fn state(&self) -> ChannelState {
		self.inner.core.lock().state
	}

	pub fn job_id(&self) -> Option<String> {
		self.inner.core.lock().job_id.clone()
	}

	#[cfg(test)]
	pub(crate) fn emit_for_test(&self, message: StreamMessage) {
		let generation = self.inner.core.lock().generation;
		self.inner.dispatch(generation, &message);
	}
}

impl ChannelInner {
	/// Moves to `next` unless this task's generation has been retired or the
	/// channel is already terminal.
	fn try_transition(&self, generation: u64, next: ChannelState) -> bool {
		let mut core = self.core.lock();
		if core.generation != generation || core.state == ChannelState::Closed {
			return false;
		}
		core.state = next;
		true
	}

	/// Delivers one message to a snapshot of the matching listeners.
	///
	/// Returns `false` when the task behind `generation` has been retired.
	fn dispatch(&self, generation: u64, message: &StreamMessage) -> bool {
		let snapshot: Vec<Listener> = {
			let core = self.core.lock();
			if core.generation != generation || core.state == ChannelState::Closed {
				return false;
			}
			core.listeners
				.get(&message.kind)
				.map(|listeners| listeners.iter().map(|(_, l)| Arc::clone(l)).collect())
				.unwrap_or_default()
		};
		invoke_all(&snapshot, message);
		true
	}

	/// Settles the terminal state and emits the single `Failed` event.
	fn fail(&self, generation: u64, attempts: u32) {
		let snapshot: Vec<Listener> = {
			let mut core = self.core.lock();
			if core.generation != generation || core.state == ChannelState::Closed {
				return;
			}
			core.state = ChannelState::Closed;
			core.job_id = None;
			core.listeners
				.get(&StreamKind::Failed)
				.map(|listeners| listeners.iter().map(|(_, l)| Arc::clone(l)).collect())
				.unwrap_or_default()
		};

		let error = Error::ConnectivityExhausted { attempts };
		warn!(target = "vox.channel", attempts, "giving up on stream");
		let event = StreamMessage {
			kind: StreamKind::Failed,
			data: json!({
				"reason": "connectivity_exhausted",
				"attempts": attempts,
				"message": error.to_string(),
			}),
		};
		invoke_all(&snapshot, &event);
	}
}

fn invoke_all(listeners: &[Listener], message: &StreamMessage) {
	for listener in listeners {
		if catch_unwind(AssertUnwindSafe(|| listener(message))).is_err() {
			warn!(target = "vox.channel", kind = ?message.kind, "listener panicked");
		}
	}
}

/// Connect/read/reconnect loop for one subscription generation.
async fn run_connection(inner: Arc<ChannelInner>, url: Url, generation: u64) {
	let policy = inner.policy.clone();
	let mut attempt: u32 = 0;

	loop {
		match transport::connect(&url).await {
			Ok(mut stream) => {
				if !inner.try_transition(generation, ChannelState::Open) {
					return;
				}
				attempt = 0;
				debug!(target = "vox.channel", %url, "stream open");

				while let Some(frame) = stream.next().await {
					match frame {
						Ok(Message::Text(text)) => match serde_json::from_str::<StreamMessage>(&text) {
							Ok(message) => {
								if !inner.dispatch(generation, &message) {
									return;
								}
							}
							Err(err) => {
								debug!(target = "vox.channel", error = %err, "unparseable frame ignored");
							}
						},
						Ok(Message::Close(_)) => break,
						Ok(_) => {}
						Err(err) => {
							debug!(target = "vox.channel", error = %err, "stream error");
							break;
						}
					}
				}

				if !inner.try_transition(generation, ChannelState::Reconnecting) {
					return;
				}
				debug!(target = "vox.channel", "stream dropped; reconnecting");
			}
			Err(err) => {
				attempt += 1;
				debug!(target = "vox.channel", attempt, error = %err, "handshake failed");
				if attempt >= policy.max_attempts {
					inner.fail(generation, attempt);
					return;
				}
			}
		}

		tokio::time::sleep(policy.base_delay * attempt.max(1)).await;
	}
}
