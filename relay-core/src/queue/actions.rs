//! ActionsQueue Implementation
//!
//! The queue serializes presentation of pending actions: producers add
//! actions from anywhere, and exactly one consumer, the [`Presenter`], shows
//! the head and reports when it has been dismissed.
//!
//! # Head Changes
//!
//! After every mutation the queue compares the new head's id with the id it
//! last announced. Only a different id counts as a head change; it updates
//! the presentation slot and is broadcast to every `heads()` stream. Re-adding
//! the head with fresh content keeps the same id, so the stream stays silent
//! while the presenter shows the new content.
//!
//! # Dismissal
//!
//! Dismissing through the presenter empties the slot and finishes the current
//! action in the same critical section, which promotes the next head.
//! Dismissing an empty slot does nothing, so the queue can never skip an
//! action it has not shown.

use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::action::QueueAction;
use super::cache::ActionsCache;
use crate::config::{QueueConfig, DEFAULT_QUEUE_LABEL};
use crate::subscription::{Registry, Subscription};

struct Shared<A: QueueAction> {
    label: String,
    state: Mutex<State<A>>,
}

struct State<A: QueueAction> {
    actions: ActionsCache<A>,
    /// Id of the head most recently announced; `None` for an empty queue.
    announced: Option<A::Id>,
    /// The action the presenter is currently showing.
    presented: Option<A>,
    heads: Registry<Option<A>>,
}

impl<A: QueueAction> State<A> {
    /// Announce the head if its identity changed since the last call.
    ///
    /// A head replaced under the same id is not announced again, but the
    /// presentation slot still picks up its new content.
    fn sync_head(&mut self, label: &str) {
        let head = self.actions.current().cloned();
        let head_id = head.as_ref().map(|action| action.id());
        if head_id == self.announced {
            self.presented = head;
            return;
        }

        tracing::debug!(
            queue = label,
            head = ?head_id,
            pending = self.actions.len(),
            "queue head changed"
        );

        self.announced = head_id;
        self.presented = head.clone();
        self.heads.broadcast(&head);
    }
}

impl<A: QueueAction> Drop for Shared<A> {
    fn drop(&mut self) {
        self.state.get_mut().heads.close_all();
    }
}

/// A priority-ordered queue of pending actions.
///
/// The handle is cheap to clone; every clone feeds the same queue.
///
/// # Example
///
/// ```rust,ignore
/// let (queue, mut presenter) = ActionsQueue::new();
///
/// queue.add(Alert::new("offline", Priority::High));
/// queue.add(Alert::new("update", Priority::Normal));
///
/// assert_eq!(presenter.current().map(|a| a.id()), Some("offline"));
/// presenter.dismiss();
/// assert_eq!(presenter.current().map(|a| a.id()), Some("update"));
/// ```
pub struct ActionsQueue<A: QueueAction> {
    shared: Arc<Shared<A>>,
}

impl<A: QueueAction> ActionsQueue<A> {
    /// Create an empty queue together with its single presenter.
    pub fn new() -> (Self, Presenter<A>) {
        Self::with_config(&QueueConfig::default())
    }

    /// Create an empty queue labelled according to `config`.
    pub fn with_config(config: &QueueConfig) -> (Self, Presenter<A>) {
        let label = config
            .label
            .clone()
            .unwrap_or_else(|| DEFAULT_QUEUE_LABEL.to_string());

        let shared = Arc::new(Shared {
            label,
            state: Mutex::new(State {
                actions: ActionsCache::new(),
                announced: None,
                presented: None,
                heads: Registry::new(),
            }),
        });

        let presenter = Presenter {
            shared: Arc::clone(&shared),
        };
        (Self { shared }, presenter)
    }

    /// The label used in log output.
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// The head of the queue.
    pub fn current_action(&self) -> Option<A> {
        self.shared.state.lock().actions.current().cloned()
    }

    /// Number of queued actions, including the head.
    pub fn len(&self) -> usize {
        self.shared.state.lock().actions.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the queued actions, head first.
    pub fn actions(&self) -> Vec<A> {
        self.shared.state.lock().actions.as_slice().to_vec()
    }

    /// Add an action.
    ///
    /// An action whose id is already queued replaces that entry without
    /// moving it. Otherwise the action is placed according to its priority.
    pub fn add(&self, action: A) {
        self.mutate(|actions| {
            tracing::trace!(action = ?action.id(), priority = ?action.priority(), "adding action");
            actions.add(action);
        });
    }

    /// Replace the first action matching `matches` in place, or add `action`
    /// if nothing matches.
    pub fn replace_first_action<F>(&self, matches: F, action: A)
    where
        F: FnMut(&A) -> bool,
    {
        self.mutate(|actions| actions.replace_first(matches, action));
    }

    /// Remove the head, promoting the next action.
    ///
    /// Returns the removed action; `None` if the queue was empty.
    pub fn finish_current(&self) -> Option<A> {
        self.mutate(ActionsCache::finish_current)
    }

    /// Remove every action matching `matches`, wherever it is queued.
    ///
    /// Returns how many actions were removed.
    pub fn finish_all_where<F>(&self, matches: F) -> usize
    where
        F: FnMut(&A) -> bool,
    {
        self.mutate(|actions| actions.finish_all_where(matches))
    }

    /// Remove every action. Returns how many were removed.
    pub fn finish_all(&self) -> usize {
        self.mutate(ActionsCache::clear)
    }

    /// Stream of head changes.
    ///
    /// The stream starts with the current head (`None` for an empty queue)
    /// and then yields once per distinct head, compared by id.
    pub fn heads(&self) -> Subscription<Option<A>> {
        subscribe_heads(&self.shared)
    }

    fn mutate<R>(&self, edit: impl FnOnce(&mut ActionsCache<A>) -> R) -> R {
        let mut state = self.shared.state.lock();
        let result = edit(&mut state.actions);
        state.sync_head(&self.shared.label);
        result
    }
}

impl<A: QueueAction> Clone for ActionsQueue<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A> Debug for ActionsQueue<A>
where
    A: QueueAction + Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ActionsQueue")
            .field("label", &self.shared.label)
            .field("actions", &state.actions.as_slice())
            .finish()
    }
}

fn subscribe_heads<A: QueueAction>(shared: &Arc<Shared<A>>) -> Subscription<Option<A>> {
    let (id, receiver) = {
        let mut state = shared.state.lock();
        let head = state.actions.current().cloned();
        state.heads.register(head)
    };

    let queue: Weak<Shared<A>> = Arc::downgrade(shared);
    Subscription::new(id, receiver, true, move |id| {
        if let Some(shared) = queue.upgrade() {
            shared.state.lock().heads.remove(id);
        }
    })
}

/// The single consumer of a queue's head.
///
/// The presenter owns the presentation slot: the action currently on
/// screen. It is created together with its queue and cannot be cloned, so a
/// queue never has two consumers racing to dismiss its head.
pub struct Presenter<A: QueueAction> {
    shared: Arc<Shared<A>>,
}

impl<A: QueueAction> Presenter<A> {
    /// The action currently being presented.
    pub fn current(&self) -> Option<A> {
        self.shared.state.lock().presented.clone()
    }

    /// True while an action is being presented.
    pub fn is_presenting(&self) -> bool {
        self.shared.state.lock().presented.is_some()
    }

    /// Report that the presented action was dismissed.
    ///
    /// Empties the slot and finishes the current action, promoting the next
    /// one. Returns the dismissed action. Does nothing if the slot is
    /// already empty.
    pub fn dismiss(&mut self) -> Option<A> {
        let mut state = self.shared.state.lock();
        let dismissed = state.presented.take()?;

        let finished = state.actions.finish_current();
        tracing::debug!(
            queue = %self.shared.label,
            action = ?dismissed.id(),
            finished = finished.is_some(),
            "presented action dismissed"
        );
        state.sync_head(&self.shared.label);
        Some(dismissed)
    }

    /// Stream of head changes, as [`ActionsQueue::heads`].
    pub fn changes(&self) -> Subscription<Option<A>> {
        subscribe_heads(&self.shared)
    }
}

impl<A> Debug for Presenter<A>
where
    A: QueueAction + Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presenter")
            .field("presented", &self.shared.state.lock().presented)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
