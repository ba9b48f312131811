//! Queue action contract.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Where an action lands when it is added to a queue.
///
/// Bands are ordered `Normal < High < Highest < ReplaceAll`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Appended to the end of the queue.
    #[default]
    Normal,

    /// Added near the front, after any `Highest` actions and after the
    /// `High` actions already queued.
    High,

    /// Added at the front, after the `Highest` actions already queued.
    Highest,

    /// Discards everything queued and becomes the only action.
    ReplaceAll,
}

impl Priority {
    /// The next band up, if any.
    pub fn higher(self) -> Option<Self> {
        match self {
            Priority::Normal => Some(Priority::High),
            Priority::High => Some(Priority::Highest),
            Priority::Highest => Some(Priority::ReplaceAll),
            Priority::ReplaceAll => None,
        }
    }
}

/// An identifiable, prioritized unit of pending UI work, such as an alert
/// or a sheet waiting to be shown.
///
/// Two actions with equal ids are the same action; adding one while the
/// other is queued replaces it in place.
pub trait QueueAction: Clone + Send + Sync + 'static {
    /// Identity type.
    type Id: PartialEq + Clone + Debug + Send + Sync + 'static;

    /// This action's identity.
    fn id(&self) -> Self::Id;

    /// This action's priority band.
    fn priority(&self) -> Priority;
}
