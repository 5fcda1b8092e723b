//! Action representation: an index into a game's fixed action space.
//!
//! Every game declares an `action_space_size`. Policies and visit
//! distributions are dense vectors over that space, so an action is just
//! its position in those vectors. The engine never interprets the index.

use serde::{Deserialize, Serialize};

/// A game action.
///
/// ## Example
///
/// ```
/// use alphazero::core::Action;
///
/// // Connect Four: drop a stone in column 3
/// let drop = Action::new(3);
/// assert_eq!(drop.index(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action(pub u16);

impl Action {
    /// Create an action from its index in the action space.
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Position of this action in policy vectors.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Build the dense 0/1 legality mask for a set of actions.
    ///
    /// Actions outside `action_space_size` are ignored.
    #[must_use]
    pub fn mask(actions: &[Action], action_space_size: usize) -> Vec<bool> {
        let mut mask = vec![false; action_space_size];
        for action in actions {
            if let Some(slot) = mask.get_mut(action.index()) {
                *slot = true;
            }
        }
        mask
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action({})", self.0)
    }
}
