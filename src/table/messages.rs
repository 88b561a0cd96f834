//! Messages understood by a table actor.

use tokio::sync::{oneshot, watch};

use crate::game::entities::Rupees;
use crate::game::state_machine::{Intent, TableState};
use crate::store::Snapshot;

/// Requests sent to a [`TableActor`](super::actor::TableActor).
pub enum TableMessage {
    Join {
        unique_id: String,
        name: String,
        chips: Rupees,
        response: oneshot::Sender<TableResponse>,
    },

    Leave {
        unique_id: String,
        response: oneshot::Sender<TableResponse>,
    },

    /// A player action intent (see, chaal, fold, show, side-show request or
    /// response, deal, play again). Lifecycle intents are rejected here;
    /// they have their own messages.
    Act {
        intent: Intent,
        response: oneshot::Sender<TableResponse>,
    },

    /// Play-again that also clears a session-expiry lock, gated by the
    /// configured admin code.
    AdminReset {
        code: String,
        response: oneshot::Sender<TableResponse>,
    },

    GetState {
        response: oneshot::Sender<Option<TableState>>,
    },

    /// Watch the raw table document.
    Subscribe {
        response: oneshot::Sender<watch::Receiver<Snapshot>>,
    },

    /// Advance the actor's logical clock by one second. The run loop sends
    /// this to itself; tests send it directly to drive timers and bots
    /// deterministically.
    Tick,

    Close {
        response: oneshot::Sender<TableResponse>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TableResponse {
    Success,
    Error(String),
}
