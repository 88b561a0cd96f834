//! Housie caller: the runtime driving one number-calling game.
//!
//! Same shape as the betting table's actor: a message inbox, a one-second
//! tick, and every state change funneled through the store's `transact`
//! with the pure `HousieState` transitions. The tick drives auto play and
//! the scheduled first call.

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, interval};

use super::state::{
    AUTO_CALL_INTERVAL_SECS, DEFAULT_TICKET_COUNT, HousieState, SettingsUpdate,
};
use super::ticket::TicketId;
use crate::store::{Mutation, Snapshot, Store};

#[derive(Clone, Debug)]
pub struct HousieConfig {
    /// Tickets generated for a fresh game.
    pub ticket_count: usize,
    /// Seconds between calls while auto play is on.
    pub auto_call_interval_secs: i64,
}

impl Default for HousieConfig {
    fn default() -> Self {
        Self {
            ticket_count: DEFAULT_TICKET_COUNT,
            auto_call_interval_secs: AUTO_CALL_INTERVAL_SECS,
        }
    }
}

pub enum CallerMessage {
    /// Call the next number now.
    CallNext {
        response: oneshot::Sender<CallerResponse>,
    },
    /// Tear the game down and start a fresh one: new shuffle, new
    /// unbooked tickets.
    Reset {
        response: oneshot::Sender<CallerResponse>,
    },
    UpdateSettings {
        update: SettingsUpdate,
        response: oneshot::Sender<CallerResponse>,
    },
    BookTickets {
        ids: Vec<TicketId>,
        owner: String,
        response: oneshot::Sender<CallerResponse>,
    },
    UnbookTickets {
        ids: Vec<TicketId>,
        owner: Option<String>,
        response: oneshot::Sender<CallerResponse>,
    },
    GetState {
        response: oneshot::Sender<Option<HousieState>>,
    },
    Subscribe {
        response: oneshot::Sender<watch::Receiver<Snapshot>>,
    },
    Tick,
    Close {
        response: oneshot::Sender<CallerResponse>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallerResponse {
    Success,
    /// Booking outcome: what was booked and what was already owned.
    Booked {
        booked: Vec<TicketId>,
        already_owned: Vec<TicketId>,
    },
    /// Unbooking outcome: how many tickets were released.
    Released(usize),
    Error(String),
}

#[derive(Clone)]
pub struct HousieHandle {
    sender: mpsc::Sender<CallerMessage>,
    path: String,
}

impl HousieHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn send(&self, message: CallerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Game is closed".to_string())
    }
}

pub struct HousieCaller {
    path: String,
    config: HousieConfig,
    store: Arc<dyn Store>,
    inbox: mpsc::Receiver<CallerMessage>,
    rng: StdRng,
    is_closed: bool,
}

impl HousieCaller {
    pub fn new(
        path: impl Into<String>,
        config: HousieConfig,
        store: Arc<dyn Store>,
    ) -> (Self, HousieHandle) {
        Self::with_rng(path, config, store, StdRng::from_os_rng())
    }

    pub fn with_rng(
        path: impl Into<String>,
        config: HousieConfig,
        store: Arc<dyn Store>,
        rng: StdRng,
    ) -> (Self, HousieHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let path = path.into();
        let caller = Self {
            path: path.clone(),
            config,
            store,
            inbox,
            rng,
            is_closed: false,
        };
        (caller, HousieHandle { sender, path })
    }

    pub async fn run(mut self) {
        log::info!("housie game {} opening", self.path);

        // An empty snapshot means no game yet: seed a fresh one.
        self.ensure_game().await;

        let mut ticker = interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                Some(message) = self.inbox.recv() => {
                    self.handle_message(message).await;
                    if self.is_closed {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        log::info!("housie game {} closed", self.path);
    }

    async fn handle_message(&mut self, message: CallerMessage) {
        match message {
            CallerMessage::CallNext { response } => {
                let result = self
                    .mutate(|state, _| Some(state.call_next(Utc::now())))
                    .await;
                let _ = response.send(result);
            }

            CallerMessage::Reset { response } => {
                let ticket_count = self.config.ticket_count;
                let result = self
                    .mutate(move |_, rng| Some(HousieState::new(ticket_count, rng)))
                    .await;
                let _ = response.send(result);
            }

            CallerMessage::UpdateSettings { update, response } => {
                let result = self
                    .mutate(move |state, _| Some(state.update_settings(&update)))
                    .await;
                let _ = response.send(result);
            }

            CallerMessage::BookTickets {
                ids,
                owner,
                response,
            } => {
                let mut outcome = (Vec::new(), Vec::new());
                let result = self
                    .mutate(|state, _| {
                        let (next, booked, already_owned) = state.book_tickets(&ids, &owner);
                        outcome = (booked, already_owned);
                        Some(next)
                    })
                    .await;
                let result = match result {
                    CallerResponse::Success => CallerResponse::Booked {
                        booked: outcome.0,
                        already_owned: outcome.1,
                    },
                    other => other,
                };
                let _ = response.send(result);
            }

            CallerMessage::UnbookTickets {
                ids,
                owner,
                response,
            } => {
                let mut released = 0;
                let result = self
                    .mutate(|state, _| {
                        let (next, count) = state.unbook_tickets(&ids, owner.as_deref());
                        released = count;
                        Some(next)
                    })
                    .await;
                let result = match result {
                    CallerResponse::Success => CallerResponse::Released(released),
                    other => other,
                };
                let _ = response.send(result);
            }

            CallerMessage::GetState { response } => {
                let _ = response.send(self.snapshot().await);
            }

            CallerMessage::Subscribe { response } => {
                match self.store.subscribe(&self.path).await {
                    Ok(receiver) => {
                        let _ = response.send(receiver);
                    }
                    Err(err) => {
                        log::error!("housie game {}: subscribe failed: {err}", self.path);
                    }
                }
            }

            CallerMessage::Tick => self.tick().await,

            CallerMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(CallerResponse::Success);
            }
        }
    }

    /// Drive the scheduled first call and the auto-play cadence.
    async fn tick(&mut self) {
        let now = Utc::now();
        let interval_secs = self.config.auto_call_interval_secs;
        let result = self
            .mutate(move |state, _| {
                if state.scheduled_start_due(now) {
                    let mut next = state.call_next(now);
                    next.is_auto_playing = true;
                    Some(next)
                } else if state.auto_call_due(now, interval_secs) {
                    Some(state.call_next(now))
                } else {
                    None
                }
            })
            .await;
        if let CallerResponse::Error(err) = result {
            log::error!("housie game {}: tick failed: {err}", self.path);
        }
    }

    async fn ensure_game(&mut self) {
        let ticket_count = self.config.ticket_count;
        let path = self.path.clone();
        let mut rng = StdRng::from_rng(&mut self.rng);
        let mut update = move |snapshot: Snapshot| -> Mutation {
            if snapshot.is_some() {
                return Mutation::Abort;
            }
            match serde_json::to_value(HousieState::new(ticket_count, &mut rng)) {
                Ok(value) => Mutation::Write(value),
                Err(err) => {
                    log::error!("housie game {path}: failed to seed: {err}");
                    Mutation::Abort
                }
            }
        };
        if let Err(err) = self.store.transact(&self.path, &mut update).await {
            log::error!("housie game {}: failed to initialize: {err}", self.path);
        }
    }

    /// Run one pure transition through the store. The closure returns
    /// `None` to leave the game untouched.
    async fn mutate(
        &mut self,
        mut transition: impl FnMut(&HousieState, &mut StdRng) -> Option<HousieState> + Send,
    ) -> CallerResponse {
        let path = self.path.clone();
        let mut rng = StdRng::from_rng(&mut self.rng);
        let mut update = |snapshot: Snapshot| -> Mutation {
            let Some(value) = snapshot else {
                return Mutation::Abort;
            };
            let state = match serde_json::from_value::<HousieState>(value) {
                Ok(state) => state,
                Err(err) => {
                    log::warn!("housie game {path}: unreadable document: {err}");
                    return Mutation::Abort;
                }
            };
            let Some(next) = transition(&state, &mut rng) else {
                return Mutation::Abort;
            };
            if next == state {
                return Mutation::Abort;
            }
            match serde_json::to_value(&next) {
                Ok(value) => Mutation::Write(value),
                Err(err) => {
                    log::error!("housie game {path}: failed to serialize state: {err}");
                    Mutation::Abort
                }
            }
        };
        match self.store.transact(&self.path, &mut update).await {
            Ok(_) => CallerResponse::Success,
            Err(err) => CallerResponse::Error(err.to_string()),
        }
    }

    async fn snapshot(&self) -> Option<HousieState> {
        match self.store.read_once(&self.path).await {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            Ok(None) => None,
            Err(err) => {
                log::error!("housie game {}: read failed: {err}", self.path);
                None
            }
        }
    }
}
