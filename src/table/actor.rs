//! Table actor: the runtime driving one betting table.
//!
//! The actor owns no game state. Every mutation goes through the store's
//! `transact` with the pure transition function, so the same actor code
//! runs a single-process bot table over the memory store and a shared
//! multi-browser table over the replicated store.
//!
//! Timers and bot pacing run on a logical one-second clock: the run loop
//! ticks it in real time, and tests tick it by message to drive timeouts
//! and bot turns deterministically.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, interval};
use uuid::Uuid;

use super::config::TableConfig;
use super::messages::{TableMessage, TableResponse};
use crate::bot::{ActionQueue, BOT_NAMES, BotAction, BotContext, BotPolicy};
use crate::game::entities::Rupees;
use crate::game::state_machine::{GamePhase, Intent, TableState};
use crate::store::{Mutation, Snapshot, Store};

const TAG_SHIFT: u32 = 56;
const TAG_TURN: u8 = 1;
const TAG_RESPONSE: u8 = 2;
const TAG_DEAL: u8 = 3;

fn make_tag(kind: u8, fields: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    fields.hash(&mut hasher);
    (u64::from(kind) << TAG_SHIFT) | (hasher.finish() >> 8)
}

fn tag_kind(tag: u64) -> u8 {
    (tag >> TAG_SHIFT) as u8
}

/// Handle for sending messages to a table actor.
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    path: String,
}

impl TableHandle {
    pub fn new(sender: mpsc::Sender<TableMessage>, path: String) -> Self {
        Self { sender, path }
    }

    /// Store path of the table document this handle points at.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }
}

/// Actor managing a single betting table.
pub struct TableActor {
    /// Store path of the authoritative table document.
    path: String,

    config: TableConfig,

    store: Arc<dyn Store>,

    /// Message inbox.
    inbox: mpsc::Receiver<TableMessage>,

    policy: BotPolicy,

    /// Parked bot turns, bot side-show answers, and deny-on-timeout
    /// fallbacks, keyed to the situation that produced them.
    queue: ActionQueue,

    /// Logical clock in milliseconds, advanced one second per tick.
    clock_ms: u64,

    rng: StdRng,

    is_closed: bool,
}

impl TableActor {
    pub fn new(
        path: impl Into<String>,
        config: TableConfig,
        store: Arc<dyn Store>,
    ) -> (Self, TableHandle) {
        Self::with_rng(path, config, store, StdRng::from_os_rng())
    }

    /// Like [`TableActor::new`] with a caller-supplied rng, for seeded
    /// simulations and tests.
    pub fn with_rng(
        path: impl Into<String>,
        config: TableConfig,
        store: Arc<dyn Store>,
        rng: StdRng,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let path = path.into();
        let actor = Self {
            path: path.clone(),
            config,
            store,
            inbox,
            policy: BotPolicy::default(),
            queue: ActionQueue::new(),
            clock_ms: 0,
            rng,
            is_closed: false,
        };
        (actor, TableHandle::new(sender, path))
    }

    /// Run the table actor event loop.
    pub async fn run(mut self) {
        log::info!("table {} '{}' opening", self.path, self.config.name);

        if self.config.bots_enabled {
            self.seed_bots().await;
        }

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

        log::info!("table {} '{}' closed", self.path, self.config.name);
    }

    async fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join {
                unique_id,
                name,
                chips,
                response,
            } => {
                let result = self.handle_join(&unique_id, &name, chips).await;
                let _ = response.send(result);
            }

            TableMessage::Leave {
                unique_id,
                response,
            } => {
                self.apply_intent(&Intent::Leave { unique_id }).await;
                let _ = response.send(TableResponse::Success);
            }

            TableMessage::Act { intent, response } => {
                let result = match intent {
                    // Lifecycle intents have their own messages.
                    Intent::Join { .. }
                    | Intent::Leave { .. }
                    | Intent::AdminReset
                    | Intent::TurnTimeout => {
                        TableResponse::Error("unsupported action".to_string())
                    }
                    intent => {
                        self.apply_intent(&intent).await;
                        TableResponse::Success
                    }
                };
                let _ = response.send(result);
            }

            TableMessage::AdminReset { code, response } => {
                let result = if self.config.verify_admin_code(&code) {
                    self.apply_intent(&Intent::AdminReset).await;
                    TableResponse::Success
                } else {
                    log::warn!("table {}: admin reset with a bad code", self.path);
                    TableResponse::Error("incorrect admin code".to_string())
                };
                let _ = response.send(result);
            }

            TableMessage::GetState { response } => {
                let _ = response.send(self.snapshot().await);
            }

            TableMessage::Subscribe { response } => {
                match self.store.subscribe(&self.path).await {
                    Ok(receiver) => {
                        let _ = response.send(receiver);
                    }
                    Err(err) => {
                        // Dropping the sender surfaces as a recv error.
                        log::error!("table {}: subscribe failed: {err}", self.path);
                    }
                }
            }

            TableMessage::Tick => self.tick().await,

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(TableResponse::Success);
            }
        }
    }

    /// One second of table time: advance the turn timer, fire whatever the
    /// action queue has due, then plan follow-up work off a fresh snapshot.
    async fn tick(&mut self) {
        self.clock_ms += 1000;
        let now_ms = self.clock_ms;

        self.countdown().await;

        for intent in self.queue.take_due(now_ms) {
            self.apply_intent(&intent).await;
        }

        let Some(state) = self.snapshot().await else {
            return;
        };
        self.plan(now_ms, &state);
    }

    /// Decide what needs scheduling given the latest snapshot: a response
    /// to a pending side show, an auto-deal on a bot table, or the current
    /// bot's next move.
    fn plan(&mut self, now_ms: u64, state: &TableState) {
        if let Some(request) = &state.side_show_request {
            let tag = make_tag(TAG_RESPONSE, (request.initiator, request.target));
            if !self.queue.contains(tag)
                && let Some(target) = state.player_by_seat(request.target)
            {
                if target.is_bot {
                    let accepted = self.policy.accept_side_show(target, &mut self.rng);
                    let due = now_ms + self.policy.response_delay_ms(&mut self.rng);
                    self.queue.schedule(
                        due,
                        tag,
                        Intent::SideShowResponse {
                            seat: target.seat,
                            accepted,
                        },
                    );
                } else {
                    // A human target who never answers denies by timeout.
                    let due = now_ms + u64::from(self.config.side_show_response_secs) * 1000;
                    self.queue.schedule(
                        due,
                        tag,
                        Intent::SideShowResponse {
                            seat: target.seat,
                            accepted: false,
                        },
                    );
                }
            }
        } else {
            self.queue.retain_tags(|tag| tag_kind(tag) != TAG_RESPONSE);
        }

        if self.config.bots_enabled
            && state.game_phase == GamePhase::Lobby
            && !state.is_game_over
            && state.players.len() >= self.config.target_bot_count.min(self.config.max_players)
        {
            let tag = make_tag(TAG_DEAL, state.hands_played);
            self.queue.schedule(now_ms + 1000, tag, Intent::Deal);
            return;
        }

        if state.game_phase != GamePhase::Betting
            || state.is_game_over
            || state.side_show_request.is_some()
        {
            return;
        }
        let Some(current) = state.current_player() else {
            return;
        };
        if !current.is_bot || current.is_folded {
            return;
        }

        let tag = make_tag(
            TAG_TURN,
            (
                state.current_player_index,
                state.betting_round,
                state.pot,
                current.is_seen,
                state.active_count(),
            ),
        );
        if self.queue.contains(tag) {
            return;
        }

        let ctx = BotContext {
            active_players: state.active_count(),
            pot: state.pot,
            boot_amount: state.boot_amount,
            betting_round: state.betting_round,
        };
        let seat = current.seat;
        let intent = match self.policy.decide(current, &ctx, &mut self.rng) {
            BotAction::See => Intent::See { seat },
            BotAction::Chaal => Intent::Chaal { seat },
            BotAction::Fold => Intent::Fold { seat },
            // Bots only ask humans for a side show; against another bot
            // they keep betting instead.
            BotAction::SideShow => match state.side_show_target() {
                Some(target) if !target.is_bot => Intent::SideShowRequest { seat },
                _ => Intent::Chaal { seat },
            },
        };
        let due = now_ms + self.policy.think_delay_ms(&mut self.rng);
        self.queue.schedule(due, tag, intent);
    }

    /// Apply one intent through the store transaction, returning the state
    /// the table settled on.
    async fn apply_intent(&mut self, intent: &Intent) -> Option<TableState> {
        let now = Utc::now();
        let path = self.path.clone();
        let mut rng = StdRng::from_rng(&mut self.rng);
        let intent = intent.clone();
        let mut update = |snapshot: Snapshot| -> Mutation {
            let Some(value) = snapshot else {
                return Mutation::Abort;
            };
            let state = match serde_json::from_value::<TableState>(value) {
                Ok(state) => state,
                Err(err) => {
                    log::warn!("table {path}: unreadable document: {err}");
                    return Mutation::Abort;
                }
            };
            let next = state.apply(&intent, now, &mut rng);
            if next.players.is_empty() && matches!(intent, Intent::Leave { .. }) {
                // Last player gone: tear the table down entirely.
                return Mutation::Remove;
            }
            if next == state {
                return Mutation::Abort;
            }
            match serde_json::to_value(&next) {
                Ok(value) => Mutation::Write(value),
                Err(err) => {
                    log::error!("table {path}: failed to serialize state: {err}");
                    Mutation::Abort
                }
            }
        };

        match self.store.transact(&self.path, &mut update).await {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            Ok(None) => None,
            Err(err) => {
                log::error!("table {}: transaction failed: {err}", self.path);
                None
            }
        }
    }

    /// Join creates the table document on first contact.
    async fn handle_join(
        &mut self,
        unique_id: &str,
        name: &str,
        chips: Rupees,
    ) -> TableResponse {
        let now = Utc::now();
        let path = self.path.clone();
        let config = self.config.clone();
        let mut rng = StdRng::from_rng(&mut self.rng);
        let intent = Intent::Join {
            unique_id: unique_id.to_string(),
            name: name.to_string(),
            chips,
            is_bot: false,
        };
        let mut update = |snapshot: Snapshot| -> Mutation {
            let state = match snapshot {
                Some(value) => match serde_json::from_value::<TableState>(value) {
                    Ok(state) => state,
                    Err(err) => {
                        log::warn!("table {path}: unreadable document: {err}");
                        return Mutation::Abort;
                    }
                },
                None => TableState::new(config.boot_amount, config.session_end_from(now)),
            };
            let next = state.apply(&intent, now, &mut rng);
            match serde_json::to_value(&next) {
                Ok(value) => Mutation::Write(value),
                Err(_) => Mutation::Abort,
            }
        };

        match self.store.transact(&self.path, &mut update).await {
            Ok(Some(value)) => {
                let seated = serde_json::from_value::<TableState>(value)
                    .map(|state| state.player_by_unique_id(unique_id).is_some())
                    .unwrap_or(false);
                if seated {
                    TableResponse::Success
                } else {
                    TableResponse::Error("Table is full".to_string())
                }
            }
            Ok(None) => TableResponse::Error("Table is closed".to_string()),
            Err(err) => TableResponse::Error(err.to_string()),
        }
    }

    /// Advance the turn timer one second; reaching zero force-folds.
    async fn countdown(&mut self) {
        let now = Utc::now();
        let path = self.path.clone();
        let mut rng = StdRng::from_rng(&mut self.rng);
        let mut update = |snapshot: Snapshot| -> Mutation {
            let Some(value) = snapshot else {
                return Mutation::Abort;
            };
            let Ok(state) = serde_json::from_value::<TableState>(value) else {
                return Mutation::Abort;
            };
            match state.tick_turn_timer(now, &mut rng) {
                Some(next) if next != state => {
                    if next.is_game_over && !state.is_game_over {
                        log::info!("table {path}: turn timer expired, forced fold ended the hand");
                    }
                    match serde_json::to_value(&next) {
                        Ok(value) => Mutation::Write(value),
                        Err(_) => Mutation::Abort,
                    }
                }
                _ => Mutation::Abort,
            }
        };
        if let Err(err) = self.store.transact(&self.path, &mut update).await {
            log::error!("table {}: timer update failed: {err}", self.path);
        }
    }

    /// Fill the table with bots up to one short of the target, leaving a
    /// seat for a human.
    async fn seed_bots(&mut self) {
        let target = self
            .config
            .target_bot_count
            .min(self.config.max_players)
            .saturating_sub(1);
        let chips = self.config.bot_starting_chips;
        for _ in 0..target {
            let unique_id = format!("bot-{}", Uuid::new_v4().simple());
            let name = BOT_NAMES[self.rng.random_range(0..BOT_NAMES.len())].to_string();
            let now = Utc::now();
            let path = self.path.clone();
            let config = self.config.clone();
            let mut rng = StdRng::from_rng(&mut self.rng);
            let intent = Intent::Join {
                unique_id,
                name,
                chips,
                is_bot: true,
            };
            let mut update = |snapshot: Snapshot| -> Mutation {
                let state = match snapshot {
                    Some(value) => match serde_json::from_value::<TableState>(value) {
                        Ok(state) => state,
                        Err(err) => {
                            log::warn!("table {path}: unreadable document: {err}");
                            return Mutation::Abort;
                        }
                    },
                    None => TableState::new(config.boot_amount, config.session_end_from(now)),
                };
                let next = state.apply(&intent, now, &mut rng);
                match serde_json::to_value(&next) {
                    Ok(value) => Mutation::Write(value),
                    Err(_) => Mutation::Abort,
                }
            };
            if let Err(err) = self.store.transact(&self.path, &mut update).await {
                log::error!("table {}: failed to seed bots: {err}", self.path);
                return;
            }
        }
    }

    async fn snapshot(&self) -> Option<TableState> {
        match self.store.read_once(&self.path).await {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            Ok(None) => None,
            Err(err) => {
                log::error!("table {}: read failed: {err}", self.path);
                None
            }
        }
    }
}
