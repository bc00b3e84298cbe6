//! Session orchestrator.
//!
//! Owns every registry and drives the full life cycle of a session:
//!
//! - **start**: game metadata, bet bounds, burst rate and cooldown are checked before any money
//!   moves. Only then is the stake escrowed and the session created. A failing `start` removes the
//!   session and refunds. The cooldown is stamped only after a successful start.
//! - **action**: the action id is parsed and resolved to a live session. Every control except
//!   `playagain` and `accept` must carry the generation it was rendered for; a missing or
//!   outdated stamp is rejected. `accept` on an open challenge seats and escrows the joiner first. The transition runs on a working copy and is
//!   committed only if the session generation is still the one the copy was taken from.
//! - **timeout**: a firing whose session is gone, finished, or at another generation is dropped.
//! - **settlement**: exactly once per session. Payouts are credited, stats and progress recorded,
//!   XP awarded, the session finished and its escrow cleared.
//!
//! The orchestrator is single-threaded: the host owns it inside one event-loop task.

use crate::cooldown::CooldownGuard;
use crate::games::{
    action_tokens, apply_game_action, game_timeout, lobby, registry::GameRegistry, start_game, GameAction,
    GameError, GameResult, GameRng,
};
use crate::ledger::{GameOutcome, Ledger, LedgerError, ProgressKind};
use crate::render::Renderer;
use crate::scheduler::{Clock, Timer, TimerFired, TimerSink};
use crate::session::{GameSession, RegistryError, SessionRegistry};
use arcade_types::{
    ActionId, GameType, GuildId, PlayerId, SessionId, VOICE_ACCRUAL_COINS, XP_PER_GAME,
    XP_WIN_BONUS,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

/// Action token that replays a finished session's game and bet.
pub const PLAY_AGAIN: &str = "playagain";

/// User-visible reasons an inbound event was refused.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("bet must be between {min} and {max}")]
    BetOutOfRange { min: u64, max: u64 },
    #[error("you are starting games too quickly")]
    BurstRate,
    #[error("on cooldown for another {remaining_ms} ms")]
    Cooldown { remaining_ms: u64 },
    #[error("you already have an active game")]
    ActiveSession,
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("this game has expired")]
    Expired,
    #[error("you are not part of this game")]
    NotParticipant,
    #[error("this button is out of date")]
    StaleAction,
    #[error("that game is not available")]
    UnknownGame,
    #[error("malformed action id")]
    InvalidActionId,
    #[error(transparent)]
    Game(#[from] GameError),
}

impl From<LedgerError> for Rejection {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { have, need } => {
                Rejection::InsufficientFunds { have, need }
            }
            LedgerError::Overflow => Rejection::Game(GameError::InvalidState),
        }
    }
}

impl From<RegistryError> for Rejection {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::PlayerBusy(_) => Rejection::ActiveSession,
            RegistryError::SessionNotFound(_) => Rejection::Expired,
            RegistryError::SessionFinished(_) => Rejection::Game(GameError::GameAlreadyComplete),
            RegistryError::SessionFull(_) => Rejection::NotParticipant,
        }
    }
}

/// A player asked to start a game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartRequest {
    pub player: PlayerId,
    pub game_type: GameType,
    pub bet: u64,
    pub guild: Option<GuildId>,
}

/// A player pressed a button (optionally submitting modal text).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionEvent {
    pub player: PlayerId,
    pub custom_id: String,
    pub value: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Rejected,
    Expired,
    BetRefunded,
    Forfeited,
}

/// Public summary attached to every render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub game_type: GameType,
    pub generation: u64,
    pub finished: bool,
    pub outcome: &'static str,
    pub payouts: Vec<(PlayerId, u64)>,
    pub logs: Vec<String>,
    /// Action ids for the current round, stamped with `generation`. Empty once finished.
    pub actions: Vec<String>,
    /// Encoded action id for the replay button, once a solo session is over.
    pub play_again: Option<String>,
}

/// Messages for the chat adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    Render {
        session_id: SessionId,
        players: Vec<PlayerId>,
        image: Vec<u8>,
        summary: RenderSummary,
    },
    Notice {
        player: PlayerId,
        kind: NoticeKind,
        message: String,
    },
}

impl Outbound {
    fn rejection(player: PlayerId, rejection: &Rejection) -> Self {
        let kind = match rejection {
            Rejection::Expired => NoticeKind::Expired,
            _ => NoticeKind::Rejected,
        };
        Outbound::Notice {
            player,
            kind,
            message: rejection.to_string(),
        }
    }

    fn refunded(player: PlayerId, amount: u64) -> Self {
        Outbound::Notice {
            player,
            kind: NoticeKind::BetRefunded,
            message: format!("your bet of {amount} was refunded"),
        }
    }
}

/// Source of per-transition randomness.
pub trait RngProvider {
    fn rng(&self, session_id: SessionId, nonce: u64) -> GameRng;
}

/// Production provider: a process seed mixed with the session id and transition nonce.
#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    seed: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl RngProvider for SeededRng {
    fn rng(&self, session_id: SessionId, nonce: u64) -> GameRng {
        GameRng::new(self.seed, session_id, nonce)
    }
}

pub struct Orchestrator<L, R, T> {
    games: GameRegistry,
    sessions: SessionRegistry,
    cooldowns: CooldownGuard,
    ledger: L,
    renderer: R,
    timers: T,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngProvider + Send>,
}

impl<L, R, T> Orchestrator<L, R, T>
where
    L: Ledger,
    R: Renderer,
    T: TimerSink,
{
    pub fn new(
        ledger: L,
        renderer: R,
        timers: T,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RngProvider + Send>,
    ) -> Self {
        Self {
            games: GameRegistry::new(),
            sessions: SessionRegistry::default(),
            cooldowns: CooldownGuard::default(),
            ledger,
            renderer,
            timers,
            clock,
            rng,
        }
    }

    pub fn with_games(mut self, games: GameRegistry) -> Self {
        self.games = games;
        self
    }

    pub fn with_sessions(mut self, sessions: SessionRegistry) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_cooldowns(mut self, cooldowns: CooldownGuard) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    pub fn games(&self) -> &GameRegistry {
        &self.games
    }

    pub fn games_mut(&mut self) -> &mut GameRegistry {
        &mut self.games
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn cooldowns_mut(&mut self) -> &mut CooldownGuard {
        &mut self.cooldowns
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn handle_start(&mut self, request: StartRequest) -> Vec<Outbound> {
        let player = request.player;
        let now = self.clock.now_ms();
        match self.start(request, now) {
            Ok(outbound) => outbound,
            Err(rejection) => {
                debug!(player = ?player, %rejection, "start rejected");
                vec![Outbound::rejection(player, &rejection)]
            }
        }
    }

    pub fn handle_action(&mut self, event: ActionEvent) -> Vec<Outbound> {
        let player = event.player;
        let now = self.clock.now_ms();
        match self.action(event, now) {
            Ok(outbound) => outbound,
            Err(rejection) => {
                debug!(player = ?player, %rejection, "action rejected");
                vec![Outbound::rejection(player, &rejection)]
            }
        }
    }

    pub fn handle_timeout(&mut self, fired: TimerFired) -> Vec<Outbound> {
        let now = self.clock.now_ms();
        let Some(session) = self.sessions.get(fired.session_id) else {
            debug!(session_id = %fired.session_id, "timer for purged session dropped");
            return Vec::new();
        };
        if session.finished || session.generation != fired.generation {
            debug!(
                session_id = %fired.session_id,
                fired_generation = fired.generation,
                generation = session.generation,
                finished = session.finished,
                "stale timer dropped"
            );
            return Vec::new();
        }

        let mut working = session.clone();
        let expected = working.generation;
        let mut rng = self.rng.rng(working.id, expected + 1);
        let result = match game_timeout(&mut working, &mut rng) {
            Ok(result) => result,
            Err(err) => {
                warn!(session_id = %fired.session_id, ?err, "timeout transition failed");
                return Vec::new();
            }
        };
        match self.commit(working, expected, now) {
            Ok(timer) => self.after_transition(fired.session_id, &result, timer, now),
            Err(rejection) => {
                debug!(session_id = %fired.session_id, %rejection, "timeout lost commit race");
                Vec::new()
            }
        }
    }

    /// Purge expired sessions, apply the abandoned-session policy and prune cooldown stamps.
    ///
    /// Abandoned sessions where nobody ever moved have every stake refunded. Once a move was
    /// committed the stakes are forfeited and recorded as losses.
    pub fn sweep(&mut self) -> Vec<Outbound> {
        let now = self.clock.now_ms();
        let report = self.sessions.sweep(now);
        let mut outbound = Vec::new();

        for session in &report.abandoned {
            if session.moves == 0 {
                for player in &session.escrowed {
                    if self.refund(*player, session.bet) {
                        outbound.push(Outbound::refunded(*player, session.bet));
                    }
                }
            } else {
                for player in &session.players {
                    self.ledger.record_game_result(
                        *player,
                        session.game_type,
                        GameOutcome::Lost,
                        session.bet,
                        0,
                    );
                    outbound.push(Outbound::Notice {
                        player: *player,
                        kind: NoticeKind::Forfeited,
                        message: format!(
                            "your {} game was abandoned and the stake forfeited",
                            session.game_type
                        ),
                    });
                }
            }
        }

        self.cooldowns.prune(now);
        info!(
            purged = report.purged.len(),
            abandoned = report.abandoned.len(),
            live = self.sessions.active_count(),
            "session sweep"
        );
        outbound
    }

    pub fn presence_joined(&mut self, player: PlayerId) {
        self.timers.start_accrual(player);
    }

    pub fn presence_left(&mut self, player: PlayerId) {
        self.timers.stop_accrual(player);
    }

    /// One accrual tick: a flat coin reward and a minute of voice progress.
    pub fn handle_accrual(&mut self, player: PlayerId) {
        if let Err(err) = self.ledger.credit(player, VOICE_ACCRUAL_COINS) {
            warn!(player = ?player, ?err, "voice accrual credit failed");
            return;
        }
        self.ledger
            .record_progress(player, ProgressKind::VoiceMinutes, 1);
    }

    fn start(&mut self, request: StartRequest, now: u64) -> Result<Vec<Outbound>, Rejection> {
        let StartRequest {
            player,
            game_type,
            bet,
            guild,
        } = request;
        let info = self.games.info(game_type);
        if !info.is_active {
            return Err(Rejection::UnknownGame);
        }
        let bet = if info.is_free() { 0 } else { bet };
        if !info.accepts_bet(bet) {
            return Err(Rejection::BetOutOfRange {
                min: info.min_bet,
                max: info.max_bet,
            });
        }
        if !self.cooldowns.check_burst_rate(player, now) {
            return Err(Rejection::BurstRate);
        }
        let cooldown = self
            .cooldowns
            .effective_cooldown(guild, game_type, info.cooldown_ms);
        let check = self
            .cooldowns
            .check_cooldown(player, game_type.as_str(), cooldown, now);
        if !check.allowed {
            return Err(Rejection::Cooldown {
                remaining_ms: check.remaining_ms,
            });
        }
        if self.sessions.has_active(player) {
            return Err(Rejection::ActiveSession);
        }

        if bet > 0 {
            self.ledger.debit(player, bet)?;
        }
        let created = self
            .sessions
            .create(game_type, vec![player], bet, guild, now)
            .map(|session| {
                if bet > 0 {
                    session.escrowed.push(player);
                }
                session.clone()
            });
        let mut working = match created {
            Ok(session) => session,
            Err(err) => {
                self.refund(player, bet);
                return Err(err.into());
            }
        };

        let session_id = working.id;
        let mut rng = self.rng.rng(session_id, 0);
        let result = match start_game(&mut working, &mut rng) {
            Ok(result) => result,
            Err(err) => {
                self.sessions.remove(session_id);
                warn!(
                    player = ?player,
                    session_id = %session_id,
                    game_type = ?game_type,
                    ?err,
                    "game start failed after escrow"
                );
                let mut outbound = vec![Outbound::rejection(player, &Rejection::Game(err))];
                if bet > 0 && self.refund(player, bet) {
                    outbound.push(Outbound::refunded(player, bet));
                }
                return Ok(outbound);
            }
        };

        let timer = self.commit(working, 0, now)?;
        self.cooldowns.record(player, game_type.as_str(), now);
        info!(
            player = ?player,
            session_id = %session_id,
            game_type = ?game_type,
            bet,
            "game started"
        );
        Ok(self.after_transition(session_id, &result, timer, now))
    }

    fn action(&mut self, event: ActionEvent, now: u64) -> Result<Vec<Outbound>, Rejection> {
        let ActionEvent {
            player,
            custom_id,
            value,
        } = event;
        let id: ActionId = custom_id
            .parse()
            .map_err(|_| Rejection::InvalidActionId)?;
        let session = self.sessions.get(id.session_id).ok_or(Rejection::Expired)?;
        if session.game_type != id.game_type {
            return Err(Rejection::InvalidActionId);
        }

        // Finished head-to-head tables are never replayed.
        if id.action == PLAY_AGAIN && !session.game_type.is_pvp() {
            if !session.has_player(player) {
                return Err(Rejection::NotParticipant);
            }
            let request = StartRequest {
                player,
                game_type: session.game_type,
                bet: session.bet,
                guild: session.guild,
            };
            return self.start(request, now);
        }

        if session.finished {
            return Err(GameError::GameAlreadyComplete.into());
        }
        match id.generation {
            Some(generation) if generation != session.generation => {
                return Err(Rejection::StaleAction)
            }
            None if id.action != lobby::ACCEPT => return Err(Rejection::StaleAction),
            _ => {}
        }

        let max_players = self.games.info(session.game_type).max_players;
        let joining = id.action == lobby::ACCEPT
            && !session.has_player(player)
            && session.players.len() < max_players;
        if !joining && !session.has_player(player) {
            return Err(Rejection::NotParticipant);
        }
        let (session_id, bet) = (session.id, session.bet);
        if joining {
            self.escrow_joiner(session_id, player, bet, max_players, now)?;
        }

        let Some(session) = self.sessions.get(session_id) else {
            return Err(Rejection::Expired);
        };
        let mut working = session.clone();
        let expected = working.generation;
        let mut rng = self.rng.rng(session_id, expected + 1);
        let action = GameAction {
            token: id.action,
            value,
        };
        let result = match apply_game_action(&mut working, player, &action, &mut rng) {
            Ok(result) => result,
            Err(err) => {
                if joining {
                    let mut outbound =
                        vec![Outbound::rejection(player, &Rejection::Game(err.clone()))];
                    if self.release_joiner(session_id, player, bet) {
                        outbound.push(Outbound::refunded(player, bet));
                    }
                    debug!(player = ?player, session_id = %session_id, ?err, "join rolled back");
                    return Ok(outbound);
                }
                return Err(err.into());
            }
        };
        working.moves = working.moves.saturating_add(1);
        let timer = self.commit(working, expected, now)?;
        Ok(self.after_transition(session_id, &result, timer, now))
    }

    /// Seat and escrow a player accepting an open challenge.
    fn escrow_joiner(
        &mut self,
        session_id: SessionId,
        player: PlayerId,
        bet: u64,
        max_players: usize,
        now: u64,
    ) -> Result<(), Rejection> {
        if self.sessions.has_active(player) {
            return Err(Rejection::ActiveSession);
        }
        if bet > 0 {
            self.ledger.debit(player, bet)?;
        }
        if let Err(err) = self.sessions.join(session_id, player, max_players, now) {
            self.refund(player, bet);
            return Err(err.into());
        }
        if bet > 0 {
            if let Some(session) = self.sessions.get_mut(session_id) {
                session.escrowed.push(player);
            }
        }
        debug!(player = ?player, session_id = %session_id, bet, "challenge joined");
        Ok(())
    }

    /// Undo [`Self::escrow_joiner`] after the accept transition failed.
    fn release_joiner(&mut self, session_id: SessionId, player: PlayerId, bet: u64) -> bool {
        self.sessions.leave(session_id, player);
        let was_escrowed = match self.sessions.get_mut(session_id) {
            Some(session) => {
                let before = session.escrowed.len();
                session.escrowed.retain(|p| *p != player);
                before != session.escrowed.len()
            }
            None => false,
        };
        was_escrowed && self.refund(player, bet)
    }

    /// Commit a working copy if the stored session is still at `expected`.
    fn commit(
        &mut self,
        mut working: GameSession,
        expected: u64,
        now: u64,
    ) -> Result<Option<u64>, Rejection> {
        let current = self
            .sessions
            .get(working.id)
            .ok_or(Rejection::Expired)?;
        if current.finished {
            return Err(GameError::GameAlreadyComplete.into());
        }
        if current.generation != expected {
            return Err(Rejection::StaleAction);
        }
        working.generation = expected + 1;
        working.last_update = now;
        let timer = working.pending_timer.take();
        self.sessions.commit(working)?;
        Ok(timer)
    }

    fn after_transition(
        &mut self,
        session_id: SessionId,
        result: &GameResult,
        timer: Option<u64>,
        now: u64,
    ) -> Vec<Outbound> {
        let mut outbound = Vec::new();
        let payouts = if result.is_terminal() {
            self.settle(session_id, result, now, &mut outbound)
        } else {
            if let (Some(delay_ms), Some(session)) = (timer, self.sessions.get(session_id)) {
                self.timers.schedule(Timer {
                    session_id,
                    generation: session.generation,
                    delay_ms,
                });
            }
            Vec::new()
        };
        if let Some(render) = self.render(session_id, result, payouts) {
            outbound.insert(0, render);
        }
        outbound
    }

    /// Credit, record and finish. Returns the credits made; empty if already settled.
    fn settle(
        &mut self,
        session_id: SessionId,
        result: &GameResult,
        now: u64,
        outbound: &mut Vec<Outbound>,
    ) -> Vec<(PlayerId, u64)> {
        let Some(session) = self.sessions.get(session_id).cloned() else {
            return Vec::new();
        };
        if session.finished || !self.sessions.finish(session_id, now) {
            debug!(session_id = %session_id, "settlement skipped, already finished");
            return Vec::new();
        }

        let initiator = session.initiator();
        let credits: Vec<(PlayerId, u64)> = match result {
            GameResult::Continue(_) | GameResult::Loss(_) => Vec::new(),
            GameResult::Win(amount, _) | GameResult::Push(amount, _) => initiator
                .map(|player| vec![(player, *amount)])
                .unwrap_or_default(),
            GameResult::Settled { payouts, .. } => payouts.clone(),
            GameResult::Cancelled(_) => session
                .escrowed
                .iter()
                .map(|player| (*player, session.bet))
                .collect(),
        };

        for (player, amount) in &credits {
            if *amount == 0 {
                continue;
            }
            if let Err(err) = self.ledger.credit(*player, *amount) {
                warn!(player = ?player, session_id = %session_id, amount, ?err, "payout failed");
            }
        }
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.escrowed.clear();
        }

        if let GameResult::Cancelled(_) = result {
            for (player, amount) in &credits {
                outbound.push(Outbound::refunded(*player, *amount));
            }
        } else {
            for player in &session.players {
                let paid: u64 = credits
                    .iter()
                    .filter(|(p, _)| p == player)
                    .map(|(_, amount)| *amount)
                    .sum();
                let outcome = outcome_for(result, *player, session.bet, paid);
                self.record_completion(&session, *player, outcome, paid);
            }
        }
        log_game_completion(&session, result, &credits);
        credits
    }

    fn record_completion(
        &mut self,
        session: &GameSession,
        player: PlayerId,
        outcome: GameOutcome,
        paid: u64,
    ) {
        let won = outcome == GameOutcome::Won;
        self.ledger
            .record_game_result(player, session.game_type, outcome, session.bet, paid);
        self.ledger
            .record_progress(player, ProgressKind::GamesPlayed, 1);
        self.ledger
            .record_progress(player, ProgressKind::CoinsWagered, session.bet);
        if won {
            self.ledger.record_progress(player, ProgressKind::GamesWon, 1);
            self.ledger.record_progress(player, ProgressKind::CoinsWon, paid);
        }
        let xp = if won {
            XP_PER_GAME + XP_WIN_BONUS
        } else {
            XP_PER_GAME
        };
        let level = self.ledger.add_xp(player, xp);
        debug!(player = ?player, xp, level, "xp awarded");
    }

    fn refund(&mut self, player: PlayerId, amount: u64) -> bool {
        if amount == 0 {
            return false;
        }
        match self.ledger.credit(player, amount) {
            Ok(_) => true,
            Err(err) => {
                warn!(player = ?player, amount, ?err, "refund failed");
                false
            }
        }
    }

    fn render(
        &self,
        session_id: SessionId,
        result: &GameResult,
        payouts: Vec<(PlayerId, u64)>,
    ) -> Option<Outbound> {
        let session = self.sessions.get(session_id)?;
        let image = self.renderer.render(session.game_type, &session.state);
        let play_again = (session.finished && !session.game_type.is_pvp())
            .then(|| ActionId::new(session.game_type, session_id, PLAY_AGAIN).encode());
        let actions = if session.finished {
            Vec::new()
        } else {
            action_tokens(session.game_type)
                .into_iter()
                .map(|token| {
                    ActionId::new(session.game_type, session_id, token)
                        .at_generation(session.generation)
                        .encode()
                })
                .collect()
        };
        Some(Outbound::Render {
            session_id,
            players: session.players.clone(),
            image,
            summary: RenderSummary {
                game_type: session.game_type,
                generation: session.generation,
                finished: session.finished,
                outcome: result.outcome_label(),
                payouts,
                logs: result.logs().to_vec(),
                actions,
                play_again,
            },
        })
    }
}

/// How a terminal result counts for `player`'s stats.
fn outcome_for(result: &GameResult, player: PlayerId, bet: u64, paid: u64) -> GameOutcome {
    match result {
        GameResult::Win(..) if paid > bet => GameOutcome::Won,
        GameResult::Win(..) if paid == bet => GameOutcome::Drawn,
        GameResult::Push(..) => GameOutcome::Drawn,
        GameResult::Settled {
            winner: Some(winner),
            ..
        } if *winner == player => GameOutcome::Won,
        GameResult::Settled { winner: None, .. } => GameOutcome::Drawn,
        _ => GameOutcome::Lost,
    }
}

fn log_game_completion(session: &GameSession, result: &GameResult, credits: &[(PlayerId, u64)]) {
    let payout: u64 = credits.iter().map(|(_, amount)| *amount).sum();
    info!(
        players = ?session.players,
        session_id = %session.id,
        game_type = ?session.game_type,
        outcome = result.outcome_label(),
        bet = session.bet,
        payout,
        moves = session.moves,
        "game completed"
    );
}
