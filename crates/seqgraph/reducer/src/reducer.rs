//! The stream reducer.
//!
//! [`StreamReducer`] folds an ordered slice of [`EventRow`]s into a
//! [`StateGraph`]. Team logs hold many sessions back to back, delimited by
//! boundary rows; player logs are re-scanned once per player.

use crate::classifier::{
    classify_risk_proneness, format_risk_list, population_std_dev, RiskAversion, RiskLevel,
    VoteDispersion, VoteOffer,
};
use crate::config::{AccumulationMode, Feature, Focus, MalformedRowPolicy, ReducerConfig};
use crate::error::ReduceError;
use crate::session::SessionTracker;
use seqgraph_graph::StateGraph;
use seqgraph_types::{ActorId, EventRow, RowError, StateKind};
use tracing::{debug, info, warn};

/// Which handlers apply to a folded row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    /// Team sessions: setup, voting, selection, total gold, rounds.
    Team,
    /// Player sessions: setup, found gold, arrivals. Rounds are driven by
    /// the scan, not by the player's own rows.
    Player,
}

/// Counters of one reduction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReduceSummary {
    /// Sessions closed into the graph.
    pub sessions: usize,
    pub rows_seen: usize,
    /// Rows whose processing was abandoned because of a row error.
    pub rows_skipped: usize,
}

impl ReduceSummary {
    pub fn absorb(&mut self, other: ReduceSummary) {
        self.sessions += other.sessions;
        self.rows_seen += other.rows_seen;
        self.rows_skipped += other.rows_skipped;
    }
}

/// Folds event rows into a state graph according to a [`ReducerConfig`].
#[derive(Clone, Copy, Debug)]
pub struct StreamReducer<'a> {
    config: &'a ReducerConfig,
}

impl<'a> StreamReducer<'a> {
    pub fn new(config: &'a ReducerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReducerConfig {
        self.config
    }

    /// Reduce a whole log in the configured focus.
    pub fn reduce(
        &self,
        rows: &[EventRow],
        graph: &mut StateGraph,
    ) -> Result<ReduceSummary, ReduceError> {
        match self.config.focus {
            Focus::Teams => self.reduce_teams(rows, graph),
            Focus::Players => self.reduce_players(rows, graph),
        }
    }

    /// Reduce a log holding consecutive team sessions.
    ///
    /// A row whose team field contains the team marker starts the session of
    /// that team. The end-of-stream row and row exhaustion close the current
    /// session. Rows before the first boundary are ignored.
    pub fn reduce_teams(
        &self,
        rows: &[EventRow],
        graph: &mut StateGraph,
    ) -> Result<ReduceSummary, ReduceError> {
        let columns = &self.config.columns;
        let events = &self.config.events;
        let mut summary = ReduceSummary::default();
        let mut current: Option<SessionTracker> = None;

        for row in rows {
            summary.rows_seen += 1;
            let team_field = match row.require(columns.team_id) {
                Ok(field) => field,
                Err(err) => {
                    let actor = current.as_ref().map(SessionTracker::actor);
                    self.on_row_error(actor, err, &mut summary)?;
                    continue;
                }
            };

            if team_field == events.end_of_stream {
                if let Some(mut session) = current.take() {
                    if session.close(graph) {
                        summary.sessions += 1;
                    }
                }
                continue;
            }

            let is_boundary = team_field.contains(events.team_marker.as_str())
                && current
                    .as_ref()
                    .map_or(true, |s| s.actor().as_str() != team_field);
            if is_boundary {
                if let Some(mut previous) = current.take() {
                    if previous.close(graph) {
                        summary.sessions += 1;
                    }
                }
                current = Some(SessionTracker::open(
                    ActorId::from(team_field),
                    self.config,
                    graph,
                ));
            }

            let Some(session) = current.as_mut() else {
                continue;
            };
            if session.is_active() {
                self.fold_row(session, row, Scope::Team, graph, &mut summary)?;
            }
        }

        if let Some(mut session) = current.take() {
            if session.close(graph) {
                summary.sessions += 1;
            }
        }

        info!(
            sessions = summary.sessions,
            rows = summary.rows_seen,
            skipped = summary.rows_skipped,
            "Team log reduced"
        );
        Ok(summary)
    }

    /// Reduce a log once per player announced by a connection row.
    pub fn reduce_players(
        &self,
        rows: &[EventRow],
        graph: &mut StateGraph,
    ) -> Result<ReduceSummary, ReduceError> {
        let players = self.discover_players(rows);
        let mut summary = ReduceSummary::default();
        for player in &players {
            summary.absorb(self.reduce_player(player, rows, graph)?);
        }
        // Every row was scanned once per player; report it once.
        summary.rows_seen = rows.len();

        info!(
            players = players.len(),
            sessions = summary.sessions,
            skipped = summary.rows_skipped,
            "Player log reduced"
        );
        Ok(summary)
    }

    /// Players in order of first connection, without repeats.
    pub fn discover_players(&self, rows: &[EventRow]) -> Vec<ActorId> {
        let columns = &self.config.columns;
        let mut players: Vec<ActorId> = Vec::new();
        for row in rows {
            if row.field(columns.event) != Some(self.config.events.player_connection.as_str()) {
                continue;
            }
            match row.field(columns.player_id) {
                Some(id) if !players.iter().any(|p| p.as_str() == id) => {
                    players.push(ActorId::from(id));
                }
                Some(_) => {}
                None => warn!(line = row.line, "Connection row without player id"),
            }
        }
        players
    }

    /// Scan the log for one player's session. The session is always closed
    /// at the end of the scan.
    pub fn reduce_player(
        &self,
        player: &ActorId,
        rows: &[EventRow],
        graph: &mut StateGraph,
    ) -> Result<ReduceSummary, ReduceError> {
        let columns = &self.config.columns;
        let events = &self.config.events;

        let owns = |row: &EventRow| row.field(columns.player_id) == Some(player.as_str());
        if !rows.iter().any(|row| owns(row)) {
            return Err(ReduceError::UnknownActor {
                actor: player.to_string(),
            });
        }

        let mut summary = ReduceSummary::default();
        let mut session = SessionTracker::open(player.clone(), self.config, graph);

        for row in rows {
            summary.rows_seen += 1;
            if !session.is_active() {
                break;
            }
            if owns(row) {
                self.fold_row(&mut session, row, Scope::Player, graph, &mut summary)?;
            }

            match row.field(columns.event) {
                Some(event) if event == events.round_separator => {
                    self.on_round_separator(&mut session, graph);
                }
                Some(event) if event == events.game_suspended => session.suspend(),
                _ => {}
            }
        }

        if session.close(graph) {
            summary.sessions += 1;
        }
        Ok(summary)
    }

    /// Reduce a log that belongs to a single actor from the first row on.
    ///
    /// The session ends at the end-of-stream row or at a suspension row;
    /// neither is folded into the trajectory key.
    pub fn reduce_session(
        &self,
        actor: ActorId,
        rows: &[EventRow],
        graph: &mut StateGraph,
    ) -> Result<ReduceSummary, ReduceError> {
        let columns = &self.config.columns;
        let mut summary = ReduceSummary::default();
        let mut session = SessionTracker::open(actor, self.config, graph);

        for row in rows {
            summary.rows_seen += 1;
            if !session.is_active() {
                break;
            }
            if row.field(columns.team_id) == Some(self.config.events.end_of_stream.as_str()) {
                break;
            }
            // A single-team log stops at the suspension row without recording it.
            if row.field(columns.event) == Some(self.config.events.game_suspended.as_str()) {
                session.suspend();
                break;
            }
            self.fold_row(&mut session, row, Scope::Team, graph, &mut summary)?;
        }

        if session.close(graph) {
            summary.sessions += 1;
        }
        Ok(summary)
    }

    /// Fold one row into an active session: extend the raw key, run the
    /// event's handler, then suspend on a suspension row.
    fn fold_row(
        &self,
        session: &mut SessionTracker,
        row: &EventRow,
        scope: Scope,
        graph: &mut StateGraph,
        summary: &mut ReduceSummary,
    ) -> Result<(), ReduceError> {
        let event = match row.require(self.config.columns.event) {
            Ok(event) => event,
            Err(err) => return self.on_row_error(Some(session.actor()), err, summary),
        };

        if event != session.actor().as_str() {
            session.record_event(event);
        }

        if let Err(err) = self.apply_event(session, event, row, scope, graph) {
            self.on_row_error(Some(session.actor()), err, summary)?;
        }

        if scope == Scope::Team && event == self.config.events.game_suspended {
            session.suspend();
        }
        Ok(())
    }

    /// Apply the malformed-row policy. `actor` is `None` for rows outside
    /// any session.
    fn on_row_error(
        &self,
        actor: Option<&ActorId>,
        err: RowError,
        summary: &mut ReduceSummary,
    ) -> Result<(), ReduceError> {
        if err.is_malformed() && self.config.malformed_rows == MalformedRowPolicy::Abort {
            return Err(err.into());
        }
        summary.rows_skipped += 1;
        warn!(
            actor = actor.map_or("-", ActorId::as_str),
            line = err.line(),
            error = %err,
            "Row skipped"
        );
        Ok(())
    }

    fn apply_event(
        &self,
        session: &mut SessionTracker,
        event: &str,
        row: &EventRow,
        scope: Scope,
        graph: &mut StateGraph,
    ) -> Result<(), RowError> {
        let columns = &self.config.columns;
        let events = &self.config.events;

        if event == events.item_setup {
            let name = row.require(columns.item_name)?;
            let probability = row.require_f64(columns.item_probability)?;
            session.registry_mut().register_tool(name, probability);
        } else if event == events.mine_setup {
            let name = row.require(columns.item_name)?;
            let (floor, ceiling) = row.require_range(columns.item_probability)?;
            session.registry_mut().register_mine(name, floor, ceiling);
        } else if scope == Scope::Team && event == events.start_votation {
            self.on_start_votation(session, row)?;
        } else if scope == Scope::Team && event == events.vote {
            self.on_vote(session, row)?;
        } else if scope == Scope::Team && event == events.leader_selection {
            self.on_leader_selection(session, row, graph)?;
        } else if scope == Scope::Team && event == events.total_gold {
            self.on_gold(session, row, columns.total_gold, self.config.team_gold_mode, graph)?;
        } else if scope == Scope::Player && event == events.found_gold {
            self.on_gold(session, row, columns.found_gold, self.config.player_gold_mode, graph)?;
        } else if scope == Scope::Player && event == events.arrived_to {
            self.on_arrival(session, row, graph)?;
        } else if scope == Scope::Team && event == events.round_separator {
            self.on_round_separator(session, graph);
        }
        Ok(())
    }

    fn on_start_votation(
        &self,
        session: &mut SessionTracker,
        row: &EventRow,
    ) -> Result<(), RowError> {
        let item1 = row.require(self.config.columns.option_one)?;
        let item2 = row.require(self.config.columns.option_two)?;
        let registry = session.registry();
        let offer = match (registry.probability(item1), registry.probability(item2)) {
            (Some(p1), Some(p2)) => Some(VoteOffer::new(item1, p1, item2, p2)),
            _ => {
                debug!(
                    actor = %session.actor(),
                    line = row.line,
                    item1,
                    item2,
                    "Vote offer references an unknown item"
                );
                None
            }
        };
        session.set_offer(offer);
        Ok(())
    }

    fn on_vote(&self, session: &mut SessionTracker, row: &EventRow) -> Result<(), RowError> {
        let item = row.require(self.config.columns.voted_item)?;
        match session.registry().tool_probability(item) {
            Some(probability) => session.record_vote(probability),
            None => debug!(actor = %session.actor(), line = row.line, item, "Vote for unknown tool"),
        }
        Ok(())
    }

    fn on_leader_selection(
        &self,
        session: &mut SessionTracker,
        row: &EventRow,
        graph: &mut StateGraph,
    ) -> Result<(), RowError> {
        let features = &self.config.features;
        let round = session.round();

        let voters = session.votes().len();
        if voters >= 2 && features.contains(Feature::VotingStDev) {
            if let Some(std_dev) = population_std_dev(session.votes()) {
                let key = format!(
                    "st_dev r{}: {} voters: {}",
                    round,
                    VoteDispersion::from_std_dev(std_dev),
                    voters
                );
                session.emit(graph, &key, StateKind::Mid);
            }
        }
        session.clear_votes();

        let selected = row.require(self.config.columns.selected_item)?;
        let Some(probability) = session.registry().probability(selected) else {
            debug!(actor = %session.actor(), line = row.line, selected, "Selection of unknown item");
            return Ok(());
        };
        let Some((risk, gap)) = session.offer().map(|o| (o.classify(selected), o.gap())) else {
            debug!(actor = %session.actor(), line = row.line, selected, "Selection without a usable offer");
            return Ok(());
        };
        session.record_selection(risk, probability);

        if risk == RiskLevel::High && features.contains(Feature::RiskProneness) {
            let key = format!("risk_proneness: {}", classify_risk_proneness(gap));
            session.emit(graph, &key, StateKind::Mid);
        }
        if features.contains(Feature::Risk) {
            let key = format!("r{}:risk {}", round, risk);
            session.emit(graph, &key, StateKind::Mid);
        }
        Ok(())
    }

    fn on_gold(
        &self,
        session: &mut SessionTracker,
        row: &EventRow,
        column: usize,
        mode: AccumulationMode,
        graph: &mut StateGraph,
    ) -> Result<(), RowError> {
        let amount = row.require_u64(column)?;
        let crossed = session
            .gold_mut()
            .update(amount, mode)
            .ok_or_else(|| out_of_range(row, column, "amount within counter range"))?;
        if self.config.features.contains(Feature::Gold) {
            for milestone in crossed {
                session.emit(graph, &format!("gold: {}", milestone), StateKind::Mid);
            }
        }
        Ok(())
    }

    fn on_arrival(
        &self,
        session: &mut SessionTracker,
        row: &EventRow,
        graph: &mut StateGraph,
    ) -> Result<(), RowError> {
        let column = self.config.columns.position;
        let position = row.require_position(column)?;
        let crossed = session
            .distance_mut()
            .arrive(position)
            .ok_or_else(|| out_of_range(row, column, "position within counter range"))?;
        if self.config.features.contains(Feature::Distance) {
            for milestone in crossed {
                session.emit(graph, &format!("distance: {}", milestone), StateKind::Mid);
            }
        }
        Ok(())
    }

    fn on_round_separator(&self, session: &mut SessionTracker, graph: &mut StateGraph) {
        let features = &self.config.features;
        let round = session.round();

        let average = session.take_selection_average();
        if let Some(average) = average.filter(|_| features.contains(Feature::RiskAversion)) {
            let key = format!("risk_aversion: {}", RiskAversion::from_average(average));
            session.emit(graph, &key, StateKind::Mid);
        }
        if features.contains(Feature::Round) {
            session.emit(graph, &format!("round {}", round), StateKind::Round);
        }
        let risks = session.take_round_risks();
        if features.contains(Feature::RoundRisk) && !risks.is_empty() {
            let key = format!("round+risk{}: {}", round, format_risk_list(&risks));
            session.emit(graph, &key, StateKind::Round);
        }

        session.advance_round();
        debug!(actor = %session.actor(), round, "Round closed");
    }
}

/// A value that parsed but overflows the counter it feeds.
fn out_of_range(row: &EventRow, index: usize, expected: &'static str) -> RowError {
    RowError::Numeric {
        line: row.line,
        index,
        expected,
        value: row.field(index).unwrap_or_default().to_string(),
    }
}
