//! Principal variation search with quiescence.
//!
//! A [`Searcher`] lives for one `go`. It owns a clone of the root position
//! and borrows the long-lived tables from the engine. Running out of budget
//! inside the tree raises [`Unwind`], which travels up through `?` to the
//! root loop; moves still applied at that point are rolled back there.

use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use talon_core::{AnalysisCache, Bitboard, Color, Move, PieceKind, Position};
use tracing::debug;

use crate::eval::{NO_VALUE, Scorer};
use crate::search::control::SearchControl;
use crate::search::draw::draw_score;
use crate::search::heuristics::{HISTORY_MIN, HistoryTable, KillerTable};
use crate::search::observer::{SearchInfo, SearchObserver};
use crate::search::ordering::{MovePicker, PickMode};
use crate::search::tt::{DEPTH_QS_CHECKS, DEPTH_QS_NO_CHECKS, NodeType, TranspositionTable, TtEntry};
use crate::search::{KNOWN_WIN, MATE, MAX_DEPTH, SearchResult, VALUE_IS_MATE};
use crate::time::{Budget, SearchParams};

const ASPIRATION_WINDOW: [i32; 6] = [10, 25, 150, 400, 550, 1025];

/// Indexed by remaining depth.
const RAZORING_MARGIN: [i32; 4] = [0, 225, 230, 235];
const FUTILITY_MARGIN_CHILD: [i32; 4] = [0, 80, 160, 240];
const FUTILITY_MARGIN_PARENT: [i32; 6] = [100, 180, 260, 340, 420, 500];
const FUTILITY_MARGIN_QS: i32 = 50;

/// History score below `HISTORY_MIN + margin` prunes a late quiet move.
const HISTORY_PRUNING_MARGIN: [i32; 4] = [7000, 5994, 5087, 5724];

/// Indexed by [`NodeKind`].
const IID_DEPTH: [i32; 3] = [5, 5, 8];
const IID_MARGIN: i32 = 150;
const SINGULAR_DEPTH: [i32; 3] = [0, 6, 8];
const SINGULAR_MARGIN: i32 = 1;

const LOW_DEPTH: i32 = 4;
const NULL_MIN_DEPTH: i32 = 2;
const NULL_VERIFY_DEPTH: i32 = 12;
const LMR_MIN_DEPTH: i32 = 3;
const EVAL_TREND_CLAMP: i32 = 250;

/// Iterations deeper than this notify on every new root move and may panic.
const NOTIFY_DEPTH: i32 = 6;
const PANIC_DROP: i32 = 100;

/// Nodes between two looks at the clock.
const CLOCK_CHECK_INTERVAL: u64 = 1024;
const MAX_PV: usize = 256;

/// Exchange values used by quiescence futility.
const QS_CAPTURE_VALUE: [i32; PieceKind::COUNT] = [100, 325, 325, 500, 975, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Root,
    Pv,
    NonPv,
}

impl NodeKind {
    const fn index(self) -> usize {
        self as usize
    }
}

/// The budget ran out; the whole tree below the root is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unwind;

#[derive(Debug, Default, Clone, Copy)]
struct Stats {
    tt_lookups: u64,
    tt_hits: u64,
    razor_tries: u64,
    razor_hits: u64,
    null_tries: u64,
    null_hits: u64,
    singular_tries: u64,
    singular_hits: u64,
    aspiration_tries: u64,
    aspiration_hits: u64,
    pv_nodes: u64,
    cut_nodes: u64,
    all_nodes: u64,
}

pub(crate) struct Searcher<'a> {
    pos: Position,
    tt: &'a mut TranspositionTable,
    history: &'a mut HistoryTable,
    killers: &'a mut KillerTable,
    scorer: &'a mut dyn Scorer,
    control: &'a SearchControl,
    observer: &'a mut dyn SearchObserver,
    params: &'a SearchParams,
    contempt: i32,

    caches: Vec<AnalysisCache>,
    evals: [i32; MAX_DEPTH],
    root_len: usize,
    turn: Color,
    start: Instant,
    clock_start: Instant,
    budget: Budget,
    panic: bool,
    pondering: bool,
    next_clock_check: u64,

    nodes: u64,
    depth: i32,
    completed_depth: i32,
    sel_depth: usize,
    best_move: Move,
    best_score: i32,
    root_score: i32,
    stats: Stats,
}

impl<'a> Searcher<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        pos: &Position,
        tt: &'a mut TranspositionTable,
        history: &'a mut HistoryTable,
        killers: &'a mut KillerTable,
        scorer: &'a mut dyn Scorer,
        control: &'a SearchControl,
        observer: &'a mut dyn SearchObserver,
        params: &'a SearchParams,
        contempt: i32,
    ) -> Searcher<'a> {
        let start = Instant::now();
        let turn = pos.turn();
        let pondering = params.ponder && control.is_pondering();
        let budget = SearchParams {
            ponder: pondering,
            ..params.clone()
        }
        .budget(turn, start, false);
        Searcher {
            pos: pos.clone(),
            tt,
            history,
            killers,
            scorer,
            control,
            observer,
            params,
            contempt,
            caches: (0..MAX_DEPTH).map(|_| AnalysisCache::new()).collect(),
            evals: [NO_VALUE; MAX_DEPTH],
            root_len: pos.history_len(),
            turn,
            start,
            clock_start: start,
            budget,
            panic: false,
            pondering,
            next_clock_check: CLOCK_CHECK_INTERVAL,
            nodes: 0,
            depth: 0,
            completed_depth: 0,
            sel_depth: 0,
            best_move: Move::NONE,
            best_score: -MATE,
            root_score: 0,
            stats: Stats::default(),
        }
    }

    /// Iterative deepening with aspiration windows, then the best move.
    pub(crate) fn run(mut self) -> SearchResult {
        self.tt.new_generation();
        self.root_score = match self.tt.lookup(self.pos.key(), 0) {
            Some(entry) if entry.can_cut(0, -MATE, MATE) => entry.score,
            entry => self.static_eval(0, entry),
        };

        let mut depth = 1;
        loop {
            self.depth = depth;
            let iteration_start = Instant::now();
            let score = match self.iterate(depth) {
                Ok(score) => score,
                Err(Unwind) => {
                    while self.pos.history_len() > self.root_len {
                        self.pos.rollback();
                    }
                    break;
                }
            };

            let previous = self.root_score;
            self.root_score = score;
            self.completed_depth = depth;
            self.notify(score, false, false);

            if depth > NOTIFY_DEPTH && !self.panic && score < previous - PANIC_DROP {
                debug!(depth, previous, score, "score dropped, extending thinking time");
                self.panic = true;
                self.recompute_budget();
            }

            if self.finished(depth, score, iteration_start.elapsed()) {
                break;
            }
            depth += 1;
        }

        let pv = self.principal_variation();
        let ponder_move = pv.get(1).copied();

        while (self.control.is_pondering() || self.params.infinite) && !self.control.is_stopped() {
            thread::sleep(Duration::from_millis(5));
        }

        let stats = self.stats;
        debug!(
            nodes = self.nodes,
            depth = self.completed_depth,
            ms = self.start.elapsed().as_millis() as u64,
            tt_lookups = stats.tt_lookups,
            tt_hits = stats.tt_hits,
            razor = ?(stats.razor_hits, stats.razor_tries),
            null = ?(stats.null_hits, stats.null_tries),
            singular = ?(stats.singular_hits, stats.singular_tries),
            aspiration = ?(stats.aspiration_hits, stats.aspiration_tries),
            nodes_pv = stats.pv_nodes,
            nodes_cut = stats.cut_nodes,
            nodes_all = stats.all_nodes,
            "search finished"
        );

        self.observer.on_best_move(self.best_move, ponder_move);
        SearchResult {
            best_move: self.best_move,
            ponder_move,
            pv,
            score: if self.best_move.is_some() { self.best_score } else { self.root_score },
            nodes: self.nodes,
            depth: self.completed_depth as usize,
            sel_depth: self.sel_depth,
        }
    }

    /// One root search at `depth`, re-searched with wider windows until the
    /// score lands strictly inside.
    fn iterate(&mut self, depth: i32) -> Result<i32, Unwind> {
        let init = self.root_score;
        let mut low_step = 0;
        let mut high_step = 0;
        let mut alpha = lower_window(init, low_step);
        let mut beta = upper_window(init, high_step);
        self.stats.aspiration_tries += 1;

        loop {
            let score = self.pvs(NodeKind::Root, depth, alpha, beta, true, Move::NONE)?;
            if score <= alpha && alpha > -MATE - 1 {
                low_step += 1;
                alpha = lower_window(init, low_step);
            } else if score >= beta && beta < MATE + 1 {
                high_step += 1;
                beta = upper_window(init, high_step);
            } else {
                if low_step == 0 && high_step == 0 {
                    self.stats.aspiration_hits += 1;
                }
                return Ok(score);
            }
        }
    }

    fn finished(&self, depth: i32, score: i32, iteration: Duration) -> bool {
        let out_of_time = self.budget.manage_time
            && (score.abs() > VALUE_IS_MATE
                || self
                    .budget
                    .deadline
                    .is_some_and(|deadline| Instant::now() + iteration * 2 > deadline));
        let mate_found = self
            .params
            .mate
            .is_some_and(|moves| score >= MATE - (2 * moves as i32 - 1));
        out_of_time
            || depth as usize >= MAX_DEPTH
            || self.budget.depth.is_some_and(|limit| depth as usize >= limit)
            || score.abs() == MATE
            || mate_found
    }

    fn pvs(
        &mut self,
        node: NodeKind,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        allow_pruning: bool,
        excluded: Move,
    ) -> Result<i32, Unwind> {
        let ply = self.ply();
        if node != NodeKind::Root && self.out_of_budget() {
            return Err(Unwind);
        }
        if node != NodeKind::NonPv {
            self.sel_depth = self.sel_depth.max(ply);
        }
        if node != NodeKind::Root && self.pos.is_draw() {
            return Ok(self.draw_score(ply));
        }

        alpha = alpha.max(mated_in(ply));
        beta = beta.min(MATE - (ply as i32 + 1));
        if alpha >= beta {
            return Ok(alpha);
        }

        let excluding = excluded.is_some();
        let key = if excluding { self.pos.exclusion_key() } else { self.pos.key() };
        let in_check = self.pos.is_check();

        self.stats.tt_lookups += 1;
        let tt_entry = self.tt.lookup(key, ply);
        let mut tt_move = Move::NONE;
        if let Some(entry) = tt_entry {
            self.stats.tt_hits += 1;
            if node != NodeKind::Root && entry.can_cut(depth, alpha, beta) {
                self.history_good(ply, entry.mv, depth);
                return Ok(entry.score);
            }
            tt_move = entry.mv;
        }

        let mut eval = -MATE;
        if in_check {
            self.evals[ply] = NO_VALUE;
        } else {
            let eval_entry = if excluding { self.tt.lookup(self.pos.key(), ply) } else { tt_entry };
            let static_eval = self.static_eval(ply, eval_entry);
            self.evals[ply] = static_eval;
            eval = refine_eval(tt_entry, static_eval);
        }

        if ply >= MAX_DEPTH - 1 {
            return Ok(if in_check { self.draw_score(ply) } else { eval });
        }

        let turn = self.pos.turn();
        let mut mate_threat = false;
        if !in_check && allow_pruning {
            if node == NodeKind::NonPv
                && tt_move.is_none()
                && depth < LOW_DEPTH
                && beta.abs() < VALUE_IS_MATE
                && eval.abs() < KNOWN_WIN
                && eval + RAZORING_MARGIN[depth as usize] < beta
                && !self.pawn_on_seventh()
            {
                self.stats.razor_tries += 1;
                if depth <= 1 && eval + RAZORING_MARGIN[3] < beta {
                    self.stats.razor_hits += 1;
                    return Ok(self.quiescence(0, alpha, beta));
                }
                let rbeta = beta - RAZORING_MARGIN[depth as usize];
                let score = self.quiescence(0, rbeta - 1, rbeta);
                if score < rbeta {
                    self.stats.razor_hits += 1;
                    return Ok(score);
                }
            }

            if node != NodeKind::Root
                && depth < LOW_DEPTH
                && alpha.abs() < VALUE_IS_MATE
                && beta.abs() < VALUE_IS_MATE
                && eval - FUTILITY_MARGIN_CHILD[depth as usize] >= beta
                && self.pos.non_pawn_material(turn).is_nonempty()
            {
                return Ok(eval - FUTILITY_MARGIN_CHILD[depth as usize]);
            }

            if node == NodeKind::NonPv
                && depth >= NULL_MIN_DEPTH
                && beta.abs() < VALUE_IS_MATE
                && eval >= beta
                && self.pos.non_pawn_material(turn).is_nonempty()
            {
                self.stats.null_tries += 1;
                let reduction = 3 + depth / 4;
                self.pos.apply_null();
                let score = -self.search_or_qs(NodeKind::NonPv, depth - reduction, -beta, -beta + 1, false)?;
                self.pos.rollback();

                if score >= beta {
                    let score = if score >= VALUE_IS_MATE { beta } else { score };
                    if depth < NULL_VERIFY_DEPTH
                        || self.pvs(NodeKind::NonPv, depth - reduction, beta - 1, beta, false, Move::NONE)? >= beta
                    {
                        self.stats.null_hits += 1;
                        return Ok(score);
                    }
                } else if score <= -VALUE_IS_MATE {
                    mate_threat = true;
                }
            }

            if tt_move.is_none()
                && depth >= IID_DEPTH[node.index()]
                && (node != NodeKind::NonPv || self.evals[ply] + IID_MARGIN > beta)
            {
                let d = if node == NodeKind::NonPv { depth >> 1 } else { depth - 2 };
                self.pvs(node, d, alpha, beta, false, excluded)?;
                if let Some(entry) = self.tt.lookup(key, ply) {
                    tt_move = entry.mv;
                }
            }
        }

        self.caches[ply].rebuild(&self.pos);
        let here = self.killers.get(ply);
        let before = if ply >= 2 { self.killers.get(ply - 2) } else { [Move::NONE; 2] };
        let killers = [here[0], here[1], before[0], before[1]];
        let eval_trend = if ply > 2 && self.evals[ply] != NO_VALUE && self.evals[ply - 2] != NO_VALUE {
            (self.evals[ply] - self.evals[ply - 2]).clamp(-EVAL_TREND_CLAMP, EVAL_TREND_CLAMP)
        } else {
            0
        };

        let mut picker = MovePicker::new(tt_move, PickMode::All, killers, in_check);
        let mut best_move = Move::NONE;
        let mut best_score = -MATE;
        let mut move_count = 0;

        while let Some(mv) = picker.next(&mut self.pos, &self.caches[ply], &*self.history) {
            if excluding && mv.same_as(excluded) {
                continue;
            }
            if node == NodeKind::Root
                && !self.params.searchmoves.is_empty()
                && !self.params.searchmoves.iter().any(|m| m.same_as(mv))
            {
                continue;
            }
            self.nodes += 1;
            move_count += 1;

            let is_tt_move = mv.same_as(tt_move);
            let gives_check = mv.is_check();

            let mut extension = 0;
            if mate_threat || (gives_check && picker.last_see(&self.pos) >= 0) {
                extension = 1;
            }
            if node != NodeKind::Root
                && is_tt_move
                && extension < 1
                && !excluding
                && depth >= SINGULAR_DEPTH[node.index()]
            {
                if let Some(tt_score) = singular_candidate(tt_entry, depth) {
                    self.stats.singular_tries += 1;
                    let se_beta = tt_score - SINGULAR_MARGIN * depth;
                    let score = self.pvs(node, depth >> 1, se_beta - 1, se_beta, false, mv)?;
                    if score < se_beta {
                        self.stats.singular_hits += 1;
                        extension = 1;
                    }
                }
            }
            let new_depth = depth + extension - 1;

            let mut reduction = 0;
            let unimportant = node != NodeKind::Root
                && !is_tt_move
                && !in_check
                && !mv.is_capture()
                && !gives_check
                && !is_pawn_push_678(mv, turn)
                && !picker.last_is_killer();
            if unimportant {
                if best_move.is_some()
                    && node == NodeKind::NonPv
                    && new_depth < LOW_DEPTH
                    && picker.last_score() < HISTORY_MIN + HISTORY_PRUNING_MARGIN[new_depth as usize]
                {
                    continue;
                }
                if depth >= LMR_MIN_DEPTH {
                    reduction = late_move_reduction(node, depth, move_count, eval_trend, picker.last_score()).min(new_depth);
                }
                if best_move.is_some() {
                    let d = new_depth - reduction;
                    if (d as usize) < FUTILITY_MARGIN_PARENT.len() {
                        let futility = self.evals[ply] + FUTILITY_MARGIN_PARENT[d as usize];
                        if futility <= alpha {
                            best_score = best_score.max(futility);
                            continue;
                        }
                    }
                    if d < LOW_DEPTH && picker.last_see(&self.pos) < 0 {
                        continue;
                    }
                }
            }

            let applied = self.pos.apply(mv);
            debug_assert!(applied, "picker yielded an illegal move {}", mv.to_uci());
            let low = alpha.max(best_score);
            let score = if node != NodeKind::NonPv && move_count == 1 {
                -self.search_or_qs(NodeKind::Pv, new_depth, -beta, -low, true)?
            } else {
                let mut score = if reduction > 0 {
                    -self.search_or_qs(NodeKind::NonPv, new_depth - reduction, -low - 1, -low, true)?
                } else {
                    low + 1
                };
                if score > low {
                    score = -self.search_or_qs(NodeKind::NonPv, new_depth, -low - 1, -low, true)?;
                }
                if node != NodeKind::NonPv && score > low && (node == NodeKind::Root || score < beta) {
                    score = -self.search_or_qs(NodeKind::Pv, new_depth, -beta, -low, true)?;
                }
                score
            };
            self.pos.rollback();

            if score > best_score {
                best_score = score;
                best_move = mv;
                if node == NodeKind::Root {
                    self.best_move = mv;
                    self.best_score = score;
                    if self.depth > NOTIFY_DEPTH {
                        self.notify(score, score >= beta, score <= alpha);
                    }
                }
            }

            if score >= beta {
                break;
            }
            if score <= alpha && !mv.is_tactical() {
                self.history.update_bad(mv, depth);
            }
        }

        if move_count == 0 {
            return Ok(if excluding {
                alpha
            } else if in_check {
                mated_in(ply)
            } else {
                self.draw_score(ply)
            });
        }

        let node_type = if best_score <= alpha {
            self.stats.all_nodes += 1;
            NodeType::FailLow
        } else if best_score >= beta {
            self.stats.cut_nodes += 1;
            self.history_good(ply, best_move, depth);
            NodeType::FailHigh
        } else {
            self.stats.pv_nodes += 1;
            NodeType::Exact
        };
        self.tt.store(key, node_type, depth, best_move, best_score, self.evals[ply], ply);
        Ok(best_score)
    }

    /// Captures, promotions and, on the first level, checks until the
    /// position is quiet. Never unwinds.
    fn quiescence(&mut self, qs_depth: usize, mut alpha: i32, mut beta: i32) -> i32 {
        let ply = self.ply();
        if self.pos.is_draw() {
            return self.draw_score(ply);
        }
        alpha = alpha.max(mated_in(ply));
        beta = beta.min(MATE - (ply as i32 + 1));
        if alpha >= beta {
            return alpha;
        }

        let is_pv = beta - alpha > 1;
        let in_check = self.pos.is_check();
        let gen_checks = qs_depth == 0;
        let tt_depth = if gen_checks || in_check { DEPTH_QS_CHECKS } else { DEPTH_QS_NO_CHECKS };
        let key = self.pos.key();

        self.stats.tt_lookups += 1;
        let tt_entry = self.tt.lookup(key, ply);
        let mut tt_move = Move::NONE;
        if let Some(entry) = tt_entry {
            self.stats.tt_hits += 1;
            if !is_pv && entry.can_cut(tt_depth, alpha, beta) {
                return entry.score;
            }
            tt_move = entry.mv;
        }

        let mut best_score = alpha;
        let mut eval = -MATE;
        let mut futility_base = -MATE;
        if in_check {
            self.evals[ply] = NO_VALUE;
        } else {
            let static_eval = self.static_eval(ply, tt_entry);
            self.evals[ply] = static_eval;
            eval = refine_eval(tt_entry, static_eval);
            if eval >= beta {
                if tt_entry.is_none() {
                    self.tt.store(key, NodeType::FailHigh, tt_depth, Move::NONE, eval, static_eval, ply);
                }
                return eval;
            }
            best_score = best_score.max(eval);
            futility_base = eval + FUTILITY_MARGIN_QS;
        }

        if ply >= MAX_DEPTH - 1 {
            return if in_check { self.draw_score(ply) } else { eval };
        }

        self.caches[ply].rebuild(&self.pos);
        let mode = if gen_checks { PickMode::CapturesPromosChecks } else { PickMode::CapturesPromos };
        let mut picker = MovePicker::new(tt_move, mode, [Move::NONE; 4], in_check);
        let turn = self.pos.turn();
        let mut best_move = Move::NONE;
        let mut move_count = 0;

        while let Some(mv) = picker.next(&mut self.pos, &self.caches[ply], &*self.history) {
            self.nodes += 1;
            move_count += 1;

            if !in_check && !mv.is_check() && !is_pawn_push_678(mv, turn) && futility_base > -KNOWN_WIN {
                let futility = futility_base + captured_value(&self.pos, mv);
                if futility <= alpha {
                    best_score = best_score.max(futility);
                    continue;
                }
                if futility_base <= alpha && picker.last_see(&self.pos) <= 0 {
                    best_score = best_score.max(futility_base);
                    continue;
                }
            }

            let applied = self.pos.apply(mv);
            debug_assert!(applied, "picker yielded an illegal move {}", mv.to_uci());
            let score = -self.quiescence(qs_depth + 1, -beta, -best_score);
            self.pos.rollback();

            if score > best_score {
                best_score = score;
                best_move = mv;
                if score >= beta {
                    break;
                }
            }
        }

        if in_check && move_count == 0 {
            return mated_in(ply);
        }

        let node_type = if best_score <= alpha {
            NodeType::FailLow
        } else if best_score >= beta {
            NodeType::FailHigh
        } else {
            NodeType::Exact
        };
        self.tt.store(key, node_type, tt_depth, best_move, best_score, self.evals[ply], ply);
        best_score
    }

    fn search_or_qs(&mut self, node: NodeKind, depth: i32, alpha: i32, beta: i32, allow_pruning: bool) -> Result<i32, Unwind> {
        if depth < 1 {
            Ok(self.quiescence(0, alpha, beta))
        } else {
            self.pvs(node, depth, alpha, beta, allow_pruning, Move::NONE)
        }
    }

    /// Side-to-move static evaluation, read from the table when present.
    /// A fresh evaluation is stored only when nothing was there.
    fn static_eval(&mut self, ply: usize, entry: Option<TtEntry>) -> i32 {
        if let Some(entry) = entry {
            if entry.eval != NO_VALUE {
                return entry.eval;
            }
        }
        self.caches[ply].rebuild(&self.pos);
        let eval = self.scorer.evaluate(&self.pos, &self.caches[ply]) * self.pos.turn().sign();
        if entry.is_none() {
            self.tt.store(self.pos.key(), NodeType::Eval, 0, Move::NONE, 0, eval, ply);
        }
        eval
    }

    fn history_good(&mut self, ply: usize, mv: Move, depth: i32) {
        if mv.is_none() || mv.is_tactical() {
            return;
        }
        self.killers.store(ply, mv);
        self.history.update_good(mv, depth);
    }

    fn out_of_budget(&mut self) -> bool {
        if self.best_move.is_none() {
            return false;
        }
        if self.control.is_stopped() {
            return true;
        }
        if self.budget.nodes.is_some_and(|limit| self.nodes > limit) {
            return true;
        }
        if self.nodes < self.next_clock_check {
            return false;
        }
        self.next_clock_check = self.nodes + CLOCK_CHECK_INTERVAL;
        if self.pondering && !self.control.is_pondering() {
            debug!(nodes = self.nodes, "ponder hit");
            self.pondering = false;
            self.clock_start = Instant::now();
            self.recompute_budget();
        }
        self.budget.deadline.is_some_and(|deadline| Instant::now() > deadline)
    }

    fn recompute_budget(&mut self) {
        if self.pondering {
            return;
        }
        let params = SearchParams {
            ponder: false,
            ..self.params.clone()
        };
        self.budget = params.budget(self.turn, self.clock_start, self.panic);
    }

    fn notify(&mut self, score: i32, lower_bound: bool, upper_bound: bool) {
        let time = self.start.elapsed();
        let millis = time.as_millis() as u64;
        let info = SearchInfo {
            depth: self.depth as usize,
            sel_depth: self.sel_depth,
            time,
            pv: self.principal_variation(),
            score,
            lower_bound,
            upper_bound,
            nodes: self.nodes,
            hashfull: self.tt.hashfull(),
            nps: if millis > 0 { self.nodes * 1000 / millis } else { 0 },
        };
        self.observer.on_progress(&info);
    }

    /// The root best move followed by the table's moves, stopping at a
    /// missing or illegal move or a repeated position.
    fn principal_variation(&mut self) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut seen = vec![self.pos.key()];
        let mut mv = self.best_move;
        while mv.is_some() && pv.len() < MAX_PV {
            let legal = self.pos.legal_move(mv);
            if legal.is_none() || !self.pos.apply(legal) {
                break;
            }
            pv.push(legal);
            let key = self.pos.key();
            if seen.contains(&key) {
                break;
            }
            seen.push(key);
            mv = self.tt.lookup(key, pv.len()).map_or(Move::NONE, |entry| entry.mv);
        }
        for _ in 0..pv.len() {
            self.pos.rollback();
        }
        pv
    }

    fn pawn_on_seventh(&self) -> bool {
        (self.pos.pieces_of(Color::White, PieceKind::Pawn) & Bitboard::RANK_7).is_nonempty()
            || (self.pos.pieces_of(Color::Black, PieceKind::Pawn) & Bitboard::RANK_2).is_nonempty()
    }

    #[inline]
    fn ply(&self) -> usize {
        self.pos.history_len() - self.root_len
    }

    #[inline]
    fn draw_score(&self, ply: usize) -> i32 {
        draw_score(&self.pos, ply, self.contempt)
    }
}

#[inline]
fn mated_in(ply: usize) -> i32 {
    -MATE + ply as i32
}

fn lower_window(init: i32, step: usize) -> i32 {
    match ASPIRATION_WINDOW.get(step) {
        Some(window) => (init - window).max(-MATE),
        None => -MATE - 1,
    }
}

fn upper_window(init: i32, step: usize) -> i32 {
    match ASPIRATION_WINDOW.get(step) {
        Some(window) => (init + window).min(MATE),
        None => MATE + 1,
    }
}

/// A stored bound tightens the static evaluation when it agrees with it.
fn refine_eval(entry: Option<TtEntry>, eval: i32) -> i32 {
    match entry {
        Some(e)
            if e.node_type == NodeType::Exact
                || (e.node_type == NodeType::FailLow && e.score < eval)
                || (e.node_type == NodeType::FailHigh && e.score > eval) =>
        {
            e.score
        }
        _ => eval,
    }
}

/// Score of a deep enough fail-high entry away from mate.
fn singular_candidate(entry: Option<TtEntry>, depth: i32) -> Option<i32> {
    entry
        .filter(|e| e.node_type == NodeType::FailHigh && e.depth >= depth - 3 && e.score.abs() < KNOWN_WIN)
        .map(|e| e.score)
}

fn is_pawn_push_678(mv: Move, turn: Color) -> bool {
    mv.piece() == PieceKind::Pawn && mv.to().relative_rank(turn) >= 5
}

fn captured_value(pos: &Position, mv: Move) -> i32 {
    if mv.is_en_passant() {
        return QS_CAPTURE_VALUE[PieceKind::Pawn.index()];
    }
    if !mv.is_capture() {
        return 0;
    }
    pos.kind_on(mv.to()).map_or(0, |kind| QS_CAPTURE_VALUE[kind.index()])
}

fn log_table() -> &'static [[f64; 64]; 64] {
    static TABLE: OnceLock<[[f64; 64]; 64]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let norm = 63f64.ln() * 63f64.ln();
        let mut table = [[0.0; 64]; 64];
        for (i, row) in table.iter_mut().enumerate().skip(1) {
            for (j, cell) in row.iter_mut().enumerate().skip(1) {
                *cell = (i as f64).ln() * (j as f64).ln() / norm;
            }
        }
        table
    })
}

/// Plies taken off a late quiet move. Grows with depth and move number,
/// shrinks for improving positions, good history and PV nodes.
fn late_move_reduction(node: NodeKind, depth: i32, move_count: usize, eval_trend: i32, history: i32) -> i32 {
    let node_factor = if node == NodeKind::NonPv { 1.0 } else { 0.85 };
    let trend = 1.0 - 0.8 * eval_trend as f64 / 500.0;
    let history = 1.0 - 1.1 * history as f64 / 65532.0;
    let log = log_table()[(depth as usize).min(63)][move_count.min(63)];
    (0.5 + 4.4 * node_factor * trend * history * log) as i32
}

#[cfg(test)]
mod tests {
    use talon_core::{Move, Position, notation};

    use super::{NodeKind, late_move_reduction, log_table, lower_window, refine_eval, upper_window};
    use crate::search::MATE;
    use crate::search::tt::{NodeType, TtEntry};

    fn entry(node_type: NodeType, score: i32) -> TtEntry {
        TtEntry {
            mv: Move::NONE,
            node_type,
            depth: 4,
            generation: 0,
            score,
            eval: 0,
        }
    }

    #[test]
    fn reduction_grows_with_depth_and_move_number() {
        assert_eq!(late_move_reduction(NodeKind::NonPv, 3, 1, 0, 0), 0);
        let shallow = late_move_reduction(NodeKind::NonPv, 4, 10, 0, 0);
        let deep = late_move_reduction(NodeKind::NonPv, 20, 30, 0, 0);
        assert!(deep > shallow);
        assert!(late_move_reduction(NodeKind::NonPv, 20, 30, 0, 0) >= late_move_reduction(NodeKind::Pv, 20, 30, 0, 0));
        assert!(late_move_reduction(NodeKind::NonPv, 20, 30, 0, -30_000) > late_move_reduction(NodeKind::NonPv, 20, 30, 0, 30_000));
        assert!(late_move_reduction(NodeKind::NonPv, 20, 30, -250, 0) > late_move_reduction(NodeKind::NonPv, 20, 30, 250, 0));
    }

    #[test]
    fn log_table_is_normalised() {
        let table = log_table();
        assert_eq!(table[1][40], 0.0);
        assert!((table[63][63] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn aspiration_windows_widen_to_full() {
        assert_eq!(lower_window(30, 0), 20);
        assert_eq!(upper_window(30, 2), 180);
        assert_eq!(lower_window(-MATE + 5, 1), -MATE);
        assert_eq!(lower_window(0, 6), -MATE - 1);
        assert_eq!(upper_window(0, 6), MATE + 1);
    }

    #[test]
    fn stored_bounds_refine_eval() {
        assert_eq!(refine_eval(None, 40), 40);
        assert_eq!(refine_eval(Some(entry(NodeType::Exact, 90)), 40), 90);
        assert_eq!(refine_eval(Some(entry(NodeType::FailLow, 10)), 40), 10);
        assert_eq!(refine_eval(Some(entry(NodeType::FailLow, 70)), 40), 40);
        assert_eq!(refine_eval(Some(entry(NodeType::FailHigh, 70)), 40), 70);
        assert_eq!(refine_eval(Some(entry(NodeType::Eval, 0)), 40), 40);
    }

    #[test]
    fn pawn_pushes_to_the_sixth_rank_and_beyond() {
        let mut pos: Position = "4k3/8/8/3P4/8/4p3/8/4K3 w - - 0 1".parse().unwrap();
        let push = notation::parse(&mut pos, "d5d6");
        assert!(super::is_pawn_push_678(push, pos.turn()));
        let mut pos: Position = "4k3/8/8/3P4/8/4p3/8/4K3 b - - 0 1".parse().unwrap();
        let push = notation::parse(&mut pos, "e3e2");
        assert!(super::is_pawn_push_678(push, pos.turn()));
        let mut pos: Position = "4k3/8/8/8/8/8/3P4/4K3 w - - 0 1".parse().unwrap();
        let push = notation::parse(&mut pos, "d2d4");
        assert!(!super::is_pawn_push_678(push, pos.turn()));
    }
}
