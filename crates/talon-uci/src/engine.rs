//! The UCI command loop.
//!
//! Commands are read and handled on the caller's thread; searches run on a
//! [`SearchThread`] whose observer writes `info` and `bestmove` lines to the
//! shared [`Output`].

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use talon_core::{Move, Position, divide, notation};
use talon_engine::{EngineConfig, SearchEngine, SearchInfo, SearchObserver, SearchThread};

use crate::command::{Command, GoCommand, PositionCommand, parse_command};
use crate::error::UciError;

const HASH_MAX_MB: usize = 4096;
const CONTEMPT_MAX: i32 = 200;

/// Protocol output, shared with the search thread. One call writes one
/// whole line.
#[derive(Clone)]
pub struct Output(Arc<Mutex<Box<dyn Write + Send>>>);

impl Output {
    pub fn new(sink: impl Write + Send + 'static) -> Output {
        Output(Arc::new(Mutex::new(Box::new(sink))))
    }

    pub fn stdout() -> Output {
        Output::new(io::stdout())
    }

    pub fn line(&self, text: &str) {
        let mut sink = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(sink, "{text}").and_then(|()| sink.flush()) {
            warn!(error = %e, "failed to write protocol output");
        }
    }
}

/// Writes search progress as `info` lines and the result as `bestmove`.
struct UciObserver {
    out: Output,
}

impl SearchObserver for UciObserver {
    fn on_progress(&mut self, info: &SearchInfo) {
        self.out.line(&format_info(info));
    }

    fn on_best_move(&mut self, best: Move, ponder: Option<Move>) {
        let line = match ponder {
            Some(ponder) if best.is_some() => format!("bestmove {best} ponder {ponder}"),
            _ if best.is_some() => format!("bestmove {best}"),
            _ => "bestmove 0000".to_string(),
        };
        self.out.line(&line);
    }
}

/// `info depth .. seldepth .. score .. nodes .. time .. hashfull .. nps .. pv ..`
pub fn format_info(info: &SearchInfo) -> String {
    let score = match info.mate_in() {
        Some(moves) => format!("mate {moves}"),
        None => format!("cp {}", info.score),
    };
    let bound = if info.lower_bound {
        " lowerbound"
    } else if info.upper_bound {
        " upperbound"
    } else {
        ""
    };
    let pv: Vec<String> = info.pv.iter().map(|m| m.to_uci()).collect();
    format!(
        "info depth {} seldepth {} score {}{} nodes {} time {} hashfull {} nps {} pv {}",
        info.depth,
        info.sel_depth,
        score,
        bound,
        info.nodes,
        info.time.as_millis(),
        info.hashfull,
        info.nps,
        pv.join(" ")
    )
}

/// The UCI engine: current position, pending options and the search thread.
pub struct UciEngine {
    position: Position,
    config: EngineConfig,
    thread: SearchThread,
    out: Output,
}

impl UciEngine {
    /// Create a new engine with the starting position.
    pub fn new(out: Output) -> UciEngine {
        let config = EngineConfig::default();
        UciEngine {
            position: Position::startpos(),
            thread: SearchThread::new(SearchEngine::new(config.clone())),
            config,
            out,
        }
    }

    /// Run the UCI loop until `quit` or end of input.
    pub fn run(mut self, input: impl BufRead) -> Result<(), UciError> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!(cmd = %line, "received UCI command");
            match parse_command(line) {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    if let Err(e) = self.handle(command) {
                        warn!(error = %e, "command failed");
                    }
                }
                Err(e) => warn!(error = %e, "UCI parse error"),
            }
        }

        self.thread.stop();
        self.thread.wait();
        info!("talon shutting down");
        Ok(())
    }

    /// Handle one parsed command.
    pub fn handle(&mut self, command: Command) -> Result<(), UciError> {
        match command {
            Command::Uci => self.handle_uci(),
            Command::IsReady => self.handle_isready(),
            Command::UciNewGame => self.handle_ucinewgame(),
            Command::SetOption { name, value } => self.handle_setoption(&name, value.as_deref())?,
            Command::Position(position) => self.handle_position(&position)?,
            Command::Go(go) => self.handle_go(go)?,
            Command::PonderHit => self.thread.ponder_hit(),
            Command::Stop => self.thread.stop(),
            Command::Display => self.out.line(&self.position.to_string()),
            Command::Perft(depth) => self.handle_perft(depth),
            Command::Quit | Command::Unknown(_) => {}
        }
        Ok(())
    }

    /// Block until the running search, if any, has reported its move.
    pub fn wait(&mut self) {
        self.thread.wait();
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    fn handle_uci(&self) {
        let defaults = EngineConfig::default();
        self.out.line("id name talon");
        self.out.line("id author the talon developers");
        self.out.line(&format!(
            "option name Hash type spin default {} min 1 max {HASH_MAX_MB}",
            defaults.hash_mb
        ));
        self.out.line(&format!("option name Ponder type check default {}", defaults.ponder));
        self.out.line(&format!("option name UCI_Chess960 type check default {}", defaults.chess960));
        self.out.line(&format!(
            "option name Contempt type spin default {} min 0 max {CONTEMPT_MAX}",
            defaults.contempt
        ));
        self.out.line("uciok");
    }

    fn handle_isready(&mut self) {
        if !self.thread.is_searching() {
            self.thread.reconfigure(self.config.clone());
        }
        self.out.line("readyok");
    }

    fn handle_ucinewgame(&mut self) {
        self.thread.stop();
        self.thread.engine_mut().clear();
        self.position = Position::startpos();
        self.position.set_chess960(self.config.chess960);
    }

    fn handle_setoption(&mut self, name: &str, value: Option<&str>) -> Result<(), UciError> {
        let value = value.unwrap_or("");
        match name.to_ascii_lowercase().as_str() {
            "hash" => self.config.hash_mb = parse_option::<usize>(name, value)?.clamp(1, HASH_MAX_MB),
            "contempt" => self.config.contempt = parse_option::<i32>(name, value)?.clamp(0, CONTEMPT_MAX),
            "ponder" => self.config.ponder = parse_option(name, value)?,
            "uci_chess960" => {
                self.config.chess960 = parse_option(name, value)?;
                self.position.set_chess960(self.config.chess960);
            }
            _ => warn!(option = %name, "unknown option"),
        }
        Ok(())
    }

    fn handle_position(&mut self, position: &PositionCommand) -> Result<(), UciError> {
        let mut pos = match &position.fen {
            None => Position::startpos(),
            Some(fen) => fen.parse().map_err(|source| UciError::InvalidFen {
                fen: fen.clone(),
                source,
            })?,
        };
        if self.config.chess960 {
            pos.set_chess960(true);
        }
        for text in &position.moves {
            let mv = notation::parse(&mut pos, text);
            if !mv.is_some() || !pos.apply(mv) {
                // Keep what was reached so far rather than the old game.
                self.position = pos;
                return Err(UciError::InvalidMove { text: text.clone() });
            }
        }
        self.position = pos;
        Ok(())
    }

    fn handle_go(&mut self, go: GoCommand) -> Result<(), UciError> {
        if self.thread.is_searching() {
            warn!("go received while searching, restarting");
        }
        self.thread.stop();
        self.thread.reconfigure(self.config.clone());

        let mut params = go.params;
        for text in &go.searchmoves {
            let mv = notation::parse(&mut self.position, text);
            if !mv.is_some() {
                return Err(UciError::InvalidMove { text: text.clone() });
            }
            params.searchmoves.push(mv);
        }

        let observer = UciObserver { out: self.out.clone() };
        self.thread.go(&self.position, params, Box::new(observer))?;
        Ok(())
    }

    fn handle_perft(&mut self, depth: usize) {
        let mut pos = self.position.clone();
        let mut total = 0;
        for (mv, nodes) in divide(&mut pos, depth) {
            self.out.line(&format!("{mv}: {nodes}"));
            total += nodes;
        }
        self.out.line("");
        self.out.line(&format!("Nodes searched: {total}"));
    }
}

fn parse_option<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, UciError> {
    value.trim().parse().map_err(|_| UciError::InvalidValue {
        param: name.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Write};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use talon_engine::SearchInfo;

    use super::{Output, UciEngine, format_info};
    use crate::command::parse_command;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn session(script: &str) -> Vec<String> {
        let buffer = Buffer::default();
        let engine = UciEngine::new(Output::new(buffer.clone()));
        engine.run(Cursor::new(script.to_string())).unwrap();
        buffer.lines()
    }

    fn engine() -> (UciEngine, Buffer) {
        let buffer = Buffer::default();
        (UciEngine::new(Output::new(buffer.clone())), buffer)
    }

    fn send(engine: &mut UciEngine, line: &str) {
        engine.handle(parse_command(line).unwrap()).unwrap();
    }

    #[test]
    fn handshake_lists_options() {
        let lines = session("uci\nisready\nquit\n");
        assert_eq!(lines.first().map(String::as_str), Some("id name talon"));
        assert!(lines.iter().any(|l| l.starts_with("option name Hash type spin default 64")));
        assert!(lines.iter().any(|l| l.starts_with("option name UCI_Chess960 type check")));
        assert!(lines.iter().any(|l| l.starts_with("option name Contempt type spin default 90")));
        assert!(lines.contains(&"uciok".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("readyok"));
    }

    #[test]
    fn fixed_depth_search_reports_bestmove() {
        let (mut engine, buffer) = engine();
        send(&mut engine, "position startpos moves e2e4 e7e5");
        send(&mut engine, "go depth 3");
        engine.wait();
        let lines = buffer.lines();
        assert!(lines.iter().any(|l| l.starts_with("info depth 3 ")));
        let best = lines.iter().find(|l| l.starts_with("bestmove ")).unwrap();
        assert_eq!(lines.iter().filter(|l| l.starts_with("bestmove ")).count(), 1);
        assert!(best.split_whitespace().nth(1).is_some_and(|m| m.len() >= 4));
    }

    #[test]
    fn mate_is_reported_in_moves() {
        let (mut engine, buffer) = engine();
        send(&mut engine, "position fen 6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1");
        send(&mut engine, "go depth 2");
        engine.wait();
        let lines = buffer.lines();
        assert!(lines.iter().any(|l| l.contains("score mate 1 ")), "{lines:?}");
        assert!(lines.iter().any(|l| l.starts_with("bestmove d1d8")));
    }

    #[test]
    fn position_moves_are_applied() {
        let (mut engine, _) = engine();
        send(&mut engine, "position startpos moves e2e4 c7c5 g1f3");
        assert_eq!(
            engine.position().to_fen(),
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
    }

    #[test]
    fn illegal_move_keeps_the_prefix() {
        let (mut engine, _) = engine();
        let command = parse_command("position startpos moves e2e4 e2e4").unwrap();
        assert!(engine.handle(command).is_err());
        assert_eq!(engine.position().moves_played(), vec!["e2e4".to_string()]);
    }

    #[test]
    fn searchmoves_limit_the_reply() {
        let (mut engine, buffer) = engine();
        send(&mut engine, "position startpos");
        send(&mut engine, "go depth 2 searchmoves h2h3");
        engine.wait();
        assert!(buffer.lines().iter().any(|l| l.starts_with("bestmove h2h3")));
    }

    #[test]
    fn stop_ends_infinite_search() {
        let (mut engine, buffer) = engine();
        send(&mut engine, "position startpos");
        send(&mut engine, "go infinite");
        std::thread::sleep(Duration::from_millis(50));
        send(&mut engine, "stop");
        engine.wait();
        assert_eq!(buffer.lines().iter().filter(|l| l.starts_with("bestmove ")).count(), 1);
    }

    #[test]
    fn options_are_applied() {
        let (mut engine, _) = engine();
        send(&mut engine, "setoption name Hash value 8");
        send(&mut engine, "setoption name Contempt value 500");
        send(&mut engine, "setoption name UCI_Chess960 value true");
        assert_eq!(engine.config.hash_mb, 8);
        assert_eq!(engine.config.contempt, 200);
        assert!(engine.position().is_chess960());
        assert!(engine.handle(parse_command("setoption name Hash value lots").unwrap()).is_err());
    }

    #[test]
    fn perft_divides() {
        let (mut engine, buffer) = engine();
        send(&mut engine, "perft 2");
        let lines = buffer.lines();
        assert_eq!(lines.last().map(String::as_str), Some("Nodes searched: 400"));
        assert_eq!(lines.iter().filter(|l| l.ends_with(": 20")).count(), 20);
    }

    #[test]
    fn info_line_format() {
        let info = SearchInfo {
            depth: 5,
            sel_depth: 9,
            time: Duration::from_millis(42),
            pv: Vec::new(),
            score: 31,
            lower_bound: true,
            upper_bound: false,
            nodes: 1234,
            hashfull: 7,
            nps: 29_380,
        };
        assert_eq!(
            format_info(&info),
            "info depth 5 seldepth 9 score cp 31 lowerbound nodes 1234 time 42 hashfull 7 nps 29380 pv "
        );
    }
}
