//! UCI command parsing.
//!
//! Parsing is purely textual. Moves stay strings here and are resolved
//! against a position by the engine loop, which knows whether castling is
//! written the Chess960 way.

use std::time::Duration;

use talon_engine::SearchParams;

use crate::error::UciError;

/// The `position` command before it is played out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCommand {
    /// `None` for `startpos`.
    pub fen: Option<String>,
    pub moves: Vec<String>,
}

/// The `go` command: everything but `searchmoves` is final.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoCommand {
    pub params: SearchParams,
    pub searchmoves: Vec<String>,
}

/// A parsed UCI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `setoption name <name> [value <value>]`; the name may contain spaces.
    SetOption { name: String, value: Option<String> },
    /// `position` -- set up a board position with optional moves applied.
    Position(PositionCommand),
    /// `go` -- start searching with given parameters.
    Go(GoCommand),
    /// `ponderhit` -- opponent played the expected move during pondering.
    PonderHit,
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// `d` -- print the board.
    Display,
    /// `perft <depth>` -- count leaf nodes per root move.
    Perft(usize),
    /// Unrecognized command (ignored, as the protocol requires).
    Unknown(String),
}

/// Keywords that end a `searchmoves` list.
const GO_KEYWORDS: [&str; 12] = [
    "wtime",
    "btime",
    "winc",
    "binc",
    "movestogo",
    "depth",
    "nodes",
    "mate",
    "movetime",
    "infinite",
    "ponder",
    "searchmoves",
];

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "ponderhit" => Ok(Command::PonderHit),
        "d" => Ok(Command::Display),
        "perft" => Ok(Command::Perft(parse_int(rest.first(), "perft")?)),
        "setoption" => parse_setoption(rest),
        "position" => parse_position(rest),
        "go" => parse_go(rest),
        _ => Ok(Command::Unknown(head.to_string())),
    }
}

fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.first() != Some(&"name") {
        return Err(UciError::MalformedOption);
    }
    let tokens = &tokens[1..];
    let split = tokens.iter().position(|&t| t == "value");
    let (name, value) = match split {
        Some(at) => (&tokens[..at], Some(tokens[at + 1..].join(" "))),
        None => (tokens, None),
    };
    if name.is_empty() {
        return Err(UciError::MalformedOption);
    }
    Ok(Command::SetOption {
        name: name.join(" "),
        value,
    })
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let moves_at = tokens.iter().position(|&t| t == "moves").unwrap_or(tokens.len());
    let (setup, moves) = tokens.split_at(moves_at);

    let fen = match setup.split_first() {
        Some((&"startpos", [])) => None,
        Some((&"fen", fields)) if !fields.is_empty() => Some(fields.join(" ")),
        _ => return Err(UciError::MalformedPosition),
    };
    let moves = moves.iter().skip(1).map(|m| m.to_string()).collect();
    Ok(Command::Position(PositionCommand { fen, moves }))
}

/// Parse the `go` command arguments. Unknown tokens are skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut go = GoCommand::default();
    let params = &mut go.params;

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1);
        match tokens[i] {
            "wtime" => params.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => params.btime = Some(parse_millis(value, "btime")?),
            "winc" => params.winc = Some(parse_millis(value, "winc")?),
            "binc" => params.binc = Some(parse_millis(value, "binc")?),
            "movestogo" => params.movestogo = Some(parse_int(value, "movestogo")?),
            "depth" => params.depth = Some(parse_int(value, "depth")?),
            "nodes" => params.nodes = Some(parse_int(value, "nodes")?),
            "mate" => params.mate = Some(parse_int(value, "mate")?),
            "movetime" => params.movetime = Some(parse_millis(value, "movetime")?),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            "ponder" => {
                params.ponder = true;
                i += 1;
                continue;
            }
            "searchmoves" => {
                let list: Vec<String> = tokens[i + 1..]
                    .iter()
                    .take_while(|t| !GO_KEYWORDS.contains(*t))
                    .map(|t| t.to_string())
                    .collect();
                i += 1 + list.len();
                go.searchmoves = list;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Ok(Command::Go(go))
}

/// Parse a millisecond value from a token.
fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    // GUIs sometimes send a negative clock when flagging.
    let value = token.ok_or_else(|| UciError::MissingValue {
        param: param.to_string(),
    })?;
    let ms: i64 = value.parse().map_err(|_| UciError::InvalidValue {
        param: param.to_string(),
        value: value.to_string(),
    })?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

/// Parse an integer value from a token.
fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn go(line: &str) -> GoCommand {
        match parse_command(line).unwrap() {
            Command::Go(go) => go,
            other => panic!("expected Go, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("uci").unwrap(), Command::Uci);
        assert_eq!(parse_command("isready").unwrap(), Command::IsReady);
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
        assert_eq!(parse_command("ucinewgame").unwrap(), Command::UciNewGame);
        assert_eq!(parse_command("ponderhit").unwrap(), Command::PonderHit);
        assert_eq!(parse_command("stop").unwrap(), Command::Stop);
        assert_eq!(parse_command("d").unwrap(), Command::Display);
        assert_eq!(parse_command("perft 3").unwrap(), Command::Perft(3));
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5").unwrap();
        assert_eq!(
            cmd,
            Command::Position(PositionCommand {
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            })
        );
    }

    #[test]
    fn parse_position_fen() {
        let cmd = parse_command("position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        match cmd {
            Command::Position(position) => {
                assert_eq!(position.fen.as_deref(), Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"));
                assert!(position.moves.is_empty());
            }
            other => panic!("expected Position, got {other:?}"),
        }
    }

    #[test]
    fn parse_position_errors() {
        assert!(matches!(parse_command("position"), Err(UciError::MalformedPosition)));
        assert!(matches!(parse_command("position fen"), Err(UciError::MalformedPosition)));
        assert!(matches!(parse_command("position somewhere"), Err(UciError::MalformedPosition)));
    }

    #[test]
    fn parse_setoption_names_and_values() {
        assert_eq!(
            parse_command("setoption name Hash value 128").unwrap(),
            Command::SetOption {
                name: "Hash".to_string(),
                value: Some("128".to_string()),
            }
        );
        assert_eq!(
            parse_command("setoption name Clear Hash").unwrap(),
            Command::SetOption {
                name: "Clear Hash".to_string(),
                value: None,
            }
        );
        assert!(matches!(parse_command("setoption Hash 1"), Err(UciError::MalformedOption)));
    }

    #[test]
    fn parse_go_clock() {
        let go = go("go wtime 300000 btime 300000 winc 2000 binc 2000 movestogo 20");
        assert_eq!(go.params.wtime, Some(Duration::from_millis(300_000)));
        assert_eq!(go.params.btime, Some(Duration::from_millis(300_000)));
        assert_eq!(go.params.winc, Some(Duration::from_millis(2_000)));
        assert_eq!(go.params.binc, Some(Duration::from_millis(2_000)));
        assert_eq!(go.params.movestogo, Some(20));
    }

    #[test]
    fn parse_go_limits() {
        assert_eq!(go("go depth 6").params.depth, Some(6));
        assert_eq!(go("go nodes 1000000").params.nodes, Some(1_000_000));
        assert_eq!(go("go mate 3").params.mate, Some(3));
        assert_eq!(go("go movetime 5000").params.movetime, Some(Duration::from_millis(5_000)));
        assert!(go("go infinite").params.infinite);
        let ponder = go("go ponder wtime 300000 btime 300000");
        assert!(ponder.params.ponder);
        assert_eq!(ponder.params.wtime, Some(Duration::from_millis(300_000)));
    }

    #[test]
    fn parse_go_bare_defaults() {
        assert_eq!(go("go"), GoCommand::default());
    }

    #[test]
    fn parse_go_searchmoves_stop_at_keyword() {
        let go = go("go searchmoves e2e4 d2d4 depth 5");
        assert_eq!(go.searchmoves, vec!["e2e4".to_string(), "d2d4".to_string()]);
        assert_eq!(go.params.depth, Some(5));
    }

    #[test]
    fn negative_clock_is_zero() {
        assert_eq!(go("go wtime -150 btime 1000").params.wtime, Some(Duration::ZERO));
    }

    #[test]
    fn parse_go_bad_values() {
        assert!(matches!(parse_command("go wtime"), Err(UciError::MissingValue { .. })));
        assert!(matches!(parse_command("go depth abc"), Err(UciError::InvalidValue { .. })));
        assert!(matches!(parse_command("perft"), Err(UciError::MissingValue { .. })));
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert_eq!(parse_command("foobar").unwrap(), Command::Unknown("foobar".to_string()));
        assert_eq!(parse_command("   ").unwrap(), Command::Unknown(String::new()));
    }
}
