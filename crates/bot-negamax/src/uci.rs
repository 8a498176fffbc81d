//! UCI command parsing and engine output.

use std::io::{BufRead, Write};
use std::str::FromStr;
use std::time::Duration;

use chess_core::Color;
use chess_engine::{Score, SearchInfo};
use thiserror::Error;

/// Clock reserve kept back when budgeting from `wtime`/`btime`.
const CLOCK_RESERVE_MS: u64 = 100;
/// Fraction of the clock spent on one move.
const CLOCK_DIVISOR: u64 = 50;
/// Smallest budget handed to the searcher.
const MIN_BUDGET_MS: u64 = 100;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    Uci,
    IsReady,
    UciNewGame,
    /// `fen` is `None` for `startpos`.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(GoOptions),
    Stop,
    Quit,
    /// Print the board (`d`).
    Display,
    /// Print the static evaluation.
    Eval,
    Unknown(String),
}

/// Options for the `go` command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoOptions {
    pub depth: Option<u32>,
    pub movetime: Option<u64>,
    pub nodes: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub infinite: bool,
}

impl GoOptions {
    /// Wall-clock budget for `side`.
    ///
    /// `movetime` wins; otherwise the clock plus increment is split as
    /// `min(clock - 100, clock / 50)`, never below 100 ms. `None` means the
    /// search is bounded by depth or nodes only.
    pub fn time_budget(&self, side: Color) -> Option<Duration> {
        if let Some(movetime) = self.movetime {
            return Some(Duration::from_millis(movetime));
        }
        if self.infinite {
            return None;
        }
        let (time, inc) = match side {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        let ours = time? + inc.unwrap_or(0);
        let budget = ours
            .saturating_sub(CLOCK_RESERVE_MS)
            .min(ours / CLOCK_DIVISOR)
            .max(MIN_BUDGET_MS);
        Some(Duration::from_millis(budget))
    }
}

impl GuiCommand {
    pub fn parse(input: &str) -> Result<Self, UciError> {
        let input = input.trim();
        let mut parts = input.split_whitespace();

        match parts.next().unwrap_or("") {
            "uci" => Ok(GuiCommand::Uci),
            "isready" => Ok(GuiCommand::IsReady),
            "ucinewgame" => Ok(GuiCommand::UciNewGame),
            "stop" => Ok(GuiCommand::Stop),
            "quit" => Ok(GuiCommand::Quit),
            "d" => Ok(GuiCommand::Display),
            "eval" => Ok(GuiCommand::Eval),
            "position" => Self::parse_position(parts),
            "go" => Self::parse_go(parts),
            _ => Ok(GuiCommand::Unknown(input.to_string())),
        }
    }

    fn parse_position<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let fen = match parts.next() {
            Some("startpos") => {
                match parts.next() {
                    None | Some("moves") => {}
                    Some(other) => {
                        return Err(UciError::Parse(format!("expected 'moves', got '{other}'")));
                    }
                }
                None
            }
            Some("fen") => {
                let fields: Vec<&str> = parts.by_ref().take_while(|&part| part != "moves").collect();
                if fields.is_empty() {
                    return Err(UciError::Parse("missing FEN after 'fen'".to_string()));
                }
                Some(fields.join(" "))
            }
            Some(other) => {
                return Err(UciError::Parse(format!("expected 'startpos' or 'fen', got '{other}'")));
            }
            None => return Err(UciError::Parse("expected 'startpos' or 'fen'".to_string())),
        };

        let moves = parts.map(str::to_string).collect();
        Ok(GuiCommand::Position { fen, moves })
    }

    fn parse_go<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let mut opts = GoOptions::default();

        while let Some(token) = parts.next() {
            match token {
                "depth" => opts.depth = Some(value(token, parts.next())?),
                "movetime" => opts.movetime = Some(value(token, parts.next())?),
                "nodes" => opts.nodes = Some(value(token, parts.next())?),
                "wtime" => opts.wtime = Some(value(token, parts.next())?),
                "btime" => opts.btime = Some(value(token, parts.next())?),
                "winc" => opts.winc = Some(value(token, parts.next())?),
                "binc" => opts.binc = Some(value(token, parts.next())?),
                "infinite" => opts.infinite = true,
                // movestogo, ponder and friends are accepted and ignored.
                _ => {}
            }
        }

        Ok(GuiCommand::Go(opts))
    }
}

fn value<T: FromStr>(key: &str, raw: Option<&str>) -> Result<T, UciError> {
    let raw = raw.ok_or_else(|| UciError::Parse(format!("missing value for '{key}'")))?;
    raw.parse()
        .map_err(|_| UciError::Parse(format!("invalid value '{raw}' for '{key}'")))
}

/// Formats one completed iteration as an `info` line.
pub fn info_line(info: &SearchInfo) -> String {
    let score = match info.score {
        Score::Cp(cp) => format!("cp {cp}"),
        Score::Mate(moves) => format!("mate {moves}"),
    };
    let mut line = format!(
        "info depth {} score {} nodes {} nps {} time {} hashfull {}",
        info.depth, score, info.nodes, info.nps, info.elapsed_ms, info.hashfull
    );
    if !info.pv.is_empty() {
        line.push_str(" pv");
        for m in &info.pv {
            line.push(' ');
            line.push_str(&m.to_uci());
        }
    }
    line
}

/// Line-oriented protocol channel.
pub struct UciEngine<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> UciEngine<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Next command, or `None` once input is closed.
    pub fn read_command(&mut self) -> Result<Option<GuiCommand>, UciError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        GuiCommand::parse(&line).map(Some)
    }

    pub fn send(&mut self, line: &str) -> Result<(), UciError> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::{find_move, Position};

    fn go(input: &str) -> GoOptions {
        match GuiCommand::parse(input).unwrap() {
            GuiCommand::Go(opts) => opts,
            other => panic!("expected go, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(GuiCommand::parse("uci").unwrap(), GuiCommand::Uci);
        assert_eq!(GuiCommand::parse("isready\n").unwrap(), GuiCommand::IsReady);
        assert_eq!(GuiCommand::parse("ucinewgame").unwrap(), GuiCommand::UciNewGame);
        assert_eq!(GuiCommand::parse("  d ").unwrap(), GuiCommand::Display);
        assert_eq!(GuiCommand::parse("eval").unwrap(), GuiCommand::Eval);
        assert_eq!(
            GuiCommand::parse("setoption name Hash value 8").unwrap(),
            GuiCommand::Unknown("setoption name Hash value 8".to_string())
        );
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        assert_eq!(
            GuiCommand::parse("position startpos moves e2e4 e7e5").unwrap(),
            GuiCommand::Position {
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            }
        );
    }

    #[test]
    fn parse_position_fen() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        assert_eq!(
            GuiCommand::parse(&format!("position fen {fen} moves c7c5")).unwrap(),
            GuiCommand::Position {
                fen: Some(fen.to_string()),
                moves: vec!["c7c5".to_string()],
            }
        );
        assert_eq!(
            GuiCommand::parse(&format!("position fen {fen}")).unwrap(),
            GuiCommand::Position {
                fen: Some(fen.to_string()),
                moves: vec![],
            }
        );
    }

    #[test]
    fn parse_position_errors() {
        assert!(matches!(GuiCommand::parse("position"), Err(UciError::Parse(_))));
        assert!(matches!(GuiCommand::parse("position banana"), Err(UciError::Parse(_))));
        assert!(matches!(GuiCommand::parse("position fen moves e2e4"), Err(UciError::Parse(_))));
    }

    #[test]
    fn parse_go_options() {
        let opts = go("go wtime 60000 btime 55000 winc 1000 binc 500 movestogo 20 depth 8");
        assert_eq!(opts.wtime, Some(60_000));
        assert_eq!(opts.btime, Some(55_000));
        assert_eq!(opts.winc, Some(1_000));
        assert_eq!(opts.binc, Some(500));
        assert_eq!(opts.depth, Some(8));
        assert_eq!(go("go nodes 5000").nodes, Some(5_000));
        assert!(go("go infinite").infinite);
        assert!(matches!(GuiCommand::parse("go depth x"), Err(UciError::Parse(_))));
        assert!(matches!(GuiCommand::parse("go movetime"), Err(UciError::Parse(_))));
    }

    #[test]
    fn movetime_overrides_clock() {
        let opts = go("go movetime 250 wtime 100000");
        assert_eq!(opts.time_budget(Color::White), Some(Duration::from_millis(250)));
    }

    #[test]
    fn clock_budget() {
        let opts = go("go wtime 60000 btime 3000 winc 1000 binc 0");
        // (60000 + 1000) / 50
        assert_eq!(opts.time_budget(Color::White), Some(Duration::from_millis(1_220)));
        // 3000 / 50 = 60, floored
        assert_eq!(opts.time_budget(Color::Black), Some(Duration::from_millis(100)));
        assert_eq!(go("go depth 5").time_budget(Color::White), None);
        assert_eq!(go("go infinite").time_budget(Color::Black), None);
    }

    #[test]
    fn info_line_format() {
        let mut position = Position::startpos();
        let e4 = find_move(&mut position, "e2e4").unwrap();
        position.make_move(e4);
        let e5 = find_move(&mut position, "e7e5").unwrap();
        let info = SearchInfo {
            depth: 2,
            score: Score::Cp(35),
            nodes: 120,
            nps: 60_000,
            elapsed_ms: 2,
            hashfull: 0,
            pv: vec![e4, e5],
        };
        assert_eq!(
            info_line(&info),
            "info depth 2 score cp 35 nodes 120 nps 60000 time 2 hashfull 0 pv e2e4 e7e5"
        );

        let mate = SearchInfo {
            score: Score::Mate(-3),
            pv: vec![],
            ..info
        };
        assert!(info_line(&mate).contains("score mate -3"));
        assert!(!info_line(&mate).contains(" pv"));
    }

    #[test]
    fn engine_reads_until_eof() {
        let input = b"uci\nisready\n".as_slice();
        let mut output = Vec::new();
        let mut engine = UciEngine::new(input, &mut output);
        assert_eq!(engine.read_command().unwrap(), Some(GuiCommand::Uci));
        assert_eq!(engine.read_command().unwrap(), Some(GuiCommand::IsReady));
        assert_eq!(engine.read_command().unwrap(), None);
        engine.send("readyok").unwrap();
        assert_eq!(output, b"readyok\n");
    }
}
