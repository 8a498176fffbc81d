//! Negamax bot - a UCI engine around `chess_engine::Searcher`.
//!
//! Reads commands from stdin and answers on stdout. Diagnostics go to stderr
//! through `tracing`, filtered by `RUST_LOG` (default `warn`). Engine limits
//! come from `negamax.toml` in the working directory when it exists.

mod uci;

use std::io::{BufReader, Stdin, Stdout};
use std::path::Path;

use chess_engine::{evaluate, find_move, EngineConfig, Position, SearchLimits, Searcher};
use tracing_subscriber::EnvFilter;
use uci::{info_line, GoOptions, GuiCommand, UciEngine, UciError};

const CONFIG_PATH: &str = "negamax.toml";

type StdioEngine = UciEngine<BufReader<Stdin>, Stdout>;

fn load_config() -> EngineConfig {
    let path = Path::new(CONFIG_PATH);
    if !path.exists() {
        tracing::info!("no {} found, using defaults", CONFIG_PATH);
        return EngineConfig::default();
    }
    match EngineConfig::load(path) {
        Ok(config) => {
            tracing::info!(?config, "loaded {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            tracing::warn!("ignoring {}: {}", CONFIG_PATH, e);
            EngineConfig::default()
        }
    }
}

/// Builds the position for a `position` command.
///
/// History is reset after every applied move so a long game never eats into
/// the search's history capacity.
fn set_position(fen: Option<&str>, moves: &[String]) -> Result<Position, UciError> {
    let mut position = match fen {
        Some(fen) => Position::from_fen(fen).map_err(|e| UciError::Parse(e.to_string()))?,
        None => Position::startpos(),
    };
    for text in moves {
        let m = find_move(&mut position, text)
            .ok_or_else(|| UciError::Parse(format!("illegal move '{text}'")))?;
        position.make_move(m);
        position.reset_history();
    }
    Ok(position)
}

fn go(searcher: &mut Searcher, opts: &GoOptions, engine: &mut StdioEngine) -> Result<(), UciError> {
    let limits = SearchLimits {
        depth: opts.depth,
        movetime: opts.time_budget(searcher.position().side_to_move()),
        nodes: opts.nodes,
    };
    tracing::debug!(?limits, fen = %searcher.position().to_fen(), "go");

    let mut write_error = None;
    let result = searcher.search(limits, |info| {
        if write_error.is_none() {
            write_error = engine.send(&info_line(info)).err();
        }
    });
    if let Some(e) = write_error {
        return Err(e);
    }

    match result.best_move {
        Some(m) => engine.send(&format!("bestmove {}", m.to_uci())),
        None => engine.send("bestmove 0000"),
    }
}

fn run(engine: &mut StdioEngine) -> Result<(), UciError> {
    let mut searcher = Searcher::new(load_config());

    while let Some(command) = engine.read_command().transpose() {
        let command = match command {
            Ok(command) => command,
            Err(UciError::Parse(message)) => {
                tracing::warn!("{}", message);
                continue;
            }
            Err(e) => return Err(e),
        };

        match command {
            GuiCommand::Uci => {
                engine.send(concat!("id name negamax ", env!("CARGO_PKG_VERSION")))?;
                engine.send(concat!("id author ", env!("CARGO_PKG_AUTHORS")))?;
                engine.send("uciok")?;
            }
            GuiCommand::IsReady => engine.send("readyok")?,
            GuiCommand::UciNewGame => {
                searcher.new_game();
                searcher.load(Position::startpos());
            }
            GuiCommand::Position { fen, moves } => match set_position(fen.as_deref(), &moves) {
                Ok(position) => searcher.load(position),
                Err(e) => tracing::warn!("rejected position: {}", e),
            },
            GuiCommand::Go(opts) => go(&mut searcher, &opts, engine)?,
            // Searches run to their budget on this thread; nothing to interrupt.
            GuiCommand::Stop => {}
            GuiCommand::Quit => break,
            GuiCommand::Display => engine.send(&searcher.position().to_string())?,
            GuiCommand::Eval => {
                let score = evaluate(searcher.position());
                engine.send(&format!("info string eval {score}"))?;
            }
            GuiCommand::Unknown(input) => {
                if !input.is_empty() {
                    tracing::debug!("ignoring unknown command: {}", input);
                }
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Build the slider tables before the first timed search.
    chess_engine::movegen::init_attack_tables();

    let mut engine = UciEngine::new(BufReader::new(std::io::stdin()), std::io::stdout());
    if let Err(e) = run(&mut engine) {
        tracing::error!("engine loop failed: {}", e);
        std::process::exit(1);
    }
}
