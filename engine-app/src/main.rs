use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

use chess::Color::{self, Black, White};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use minimax_chess::{
    AsyncEngine, Difficulty, DrawReason, Logger, MoveSelector, Position, Progress, Status,
};

const INSTRUCTIONS: &str = "\
    Please enter your move in long algebraic notation:\n    \
      <from><to>[promotion], e.g. \"e2e4\", or \"e7e8q\" to promote to a queen.\n  \
      Other commands:\n    \
        - \"undo\" takes back your last move and the engine's reply.\n    \
        - \"quit\" ends the game.\n\
";

/// Arguments to the engine
#[derive(Parser, Debug)]
#[command(
    name = "Minimax Chess - Engine",
    about = "Play a game against the minimax engine in the terminal."
)]
struct Cli {
    /// The color the engine should play as
    #[arg(short, long, default_value = "black")]
    engine_color: ArgColor,
    /// Engine strength, from 1 (searches 2 plies) to 4 (searches 5 plies)
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u8).range(1..=4))]
    difficulty: u8,
    /// Start from this position instead of the usual one
    #[arg(short, long)]
    fen: Option<String>,
    /// 10 is everything and 0 is nothing
    #[arg(short, long, default_value = "2")]
    log_level: u8,
    /// Whether to prevent the game board, human-readable moves, and prompts
    /// from being printed
    #[arg(short, long)]
    quiet: bool,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum ArgColor {
    White,
    Black,
}

impl ArgColor {
    fn to_color(&self) -> Color {
        match self {
            ArgColor::White => White,
            ArgColor::Black => Black,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let logger = Logger::new(cli.log_level);
    let filter = logger.max_facade_level().to_string();
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    let difficulty = match Difficulty::try_from(cli.difficulty) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    let mut position = match cli.fen.as_deref().map(Position::from_fen) {
        None => Position::initial(),
        Some(Ok(position)) => position,
        Some(Err(e)) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let engine = AsyncEngine::new(MoveSelector::standard(logger.clone()), logger);
    let mut input = std::io::stdin().lock().lines();

    while position.status().is_in_progress() {
        if position.side_to_move() == cli.engine_color.to_color() {
            if let Err(e) = engine.request(&position, difficulty) {
                eprintln!("Engine unavailable: {}", e);
                return;
            }
            let decision = loop {
                match engine.progress() {
                    Progress::Done(decision) => break decision,
                    Progress::Thinking => {}
                    Progress::Idle => {
                        eprintln!("The engine stopped without a move.");
                        return;
                    }
                }
                if !cli.quiet {
                    print!(".");
                    flush();
                }
                thread::sleep(Duration::from_millis(100));
            };
            let Some(mv) = decision.chosen else {
                break;
            };
            if !cli.quiet {
                println!();
                println!(
                    "Engine played: {} [{}, {} ms, {} nodes]",
                    mv,
                    decision.source,
                    decision.millis,
                    decision.branch_info.as_ref().map_or(0, |info| info.total_nodes()),
                );
            } else {
                println!("{}", mv);
            }
            if let Err(e) = position.push(mv) {
                eprintln!("Engine move rejected: {}", e);
                return;
            }
        } else {
            if !cli.quiet {
                println!("{}", position);
                print!("Enter your move: ");
                flush();
            }
            let Some(Ok(line)) = input.next() else {
                return;
            };
            match line.trim() {
                "quit" => return,
                "undo" => {
                    engine.invalidate();
                    if position.pop().is_err() {
                        println!("Nothing to undo.");
                    } else if position.side_to_move() == cli.engine_color.to_color() {
                        // that was the engine's reply, so take back ours as well
                        position.pop().ok();
                    }
                }
                text => {
                    let played = Position::parse_move(text).and_then(|mv| position.push(mv));
                    if let Err(e) = played {
                        println!("{}", e);
                        println!("{}", INSTRUCTIONS);
                    }
                }
            }
        }
    }

    if !cli.quiet {
        println!("{}", position);
    }
    match position.status() {
        Status::Win(White) => println!("white wins"),
        Status::Win(Black) => println!("black wins"),
        Status::Draw(reason) => println!("draw by {}", describe(reason)),
        Status::InProgress => println!("game abandoned"),
    }
}

fn describe(reason: DrawReason) -> &'static str {
    match reason {
        DrawReason::Stalemate => "stalemate",
        DrawReason::InsufficientMaterial => "insufficient material",
        DrawReason::SeventyFiveMoves => "the seventy-five-move rule",
        DrawReason::FivefoldRepetition => "fivefold repetition",
    }
}

fn flush() { std::io::stdout().flush().unwrap_or(()); }
