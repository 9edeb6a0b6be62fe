use std::env;
use std::fs::metadata;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use arbor::tree::Arbor;
use arbor::tree::ArborConfig;
use arbor::tree::Comparator;
use arbor::tree::Direction;
use arbor::tree::Rebalance;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use strum::{Display, EnumString};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum keys per node
    #[arg(short, long, default_value_t = 4)]
    order: usize,

    /// Removal strategy (Simplified or Merge)
    #[arg(short, long, default_value_t = Rebalance::Simplified)]
    rebalance: Rebalance,

    /// Key ordering (Lexical or Numeric)
    #[arg(short, long, default_value_t = Collation::Lexical)]
    collation: Collation,

    /// Keys to insert before processing commands
    #[arg(short, long, value_delimiter = ',')]
    seed: Vec<String>,

    #[command(subcommand)]
    parameter: Option<Parameter>,
}

/// How the shell orders its string keys.
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
enum Collation {
    /// Byte-wise string order
    Lexical,
    /// Integers first, by value, then everything else lexically
    Numeric,
}

#[derive(Clone, Copy, Debug)]
struct ShellOrder(Collation);

impl Comparator<String> for ShellOrder {
    fn less_than(&self, a: &String, b: &String) -> bool {
        match self.0 {
            Collation::Lexical => a < b,
            Collation::Numeric => numeric_key(a) < numeric_key(b),
        }
    }
}

fn numeric_key(s: &str) -> (bool, i64, &str) {
    match s.parse::<i64>() {
        Ok(n) => (false, n, s),
        Err(_) => (true, 0, s),
    }
}

#[derive(Debug, EnumString, Subcommand, PartialEq)]
#[strum(ascii_case_insensitive)]
enum Parameter {
    /// Does our tree contain this key
    Contains { key: String },
    /// Remove all keys
    Clear,
    /// Display key count
    Count,
    /// Display tree height
    Height,
    /// Interactive Help
    Help,
    /// Log tree statistics
    Info,
    /// Insert this key
    Insert { key: String },
    /// List tree keys
    Keys {
        /// Direction (Descending or Ascending)
        direction: Option<Direction>,
    },
    /// Print every node, indented by depth
    Print,
    /// Remove this key
    Remove { key: String },
    /// Leaf Utilization
    Utilization,
    /// Verify tree
    Verify,
}

/// Turn one line of interactive input into a command.
///
/// The first word names the command, any further words are its arguments.
fn parse_words(words: &[&str]) -> std::result::Result<Parameter, String> {
    let Some(first) = words.first() else {
        return Err("empty command".to_string());
    };
    // EnumString doesn't deal with variant parameters, so...
    let parameter = Parameter::from_str(first).map_err(|e| format!("error: {e}"))?;
    match parameter {
        Parameter::Contains { .. } => match words {
            [_, key] => Ok(Parameter::Contains {
                key: key.to_string(),
            }),
            _ => Err("usage: contains <key>".to_string()),
        },
        Parameter::Insert { .. } => match words {
            [_, key] => Ok(Parameter::Insert {
                key: key.to_string(),
            }),
            _ => Err("usage: insert <key>".to_string()),
        },
        Parameter::Remove { .. } => match words {
            [_, key] => Ok(Parameter::Remove {
                key: key.to_string(),
            }),
            _ => Err("usage: remove <key>".to_string()),
        },
        Parameter::Keys { .. } => match words {
            [_] => Ok(Parameter::Keys { direction: None }),
            [_, direction] => Direction::from_str(direction)
                .map(|d| Parameter::Keys { direction: Some(d) })
                .map_err(|_| "usage: keys [<direction>]".to_string()),
            _ => Err("usage: keys [<direction>]".to_string()),
        },
        p => match words.len() {
            1 => Ok(p),
            _ => Err(format!("usage: {}", first.to_lowercase())),
        },
    }
}

fn get_history_file() -> Option<PathBuf> {
    dirs::preference_dir()
        .and_then(|mut base| {
            base.push("arbor-shell");
            // Note: Not create_dir_all(), because we don't want to create preference
            // dirs if they don't exist.
            if metadata(base.clone()).ok().is_none() {
                std::fs::create_dir(base.clone()).ok()?
            }
            Some(base)
        })
        .map(|mut base| {
            base.push("history.txt");
            base
        })
}

fn interactive(tree: &mut Arbor<String, ShellOrder>) -> Result<()> {
    // `()` can be used when no completer is required
    let mut rl = DefaultEditor::new()?;
    if let Some(file_location) = get_history_file() {
        if let Err(e) = rl.load_history(&file_location) {
            println!("error loading history: {e}");
        }
    }
    println!("terminate with ctrl-c or ctrl-d");
    loop {
        let readline = rl.readline("arbor: ");
        match readline {
            Ok(line) => {
                let words = line.split_whitespace().collect::<Vec<&str>>();
                if words.is_empty() {
                    continue;
                }
                match parse_words(&words) {
                    Ok(parameter) => process_parameter(tree, &parameter),
                    Err(msg) => {
                        println!("{msg}");
                        continue;
                    }
                }
                rl.add_history_entry(line.as_str())?;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("terminating...");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
    if let Some(file_location) = get_history_file() {
        if let Err(e) = rl.save_history(&file_location) {
            println!("error saving history: {e}");
        }
    }
    Ok(())
}

fn process_parameter(tree: &mut Arbor<String, ShellOrder>, parameter: &Parameter) {
    match parameter {
        Parameter::Contains { key } => println!("{}", tree.contains(key)),
        Parameter::Clear => {
            tree.clear();
            println!("cleared");
        }
        Parameter::Count => println!("count: {}", tree.count()),
        Parameter::Height => println!("height: {}", tree.height()),
        Parameter::Help => {
            let help = Cli::command().render_help().to_string();

            let mut print_it = false;

            for line in help.lines() {
                if line.starts_with("Options:") {
                    print_it = false;
                }
                if print_it && !line.is_empty() {
                    println!("{}", line);
                }
                if line.starts_with("Commands:") {
                    print_it = true;
                }
            }
        }
        Parameter::Info => {
            tree.info();
            println!(
                "order: {}, rebalance: {}, nodes: {}",
                tree.order(),
                tree.rebalance(),
                tree.node_count()
            );
        }
        Parameter::Insert { key } => {
            let before = tree.count();
            let root = tree.insert(key.clone());
            if tree.count() > before {
                println!("inserted: {key} (root: {root})");
            } else {
                println!("present: {key}");
            }
        }
        Parameter::Keys { direction } => {
            tree.print_keys(direction.unwrap_or(Direction::Ascending));
        }
        Parameter::Print => tree.print_tree(),
        Parameter::Remove { key } => {
            if tree.contains(key) {
                let root = tree.remove(key);
                println!("removed: {key} (root: {root})");
            } else {
                println!("not found");
            }
        }
        Parameter::Utilization => {
            println!("Utilization: {:.1}%", 100.0 * tree.utilization());
        }
        Parameter::Verify => match tree.verify() {
            Ok(_) => println!("Ok"),
            Err(e) => println!("Verification failed: {e}"),
        },
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = match env::var("TMPDIR") {
        Ok(d) => d,
        Err(_e) => ".".to_string(),
    };

    let file_appender = tracing_appender::rolling::daily(log_dir, "arbor.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking)
        .init();

    let config = ArborConfig::default()
        .with_order(cli.order)
        .with_rebalance(cli.rebalance);
    let mut tree = Arbor::try_with_config(config, ShellOrder(cli.collation))?;
    for key in cli.seed {
        tree.insert(key);
    }

    match cli.parameter {
        Some(parameter) => process_parameter(&mut tree, &parameter),
        None => interactive(&mut tree)?,
    }
    Ok(())
}
