//! LITEKV - Interactive Shell
//! Line-oriented console over a LiteKv store.
//!
//! Usage: `litekv [database-path]` (defaults to `./data/litekv.sqlite`).

use std::io::{self, BufRead, Write};
use std::path::Path;

use litekv::{Config, JournalMode, LiteKv, Value};

/// Split the value tokens from a trailing `once` flag. The flag is only
/// taken when at least one value token remains, so `set k once` stores the
/// string `once`.
fn split_once_flag<'a>(tokens: &'a [&'a str]) -> (&'a [&'a str], bool) {
    match tokens.split_last() {
        Some((last, rest)) if !rest.is_empty() && last.eq_ignore_ascii_case("once") => {
            (rest, true)
        }
        _ => (tokens, false),
    }
}

/// Parse shell input as JSON, falling back to a plain string.
fn parse_value(text: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|json| Value::try_from(json).ok())
        .unwrap_or_else(|| Value::from(text))
}

fn show(value: Value) -> String {
    serde_json::Value::from(value).to_string()
}

fn print_help() {
    println!("  Commands:");
    println!("    set <key> <json> [once]         - Store (merge) a value");
    println!("    setex <key> <secs> <json> [once] - Store a value with a TTL");
    println!("    get <key>                       - Retrieve a value");
    println!("    del <key>                       - Delete a key");
    println!("    exists <key>                    - Check for a live key");
    println!("    keys [pattern]                  - List keys (% and _ wildcards)");
    println!("    ttl <key>                       - Remaining lifetime in ms");
    println!("    incr <key> [amount]             - Add to a numeric value");
    println!("    size | clear                    - Count / remove all entries");
    println!("    begin | commit | rollback       - Transaction control");
    println!("    mode [journal-mode]             - Show or set the journal mode");
    println!("    info | stats                    - Store info / metrics");
    println!("    export [path]                   - Write all entries as JSON");
    println!("    exit                            - Close the store");
}

fn report<T>(result: litekv::Result<T>, ok: impl FnOnce(T)) {
    match result {
        Ok(value) => ok(value),
        Err(e) => println!("  ERROR: {}", e),
    }
}

fn main() {
    env_logger::init();

    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║              LITEKV Store                 ║");
    println!("  ║     Key-Value Store on SQLite v1.0.0      ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    print_help();
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::new(path),
        None => Config::default(),
    };
    let mut store = match LiteKv::open(config) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("[ERROR] Failed to open store: {}", err);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("litekv> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "set" | "put" => {
                if parts.len() < 3 {
                    println!("  Usage: set <key> <json> [once]");
                    continue;
                }
                let (tokens, once) = split_once_flag(&parts[2..]);
                let value = parse_value(&tokens.join(" "));
                report(store.set(parts[1], value, once), |_| println!("  OK"));
            }
            "setex" => {
                if parts.len() < 4 {
                    println!("  Usage: setex <key> <secs> <json> [once]");
                    continue;
                }
                let Ok(secs) = parts[2].parse::<i64>() else {
                    println!("  TTL must be an integer number of seconds");
                    continue;
                };
                let (tokens, once) = split_once_flag(&parts[3..]);
                let value = parse_value(&tokens.join(" "));
                report(store.setex(parts[1], secs, value, once), |_| println!("  OK"));
            }
            "get" => {
                if parts.len() < 2 {
                    println!("  Usage: get <key>");
                    continue;
                }
                report(store.get(parts[1]), |value| match value {
                    Some(value) => println!("  {}", show(value)),
                    None => println!("  (nil)"),
                });
            }
            "del" | "delete" => {
                if parts.len() < 2 {
                    println!("  Usage: del <key>");
                    continue;
                }
                report(store.delete(parts[1]), |removed| {
                    println!("  {}", if removed { "OK (deleted)" } else { "(not found)" })
                });
            }
            "exists" => {
                if parts.len() < 2 {
                    println!("  Usage: exists <key>");
                    continue;
                }
                report(store.exists(parts[1]), |found| println!("  {}", found));
            }
            "keys" | "scan" => {
                report(store.keys(parts.get(1).copied()), |keys| {
                    if keys.is_empty() {
                        println!("  (empty)");
                    } else {
                        for key in &keys {
                            println!("  {}", key);
                        }
                        println!("  ({} keys)", keys.len());
                    }
                });
            }
            "ttl" => {
                if parts.len() < 2 {
                    println!("  Usage: ttl <key>");
                    continue;
                }
                report(store.ttl(parts[1]), |ttl| match ttl {
                    Some(ms) => println!("  {} ms", ms),
                    None => println!("  (no ttl)"),
                });
            }
            "incr" => {
                if parts.len() < 2 {
                    println!("  Usage: incr <key> [amount]");
                    continue;
                }
                let Ok(amount) = parts.get(2).map_or(Ok(1), |a| a.parse::<i64>()) else {
                    println!("  Amount must be an integer");
                    continue;
                };
                report(store.increment(parts[1], amount), |value| match value {
                    Some(value) => println!("  {}", show(value)),
                    None => println!("  (not a number)"),
                });
            }
            "size" => report(store.size(), |n| println!("  {} entries", n)),
            "clear" => report(store.clear(), |_| println!("  OK (cleared)")),
            "begin" => report(store.begin_transaction(), |()| println!("  OK")),
            "commit" => report(store.commit_transaction(), |()| println!("  OK")),
            "rollback" => report(store.rollback_transaction(), |()| println!("  OK")),
            "mode" => match parts.get(1) {
                Some(mode) => match mode.parse::<JournalMode>() {
                    Ok(mode) => report(store.set_journal_mode(mode), |applied| {
                        println!("  journal mode: {}", applied)
                    }),
                    Err(e) => println!("  ERROR: {}", e),
                },
                None => report(store.journal_mode(), |mode| println!("  journal mode: {}", mode)),
            },
            "info" => report(store.info(), |info| {
                let path = info
                    .path
                    .as_deref()
                    .map_or(":memory:".into(), |p| p.display().to_string());
                println!("  Path:         {}", path);
                println!("  Table:        {}", info.table_name);
                println!("  Journal mode: {}", info.journal_mode);
                println!("  Entries:      {}", info.key_count);
                println!("  File size:    {} bytes", info.size_bytes);
            }),
            "stats" => println!("{}", store.metrics().report()),
            "export" => {
                if store.convert_to_json(parts.get(1).map(Path::new)) {
                    println!("  OK (exported)");
                } else {
                    println!("  ERROR: export failed (see log)");
                }
            }
            "help" => print_help(),
            "exit" | "quit" | "q" => {
                println!("  Shutting down LITEKV...");
                break;
            }
            _ => {
                println!("  Unknown command: '{}'. Type 'help' for commands.", parts[0]);
            }
        }
    }

    if let Err(e) = store.close() {
        eprintln!("[ERROR] Failed to close store: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_once_is_a_flag() {
        assert_eq!(split_once_flag(&["42", "once"]), (&["42"][..], true));
        assert_eq!(split_once_flag(&["a", "b", "ONCE"]), (&["a", "b"][..], true));
    }

    #[test]
    fn test_lone_once_is_the_value() {
        assert_eq!(split_once_flag(&["once"]), (&["once"][..], false));
        assert_eq!(split_once_flag(&["42"]), (&["42"][..], false));
    }

    #[test]
    fn test_parse_value_falls_back_to_string() {
        assert_eq!(parse_value("[1, 2]"), Value::Array(vec![1.into(), 2.into()]));
        assert_eq!(parse_value("hello world"), Value::from("hello world"));
        assert_eq!(parse_value("null"), Value::from("null"));
    }
}
