//! BLOOMFILE - Interactive Shell
//! A small REPL for building, querying and dumping a Bloom filter.

use std::io::{self, BufRead, Write};

use bloomfile::{BloomFilter, Config, FilterState};

fn print_help() {
    println!("  Commands:");
    println!("    init <seed> <n> <p>  - Build a filter for n items at false positive rate p");
    println!("    add <item>           - Insert an item");
    println!("    check <item>         - Test membership");
    println!("    reset                - Lazy reset (bits cleared on next add)");
    println!("    clear                - Eager reset");
    println!("    free                 - Release the filter's buffers");
    println!("    save <path>          - Dump the filter to a file");
    println!("    load <path>          - Restore a filter from a file");
    println!("    info                 - Show filter parameters");
    println!("    exit                 - Quit");
    println!();
}

fn main() {
    let config = Config::default();
    config.init_logging();

    println!();
    println!("  bloomfile shell");
    println!();
    print_help();

    let mut filter = match BloomFilter::from_config(&config) {
        Ok(f) => f,
        Err(err) => {
            eprintln!("[ERROR] Failed to build filter: {}", err);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("bloom> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break, // EOF
            Ok(_) => {}
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "init" => {
                let args = (
                    parts.get(1).and_then(|s| s.parse::<u32>().ok()),
                    parts.get(2).and_then(|s| s.parse::<u32>().ok()),
                    parts.get(3).and_then(|s| s.parse::<f64>().ok()),
                );
                let (Some(seed), Some(n), Some(p)) = args else {
                    println!("  Usage: init <seed> <n> <p>");
                    continue;
                };
                match filter.init(seed, n, p) {
                    Ok(()) => println!(
                        "  OK (m={}, k={})",
                        filter.bit_count(),
                        filter.hash_func_count()
                    ),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "add" => {
                if parts.len() < 2 {
                    println!("  Usage: add <item>");
                    continue;
                }
                let item = parts[1..].join(" ");
                match filter.insert(item.as_bytes()) {
                    Ok(status) if status.is_over_capacity() => {
                        println!("  OK (over capacity: {} items)", filter.count())
                    }
                    Ok(_) => println!("  OK"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "check" => {
                if parts.len() < 2 {
                    println!("  Usage: check <item>");
                    continue;
                }
                let item = parts[1..].join(" ");
                match filter.contains(item.as_bytes()) {
                    Ok(true) => println!("  maybe present"),
                    Ok(false) => println!("  absent"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "reset" => {
                filter.reset();
                println!("  OK (lazy)");
            }
            "clear" => match filter.clear() {
                Ok(()) => println!("  OK"),
                Err(e) => println!("  ERROR: {}", e),
            },
            "free" => {
                filter.release();
                println!("  OK (released)");
            }
            "save" => {
                let Some(path) = parts.get(1) else {
                    println!("  Usage: save <path>");
                    continue;
                };
                match filter.save(path) {
                    Ok(()) => println!("  OK"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "load" => {
                let Some(path) = parts.get(1) else {
                    println!("  Usage: load <path>");
                    continue;
                };
                match filter.load_into(path) {
                    Ok(()) => println!("  OK ({} items)", filter.count()),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "info" | "stats" => {
                let state = match filter.state() {
                    FilterState::Ready => "ready",
                    FilterState::Stale => "stale (lazy reset)",
                    FilterState::Released => "released",
                };
                println!("  State:          {}", state);
                println!("  Seed:           {}", filter.seed());
                println!("  Capacity:       {}", filter.capacity());
                println!("  Target FPR:     {}", filter.false_positive_rate());
                println!("  Bits / hashes:  {} / {}", filter.bit_count(), filter.hash_func_count());
                println!("  Items:          {}", filter.count());
                println!("  Estimated FPR:  {:.6}", filter.estimated_fpr());
                println!("  Memory:         {} bytes", filter.memory_usage());
            }
            "help" => print_help(),
            "exit" | "quit" | "q" => break,
            _ => {
                println!("  Unknown command: '{}'. Type 'help' for commands.", parts[0]);
            }
        }
    }
}
