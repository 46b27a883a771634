use clap::Parser;
use std::fs;
use std::path::PathBuf;
use bumpalo::Bump;
use framec_language::loader::{fallback_name, load_unit};

/// Load a source document and print the normalized AST as JSON.
#[derive(Parser, Debug)]
#[command(name = "framec-dump", author, version, about, long_about = None)]
struct Args {
    /// Source document (JSON) produced by a front-end
    #[arg(short, long)]
    input: PathBuf,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let content = match fs::read_to_string(&args.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", args.input.display(), e);
            std::process::exit(1);
        }
    };

    let arena = Bump::new();
    let unit = match load_unit(&arena, &content, &fallback_name(&args.input)) {
        Ok(unit) => unit,
        Err(e) => {
            eprintln!("Error loading {}: {}", args.input.display(), e);
            std::process::exit(1);
        }
    };

    let printed = if args.compact {
        serde_json::to_string(&unit)
    } else {
        serde_json::to_string_pretty(&unit)
    };
    match printed {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error printing AST: {}", e);
            std::process::exit(1);
        }
    }
}
