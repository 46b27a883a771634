/// framec CLI - lowers source documents into command script bundles.

use bumpalo::Bump;
use clap::Parser as ClapParser;
use framec::bundle::{self, Manifest, UnitEntry};
use framec::Transpiler;
use framec_language::loader::{fallback_name, load_unit};
use std::fs;
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "framec")]
#[command(about = "Lower typed source documents into frame-tagged command scripts")]
struct Cli {
    /// Source documents (JSON syntax trees), compiled in order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory; scripts land in <out-dir>/<context>/
    #[arg(short, long, default_value = "out")]
    out_dir: PathBuf,

    /// File extension of written scripts
    #[arg(long, default_value = "cmd")]
    extension: String,

    /// Also write manifest.json into the output directory
    #[arg(long)]
    manifest: bool,

    /// Exit with an error if any warning was reported
    #[arg(long)]
    deny_warnings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();

    // One session for all inputs keeps register names unique across units.
    let mut transpiler = Transpiler::new();
    let mut units = Vec::new();
    let mut failed = 0;
    let mut warned = 0;

    for input in &cli.inputs {
        let source = fs::read_to_string(input)
            .map_err(|e| format!("reading {}: {}", input.display(), e))?;

        let arena = Bump::new();
        let unit = load_unit(&arena, &source, &fallback_name(input))
            .map_err(|e| format!("loading {}: {}", input.display(), e))?;

        let compilation = match transpiler.compile(&unit) {
            Ok(compilation) => compilation,
            Err(e) => {
                eprintln!("Compilation error: {}", e);
                failed += 1;
                continue;
            }
        };

        for warning in &compilation.warnings {
            eprintln!("{}", warning);
        }
        warned += compilation.warnings.len();

        let written = bundle::write_scripts(&cli.out_dir, &compilation, &cli.extension)
            .map_err(|e| format!("writing scripts for {}: {}", input.display(), e))?;
        println!(
            "Compiled {} -> {} ({} scripts)",
            input.display(),
            cli.out_dir.join(&compilation.context).display(),
            written.len()
        );
        units.push(UnitEntry::new(input, &compilation));
    }

    if cli.manifest {
        fs::create_dir_all(&cli.out_dir)
            .map_err(|e| format!("creating {}: {}", cli.out_dir.display(), e))?;
        let path = cli.out_dir.join(bundle::MANIFEST_FILE);
        let mut file = fs::File::create(&path)
            .map_err(|e| format!("creating {}: {}", path.display(), e))?;
        bundle::write_manifest(&mut file, &Manifest::new(units))
            .map_err(|e| format!("writing {}: {}", path.display(), e))?;
    }

    if failed > 0 {
        return Err(format!("{} of {} unit(s) failed to compile", failed, cli.inputs.len()));
    }
    if cli.deny_warnings && warned > 0 {
        return Err(format!("{} warning(s) reported and --deny-warnings is set", warned));
    }
    Ok(())
}
