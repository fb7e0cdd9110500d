//! VM translator command-line driver.
//!
//! Reads `.vm` files (or directories containing them), translates them as one
//! program and writes a single Hack assembly file.

use std::error::Error;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use vmtrans::{parse_unit, Program, Translator, TranslatorConfig};

/// Translate Hack VM code to Hack assembly.
///
/// All input files are linked into one program: function calls may cross
/// files, and each file's name (without extension) qualifies its statics.
///
/// EXAMPLES:
///     vmtrans FibonacciElement/ -o Fib.asm     Translate a directory
///     vmtrans Main.vm Sys.vm --stats           Translate files, print statistics
#[derive(Parser, Debug)]
#[command(name = "vmtrans", version)]
struct Cli {
    /// Code to translate: .vm files and/or directories searched recursively
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Path of the assembly output
    #[arg(short, long, default_value = "out.asm")]
    output: PathBuf,

    /// Function called by the bootstrap
    #[arg(long, default_value = "Sys.init")]
    entry: String,

    /// Largest local count initialised without a loop
    #[arg(long, default_value_t = TranslatorConfig::default().inline_locals_max)]
    inline_locals: u16,

    /// Print translation statistics
    #[arg(long)]
    stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let files = gather_inputs(&cli.input)?;
    if files.is_empty() {
        return Err("no .vm files found in the given inputs".into());
    }

    let mut program = Program::default();
    for path in &files {
        let name = unit_name(path)?;
        let text = fs::read_to_string(path)?;
        log::info!("reading {} as unit {}", path.display(), name);
        program.push_unit(parse_unit(&name, &text)?);
    }

    let config = TranslatorConfig {
        entry_point: cli.entry,
        inline_locals_max: cli.inline_locals,
        ..TranslatorConfig::default()
    };
    let output = Translator::new(config).translate(&program)?;

    let mut out = BufWriter::new(fs::File::create(&cli.output)?);
    output.write_asm(&mut out)?;
    out.flush()?;
    log::info!("wrote {}", cli.output.display());

    if cli.stats {
        print!("{}", output.stats);
    }
    Ok(())
}

/// Every `.vm` file named by `inputs`, sorted within each directory.
fn gather_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut files = Vec::new();
    for path in inputs {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            gather_dir(path, &mut files)?;
        } else {
            return Err(format!("{} is neither a file nor a directory", path.display()).into());
        }
    }
    Ok(files)
}

fn gather_dir(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            gather_dir(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "vm") {
            files.push(path);
        }
    }
    Ok(())
}

fn unit_name(path: &Path) -> Result<String, Box<dyn Error>> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("cannot derive a unit name from {}", path.display()).into())
}
