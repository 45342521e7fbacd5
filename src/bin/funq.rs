use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use colored::Colorize;

use funq::compile;

#[derive(Parser)]
#[command(name = "funq")]
#[command(version)]
#[command(about = "Compiles Funq code into a set of OpenQASM files, one per region", long_about = None)]
struct Cli {
    /// Input Funq source file
    input: PathBuf,

    /// Directory the compiled regions are written to
    #[arg(short, long, value_name = "PATH", default_value = "./funq_build")]
    location: PathBuf,

    /// Save a compiled region under a specific file name (repeatable)
    #[arg(short, long, num_args = 2, value_names = ["REGION", "FILE"], action = clap::ArgAction::Append)]
    output: Vec<String>,

    /// Also print a compiled region to stdout (repeatable)
    #[arg(long, value_name = "REGION", action = clap::ArgAction::Append)]
    stdout: Vec<String>,

    /// Only write the regions named by --output
    #[arg(long)]
    no_default_save: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("{} {}", "[ERR]".red().bold(), error);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&cli.input)?;
    let files = compile(&source)?;

    let mut region_file_map = HashMap::new();
    for pair in cli.output.chunks(2) {
        if let [region, file] = pair {
            region_file_map.insert(region.clone(), file.clone());
        }
    }

    fs::create_dir_all(&cli.location)?;
    for (region, text) in &files {
        if cli.stdout.contains(region) {
            print!("{}", text);
        }
        let file_name = match region_file_map.get(region) {
            Some(file) => file.clone(),
            None if cli.no_default_save => continue,
            None => format!("{}.qasm", region),
        };
        fs::write(cli.location.join(file_name), text)?;
    }
    Ok(())
}
