//! tonec: compile a tone program from a file or stdin.

use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tonec::config::Config;
use tonec::dsl::{Compilation, Compiler};

/// Compile tone DSL programs into tone strings
#[derive(Parser, Debug)]
#[command(name = "tonec", version)]
#[command(about = "Compile tone DSL programs into tone strings", long_about = None)]
struct Args {
    /// Source file; reads stdin when omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Print the derivation tree
    #[arg(long)]
    tree: bool,

    /// Print the token stream and stop
    #[arg(long)]
    tokens: bool,

    /// Print FIRST/FOLLOW/PREDICT for the grammar and stop
    #[arg(long)]
    grammar: bool,

    /// Config file (default ~/.tonec/config.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let compiler = Compiler::new();
    if args.grammar {
        print!("{}", compiler.table());
        return;
    }

    let source = match read_source(args.file.as_ref()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("failed to read source: {e}");
            std::process::exit(1);
        }
    };

    if args.tokens {
        let (tokens, errors) = Compiler::tokenize(&source);
        for token in tokens.iter().filter(|t| !t.category.is_trivia()) {
            println!("{:>4}  {token}", token.line);
        }
        for error in &errors {
            eprintln!("{error}");
        }
        if !errors.is_empty() {
            std::process::exit(1);
        }
        return;
    }

    let mut result = compiler.compile(&source);
    if args.tree || config.show_tree {
        match &result.tree {
            Some(tree) => print!("{tree}"),
            None => eprintln!("no derivation tree"),
        }
    }

    let too_long = config.enforce(&mut result);

    if args.json || config.json {
        print_json(&result);
    } else if let Some(output) = result.final_result.as_deref() {
        println!("{output}");
    }

    for error in &result.errors {
        eprintln!("{error}");
    }
    if too_long {
        if let Some(max) = config.max_output_len {
            eprintln!("output exceeds max_output_len ({max} characters)");
        }
    }

    if !result.is_success() || too_long {
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, io::Error> {
    match path {
        Some(path) if !path.exists() => Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )),
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn read_source(path: Option<&PathBuf>) -> Result<String, io::Error> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn print_json(result: &Compilation) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to render JSON: {e}");
            std::process::exit(1);
        }
    }
}
