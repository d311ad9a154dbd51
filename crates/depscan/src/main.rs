//! Dependency directive scanner CLI
//!
//! Usage: depscan [OPTIONS] <input>

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser as ClapParser;
use dep_scan::{DiagnosticReporter, ScanOptions, minimize, scan};

#[derive(ClapParser, Debug)]
#[command(name = "depscan")]
#[command(version = "0.1.0")]
#[command(
    about = "Extract dependency directives from C, C++ and Objective-C sources",
    long_about = None
)]
struct Args {
    /// Input source file, or "-" for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Recognize u/u8/U string literal prefixes
    #[arg(long)]
    unicode_prefixes: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dump retained tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump the directive list (for debugging)
    #[arg(long)]
    dump_directives: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut source = Vec::new();
        std::io::stdin()
            .read_to_end(&mut source)
            .context("failed to read stdin")?;
        return Ok(source);
    }
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run(args: &Args) -> anyhow::Result<()> {
    let source = read_input(&args.input)?;
    let filename = args.input.display().to_string();

    let options = ScanOptions {
        unicode_literal_prefixes: args.unicode_prefixes,
    };

    let output = match scan(&source, &options) {
        Ok(output) => output,
        Err(error) => {
            // Pretty source-located diagnostic before the final error line.
            let mut reporter = DiagnosticReporter::new();
            let file_id =
                reporter.add_file(filename, String::from_utf8_lossy(&source).into_owned());
            reporter.report_error(file_id, &error);
            return Err(error.into());
        }
    };

    if args.dump_tokens {
        eprintln!("=== Tokens ===");
        for token in &output.tokens {
            let mut flags = String::new();
            if token.start_of_line {
                flags.push_str(" [line-start]");
            }
            if token.leading_space {
                flags.push_str(" [space]");
            }
            if token.spliced {
                flags.push_str(" [spliced]");
            }
            eprintln!(
                "{}..{}\t{}{}",
                token.span.start, token.span.end, token.kind, flags
            );
        }
        eprintln!("=== End Tokens ===\n");
    }

    if args.dump_directives {
        eprintln!("=== Directives ===");
        for directive in &output.directives {
            eprintln!(
                "{} [{}..{}]",
                directive.kind, directive.token_range.start, directive.token_range.end
            );
        }
        eprintln!("=== End Directives ===\n");
    }

    let minimized = minimize(&source, &output);

    match &args.output {
        Some(path) => fs::write(path, &minimized)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => std::io::stdout()
            .write_all(&minimized)
            .context("failed to write stdout")?,
    }

    if args.verbose {
        eprintln!(
            "Scanned {} bytes ({}) -> {} directives, {} bytes minimized",
            source.len(),
            args.input.display(),
            output.directives.len(),
            minimized.len()
        );
    }

    Ok(())
}
