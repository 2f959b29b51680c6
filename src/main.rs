//! biglog - Large Log File Browser
//!
//! Command-line front end over the sparse line index engine: list browsable
//! files, show line counts, print or export line ranges, and search.

use anyhow::{Context, Result};
use biglog::{FilterMode, Session};
use clap::{Arg, ArgAction, Command};
use std::io::Write;
use std::path::PathBuf;

/// Search result cap when `--limit` is not given.
const DEFAULT_SEARCH_LIMIT: usize = 500;

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("biglog")
        .version(biglog::VERSION)
        .about("Browse, search, and export very large log files")
        .long_about(
            "biglog indexes a log file with one forward scan, recording a sparse \
             checkpoint every 256 lines, then serves arbitrary line ranges and \
             substring searches without ever loading the file into memory.",
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .default_value(".")
                .global(true)
                .help("Root directory files are resolved against"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("list").about("List browsable files under the root").arg(
                Arg::new("ext")
                    .long("ext")
                    .value_name("EXT")
                    .action(ArgAction::Append)
                    .help("Additional extensions to admit (use '*' for any text file)"),
            ),
        )
        .subcommand(
            Command::new("info")
                .about("Index a file and print its line count")
                .arg(Arg::new("file").required(true).help("File to index")),
        )
        .subcommand(
            Command::new("range")
                .about("Print a range of lines")
                .arg(Arg::new("file").required(true).help("File to read"))
                .arg(
                    Arg::new("start")
                        .long("start")
                        .value_name("LINE")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("0")
                        .help("First line to print (0-based)"),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .value_name("N")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("400")
                        .help("Number of lines to print"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Stream a range of lines to a file or stdout")
                .arg(Arg::new("file").required(true).help("File to export from"))
                .arg(
                    Arg::new("start")
                        .long("start")
                        .value_name("LINE")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("0")
                        .help("First line to export (0-based)"),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .value_name("LINE")
                        .value_parser(clap::value_parser!(u64))
                        .help("One past the last line to export (default: end of file)"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_name("PATH")
                        .help("Output path ('-' for stdout; default: lines_<a>-<b>.txt)"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Find lines containing a substring (case-insensitive)")
                .arg(Arg::new("file").required(true).help("File to search"))
                .arg(Arg::new("pattern").required(true).help("Substring to look for"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .help("Stop after this many matches (default: 500)"),
                ),
        )
        .get_matches();

    let root = matches
        .get_one::<String>("root")
        .expect("root has a default");
    let session = Session::new(root).context("failed to set up session root")?;

    match matches.subcommand() {
        Some(("list", sub)) => {
            if let Some(exts) = sub.get_many::<String>("ext") {
                session.set_extensions(exts, FilterMode::Merge);
            }
            for file in session.list()? {
                println!("{}", file.display());
            }
        }
        Some(("info", sub)) => {
            let file = sub.get_one::<String>("file").expect("file is required");
            let lines = session.open(file)?;
            println!("{}: {} lines", file, lines);
        }
        Some(("range", sub)) => {
            let file = sub.get_one::<String>("file").expect("file is required");
            let start = *sub.get_one::<u64>("start").expect("start has a default");
            let count = *sub.get_one::<u64>("count").expect("count has a default");

            session.open(file)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            // Stream rather than materialize: terminators are already in the data
            session.write_range(&mut out, start, start.saturating_add(count))?;
            out.flush()?;
        }
        Some(("export", sub)) => {
            let file = sub.get_one::<String>("file").expect("file is required");
            let start = *sub.get_one::<u64>("start").expect("start has a default");

            let lines = session.open(file)?;
            let end = sub.get_one::<u64>("end").copied().unwrap_or(lines);

            match sub.get_one::<String>("out").map(String::as_str) {
                Some("-") => {
                    let stdout = std::io::stdout();
                    let mut out = stdout.lock();
                    session.write_range(&mut out, start, end)?;
                    out.flush()?;
                }
                out_path => {
                    let path = out_path.map(PathBuf::from).unwrap_or_else(|| {
                        PathBuf::from(format!("lines_{}-{}.txt", start + 1, end.min(lines)))
                    });
                    let mut out = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    session.write_range(&mut out, start, end)?;
                    out.flush()?;
                    eprintln!("wrote {}", path.display());
                }
            }
        }
        Some(("search", sub)) => {
            let file = sub.get_one::<String>("file").expect("file is required");
            let pattern = sub
                .get_one::<String>("pattern")
                .expect("pattern is required");
            let limit = sub
                .get_one::<usize>("limit")
                .copied()
                .unwrap_or(DEFAULT_SEARCH_LIMIT);

            session.open(file)?;
            for line_number in session.search(pattern, limit)? {
                println!("{}", line_number);
            }
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
