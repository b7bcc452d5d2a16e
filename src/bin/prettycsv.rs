//! Pretty-print CSV data as aligned columns.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use csvline::{ReaderBuilder, Source};
use log::debug;

/// Pretty-print CSV files
#[derive(Parser, Debug)]
#[command(name = "prettycsv")]
#[command(version)]
#[command(about = "Pretty-print CSV files", long_about = None)]
struct Args {
    /// CSV input file to display, or `-` for stdin
    #[arg(value_name = "CSV_FILE", default_value = "-")]
    filename: PathBuf,

    /// Field delimiter character
    #[arg(short, long, value_name = "DELIMITER", default_value = ",", value_parser = parse_byte)]
    delimiter: u8,

    /// Quote character
    #[arg(short, long, value_name = "QUOTE", default_value = "\"", value_parser = parse_byte)]
    quote: u8,

    /// Recover from malformed quoting instead of failing
    #[arg(short, long)]
    lenient: bool,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("expected a single ASCII character, got {:?}", s)),
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    )
    .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run(args: &Args) -> csvline::Result<()> {
    let mut builder = ReaderBuilder::new();
    builder.delimiter(args.delimiter).quote(args.quote).lenient(args.lenient);
    debug!("reading {}", args.filename.display());
    let rows = if args.filename.as_os_str() == "-" {
        let stdin = io::stdin();
        let mut lock = stdin.lock();
        read_all(builder.from_reader(&mut lock))?
    } else {
        read_all(builder.from_path(&args.filename)?)?
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(render(&rows).as_bytes())?;
    out.flush()?;
    Ok(())
}

fn read_all<S: Source>(
    mut rdr: csvline::Reader<S>,
) -> csvline::Result<Vec<Vec<String>>> {
    rdr.read_all()
}

/// Lay out `rows` with every field left aligned and padded to the widest
/// field of its column, separated by ` | `.
fn render(rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = vec![];
    for row in rows {
        for (i, field) in row.iter().enumerate() {
            let width = field.chars().count();
            if i == widths.len() {
                widths.push(width);
            } else if widths[i] < width {
                widths[i] = width;
            }
        }
    }
    let mut out = String::new();
    for row in rows {
        for (i, field) in row.iter().enumerate() {
            if i != 0 {
                out.push_str(" | ");
            }
            out.push_str(field);
            for _ in field.chars().count()..widths[i] {
                out.push(' ');
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{parse_byte, render};

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|f| f.to_string()).collect())
            .collect()
    }

    #[test]
    fn aligns_columns() {
        let got = render(&rows(&[&["a", "bbb"], &["cc", "d", "e"]]));
        assert_eq!("a  | bbb\ncc | d   | e\n", got);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let got = render(&rows(&[&["é", "x"], &["ab", "y"]]));
        assert_eq!("é  | x\nab | y\n", got);
    }

    #[test]
    fn byte_arguments() {
        assert_eq!(Ok(b'|'), parse_byte("|"));
        assert!(parse_byte("||").is_err());
        assert!(parse_byte("").is_err());
        assert!(parse_byte("é").is_err());
    }
}
