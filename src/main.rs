use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rust_cdb::{Statement, Table, TableError, close_database, open_database, prepare_statement};

/// A single-table record store with a line-oriented prompt
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Database file, created if it does not exist
    filename: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

struct InputBuffer {
    buffer: String,
}

impl InputBuffer {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Returns false once stdin is exhausted.
    fn read_input(&mut self, stdin: &mut impl BufRead) -> io::Result<bool> {
        self.buffer.clear();
        let read = stdin.read_line(&mut self.buffer)?;
        self.buffer = self.buffer.trim().to_string();
        Ok(read > 0)
    }
}

// Non-SQL statements like .exit are called “meta-commands”.
enum MetaCommands {
    Exit,
    Unrecognized,
}

impl MetaCommands {
    fn parse(input: &str) -> Option<MetaCommands> {
        match input {
            ".exit" => Some(MetaCommands::Exit),
            _ => {
                if input.starts_with(".") {
                    Some(MetaCommands::Unrecognized)
                } else {
                    None
                }
            }
        }
    }
}

fn print_prompt() -> io::Result<()> {
    print!("db > ");
    io::stdout().flush()
}

fn execute_statement(statement: Statement, table: &mut Table) -> Result<()> {
    match statement {
        Statement::Insert(row) => match table.insert(&row) {
            Ok(()) => println!("Executed."),
            Err(TableError::TableFull) => println!("Error: Table full."),
            Err(e) => return Err(e).context("Failed to insert row"),
        },
        Statement::Select => {
            for row in table.rows() {
                println!("{}", row.context("Failed to read row")?);
            }
            println!("Executed.");
        }
    }
    Ok(())
}

fn run(table: &mut Table) -> Result<()> {
    let mut input_buffer = InputBuffer::new();
    let mut stdin = io::stdin().lock();

    loop {
        print_prompt()?;
        if !input_buffer.read_input(&mut stdin)? {
            return Ok(());
        }

        match MetaCommands::parse(&input_buffer.buffer) {
            Some(MetaCommands::Exit) => return Ok(()),
            Some(MetaCommands::Unrecognized) => {
                println!("Unrecognized command '{}'", input_buffer.buffer);
                continue;
            }
            None => {}
        }

        match prepare_statement(&input_buffer.buffer) {
            Ok(statement) => execute_statement(statement, table)?,
            Err(e) => println!("{e}"),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut table = open_database(&args.filename)
        .with_context(|| format!("Unable to open file {}", args.filename.display()))?;

    // On error the table is dropped here, which still flushes it.
    run(&mut table)?;

    close_database(table).context("Failed to close database")
}
