use std::path::PathBuf;

use clap::Parser;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use kvquery::{load_sample, Catalog, EngineConfig, MemoryStore, ResultSet, Session};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// kvquery CLI
#[derive(Parser, Debug)]
#[command(name = "kvq")]
#[command(about = "Run SELECT queries against the sample lineitem/orders store", long_about = None)]
struct Args {
    /// Run one query and exit
    #[arg(short = 'q', long)]
    query: Option<String>,

    /// Print the parsed query and its per-table scans instead of running it
    #[arg(long, requires = "query")]
    explain: bool,

    /// Truncate every storage scan after this many rows
    #[arg(long)]
    scan_span: Option<usize>,

    /// Rows in the sample lineitem table
    #[arg(long)]
    lineitems: Option<u64>,

    /// Rows in the sample orders table
    #[arg(long)]
    orders: Option<u64>,

    /// Config file (default: /etc/kvquery/kvquery.toml or ./kvquery.toml)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
}

/// CLI flags override everything loaded from file and environment.
fn load_config(args: &Args) -> kvquery::Result<EngineConfig> {
    let base = EngineConfig::load(args.config.as_deref())?;
    Ok(EngineConfig {
        scan_span: args.scan_span.or(base.scan_span),
        lineitems: args.lineitems.unwrap_or(base.lineitems),
        orders: args.orders.unwrap_or(base.orders),
        history: base.history,
    })
}

fn render(result: &ResultSet) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(&result.columns);
    for row in &result.rows {
        table.add_row(row.iter().map(ToString::to_string));
    }
    table
}

fn run(session: &Session<'_, MemoryStore>, sql: &str, explain: bool) {
    if explain {
        match session.explain(sql) {
            Ok(plan) => print!("{plan}"),
            Err(e) => eprintln!("✗ {e}"),
        }
        return;
    }
    match session.execute(sql) {
        Ok(result) => {
            println!("{}", render(&result));
            println!("({} row{})", result.len(), if result.len() == 1 { "" } else { "s" });
        }
        Err(e) => eprintln!("✗ {e}"),
    }
}

fn describe_tables(catalog: &Catalog, name: Option<&str>) {
    let names = match name {
        Some(name) => vec![name],
        None => catalog.table_names(),
    };
    for name in names {
        match catalog.table(name) {
            Ok(table) => {
                let mut out = Table::new();
                out.load_preset(UTF8_FULL).set_header(vec!["Column", "Type"]);
                for column in table.schema().columns() {
                    out.add_row(vec![column.name.clone(), column.data_type.to_string()]);
                }
                println!("Table \"{}\" (tag {})", table.name, table.tag);
                println!("{out}");
            }
            Err(e) => eprintln!("✗ {e}"),
        }
    }
}

fn print_help() {
    println!("Meta-commands:");
    println!("  \\q, \\quit          - Quit");
    println!("  \\d                 - Describe all tables");
    println!("  \\d <table>         - Describe one table");
    println!("  \\explain <query>   - Show the parsed query and its scans");
    println!("  \\?, \\h, \\help      - Show this help");
    println!("\nQueries: SELECT ... FROM ... [WHERE ...] [GROUP BY ...] [ORDER BY ...]");
}

fn repl(session: &Session<'_, MemoryStore>, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;
    let history_file = config.history_file();
    if let Some(ref path) = history_file {
        let _ = rl.load_history(path);
    }

    println!("Type '\\?' for help, 'quit' or 'exit' to quit.\n");

    loop {
        match rl.readline("kvq> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                    break;
                }
                match line.split_once(char::is_whitespace) {
                    _ if !line.starts_with('\\') => run(session, line, false),
                    Some(("\\explain", sql)) => run(session, sql, true),
                    Some(("\\d", table)) => describe_tables(session.catalog(), Some(table.trim())),
                    None => match line {
                        "\\q" | "\\quit" => break,
                        "\\d" | "\\dt" => describe_tables(session.catalog(), None),
                        "\\?" | "\\h" | "\\help" => print_help(),
                        _ => println!("Unknown meta-command: {line}. Use \\? for help."),
                    },
                    Some(_) => println!("Unknown meta-command: {line}. Use \\? for help."),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("quit");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                return Err(err.into());
            }
        }
    }

    if let Some(ref path) = history_file {
        let _ = rl.save_history(path);
    }
    println!("\n╔══════════════════════════════════════════════════════════╗");
    println!("║                    Session closed                        ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    let (catalog, store) = load_sample(config.lineitems, config.orders)?;
    let store = match config.scan_span {
        Some(span) => store.with_scan_span(span),
        None => store,
    };
    let session = Session::new(&catalog, &store);

    if let Some(query) = &args.query {
        run(&session, query, args.explain);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                   kvquery CLI v{:<26}║", env!("CARGO_PKG_VERSION"));
    println!("╚══════════════════════════════════════════════════════════╝");
    println!(
        "Sample data: {} lineitems, {} orders, scan span {}\n",
        config.lineitems,
        config.orders,
        config.scan_span.map_or_else(|| "unlimited".to_string(), |s| s.to_string())
    );

    repl(&session, &config)
}
