//! # Transfer CLI
//!
//! Command-line bulk import/export against a Stockline database.
//!
//! ## Usage
//! ```bash
//! # Import products from CSV
//! cargo run -p stockline-transfer --bin transfer -- import products ./products.csv
//!
//! # Export one branch's ranging as XML
//! cargo run -p stockline-transfer --bin transfer -- export mappings ./cbd.xml --branch 2
//!
//! # Merge mappings across branches from JSON
//! cargo run -p stockline-transfer --bin transfer -- import mappings ./pairs.json
//! ```
//!
//! Ctrl-C cancels cooperatively: the in-flight transaction rolls back and
//! the store is left unchanged by the interrupted file.

use std::env;
use std::path::PathBuf;
use std::process;

use tokio_util::sync::CancellationToken;

use stockline_db::{Database, DbConfig};
use stockline_transfer::TransferService;

fn print_usage() {
    println!("Stockline Transfer Tool");
    println!();
    println!("Usage: transfer <import|export> <products|branches|mappings> <FILE> [OPTIONS]");
    println!();
    println!("The file format is chosen by extension: .csv, .json, or .xml");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>     Database file path (default: ./stockline_dev.db)");
    println!("  -b, --branch <ID>   Mappings only. Import: replace this branch's");
    println!("                      ranging (0 = merge pairs, default). Export:");
    println!("                      just this branch's pairs (0 = all, default).");
    println!("  -h, --help          Show this help message");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut positional: Vec<String> = Vec::new();
    let mut db_path = String::from("./stockline_dev.db");
    let mut branch_id: i64 = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--branch" | "-b" => {
                if i + 1 < args.len() {
                    branch_id = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    if positional.len() != 3 {
        print_usage();
        process::exit(2);
    }
    let direction = positional[0].as_str();
    let entity = positional[1].as_str();
    let file = PathBuf::from(&positional[2]);

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let service = TransferService::new(db);

    // Ctrl-C flips the token; the engine stops at its next store round trip
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling, rolling back in-flight work...");
            signal_token.cancel();
        }
    });

    let count = match (direction, entity) {
        ("import", "products") => service.import_products(&file, &cancel).await?,
        ("import", "branches") => service.import_branches(&file, &cancel).await?,
        ("import", "mappings") => service.import_mappings(&file, branch_id, &cancel).await?,
        ("export", "products") => service.export_products(&file, &cancel).await?,
        ("export", "branches") => service.export_branches(&file, &cancel).await?,
        ("export", "mappings") => service.export_mappings(&file, branch_id, &cancel).await?,
        _ => {
            print_usage();
            process::exit(2);
        }
    };

    match direction {
        "import" => println!("✓ Applied {} rows from {}", count, file.display()),
        _ => println!("✓ Wrote {} rows to {}", count, file.display()),
    }

    Ok(())
}
