// ==========================================
// Bedna workflow - admin binary
// ==========================================
// Usage: bedna-admin <db_path|-> <command> [args]
//   init
//   import <customer> <shipment_in_id> <file> [actor]
//   preview <customer> <file>
//   dispatch <shipment_out_id> <order_id>...
//   return <order_id> [actor]
//   choices <crate_id>
//   cost <order_id>
//   history <entity> <id>
// "-" selects the default database path.
// ==========================================

use std::error::Error;
use std::path::PathBuf;

use bedna_workflow::app::{get_default_db_path, AppState};
use bedna_workflow::importer::SpreadsheetImporter;
use bedna_workflow::logging;
use serde::Serialize;

const DEFAULT_ACTOR: &str = "admin";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("usage: bedna-admin <db_path|-> <command> [args]");
        std::process::exit(2);
    }

    let db_path = match args[0].as_str() {
        "-" => get_default_db_path(),
        path => path.to_string(),
    };
    let state = AppState::new(db_path)?;
    let rest = &args[2..];

    match args[1].as_str() {
        "init" => {
            println!("database ready: {}", state.db_path());
        }
        "import" => {
            let customer = arg(rest, 0, "customer")?;
            let shipment_in_id: i64 = arg(rest, 1, "shipment_in_id")?.parse()?;
            let file = PathBuf::from(arg(rest, 2, "file")?);
            let actor = rest.get(3).map(String::as_str).unwrap_or(DEFAULT_ACTOR);

            let importer = state.import_api.async_importer();
            let report = importer.import_file(customer, shipment_in_id, &file, actor).await?;
            print_json(&report)?;
            if !report.committed {
                std::process::exit(1);
            }
        }
        "preview" => {
            let customer = arg(rest, 0, "customer")?;
            let file = PathBuf::from(arg(rest, 1, "file")?);
            let report = state.import_api.async_importer().preview_file(customer, &file).await?;
            print_json(&report)?;
        }
        "dispatch" => {
            let shipment_out_id: i64 = arg(rest, 0, "shipment_out_id")?.parse()?;
            let order_ids = rest[1..]
                .iter()
                .map(|s| s.parse::<i64>())
                .collect::<Result<Vec<_>, _>>()?;
            if order_ids.is_empty() {
                return Err("at least one order_id is required".into());
            }
            let outcomes = state
                .dispatch_api
                .dispatch_orders(&order_ids, shipment_out_id, DEFAULT_ACTOR)?;
            print_json(&outcomes)?;
        }
        "return" => {
            let order_id: i64 = arg(rest, 0, "order_id")?.parse()?;
            let actor = rest.get(1).map(String::as_str).unwrap_or(DEFAULT_ACTOR);
            let order = state.dispatch_api.return_from_dispatch(order_id, actor)?;
            print_json(&order)?;
        }
        "choices" => {
            let crate_id: i64 = arg(rest, 0, "crate_id")?.parse()?;
            print_json(&state.crate_api.allowed_choices(crate_id)?)?;
        }
        "cost" => {
            let order_id: i64 = arg(rest, 0, "order_id")?.parse()?;
            print_json(&state.order_api.order_cost(order_id)?)?;
        }
        "history" => {
            let entity = arg(rest, 0, "entity")?;
            let id: i64 = arg(rest, 1, "id")?.parse()?;
            print_json(&state.history_api.history_by_name(entity, id)?)?;
        }
        other => {
            return Err(format!("unknown command: {}", other).into());
        }
    }

    Ok(())
}

fn arg<'a>(rest: &'a [String], index: usize, name: &str) -> Result<&'a str, Box<dyn Error>> {
    rest.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument <{}>", name).into())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
