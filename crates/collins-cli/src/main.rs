//! # Collins CLI
//!
//! Thin command-line front-end over `collins-client` for poking at a
//! Collins server from scripts and shells. Credentials and host come from
//! the `COLLINS_*` environment variables.

use anyhow::{bail, Context, Result};
use collins_client::{CollinsClient, CollinsConfig, Envelope, Params};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let client = CollinsClient::new(CollinsConfig::from_env())
        .context("Failed to initialize Collins client")?;

    let envelope = match args[1].as_str() {
        "ping" => client.ping()?,
        "get" => {
            let tag = require(&args, 2, "collins get <tag>")?;
            client.asset_info(tag, &Params::new())?
        }
        "find" => client.find_assets(&kv_params(&args[2..])?)?,
        "create" => {
            let tag = require(&args, 2, "collins create <tag> [key=value ...]")?;
            client.create_asset(tag, &kv_params(&args[3..])?)?
        }
        "ensure" => {
            let tag = require(&args, 2, "collins ensure <tag> [key=value ...]")?;
            client.ensure_asset(tag, &kv_params(&args[3..])?)?
        }
        "set" => {
            let tag = require(&args, 2, "collins set <tag> <key> <value>")?;
            let key = require(&args, 3, "collins set <tag> <key> <value>")?;
            let value = require(&args, 4, "collins set <tag> <key> <value>")?;
            let updated = client.soft_update(tag, key, value)?;
            if updated {
                println!("updated {key} on {tag}");
            } else {
                println!("no change to {key} on {tag}");
            }
            return Ok(());
        }
        "delete" => {
            let tag = require(&args, 2, "collins delete <tag>")?;
            client.delete_asset(tag, &Params::new())?
        }
        "log" => {
            let tag = require(&args, 2, "collins log <tag> <message>")?;
            let message = require(&args, 3, "collins log <tag> <message>")?;
            client.create_asset_log(tag, message, None)?
        }
        "ensure-type" => {
            let name = require(&args, 2, "collins ensure-type <name> <label>")?;
            let label = require(&args, 3, "collins ensure-type <name> <label>")?;
            client.ensure_asset_type(name, label)?
        }
        "help" | "--help" | "-h" => {
            print_help();
            return Ok(());
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    };

    print_envelope(&envelope)?;
    if !envelope.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn require<'a>(args: &'a [String], index: usize, usage: &str) -> Result<&'a str> {
    match args.get(index) {
        Some(value) => Ok(value),
        None => bail!("Usage: {usage}"),
    }
}

/// Turn trailing `key=value` arguments into request params. Repeating a key
/// repeats the pair, which is how multi-valued filters are expressed.
fn kv_params(args: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("Expected key=value, got: {arg}");
        };
        params.insert(key, value);
    }
    Ok(params)
}

fn print_envelope(envelope: &Envelope) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

fn print_help() {
    println!(
        r#"Collins CLI

USAGE:
    collins <COMMAND> [ARGS]

COMMANDS:
    ping                          Liveness check
    get <tag>                     Fetch an asset
    find [key=value ...]          Find assets (repeat attribute=K;V to AND filters)
    create <tag> [key=value ...]  Create an asset (409 if it exists)
    ensure <tag> [key=value ...]  Create an asset, treating "exists" as success
    set <tag> <key> <value>       Update one attribute only if it changed
    delete <tag>                  Delete an asset
    log <tag> <message>           Append a log entry to an asset
    ensure-type <name> <label>    Create an asset type, treating "exists" as success
    help                          Show this help message

ENVIRONMENT:
    COLLINS_HOST, COLLINS_USERNAME, COLLINS_PASSWORD, COLLINS_TIMEOUT_SECS

EXAMPLES:
    collins find "attribute=PRIMARY_ROLE;APP" status=Allocated
    collins set web-01 nodeclass web
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_params_splits_on_first_equals() {
        let args = vec!["attribute=HOSTNAME;a=b".to_string()];
        let params = kv_params(&args).unwrap();
        assert_eq!(params.get_all("attribute"), vec!["HOSTNAME;a=b"]);
    }

    #[test]
    fn kv_params_rejects_bare_words() {
        assert!(kv_params(&["nonsense".to_string()]).is_err());
    }

    #[test]
    fn kv_params_keeps_repeated_keys() {
        let args = vec![
            "attribute=A;1".to_string(),
            "attribute=B;2".to_string(),
        ];
        let params = kv_params(&args).unwrap();
        assert_eq!(params.get_all("attribute"), vec!["A;1", "B;2"]);
    }
}
