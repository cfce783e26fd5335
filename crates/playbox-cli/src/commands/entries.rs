use playbox_core::games::GameId;
use playbox_core::storage::{KeyValueStore, SqliteBackend, StorageBackend, VersionCheck};
use playbox_core::StoreError;
use serde_json::Value;

use crate::app::AppContext;
use crate::cli::{ClearArgs, DumpArgs, GetArgs, KeysArgs, RemoveArgs, SetArgs};
use crate::output::{entries_json, entries_table};

fn parse_json_arg(label: &str, raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).map_err(|e| {
        anyhow::anyhow!(
            "{} must be JSON ({}). Quote strings, e.g. '\"text\"'.",
            label,
            e
        )
    })
}

pub fn handle_get(ctx: &AppContext, args: &GetArgs) -> anyhow::Result<()> {
    let default = args
        .default
        .as_deref()
        .map(|raw| parse_json_arg("--default", raw))
        .transpose()?;
    let store = ctx.store(&args.namespace)?;

    let value = match store.try_get::<Value>(&args.key) {
        Ok(Some(value)) => value,
        Ok(None) => default.unwrap_or(Value::Null),
        Err(StoreError::Deserialization(err)) => {
            return Err(anyhow::anyhow!(
                "Entry {}:{} is not valid JSON: {}",
                args.namespace,
                args.key,
                err
            ));
        }
        Err(err) => return Err(err.into()),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub fn handle_set(ctx: &AppContext, args: &SetArgs) -> anyhow::Result<()> {
    let value = parse_json_arg("Value", &args.value)?;
    let store = ctx.store(&args.namespace)?;
    // Games discard saves without a matching version marker on open
    let game = GameId::ALL
        .into_iter()
        .find(|game| game.slug() == store.namespace().as_str());
    if let Some(game) = game {
        if let VersionCheck::Reset { from } = store.try_versioned(game.schema_version())? {
            tracing::warn!(
                namespace = %store.namespace(),
                from = ?from,
                "discarded entries from another save version"
            );
        }
    }
    store.try_set(&args.key, &value)?;
    if !ctx.quiet {
        println!("Stored {}:{}", store.namespace(), args.key);
    }
    Ok(())
}

pub fn handle_remove(ctx: &AppContext, args: &RemoveArgs) -> anyhow::Result<()> {
    let store = ctx.store(&args.namespace)?;
    let existed = store.has(&args.key);
    store.try_remove(&args.key)?;
    if !ctx.quiet {
        if existed {
            println!("Removed {}:{}", store.namespace(), args.key);
        } else {
            println!("No entry {}:{}", store.namespace(), args.key);
        }
    }
    Ok(())
}

pub fn handle_clear(ctx: &AppContext, args: &ClearArgs) -> anyhow::Result<()> {
    let store = ctx.store(&args.namespace)?;
    let removed = store.try_clear()?;
    if !ctx.quiet {
        println!("Cleared {} entries from {}", removed, store.namespace());
    }
    Ok(())
}

pub fn handle_keys(ctx: &AppContext, args: &KeysArgs) -> anyhow::Result<()> {
    let store = ctx.store(&args.namespace)?;
    let keys = store.try_keys()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
    } else {
        for key in keys {
            println!("{}", key);
        }
    }
    Ok(())
}

/// Collect `(namespace, key, raw)` rows for one namespace or the whole store.
fn collect_rows(
    ctx: &AppContext,
    namespace: Option<&str>,
) -> anyhow::Result<Vec<(String, String, String)>> {
    if let Some(namespace) = namespace {
        let store = ctx.store(namespace)?;
        return rows_for(&store).map_err(Into::into);
    }

    let backend = ctx.open_backend()?;
    let mut rows = Vec::new();
    for storage_key in backend.keys()? {
        // Version markers have no ':' and are skipped
        let Some((namespace, key)) = storage_key.split_once(':') else {
            continue;
        };
        if let Some(raw) = backend.get_item(&storage_key)? {
            rows.push((namespace.to_string(), key.to_string(), raw));
        }
    }
    rows.sort();
    Ok(rows)
}

fn rows_for(
    store: &KeyValueStore<SqliteBackend>,
) -> playbox_core::Result<Vec<(String, String, String)>> {
    let namespace = store.namespace().to_string();
    Ok(store
        .try_entries()?
        .into_iter()
        .map(|(key, raw)| (namespace.clone(), key, raw))
        .collect())
}

pub fn handle_dump(ctx: &AppContext, args: &DumpArgs) -> anyhow::Result<()> {
    let rows = collect_rows(ctx, args.namespace.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries_json(&rows))?);
    } else if rows.is_empty() {
        if !ctx.quiet {
            println!("No entries.");
        }
    } else {
        println!("{}", entries_table(&rows));
    }
    Ok(())
}
