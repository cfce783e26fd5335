use playbox_core::games::GameId;
use playbox_core::storage::KeyValueStore;

use crate::app::AppContext;
use crate::cli::ResetArgs;
use crate::output::games_table;

pub fn handle_games(ctx: &AppContext) -> anyhow::Result<()> {
    let backend = ctx.open_backend()?;
    let mut rows = Vec::new();
    for game in GameId::ALL {
        let store = KeyValueStore::new(backend.clone(), game.namespace()?);
        rows.push((
            game.slug().to_string(),
            game.title().to_string(),
            store.stored_version()?,
            store.try_keys()?.len(),
        ));
    }
    println!("{}", games_table(&rows));
    Ok(())
}

pub fn handle_reset(ctx: &AppContext, args: &ResetArgs) -> anyhow::Result<()> {
    let game: GameId = args.game.parse().map_err(|_| {
        let known: Vec<&str> = GameId::ALL.iter().map(|g| g.slug()).collect();
        anyhow::anyhow!(
            "Unknown game '{}'. Known games: {}",
            args.game,
            known.join(", ")
        )
    })?;
    let store = KeyValueStore::new(ctx.open_backend()?, game.namespace()?);
    let removed = store.try_clear()?;
    if !ctx.quiet {
        println!("Reset {} ({} entries removed)", game.title(), removed);
    }
    Ok(())
}
