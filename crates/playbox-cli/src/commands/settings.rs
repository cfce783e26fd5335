use playbox_core::settings::{Language, Settings, SettingsAccess, StoredSettings, MAX_VOLUME};

use crate::app::AppContext;
use crate::cli::SettingsCommand;

fn print_settings(settings: &Settings) {
    println!(
        "language: {} ({})",
        settings.language,
        settings.language.native_name()
    );
    println!(
        "sound:    {}",
        if settings.sound_enabled { "on" } else { "off" }
    );
    println!("volume:   {}/{}", settings.volume, MAX_VOLUME);
}

pub fn handle_settings(ctx: &AppContext, command: &SettingsCommand) -> anyhow::Result<()> {
    let access = StoredSettings::new(ctx.open_backend()?)?;
    match command {
        SettingsCommand::Show { json } => {
            let settings = access.load();
            if *json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                print_settings(&settings);
            }
        }
        SettingsCommand::Set {
            language,
            sound,
            volume,
        } => {
            let language = language
                .as_deref()
                .map(|code| {
                    code.parse::<Language>().map_err(|_| {
                        let known: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
                        anyhow::anyhow!(
                            "Unknown language '{}'. Known languages: {}",
                            code,
                            known.join(", ")
                        )
                    })
                })
                .transpose()?;

            let mut settings = access.load();
            if let Some(language) = language {
                settings.language = language;
            }
            if let Some(sound) = sound {
                settings.sound_enabled = sound.enabled();
            }
            if let Some(volume) = volume {
                settings.volume = *volume;
            }
            if !access.save(&settings) {
                return Err(anyhow::anyhow!("Failed to save settings"));
            }
            if !ctx.quiet {
                print_settings(&settings);
            }
        }
    }
    Ok(())
}
