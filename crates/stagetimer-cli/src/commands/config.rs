use clap::Subcommand;
use stagetimer_core::{Settings, SqliteStore};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "enableSound", "display.monitorIndex")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SqliteStore::open_default()?;
    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load(&store)?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load(&store)?;
            settings.set(&key, &value, &mut store)?;
            println!("ok");
        }
        ConfigAction::List { json } => {
            let settings = Settings::load(&store)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                for (key, value) in settings.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            Settings::default().save(&mut store)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
