use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use rollcall_core::{Settings, SignupDesk};
use rollcall_sqlite::SqliteStore;
use rollcall_store::{SettingsProvider, StatRecord};

#[derive(Parser, Debug)]
#[command(name = "rollcall", version, about = "Event signup desk CLI")]
struct Cli {
    /// Path to the sqlite database
    #[arg(long, default_value = "rollcall.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the database
    Init,

    /// Send a chat line as a given user and print the reply
    Send {
        /// Acting user id
        #[arg(long)]
        user: String,

        /// Acting user display name
        #[arg(long, default_value = "")]
        name: String,

        /// The chat text, e.g. "+2", "-1", "Guest+3", "?"
        #[arg(allow_hyphen_values = true)]
        text: String,
    },

    /// Print the signup summary
    Summary,

    /// Re-run waitlist promotion (after an admin capacity increase)
    Promote,

    /// Read or write event settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Add a row to the statistics table
    StatAdd {
        user: String,
        name: String,
        description: String,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print resolved settings
    Show,
    /// Set one settings key
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let store = Arc::new(SqliteStore::open(&cli.db)?);
    let desk = SignupDesk::new(store.clone(), store.clone(), store.clone());

    match cli.command {
        Command::Init => {
            // Opening the database creates the schema.
            println!("initialized {}", cli.db.display());
        }
        Command::Send { user, name, text } => match desk.handle(&user, &name, &text)? {
            Some(reply) => println!("{reply}"),
            None => println!("(ignored)"),
        },
        Command::Summary => println!("{}", desk.summary()?),
        Command::Promote => {
            desk.promote()?;
            println!("{}", desk.summary()?);
        }
        Command::Settings(SettingsCommand::Show) => {
            let settings = Settings::resolve(&store.get_settings()?);
            println!("capacity = {}", settings.capacity);
            println!("title = {}", settings.title);
            println!("description = {}", settings.description);
            println!("signup_enabled = {}", settings.signup_enabled);
            println!("query_enabled = {}", settings.query_enabled);
        }
        Command::Settings(SettingsCommand::Set { key, value }) => {
            store.set_setting(&key, &value)?;
        }
        Command::StatAdd {
            user,
            name,
            description,
        } => {
            store.add_stat(&StatRecord {
                user_id: user,
                name,
                description,
            })?;
        }
    }
    Ok(())
}
