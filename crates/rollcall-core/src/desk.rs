use rollcall_store::{LedgerStore, SettingsProvider, StatsStore};

use crate::command::Command;
use crate::engine::{self, ReconcileOutcome};
use crate::error::SignupError;
use crate::reply;
use crate::settings::Settings;
use crate::summary::render_summary;

/// Synthetic id prefix for proxy signups, namespaced so it can never
/// collide with a real messaging-layer account id.
pub const PROXY_ID_PREFIX: &str = "proxy:";

pub fn proxy_id(name: &str) -> String {
    format!("{PROXY_ID_PREFIX}{name}")
}

/// Command dispatcher: maps parsed command intents onto engine calls and
/// renders the reply. One desk per event/capacity scope; callers serialize
/// `handle` invocations (the engine needs exclusive ledger access).
pub struct SignupDesk<L, S, T> {
    ledger: L,
    settings: S,
    stats: T,
}

impl<L, S, T> SignupDesk<L, S, T>
where
    L: LedgerStore,
    S: SettingsProvider,
    T: StatsStore,
{
    pub fn new(ledger: L, settings: S, stats: T) -> Self {
        Self {
            ledger,
            settings,
            stats,
        }
    }

    /// Handles one inbound message. `Ok(None)` means silent ignore:
    /// unrecognized text, or a command whose whole category is toggled
    /// off.
    pub fn handle(
        &self,
        user_id: &str,
        display_name: &str,
        text: &str,
    ) -> Result<Option<String>, SignupError> {
        let command = Command::parse(text);
        if command == Command::Unrecognized {
            return Ok(None);
        }

        let settings = Settings::resolve(&self.settings.get_settings()?);
        if command.is_signup() && !settings.signup_enabled {
            return Ok(None);
        }
        if command.is_stats() && !settings.query_enabled {
            return Ok(None);
        }

        let reply = match command {
            Command::SelfAdd(n) => {
                self.apply_delta(&settings, user_id, display_name, i64::from(n))?
            }
            Command::SelfRemove(n) => {
                self.apply_delta(&settings, user_id, display_name, -i64::from(n))?
            }
            Command::ProxyAdd { name, count } => {
                self.apply_delta(&settings, &proxy_id(&name), &name, i64::from(count))?
            }
            Command::ProxyRemove { name, count } => {
                self.apply_delta(&settings, &proxy_id(&name), &name, -i64::from(count))?
            }
            Command::ListQuery => render_summary(&self.ledger, &settings)?,
            Command::StatSelf => {
                let hits = self.stats.lookup_by_user(user_id)?;
                reply::stat_hits(&hits).unwrap_or_else(reply::no_stats_self)
            }
            Command::StatAll => reply::stat_listing(&self.stats.list_all()?),
            Command::StatOther(name) => {
                let hits = self.stats.lookup_by_name(&name)?;
                reply::stat_hits(&hits).unwrap_or_else(|| reply::no_stats_for(&name))
            }
            Command::Unrecognized => return Ok(None),
        };
        Ok(Some(reply))
    }

    /// Current status report, independent of any inbound command.
    pub fn summary(&self) -> Result<String, SignupError> {
        let settings = Settings::resolve(&self.settings.get_settings()?);
        render_summary(&self.ledger, &settings)
    }

    /// Runs the promotion cascade directly. Exposed for the capacity-
    /// increase path, where an administrator edits settings out of band
    /// and then asks the desk to re-fill the freed seats.
    pub fn promote(&self) -> Result<(), SignupError> {
        let settings = Settings::resolve(&self.settings.get_settings()?);
        engine::promote_waitlist(&self.ledger, settings.capacity)
    }

    fn apply_delta(
        &self,
        settings: &Settings,
        user_id: &str,
        display_name: &str,
        delta: i64,
    ) -> Result<String, SignupError> {
        let outcome = engine::reconcile(&self.ledger, settings.capacity, user_id, display_name, delta)?;
        if delta < 0 && outcome != ReconcileOutcome::NotSignedUp {
            engine::promote_waitlist(&self.ledger, settings.capacity)?;
        }
        let mut text = reply::outcome(&outcome);
        text.push_str("\n\n");
        text.push_str(&render_summary(&self.ledger, settings)?);
        Ok(text)
    }
}
