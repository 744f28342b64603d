use crate::catalog::OptionCatalog;
use crate::diff::{self, ChangeEvent};
use crate::history::{HistoryEntry, HistoryLog};
use crate::repository::OrderRepository;
use crate::settings::Settings;
use crate::snapshot::OrderSnapshot;
use crate::storage::FileStatus;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tos_auth::{AuthSession, OAuthClient, TokenSet, TokenStore};
use tracing::{debug, info, warn};

/// Result of one [`AppContext::refresh`].
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub snapshot: OrderSnapshot,
    /// Differences to the previously persisted snapshot
    pub changes: Vec<ChangeEvent>,
    /// Served from memory inside the freshness window
    pub from_memory: bool,
    /// Whether a previous snapshot existed to compare against
    pub had_previous: bool,
}

impl RefreshOutcome {
    /// `1` when something changed, `0` when nothing did, `-1` when there was
    /// nothing to compare against.
    pub fn status_code(&self) -> i8 {
        if !self.had_previous {
            -1
        } else if self.changes.is_empty() {
            0
        } else {
            1
        }
    }
}

/// Everything one run of the tool works with. Owned by the caller and passed
/// explicitly; there is no global state.
pub struct AppContext {
    data_dir: PathBuf,
    session: AuthSession,
    repository: OrderRepository,
    history: HistoryLog,
    catalog: OptionCatalog,
    auto_save: bool,
    freshness: Duration,
    last_refresh: Option<LastRefresh>,
}

/// The last fetched result, kept for the freshness window.
struct LastRefresh {
    at: DateTime<Local>,
    snapshot: OrderSnapshot,
    had_previous: bool,
}

impl AppContext {
    pub fn new(settings: Settings) -> Result<Self> {
        let data_dir = settings
            .storage
            .data_dir()
            .map_err(anyhow::Error::msg)?;
        let client = OAuthClient::new(settings.auth.clone())?;
        let session = AuthSession::new(client, TokenStore::in_dir(&data_dir));
        let catalog = OptionCatalog::load(settings.storage.option_codes_dir.as_deref())
            .context("Failed to load option codes")?;
        let freshness_minutes = i64::try_from(settings.refresh.freshness_minutes)
            .context("refresh.freshness_minutes is too large")?;

        Ok(Self {
            repository: OrderRepository::new(
                settings.api.clone(),
                &data_dir,
                settings.storage.auto_save_orders,
            ),
            history: HistoryLog::in_dir(&data_dir),
            auto_save: settings.storage.auto_save_orders,
            freshness: Duration::minutes(freshness_minutes),
            last_refresh: None,
            data_dir,
            session,
            catalog,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn repository(&self) -> &OrderRepository {
        &self.repository
    }

    /// Valid tokens, prompting for a browser login when the stored ones are
    /// gone or cannot be refreshed.
    pub async fn authenticate(&mut self) -> Result<TokenSet> {
        Ok(tos_auth::authenticate(&mut self.session).await?)
    }

    pub async fn login(&mut self) -> Result<TokenSet> {
        Ok(tos_auth::login_interactive(&mut self.session).await?)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.sign_out()?;
        self.last_refresh = None;
        Ok(())
    }

    fn fresh_refresh(&self, now: DateTime<Local>) -> Option<&LastRefresh> {
        self.last_refresh
            .as_ref()
            .filter(|last| now - last.at < self.freshness)
    }

    /// Fetch the current orders, compare them with the persisted snapshot and
    /// record any changes. Inside the freshness window the last result is
    /// reused unless `force` is set.
    ///
    /// Never prompts: missing or dead credentials surface as
    /// `AuthError::ReauthenticationRequired`.
    pub async fn refresh(&mut self, force: bool) -> Result<RefreshOutcome> {
        let now = Local::now();
        if !force {
            if let Some(last) = self.fresh_refresh(now) {
                debug!("Reusing snapshot fetched at {}", last.at);
                return Ok(RefreshOutcome {
                    snapshot: last.snapshot.clone(),
                    changes: Vec::new(),
                    from_memory: true,
                    had_previous: last.had_previous,
                });
            }
        }

        let tokens = self.session.ensure_valid().await?;
        let access_token = SecretString::from(tokens.access_token);
        self.fetch_and_record(&access_token, now).await
    }

    async fn fetch_and_record(
        &mut self,
        access_token: &SecretString,
        now: DateTime<Local>,
    ) -> Result<RefreshOutcome> {
        let previous = match self.repository.load_snapshot().await {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Ignoring unreadable previous snapshot: {}", e);
                None
            }
        };

        let snapshot = self
            .repository
            .fetch_current(access_token.expose_secret())
            .await
            .context("Failed to fetch orders")?;

        let changes = diff::compare_snapshots(previous.as_ref(), &snapshot)?;
        info!("Detected {} change(s)", changes.len());

        // History only records changes against a baseline that actually
        // moved; otherwise the next run would record the same entry again.
        if self.auto_save {
            match self.repository.save_snapshot(&snapshot).await {
                Ok(()) if !changes.is_empty() => {
                    self.history
                        .append(HistoryEntry::new(now.date_naive(), changes.clone()))
                        .await
                        .context("Failed to record change history")?;
                }
                Ok(()) => {}
                Err(e) => warn!("Snapshot not saved, change history left as is: {}", e),
            }
        }

        let had_previous = previous.is_some();
        self.last_refresh = Some(LastRefresh {
            at: now,
            snapshot: snapshot.clone(),
            had_previous,
        });

        Ok(RefreshOutcome {
            snapshot,
            changes,
            from_memory: false,
            had_previous,
        })
    }

    /// The persisted snapshot, without contacting the API.
    pub async fn cached_snapshot(&self) -> Result<Option<OrderSnapshot>> {
        Ok(self.repository.load_snapshot().await?)
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.load_or_empty().await
    }

    pub fn decode(&self, raw: &str) -> Vec<(String, String)> {
        self.catalog.decode(raw)
    }

    /// Token, snapshot and history files, in that order.
    pub async fn file_statuses(&self) -> Vec<FileStatus> {
        let mut statuses = Vec::with_capacity(3);
        for path in [
            self.session.store().path(),
            self.repository.snapshot_path(),
            self.history.path(),
        ] {
            statuses.push(FileStatus::of(path).await);
        }
        statuses
    }
}
