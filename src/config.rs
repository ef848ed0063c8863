//! Monitor configuration.
//!
//! [`MonitorConfig`] is built once at startup through [`MonitorConfigBuilder`]
//! and handed to the monitor by value; nothing reads configuration from global
//! state afterwards.

use crate::core::balance::{LAMPORTS_PER_SOL, TokenDeltaStrategy};
use crate::utils::error::{Result, SolTrackError};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Default upper bound for a single `getTransaction` round trip.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Commitment used for both the subscription and the transaction fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CommitmentLevel {
    Processed,
    Confirmed,
    #[default]
    Finalized,
}

impl CommitmentLevel {
    /// Name used in JSON-RPC requests.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

impl From<CommitmentLevel> for CommitmentConfig {
    fn from(level: CommitmentLevel) -> Self {
        match level {
            CommitmentLevel::Processed => CommitmentConfig::processed(),
            CommitmentLevel::Confirmed => CommitmentConfig::confirmed(),
            CommitmentLevel::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// Validated, immutable monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// The watched wallet.
    pub wallet: Pubkey,
    /// HTTP(S) JSON-RPC endpoint used to fetch transactions.
    pub rpc_url: String,
    /// WS(S) endpoint used for the `logsSubscribe` subscription.
    pub ws_url: String,
    pub commitment_level: CommitmentLevel,
    pub fetch_timeout_secs: u64,
    /// Smallest-denomination units per reported native unit.
    pub denomination: u64,
    pub token_delta: TokenDeltaStrategy,
}

/// Builder for [`MonitorConfig`].
///
/// # Example
///
/// ```
/// use soltrack::MonitorConfigBuilder;
///
/// let config = MonitorConfigBuilder::new()
///     .wallet("4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T")
///     .with_rpc("https://api.devnet.solana.com")
///     .with_ws("wss://api.devnet.solana.com")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.fetch_timeout_secs, 30);
/// ```
#[derive(Debug, Clone)]
pub struct MonitorConfigBuilder {
    wallet: Option<String>,
    rpc_url: Option<String>,
    ws_url: Option<String>,
    commitment_level: CommitmentLevel,
    fetch_timeout_secs: u64,
    denomination: u64,
    token_delta: TokenDeltaStrategy,
}

impl Default for MonitorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            wallet: None,
            rpc_url: None,
            ws_url: None,
            commitment_level: CommitmentLevel::default(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            denomination: LAMPORTS_PER_SOL,
            token_delta: TokenDeltaStrategy::default(),
        }
    }

    /// Sets the wallet address (base58).
    #[must_use]
    pub fn wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet = Some(wallet.into());
        self
    }

    #[must_use]
    pub fn with_rpc(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    #[must_use]
    pub fn with_ws(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = Some(ws_url.into());
        self
    }

    #[must_use]
    pub fn with_commitment(mut self, level: CommitmentLevel) -> Self {
        self.commitment_level = level;
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    /// Units of the smallest denomination per reported SOL. Defaults to
    /// lamports per SOL.
    #[must_use]
    pub fn with_denomination(mut self, factor: u64) -> Self {
        self.denomination = factor;
        self
    }

    #[must_use]
    pub fn with_token_delta(mut self, strategy: TokenDeltaStrategy) -> Self {
        self.token_delta = strategy;
        self
    }

    /// Validates the settings.
    ///
    /// The wallet is checked first so that a malformed address is reported
    /// before anything else.
    ///
    /// # Errors
    ///
    /// Returns [`SolTrackError::InvalidWallet`] for a missing or malformed
    /// wallet and [`SolTrackError::ConfigError`] for missing or malformed
    /// endpoints and non-positive limits.
    pub fn build(self) -> Result<MonitorConfig> {
        let wallet = self
            .wallet
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or_else(|| SolTrackError::InvalidWallet("wallet address is required".into()))?;
        let wallet = Pubkey::from_str(wallet)
            .map_err(|e| SolTrackError::InvalidWallet(format!("{wallet}: {e}")))?;

        let rpc_url = non_empty(self.rpc_url);
        let ws_url = non_empty(self.ws_url);
        let (Some(rpc_url), Some(ws_url)) = (rpc_url, ws_url) else {
            return Err(SolTrackError::ConfigError(
                "RPC_URL and WS_URL must both be set".into(),
            ));
        };

        require_scheme("RPC", &rpc_url, &["http://", "https://"])?;
        require_scheme("WebSocket", &ws_url, &["ws://", "wss://"])?;

        if self.fetch_timeout_secs == 0 {
            return Err(SolTrackError::ConfigError(
                "fetch timeout must be at least 1 second".into(),
            ));
        }
        if self.denomination == 0 {
            return Err(SolTrackError::ConfigError(
                "denomination factor must be positive".into(),
            ));
        }

        Ok(MonitorConfig {
            wallet,
            rpc_url,
            ws_url,
            commitment_level: self.commitment_level,
            fetch_timeout_secs: self.fetch_timeout_secs,
            denomination: self.denomination,
            token_delta: self.token_delta,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_scheme(name: &str, url: &str, schemes: &[&str]) -> Result<()> {
    if schemes.iter().any(|scheme| url.starts_with(scheme)) {
        Ok(())
    } else {
        Err(SolTrackError::ConfigError(format!(
            "{name} endpoint {url} must start with {}",
            schemes.join(" or ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

    fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::new()
            .wallet(WALLET)
            .with_rpc("http://127.0.0.1:8899")
            .with_ws("ws://127.0.0.1:8900")
    }

    #[test]
    fn test_build_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.wallet.to_string(), WALLET);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.ws_url, "ws://127.0.0.1:8900");
        assert_eq!(config.commitment_level, CommitmentLevel::Finalized);
        assert_eq!(config.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(config.denomination, LAMPORTS_PER_SOL);
        assert_eq!(config.token_delta, TokenDeltaStrategy::Decimals);
    }

    #[test]
    fn test_build_overrides() {
        let config = builder()
            .with_commitment(CommitmentLevel::Confirmed)
            .with_fetch_timeout(5)
            .with_denomination(1)
            .with_token_delta(TokenDeltaStrategy::Amount)
            .build()
            .unwrap();

        assert_eq!(config.commitment_level.as_str(), "confirmed");
        assert_eq!(config.fetch_timeout_secs, 5);
        assert_eq!(config.denomination, 1);
        assert_eq!(config.token_delta, TokenDeltaStrategy::Amount);
    }

    #[test]
    fn test_invalid_wallet_is_reported_first() {
        let err = MonitorConfigBuilder::new()
            .wallet("not-a-key")
            .build()
            .unwrap_err();
        assert!(matches!(err, SolTrackError::InvalidWallet(_)));

        let err = MonitorConfigBuilder::new().build().unwrap_err();
        assert!(matches!(err, SolTrackError::InvalidWallet(_)));

        // Valid base58 but the wrong length.
        let err = builder().wallet("3yZe7d").build().unwrap_err();
        assert!(matches!(err, SolTrackError::InvalidWallet(_)));
    }

    #[test]
    fn test_missing_endpoints() {
        let err = MonitorConfigBuilder::new()
            .wallet(WALLET)
            .with_rpc("http://127.0.0.1:8899")
            .build()
            .unwrap_err();
        assert!(matches!(err, SolTrackError::ConfigError(_)));

        let err = MonitorConfigBuilder::new()
            .wallet(WALLET)
            .with_rpc("  ")
            .with_ws("ws://127.0.0.1:8900")
            .build()
            .unwrap_err();
        assert!(matches!(err, SolTrackError::ConfigError(_)));
    }

    #[test]
    fn test_endpoint_schemes() {
        let err = builder().with_rpc("ws://127.0.0.1:8899").build().unwrap_err();
        assert!(err.to_string().contains("RPC endpoint"));

        let err = builder().with_ws("https://127.0.0.1:8900").build().unwrap_err();
        assert!(err.to_string().contains("WebSocket endpoint"));
    }

    #[test]
    fn test_limits() {
        assert!(builder().with_fetch_timeout(0).build().is_err());
        assert!(builder().with_denomination(0).build().is_err());
    }

    #[test]
    fn test_commitment_conversion() {
        let config: CommitmentConfig = CommitmentLevel::Finalized.into();
        assert_eq!(config, CommitmentConfig::finalized());
    }
}
