//! Inspection handler implementing ModuleContract

use super::audit::{AuditEntry, AuditLog};
use super::config::InspectionConfig;
use super::engine::InspectionEngine;
use super::error::{InspectionError, InspectionResult};
use super::transaction::Transaction;
use crate::config::{ConfigLoader, Validate};
use crate::module::{
    MetricsPayload, ModuleConfig, ModuleContract, ModuleError, ModuleManifest, ModuleResult,
    ModuleStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Statistics for the inspection handler
#[derive(Debug, Default)]
pub struct InspectionStats {
    /// Transactions opened
    pub transactions_started: AtomicU64,
    /// Transactions finished through the handler
    pub transactions_finished: AtomicU64,
    /// Finished transactions blocked by at least one rule
    pub transactions_blocked: AtomicU64,
    /// Finished transactions bypassed by an ignored rule
    pub transactions_bypassed: AtomicU64,
    /// Logging phases skipped because of a bypass
    pub logging_skipped: AtomicU64,
    /// Engine failures while opening or finishing transactions
    pub engine_failures: AtomicU64,
}

impl InspectionStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished transaction
    pub fn record_finish<E: InspectionEngine>(&self, txn: &Transaction<E>) {
        self.transactions_finished.fetch_add(1, Ordering::Relaxed);

        if !txn.blocked_by().is_empty() {
            self.transactions_blocked.fetch_add(1, Ordering::Relaxed);
        }
        if txn.is_bypassed() {
            self.transactions_bypassed.fetch_add(1, Ordering::Relaxed);
            if !txn.force_log() {
                self.logging_skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record an engine failure
    pub fn record_failure(&self) {
        self.engine_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get block rate as percentage of finished transactions
    pub fn block_rate(&self) -> f64 {
        let finished = self.transactions_finished.load(Ordering::Relaxed);
        if finished == 0 {
            0.0
        } else {
            (self.transactions_blocked.load(Ordering::Relaxed) as f64 / finished as f64) * 100.0
        }
    }
}

/// Owns the shared engine and opens transactions with the configured policy.
pub struct InspectionHandler<E: InspectionEngine> {
    /// Shared inspection engine
    engine: Arc<E>,

    /// Configuration
    config: InspectionConfig,

    /// Audit log
    audit: AuditLog,

    /// Current status
    status: ModuleStatus,

    /// Statistics
    stats: Arc<InspectionStats>,

    /// Start time for uptime calculation
    started_at: Option<Instant>,
}

impl<E: InspectionEngine> std::fmt::Debug for InspectionHandler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectionHandler")
            .field("config", &self.config)
            .field("status", &self.status)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<E: InspectionEngine> InspectionHandler<E> {
    /// Create a handler with default configuration
    pub fn new(engine: Arc<E>) -> Self {
        Self::with_config(engine, InspectionConfig::default())
    }

    /// Create a handler with custom configuration.
    ///
    /// The configuration is not rejected here; validation problems are
    /// logged and the audit log treats zero capacity as disabled.
    pub fn with_config(engine: Arc<E>, config: InspectionConfig) -> Self {
        for error in config.validate().errors() {
            warn!("Inspection configuration: {}", error);
        }

        Self {
            engine,
            audit: AuditLog::new(config.audit.clone()),
            config,
            status: ModuleStatus::Stopped,
            stats: Arc::new(InspectionStats::new()),
            started_at: None,
        }
    }

    /// Open a transaction for a new connection.
    ///
    /// The transaction starts with the configured ignore list and
    /// force-log setting.
    pub fn begin_transaction(
        &self,
        remote_host: &str,
        remote_port: u16,
        local_host: &str,
        local_port: u16,
    ) -> InspectionResult<Transaction<E>> {
        if !self.status.is_operational() {
            return Err(InspectionError::NotRunning);
        }
        if !self.config.enabled {
            return Err(InspectionError::Disabled);
        }

        let txn = Transaction::begin_connection(
            Arc::clone(&self.engine),
            remote_host,
            remote_port,
            local_host,
            local_port,
        )
        .inspect_err(|_| self.stats.record_failure())?;

        self.stats
            .transactions_started
            .fetch_add(1, Ordering::Relaxed);

        Ok(txn
            .with_ignore_rules(&self.config.ignore_rules)
            .with_force_log(self.config.force_log))
    }

    /// Run the logging phase, record the outcome and clean up.
    ///
    /// The transaction is cleaned up even when logging fails. A transaction
    /// that was already cleaned up is returned as `TransactionClosed` and
    /// leaves the stats and audit log untouched.
    pub fn finish_transaction(&self, mut txn: Transaction<E>) -> InspectionResult<()> {
        if txn.is_closed() {
            return Err(InspectionError::TransactionClosed(txn.id()));
        }

        let result = txn.process_logging();
        if let Err(e) = &result {
            warn!("Logging failed for transaction {}: {}", txn.id(), e);
            self.stats.record_failure();
        }

        self.stats.record_finish(&txn);
        if self.audit.record(AuditEntry::from_transaction(&txn)) {
            debug!("Recorded transaction {} in audit log", txn.id());
        }

        txn.cleanup();
        result
    }

    /// Get statistics
    pub fn stats(&self) -> &InspectionStats {
        &self.stats
    }

    /// Get audit log
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Get the current configuration
    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    fn parse_config(config: &ModuleConfig) -> ModuleResult<Option<InspectionConfig>> {
        config
            .raw_config()
            .map(|raw| ConfigLoader::new().load_str::<InspectionConfig>(raw))
            .transpose()
            .map_err(|e| ModuleError::ConfigError(e.to_string()))
    }

    fn apply(&mut self, config: InspectionConfig) {
        self.audit.reconfigure(config.audit.clone());
        self.config = config;
    }

    fn running_status(&self) -> ModuleStatus {
        if self.config.enabled {
            ModuleStatus::Running
        } else {
            ModuleStatus::Degraded {
                reason: "inspection disabled by configuration".to_string(),
            }
        }
    }
}

impl<E: InspectionEngine> ModuleContract for InspectionHandler<E> {
    fn manifest(&self) -> ModuleManifest {
        ModuleManifest::new(
            "inspection",
            "HTTP transaction inspection through an external rule engine",
            env!("CARGO_PKG_VERSION"),
        )
    }

    fn init(&mut self, config: ModuleConfig) -> ModuleResult<()> {
        if self.status != ModuleStatus::Stopped {
            return Err(ModuleError::invalid_state(&self.status, "stopped"));
        }

        info!("Initializing inspection handler");

        if let Some(config) = Self::parse_config(&config)? {
            self.apply(config);
            debug!("Loaded inspection configuration from TOML");
        }

        self.status = ModuleStatus::Initializing;
        info!(
            "Inspection handler initialized (ignore_rules={:?}, force_log={})",
            self.config.ignore_rules, self.config.force_log
        );
        Ok(())
    }

    fn start(&mut self) -> ModuleResult<()> {
        if self.status != ModuleStatus::Initializing {
            return Err(ModuleError::invalid_state(&self.status, "initializing"));
        }

        self.started_at = Some(Instant::now());
        self.status = self.running_status();

        info!("Inspection handler started ({})", self.status);
        Ok(())
    }

    fn stop(&mut self) -> ModuleResult<()> {
        if !self.status.is_operational() {
            return Err(ModuleError::invalid_state(&self.status, "running"));
        }

        self.status = ModuleStatus::Stopped;
        self.started_at = None;

        info!("Inspection handler stopped");
        Ok(())
    }

    fn reload(&mut self, config: ModuleConfig) -> ModuleResult<()> {
        let Some(config) = Self::parse_config(&config)? else {
            return Err(ModuleError::ConfigError(
                "reload requires a configuration".to_string(),
            ));
        };

        self.apply(config);
        if self.status.is_operational() {
            self.status = self.running_status();
        }

        info!("Inspection configuration reloaded");
        Ok(())
    }

    fn status(&self) -> ModuleStatus {
        self.status.clone()
    }

    fn metrics(&self) -> MetricsPayload {
        let mut payload = MetricsPayload::new();

        payload.counter(
            "transactions_started",
            self.stats.transactions_started.load(Ordering::Relaxed),
        );
        payload.counter(
            "transactions_finished",
            self.stats.transactions_finished.load(Ordering::Relaxed),
        );
        payload.counter(
            "transactions_blocked",
            self.stats.transactions_blocked.load(Ordering::Relaxed),
        );
        payload.counter(
            "transactions_bypassed",
            self.stats.transactions_bypassed.load(Ordering::Relaxed),
        );
        payload.counter(
            "logging_skipped",
            self.stats.logging_skipped.load(Ordering::Relaxed),
        );
        payload.counter(
            "engine_failures",
            self.stats.engine_failures.load(Ordering::Relaxed),
        );
        payload.counter("audit_entries", self.audit.count() as u64);

        payload.gauge("block_rate", self.stats.block_rate());
        if let Some(started) = self.started_at {
            payload.gauge("uptime_secs", started.elapsed().as_secs() as f64);
        }

        payload
    }
}
