use thiserror::Error;

use crate::DrilldownSource;

/// Caller violated the engine's input contract.
///
/// Unlike a failing reconcile check (a data-quality finding) or a malformed
/// row (skipped and recorded), a contract error aborts the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("unknown mode '{0}' (expected cap | tax | apron)")]
    UnknownMode(String),

    #[error("unknown bucket '{0}' (expected rost | fa | term | 2way)")]
    UnknownBucket(String),

    #[error("unknown threshold '{0}'")]
    UnknownThreshold(String),

    #[error("unknown drilldown source '{0}' (expected salary_book | cap_holds | dead_money)")]
    UnknownSource(String),

    #[error("drilldown source '{0}' supplied more than once")]
    DuplicateSource(DrilldownSource),

    #[error("drilldown table '{table}' contains a record from '{record}'")]
    SourceMismatch {
        table: DrilldownSource,
        record: DrilldownSource,
    },

    #[error("drilldown reconciliation requires at least one source table")]
    NoDrilldownTables,
}
