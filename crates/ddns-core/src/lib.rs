// # ddns-core
//
// Core library for the Gcore DDNS reconciliation daemon.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for listing and replacing record sets via provider APIs
// - **ConfigSource**: Trait for re-reading configuration every cycle
// - **planner**: Pure decision of skip / create / replace for one record
// - **DdnsEngine**: One reconciliation cycle across all configured records
// - **Scheduler**: Runs the engine at a fixed interval with fault containment
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Stateless Cycles**: Config, IP and provider state are re-read every cycle
// 3. **Failure Isolation**: One bad record never blocks the others
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: Records already holding exactly the IP are never written

pub mod traits;
pub mod planner;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsProviderFactory, IpSource};
pub use engine::{
    Cycle, CycleOutcome, DdnsEngine, RecordReport, RecordStatus, Scheduler, Sleeper,
    TokioSleeper,
};
pub use planner::Plan;
pub use config::{Config, ConfigSource, FileConfigSource, RecordSpec, RecordTarget};
pub use error::{Error, Result};
