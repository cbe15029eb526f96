pub mod structured_logging;

pub use structured_logging::{
    capture_structured_logs,
    init_structured_logging,
    init_test_logging,
    JsonFormatter,
    LoggingConfig,
    StructuredLogEntry,
    ExecutionContext,
};
