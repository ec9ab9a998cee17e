/// Error code registry for deptstat
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 3000-3999: Input, output and temporary storage errors
/// - 4000-4999: Execution errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_PARSE_ERROR: u16 = 1007;

    // Storage errors (3000-3999)
    pub const INPUT_OPEN_FAILED: u16 = 3001;
    pub const INPUT_MISSING_COLUMN: u16 = 3002;
    pub const INPUT_READ_FAILED: u16 = 3003;
    pub const CHUNK_WRITE_FAILED: u16 = 3010;
    pub const REPORT_WRITE_FAILED: u16 = 3020;

    // Execution errors (4000-4999)
    pub const WORKER_FAILED: u16 = 4001;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_INVALID_VALUE => "Invalid configuration value",
        ErrorCode::CONFIG_PARSE_ERROR => "Configuration file could not be parsed",
        ErrorCode::INPUT_OPEN_FAILED => "Input file could not be opened",
        ErrorCode::INPUT_MISSING_COLUMN => "Input header is missing a configured column",
        ErrorCode::INPUT_READ_FAILED => "Input file could not be read",
        ErrorCode::CHUNK_WRITE_FAILED => "Temporary chunk file could not be written",
        ErrorCode::REPORT_WRITE_FAILED => "Report file could not be written",
        ErrorCode::WORKER_FAILED => "Aggregation worker did not complete",
        _ => "Unknown error",
    }
}
