/// Number of backups kept per source when `--copies` is not given.
pub const DEFAULT_COPIES: usize = 12;

/// Environment variable holding an `EnvFilter` directive for log output.
pub const LOG_ENV_VAR: &str = "KEEPBAK_LOG";

/// Log level used when neither `--verbose` nor the environment asks for more.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// How many backups of one source survive a retention pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub copies: usize,
}

impl RetentionPolicy {
    pub fn keep(copies: usize) -> Self {
        Self { copies }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            copies: DEFAULT_COPIES,
        }
    }
}
