use std::env;
use std::time::Duration;

/// Environment variable holding the number of attempts for background writes.
pub const WRITE_RETRIES_ENV: &str = "QUIZZY_WRITE_RETRIES";

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(50);

/// How often a fire-and-forget write is attempted before it is given up on.
///
/// The delay before retry `n` is `backoff * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl WriteRetryPolicy {
    /// At least one attempt is always made.
    #[must_use]
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// A single attempt with no retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Default policy with the attempt count taken from `QUIZZY_WRITE_RETRIES`.
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        match env::var(WRITE_RETRIES_ENV) {
            Ok(raw) => Self::parse_attempts(&raw).unwrap_or_else(|| {
                log::warn!("ignoring invalid {WRITE_RETRIES_ENV}={raw:?}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    fn parse_attempts(raw: &str) -> Option<Self> {
        let attempts = raw.trim().parse::<u32>().ok()?;
        Some(Self::new(attempts, DEFAULT_BACKOFF))
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for WriteRetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BACKOFF)
    }
}
