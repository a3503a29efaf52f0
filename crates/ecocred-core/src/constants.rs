/// ─── EcoCred Ledger Constants ───────────────────────────────────────────────
///
/// Credit unit:  18-decimal fixed point (1 credit = 10^18 base units)
/// Native unit:  18-decimal fixed point, used only for marketplace payments

// ── Units ────────────────────────────────────────────────────────────────────

/// Decimal places of the credit token.
pub const CREDIT_DECIMALS: u32 = 18;

/// One whole credit expressed in base units.
pub const CREDIT_UNIT: u128 = 1_000_000_000_000_000_000;

/// One whole native coin expressed in base units.
pub const NATIVE_UNIT: u128 = 1_000_000_000_000_000_000;

/// Denominator for every basis-point quantity (fees, reward rates, multipliers).
pub const BPS_DENOMINATOR: u128 = 10_000;

pub const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Staking rewards are annualised over a 365-day year.
pub const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

// ── Verification ──────────────────────────────────────────────────────────────

/// Distinct verifier verdicts required to finalize an action.
pub const DEFAULT_VERIFICATION_THRESHOLD: u32 = 1;

/// Awarded amount at or above which the company receives a badge (100 credits).
pub const DEFAULT_BADGE_THRESHOLD: u128 = 100 * CREDIT_UNIT;

pub const MAX_TITLE_BYTES: usize = 200;
pub const MAX_DESCRIPTION_BYTES: usize = 4_096;
pub const MAX_LOCATION_BYTES: usize = 256;
pub const MAX_CATEGORY_BYTES: usize = 64;
pub const MAX_COMMENTS_BYTES: usize = 1_024;

// ── Reputation ────────────────────────────────────────────────────────────────

/// Whole verified credits per reputation point.
pub const CREDITS_PER_REPUTATION_POINT: u128 = 10;

/// Reputation score ceiling.
pub const MAX_REPUTATION_SCORE: u32 = 1_000;

/// Multiplier that leaves awarded credits unchanged (1.0×).
pub const NEUTRAL_MULTIPLIER_BPS: u32 = 10_000;

// ── Marketplace ───────────────────────────────────────────────────────────────

/// Default platform fee: 2.5 %.
pub const DEFAULT_PLATFORM_FEE_BPS: u16 = 250;

/// Platform fee ceiling: 10 %.
pub const MAX_PLATFORM_FEE_BPS: u16 = 1_000;

// ── Staking ───────────────────────────────────────────────────────────────────

/// Default annual reward rate: 5 %.
pub const DEFAULT_REWARD_RATE_BPS: u32 = 500;

pub const DEFAULT_MIN_LOCK_DAYS: u32 = 1;
pub const DEFAULT_MAX_LOCK_DAYS: u32 = 4 * 365;

// ── Retirement ────────────────────────────────────────────────────────────────

pub const MAX_REASON_BYTES: usize = 1_024;
pub const MAX_CERTIFICATE_ID_BYTES: usize = 128;

// ── Governance ────────────────────────────────────────────────────────────────

/// Minimum credit balance to open a proposal (100 credits).
pub const DEFAULT_PROPOSAL_THRESHOLD: u128 = 100 * CREDIT_UNIT;

/// Voting window (seconds). Default: 3 days.
pub const DEFAULT_VOTING_PERIOD_SECS: i64 = 3 * SECONDS_PER_DAY;

/// Minimum total voting power (for + against) for a proposal to execute.
pub const DEFAULT_QUORUM: u128 = 1_000 * CREDIT_UNIT;

pub const MAX_PROPOSAL_DESCRIPTION_BYTES: usize = 4_096;

// ── Events ────────────────────────────────────────────────────────────────────

/// Version stamped on every event envelope handed to indexers.
pub const EVENT_SCHEMA_VERSION: u16 = 1;
