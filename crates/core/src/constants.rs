/// Resin thresholds used when an account does not configure its own
pub const DEFAULT_RESIN_THRESHOLDS: &[u32] = &[180];

/// Timezone used when an account does not configure one
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Daily commissions per day when upstream omits the field
pub const DEFAULT_COMMISSIONS_TOTAL: u32 = 4;

/// Prefix of the persisted threshold name, e.g. `resin_180`
pub const RESIN_THRESHOLD_PREFIX: &str = "resin_";

/// Page size used by lazy window iterators over the snapshot store
pub const SNAPSHOT_PAGE_SIZE: i64 = 256;

/// Canonical storage format for instants (fixed width so text ordering is time ordering)
pub const STORAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Display format for local times in notifications
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M %Z";
