use std::time::Duration;

/// URL scheme accepted by the command URL surface (`menushade://toggle`).
pub const URL_SCHEME: &str = "menushade";

/// Query parameter carrying the prefilled search text (`menushade://search?q=wifi`).
pub const SEARCH_QUERY_PARAM: &str = "q";

/// Bundle identifier prefix of the competitor tool whose profiles are imported.
///
/// Tokens naming the tool itself cannot be moved and are skipped.
pub const IMPORT_SOURCE_BUNDLE_ID: &str = "com.surteesstudios.Bartender";

/// Hard limit on a single script trigger run before it is killed.
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Smallest allowed interval between script trigger runs.
pub const MIN_SCRIPT_INTERVAL: Duration = Duration::from_secs(1);

/// Exit code reported when the script trigger could not be launched or timed out.
pub const SCRIPT_FAILURE_EXIT_CODE: i32 = -1;

/// Hover delay bounds (seconds) before a hover reveals the hidden section.
pub const MIN_HOVER_DELAY: Duration = Duration::from_millis(100);
pub const MAX_HOVER_DELAY: Duration = Duration::from_secs(2);

/// Default delay before an automatic rehide.
pub const DEFAULT_REHIDE_DELAY: Duration = Duration::from_secs(5);

/// Reason shown by the credential prompt when revealing hidden icons.
pub const REVEAL_AUTH_REASON: &str = "Unlock hidden icons";
