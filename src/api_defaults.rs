// Seconds to keep a response in storage when the caller does not say
// otherwise and the response carries no Expires header. 5 minutes.
pub const DEFAULT_STORAGE_EXPIRES: u64 = 300;

// Relative to $HOME
pub const CONFIG_PATH: &str = ".config/fresh-fetch/config";

// Relative to $HOME. Used when the config file does not set
// storage_location.
pub const DEFAULT_STORAGE_LOCATION: &str = ".cache/fresh-fetch";

pub const USER_AGENT: &str = concat!("fresh-fetch/", env!("CARGO_PKG_VERSION"));
