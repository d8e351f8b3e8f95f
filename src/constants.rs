/// Application constants

// API version
pub const API_VERSION: &str = "v1";

// Pagination
pub const DEFAULT_PAGE_SIZE: i32 = 10;
pub const DEFAULT_CARD_PAGE_SIZE: i32 = 20;
pub const MAX_PAGE_SIZE: i32 = 100;

// Auth
pub const ACCESS_TOKEN_TTL_SECS: u64 = 900; // 15 minutes
pub const REFRESH_TOKEN_TTL_SECS: u64 = 604800; // 7 days
pub const BCRYPT_COST_DEFAULT: u32 = 10;
pub const BCRYPT_MIN_COST: u32 = 4;
pub const BCRYPT_MAX_COST: u32 = 31;
pub const MIN_PASSWORD_LEN: usize = 6;

// Board geometry
pub const BOARD_GRID_MIN: i32 = 0;
pub const BOARD_GRID_MAX: i32 = 9;

// Rent validation
pub const MAX_RENT_VALUE: i32 = 1_000_000;

// Default chain for wallet registrations
pub const DEFAULT_CHAIN: &str = "BASE";

// Caching
pub const CACHE_TTL_SECS: u64 = 300; // 5 minutes
pub const CACHE_KEY_PREFIX: &str = "cache";

// Rate limits (requests per fixed window)
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
pub const RATE_LIMIT_CREATE_USER: u32 = 5;
pub const RATE_LIMIT_LIST_USERS: u32 = 50;
pub const RATE_LIMIT_GET_USER: u32 = 100;
pub const RATE_LIMIT_REQUESTS_PER_MINUTE: u32 = 60;
pub const RATE_LIMIT_REQUESTS_PER_HOUR: u32 = 1000;

// Background service intervals
pub const TOKEN_SWEEP_INTERVAL_SECS: u64 = 3600;
