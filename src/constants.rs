/// Application constants

// API version
pub const API_VERSION: &str = "v1";

// Root of the on-chain rule tables (table sheets)
pub const DEFAULT_TABLE_SHEET_ADDRESS: &str = "0x0000000000000000000000000000000000000003";

// Derivation labels
pub const INVENTORY_SALT: &str = "inventory";
pub const WORLD_INFORMATION_SALT: &str = "worldInformation";
pub const ITEM_SLOT_SALT_PREFIX: &str = "itemslot";
pub const RUNE_SLOT_SALT_PREFIX: &str = "runeslot";

// Arena simulator
pub const ARENA_MAX_ACTIONS_PER_TURN: u32 = 5;
pub const ARENA_MAX_TURNS: u32 = 20;
pub const ARENA_HP_MODIFIER: i64 = 5;

// Bencodex decoder nesting guard
pub const MAX_VALUE_NESTING_DEPTH: usize = 128;

// Headless client
pub const HEADLESS_JWT_EXPIRY_SECS: i64 = 60;
