//! Process exit codes. Part of the CLI contract.

pub const SUCCESS: i32 = 0;
pub const CONFIG_ERROR: i32 = 2; // Bad config, missing credential, aborted run
pub const INTERRUPTED: i32 = 130; // Ctrl-C; target restored before exit
