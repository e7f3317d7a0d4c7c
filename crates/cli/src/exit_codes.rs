//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | Runtime error (store failure, unwritable output) |
//! | 2    | Usage error (bad args, missing file, bad script) |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Runtime error - the command was valid but could not complete.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable input, malformed script line.
pub const EXIT_USAGE: u8 = 2;
