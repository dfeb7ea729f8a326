//! Constants for the banking portal core
//!
//! Field limits mirror the column definitions of the accounts table.

// Account record limits
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const ACCOUNT_NUMBER_MAX_LENGTH: usize = 20;

// Balance storage precision: numeric(12, 2)
pub const BALANCE_MAX_DIGITS: u32 = 12;
pub const BALANCE_DECIMAL_PLACES: u32 = 2;
pub const BALANCE_MAX_INTEGER_DIGITS: u32 = BALANCE_MAX_DIGITS - BALANCE_DECIMAL_PLACES;

// Display fallbacks for the home view
pub const ACCOUNT_NUMBER_NOT_SET: &str = "Not set";
pub const BALANCE_NOT_SET: &str = "0.00";

// Password policy
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_SIMILARITY: f64 = 0.7;

// Key under which form-wide errors are reported
pub const NON_FIELD_ERRORS: &str = "__all__";

// Error messages shown next to form fields
pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";
pub const MSG_PASSWORD_MISMATCH: &str = "The two password fields didn’t match.";
pub const MSG_DUPLICATE_USERNAME: &str = "A user with that username already exists.";
pub const MSG_INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
