pub mod nesting;
pub mod preprocessor;
pub mod url_rebase;
