mod drop_fragment_definitions;
mod drop_unused_operations;
mod extract_variables;
mod inline_fragment_spreads;
mod remove_unused_variables;

pub use drop_fragment_definitions::drop_fragment_definitions;
pub use drop_unused_operations::drop_unused_operations;
pub use extract_variables::extract_variables;
pub use inline_fragment_spreads::inline_fragment_spreads;
pub use remove_unused_variables::remove_unused_variables;
