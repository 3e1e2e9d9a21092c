mod catalog;
mod search;

pub use catalog::{cmd_categories, cmd_models, cmd_products};
pub use search::cmd_search;
