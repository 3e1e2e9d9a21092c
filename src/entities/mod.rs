pub mod prelude;

pub mod categories;
pub mod category_models;
pub mod models;
pub mod products;
pub mod users;
