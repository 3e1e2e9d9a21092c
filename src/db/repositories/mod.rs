pub mod category;
pub mod category_model;
pub mod model;
pub mod product;
pub mod query;
pub mod user;
