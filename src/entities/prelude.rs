pub use super::categories::Entity as Categories;
pub use super::category_models::Entity as CategoryModels;
pub use super::models::Entity as Models;
pub use super::products::Entity as Products;
pub use super::users::Entity as Users;
