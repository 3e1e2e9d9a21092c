pub mod catalog;

pub use catalog::{
    Category, CategoryChanges, CategoryModel, Model, ModelChanges, ModelGroup, NewCategory,
    NewModel, NewProduct, Product, ProductChanges,
};
