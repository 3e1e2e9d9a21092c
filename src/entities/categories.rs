use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
    #[sea_orm(has_many = "super::category_models::Entity")]
    CategoryModels,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::models::Entity> for Entity {
    fn to() -> RelationDef {
        super::category_models::Relation::Models.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::category_models::Relation::Categories.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
