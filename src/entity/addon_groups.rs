use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "addon_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub is_required: bool,
    pub max_selections: i32,
    /// JSONB array of `{name, price}` options, mirrored into
    /// `domain::catalog::AddOnOption` when read.
    pub options: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::menu_items::Entity",
        from = "Column::MenuItemId",
        to = "super::menu_items::Column::Id"
    )]
    MenuItems,
}

impl Related<super::menu_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
