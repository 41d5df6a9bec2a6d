use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "guest_carts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub guest_id: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::guest_cart_items::Entity")]
    GuestCartItems,
}

impl Related<super::guest_cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GuestCartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
