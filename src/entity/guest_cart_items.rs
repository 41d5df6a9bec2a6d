use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "guest_cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub product_ename: String,
    pub product_arname: String,
    pub product_image: String,
    pub product_stock: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub sale_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub regular_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))")]
    pub weight: Decimal,
    pub quantity: i32,
    pub added_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::guest_carts::Entity",
        from = "Column::CartId",
        to = "super::guest_carts::Column::Id",
        on_delete = "Cascade"
    )]
    GuestCarts,
}

impl Related<super::guest_carts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GuestCarts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
