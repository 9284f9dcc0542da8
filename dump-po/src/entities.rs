use dump_data_sqlx::entity;

entity! {
    /// Back-office account.
    pub struct Admin in "admin" {
        name: String => set_name,
        password: String => set_password,
        created: i64 => set_created,
        updated: i64 => set_updated,
    }
}

entity! {
    pub struct User in "user" {
        name: String => set_name,
        /// Balance in cents.
        money: i64 => set_money,
        password: String => set_password,
        created: i64 => set_created,
        updated: i64 => set_updated,
    }
}

entity! {
    /// A product on sale.
    pub struct Goods in "goods" {
        name: String => set_name,
        /// Price in cents.
        price: i64 => set_price,
        stock: i64 => set_stock,
        tag: String => set_tag,
        created: i64 => set_created,
        updated: i64 => set_updated,
    }
}

entity! {
    pub struct Cart in "cart" {
        user_id: i64 => set_user_id,
        goods_id: i64 => set_goods_id,
        num: i64 => set_num,
        created: i64 => set_created,
        updated: i64 => set_updated,
    }
}

entity! {
    pub struct Order in "order" {
        order_no: String => set_order_no,
        user_id: i64 => set_user_id,
        total_price: i64 => set_total_price,
        status: String => set_status,
        created: i64 => set_created,
        updated: i64 => set_updated,
    }
}

entity! {
    /// One goods line of an order.
    pub struct OrderDetail in "order_detail" {
        order_no: String => set_order_no,
        goods_id: i64 => set_goods_id,
        goods_name: String => set_goods_name,
        num: i64 => set_num,
        created: i64 => set_created,
        updated: i64 => set_updated,
    }
}

entity! {
    /// Order status history. Rows are only ever appended.
    pub struct OrderLog in "order_log" {
        order_no: String => set_order_no,
        status: String => set_status,
        remark: Option<String> => set_remark,
        created: i64 => set_created,
    }
}

entity! {
    pub struct Delivery in "delivery" {
        admin_id: i64 => set_admin_id,
        order_no: String => set_order_no,
        tracking_number: String => set_tracking_number,
        created: i64 => set_created,
        updated: i64 => set_updated,
    }
}

entity! {
    pub struct Product in "product" {
        name: String => set_name,
        sku: String => set_sku,
        price: i64 => set_price,
        description: Option<String> => set_description,
        created: i64 => set_created,
        updated: i64 => set_updated,
    }
}
