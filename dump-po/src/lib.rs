//! Persisted objects of the shop domain.
//!
//! Each entity is declared with [`dump_data_sqlx::entity!`] and gets a
//! repository alias over the generic engine:
//!
//! ```ignore
//! let db = Database::connect(&config).await?;
//! dump_po::create_schema(&db).await?;
//! let goods: GoodsRepository = db.repository();
//! ```

mod entities;
mod schema;

pub use entities::*;
pub use schema::{create_schema, schema};

use dump_data_sqlx::SqlxRepository;

pub type AdminRepository = SqlxRepository<Admin>;
pub type CartRepository = SqlxRepository<Cart>;
pub type DeliveryRepository = SqlxRepository<Delivery>;
pub type GoodsRepository = SqlxRepository<Goods>;
pub type OrderRepository = SqlxRepository<Order>;
pub type OrderDetailRepository = SqlxRepository<OrderDetail>;
pub type OrderLogRepository = SqlxRepository<OrderLog>;
pub type ProductRepository = SqlxRepository<Product>;
pub type UserRepository = SqlxRepository<User>;
