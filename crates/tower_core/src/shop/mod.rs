mod engine;
mod order;
mod session;
mod view;

pub use engine::{
    InvariantViolation, ItemState, ItemStateChanged, ItemStateEngine, ItemStateError, ShopEntry,
};
pub use order::{default_selection, order_for_display};
pub use session::{SessionError, ShopSession, SHOP_SUBSCRIBER};
pub use view::{ShopRow, ShopView};
