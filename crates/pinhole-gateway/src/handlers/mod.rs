mod health;
mod stats;
mod url;

pub use health::health_handler;
pub use stats::stats_handler;
pub use url::{
    create_url_batch_handler, create_url_handler, delete_user_urls_handler, redirect_handler,
    user_urls_handler,
};
