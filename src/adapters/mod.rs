// Adapters layer: concrete implementations of the domain ports (browser rendering, local files).

pub mod browser;
pub mod storage;

pub use browser::{ChromePage, ChromeRenderer};
pub use storage::LocalStorage;
