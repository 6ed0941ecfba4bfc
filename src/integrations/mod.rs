//! External service integrations.

pub mod amap_client {
    pub use crate::amap_client::*;
}

pub mod amap_models {
    pub use crate::amap_models::*;
}
