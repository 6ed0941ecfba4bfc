// Domain-layer modules and shared errors/models
pub mod completion {
    pub use crate::completion::*;
}

pub mod normalizer {
    pub use crate::normalizer::*;
}

pub mod known_places {
    pub use crate::known_places::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
