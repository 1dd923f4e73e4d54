//! External service integrations.

pub mod turnstile {
    pub use crate::turnstile::*;
}

pub mod klaviyo {
    pub use crate::klaviyo::*;
}

pub mod crm_sync {
    pub use crate::crm_sync::*;
}

pub mod submission_store {
    pub use crate::submission_store::*;
}
