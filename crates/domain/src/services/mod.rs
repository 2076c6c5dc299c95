//! Domain services for the Battery ERP backend.
//!
//! Services contain business logic that operates on domain models.

pub mod lifecycle;
pub mod qr;

pub use lifecycle::{allowed_next, attempt_transition, permitted_roles, TransitionError};

pub use qr::{
    decode_binding, encode_binding, is_valid_binding, new_battery_id, new_battery_id_now,
    BindingError, QrBinding, BATTERY_ID_PREFIX,
};
