//! Records owned by the document store.

mod device;
mod user;

pub use device::{is_valid_asset_code, Calibration, Certificate, Device, NewDevice};
pub use user::{Permissions, Role, User};
