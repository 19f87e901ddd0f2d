pub mod controller;
pub mod reading;
pub mod registers;

pub use controller::VfdController;
pub use reading::Reading;
