pub mod capture;
pub mod pick_buffer;
pub mod preview;
