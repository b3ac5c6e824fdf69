pub mod buttons;
pub mod flash;
pub mod led;
pub mod pins;
pub mod stepper;
pub mod tick;
pub mod watchdog;

pub use buttons::ReceiverInputs;
pub use flash::FlashStore;
pub use led::Led;
pub use pins::BoardPins;
pub use stepper::A4988;
