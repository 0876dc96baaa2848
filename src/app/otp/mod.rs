pub mod store;
pub mod sweeper;

/// Code generation, storage is up to the implementor
pub trait OtpManager {
    fn generate_otp(&self) -> String;
}
