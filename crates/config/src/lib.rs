pub mod env;
pub mod tracing_init;

pub use env::AppConfig;
pub use tracing_init::init_tracing;

// Env-var mutating tests across this crate serialize on one lock.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
