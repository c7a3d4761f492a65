mod client;
mod notifier;
mod status;

pub use notifier::notify;
