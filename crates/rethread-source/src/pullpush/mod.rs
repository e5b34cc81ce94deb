mod client;
mod decode;

pub use client::PullPushClient;
