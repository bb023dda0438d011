#![forbid(unsafe_code)]

pub mod identity;
pub mod agreement;
pub mod cipher;

pub mod envelope;
pub mod provider;

#[cfg(test)]
mod proptests;
