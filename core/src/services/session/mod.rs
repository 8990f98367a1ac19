//! Session tracking tied to issued token pairs

mod service;

#[cfg(test)]
mod tests;

pub use service::SessionService;
