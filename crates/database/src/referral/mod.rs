pub mod model;

#[cfg(test)]
mod tests;

pub use model::*;
