pub mod assets;
pub mod diagnostics;
pub mod dsl;
pub mod error;
pub mod export;
pub mod graph;
pub mod naming;
pub mod utils;
