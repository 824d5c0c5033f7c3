pub mod export;
pub mod fastas;
pub mod import;
pub mod stats;
