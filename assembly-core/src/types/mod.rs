/// Core types shared across all assembly-util crates
pub mod checksum;
pub mod object;

pub use checksum::{aggregate_checksum, md5_hex, round_fraction, GC_DECIMALS};
pub use object::{ObjectInfo, Upa, ASSEMBLY_TYPE};
