//! Content checksums and fixed-precision rounding for stored statistics

/// Decimal places kept for every stored GC fraction
pub const GC_DECIMALS: usize = 5;

/// Lowercase hex MD5 of a byte slice
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Order-independent checksum over a set of per-contig checksums.
///
/// The checksums are sorted lexicographically and joined with `,` before
/// hashing, so two files holding the same contigs in a different order
/// produce the same value. An empty set hashes the empty string.
pub fn aggregate_checksum<S: AsRef<str>>(checksums: &[S]) -> String {
    let mut sorted: Vec<&str> = checksums.iter().map(|c| c.as_ref()).collect();
    sorted.sort_unstable();
    md5_hex(sorted.join(",").as_bytes())
}

/// Round to [`GC_DECIMALS`] places using correctly rounded decimal formatting
pub fn round_fraction(value: f64) -> f64 {
    let formatted = format!("{:.*}", GC_DECIMALS, value);
    formatted.parse().unwrap_or(value)
}
