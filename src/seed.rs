/// Standard 64-bit FNV-1a parameters.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Modulus applied to the prompt hash. Keeps the result strictly below 2^32.
const HASH_MODULUS: u64 = (1 << 32) - 1;

/// FNV-1a over the UTF-8 bytes of `input`.
pub fn fnv1a_64(input: &[u8]) -> u64 {
    input.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Portable prompt hash used when no explicit seed is given.
pub fn stable_hash(prompt: &str) -> u32 {
    // always < 2^32 after the reduction
    (fnv1a_64(prompt.trim().as_bytes()) % HASH_MODULUS) as u32
}

/// Resolve the seed that drives every random draw for a request.
///
/// An explicit seed wins (including `0`) and is reduced modulo 2^32 into the
/// non-negative range. Without one the trimmed prompt is hashed, so the same
/// prompt always lands on the same image.
pub fn resolve(prompt: &str, explicit: Option<i64>) -> u32 {
    match explicit {
        Some(seed) => seed.rem_euclid(1 << 32) as u32,
        None => stable_hash(prompt),
    }
}
