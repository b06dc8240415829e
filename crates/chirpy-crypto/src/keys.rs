use rand_core::{OsRng, RngCore};

/// Refresh tokens carry 256 bits of entropy.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate an opaque refresh token: 32 bytes from the OS CSPRNG, hex-encoded.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
