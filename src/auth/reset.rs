use rand::{rngs::OsRng, RngCore};

/// 32 bytes of OS entropy, 256 bits.
const RESET_TOKEN_BYTES: usize = 32;

/// Generate the opaque single-use secret for the admin-mediated reset
/// workflow. Hex-encoded, so it survives copy-paste through email.
pub fn generate_reset_token() -> String {
    let mut buf = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
