use rand::{rngs::OsRng, RngCore};

/// 32 random bytes, hex encoded.
pub fn new_verification_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub const VERIFIED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Email verified</title>
</head>
<body style="font-family: Arial, sans-serif; padding: 40px; text-align: center; color: #333;">
  <h2 style="color: #4CAF50;">Your email has been verified</h2>
  <p>You can now close this page and log in.</p>
</body>
</html>
"#;

pub const VERIFY_FAILED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Verification failed</title>
</head>
<body style="font-family: Arial, sans-serif; padding: 40px; text-align: center; color: #333;">
  <h2 style="color: #E53935;">This verification link is invalid or has already been used</h2>
  <p>Log in again to receive a fresh verification email.</p>
</body>
</html>
"#;
