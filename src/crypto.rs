pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    #[cfg(feature = "aws-lc-rs")]
    return aws_lc_rs::hmac::sign(
        &aws_lc_rs::hmac::Key::new(aws_lc_rs::hmac::HMAC_SHA256, key),
        data,
    )
    .as_ref()
    .to_vec();

    #[cfg(all(feature = "ring", not(feature = "aws-lc-rs")))]
    return ring::hmac::sign(&ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key), data)
        .as_ref()
        .to_vec();

    #[cfg(not(any(feature = "aws-lc-rs", feature = "ring")))]
    unimplemented!();
}
