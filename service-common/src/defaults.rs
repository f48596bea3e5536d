use std::time::Duration;

#[inline]
pub fn client_id() -> String {
    "cf".into()
}

#[inline]
pub fn drain_type() -> String {
    "all".into()
}

#[inline]
pub const fn interval() -> Duration {
    Duration::from_secs(60)
}

#[inline]
pub const fn timeout() -> Duration {
    Duration::from_secs(5)
}

#[inline]
pub const fn skip_cert_verify() -> bool {
    false
}
