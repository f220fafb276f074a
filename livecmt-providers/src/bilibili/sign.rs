//! Request signing for the legacy play URL API

/// Sign a parameter string with the app secret.
///
/// The signature is the lowercase hex MD5 of `params + secret`, two hex
/// characters per digest byte.
#[must_use]
pub fn sign_params(params: &str, secret: &str) -> String {
    let mut input = String::with_capacity(params.len() + secret.len());
    input.push_str(params);
    input.push_str(secret);
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// A time-stamped, signed play URL request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Unsigned parameter string
    pub params: String,
    /// Unix seconds embedded in `params`
    pub timestamp: i64,
    pub sign: String,
    pub url: String,
}

impl SignedRequest {
    /// Build the request for `room_id` at `timestamp`.
    ///
    /// Pure: the same inputs always give the same URL.
    #[must_use]
    pub fn new(base_url: &str, app_key: &str, secret: &str, room_id: &str, timestamp: i64) -> Self {
        let params =
            format!("appkey={app_key}&cid={room_id}&player=1&quality=0&ts={timestamp}");
        let sign = sign_params(&params, secret);
        let url = format!("{base_url}/api/playurl?{params}&sign={sign}");

        Self {
            params,
            timestamp,
            sign,
            url,
        }
    }
}
