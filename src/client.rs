use lazy_static::lazy_static;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use tokio::time::Duration;

const USER_AGENT: &str = concat!("k2batch/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    static ref HTTP: ClientWithMiddleware = {
        let backoff = ExponentialBackoff::builder().build_with_max_retries(4);
        let inner = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest::Client::builder()");

        ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(backoff))
            .build()
    };
}

/// Shared HTTP client; transient errors are retried with exponential backoff.
pub fn http_client() -> &'static ClientWithMiddleware {
    &HTTP
}
