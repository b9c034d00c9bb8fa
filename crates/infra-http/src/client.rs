// Shared reqwest client
// reason: one connection pool per process, built once in the daemon
use std::time::Duration;

/// Per-request timeout of every HTTP adapter
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("homewatch/", env!("CARGO_PKG_VERSION"));

/// Build the client shared by all HTTP adapters
///
/// # Errors
/// Returns error if the TLS backend cannot be initialized
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Status and (truncated) body of a non-success response
pub(crate) async fn failure_details(response: reqwest::Response) -> (u16, String) {
    const MAX_BODY: usize = 512;

    let status = response.status().as_u16();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_BODY {
        let mut cut = MAX_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    (status, body)
}
