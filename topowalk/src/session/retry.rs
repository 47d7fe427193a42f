//! Connection retry.

use log::debug;

use super::{Connector, RemoteTarget};
use crate::credentials::Credential;
use crate::error::Result;
use crate::platform::PlatformDefinition;

/// Open a session, retrying failed attempts with the same credential.
///
/// Makes at most `1 + target.retry_attempts` attempts, sleeping
/// `target.retry_delay` in between. Authentication rejections are retried
/// like any other connection error.
pub async fn open_with_retry<C: Connector>(
    connector: &C,
    target: &RemoteTarget,
    credential: &Credential,
    platform: &PlatformDefinition,
) -> Result<C::Session> {
    let attempts = target.retry_attempts.saturating_add(1);
    let mut attempt = 1;

    loop {
        match connector.connect(target, credential, platform).await {
            Ok(session) => return Ok(session),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                debug!(
                    "{}: connection attempt {}/{} as '{}' {}: {}",
                    target.address,
                    attempt,
                    attempts,
                    credential.username,
                    if e.is_auth_rejection() { "rejected" } else { "failed" },
                    e
                );
                attempt += 1;
                tokio::time::sleep(target.retry_delay).await;
            }
        }
    }
}
