//! Registry authentication.
//!
//! Credentials come from the environment (variable names are configurable),
//! are handed to `docker login` over stdin, and are never logged, never
//! placed on a command line, and never written to disk. An invalid credential
//! is fatal to the run; no retry.

use crate::config::CredentialSource;
use crate::error::{RegistryError, Result};
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for `docker login` / `docker logout`
const LOGIN_TIMEOUT: Duration = Duration::from_secs(60);

/// A username/token pair for one registry.
///
/// The token is deliberately private and redacted from `Debug` output.
#[derive(Clone)]
pub struct RegistryCredentials {
    username: String,
    token: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl RegistryCredentials {
    /// Read credentials from the process environment
    pub fn from_env(source: &CredentialSource) -> Result<Self> {
        Self::from_lookup(source, |name| std::env::var(name).ok())
    }

    /// Read credentials through a caller-supplied lookup (testable seam)
    pub fn from_lookup(
        source: &CredentialSource,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let fetch = |variable: &str| -> Result<String> {
            match lookup(variable) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(RegistryError::MissingCredential {
                    variable: variable.to_string(),
                }
                .into()),
            }
        };
        Ok(Self {
            username: fetch(&source.username_var)?,
            token: fetch(&source.token_var)?,
        })
    }

    /// Registry username (safe to display)
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Authenticate the local docker client against a registry.
///
/// Runs `docker login --username <user> --password-stdin <registry>` and
/// writes the token to the child's stdin. Side effect: subsequent push
/// operations against that registry are authorized.
pub async fn login(registry: &str, credentials: &RegistryCredentials) -> Result<()> {
    let mut child = Command::new("docker")
        .args([
            "login",
            "--username",
            credentials.username(),
            "--password-stdin",
            registry,
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RegistryError::LoginFailed {
            registry: registry.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(credentials.token.as_bytes())
            .await
            .map_err(|e| RegistryError::LoginFailed {
                registry: registry.to_string(),
                reason: format!("failed to pass credentials: {e}"),
            })?;
        // drop closes the pipe so docker sees EOF
    }

    let output = timeout(LOGIN_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| RegistryError::LoginFailed {
            registry: registry.to_string(),
            reason: format!("login timed out after {} seconds", LOGIN_TIMEOUT.as_secs()),
        })?
        .map_err(|e| RegistryError::LoginFailed {
            registry: registry.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(RegistryError::LoginFailed {
            registry: registry.to_string(),
            reason: if stderr.is_empty() {
                format!("exit code {}", output.status.code().unwrap_or(-1))
            } else {
                stderr
            },
        }
        .into());
    }

    log::debug!("authenticated to {registry} as {}", credentials.username());
    Ok(())
}

/// Best-effort `docker logout`; failures are logged, never fatal.
pub async fn logout(registry: &str) {
    let result = timeout(
        LOGIN_TIMEOUT,
        Command::new("docker")
            .args(["logout", registry])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
    )
    .await;

    match result {
        Ok(Ok(status)) if status.success() => {
            log::debug!("logged out of {registry}");
        }
        _ => {
            log::warn!("docker logout {registry} did not complete cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> CredentialSource {
        CredentialSource::default()
    }

    #[test]
    fn reads_both_variables() {
        let creds = RegistryCredentials::from_lookup(&source(), |name| match name {
            "REGISTRY_USERNAME" => Some("greenbonebot".to_string()),
            "REGISTRY_TOKEN" => Some("s3cret".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(creds.username(), "greenbonebot");
    }

    #[test]
    fn missing_or_empty_token_is_an_error() {
        let missing = RegistryCredentials::from_lookup(&source(), |name| {
            (name == "REGISTRY_USERNAME").then(|| "user".to_string())
        });
        assert!(missing.is_err());

        let empty = RegistryCredentials::from_lookup(&source(), |name| match name {
            "REGISTRY_USERNAME" => Some("user".to_string()),
            _ => Some(String::new()),
        });
        assert!(empty.is_err());
    }

    #[test]
    fn debug_output_never_contains_the_token() {
        let creds = RegistryCredentials::from_lookup(&source(), |name| match name {
            "REGISTRY_USERNAME" => Some("user".to_string()),
            "REGISTRY_TOKEN" => Some("hunter2".to_string()),
            _ => None,
        })
        .unwrap();
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn custom_variable_names_are_honored() {
        let source = CredentialSource {
            username_var: "DOCKERHUB_USERNAME".to_string(),
            token_var: "DOCKERHUB_TOKEN".to_string(),
        };
        let creds = RegistryCredentials::from_lookup(&source, |name| match name {
            "DOCKERHUB_USERNAME" => Some("user".to_string()),
            "DOCKERHUB_TOKEN" => Some("tok".to_string()),
            _ => None,
        });
        assert!(creds.is_ok());
    }
}
