//! Secret reference resolver.
//!
//! Values in `config.toml` can use special prefixes to reference secrets
//! stored outside the file:
//!
//! - `pass::path/in/store`: runs `pass show path/in/store`, returns first line
//! - `env::VAR_NAME`: reads `$VAR_NAME` from the environment
//! - anything else: returned as-is (plain text)

const PASS_PREFIX: &str = "pass::";
const ENV_PREFIX: &str = "env::";

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix(PASS_PREFIX) {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix(ENV_PREFIX) {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

/// Returns true if `value` points elsewhere instead of holding the secret.
pub fn is_reference(value: &str) -> bool {
    value.starts_with(PASS_PREFIX) || value.starts_with(ENV_PREFIX)
}

/// Masks plain-text secrets for display; references are shown unchanged.
pub fn redact(value: &str) -> String {
    if is_reference(value) || value.is_empty() {
        value.to_string()
    } else {
        "<redacted>".to_string()
    }
}

fn resolve_pass(path: &str) -> Result<String, String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed (exit {}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

fn resolve_env(var: &str) -> Result<String, String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(format!("environment variable `{}` is empty", var)),
        Err(_) => Err(format!("environment variable `{}` is not set", var)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("hello").unwrap(), "hello");
        assert_eq!(
            resolve("xxx.apps.googleusercontent.com").unwrap(),
            "xxx.apps.googleusercontent.com"
        );
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_DUESYNC_SECRET_TEST", "my-secret-value");
        }
        assert_eq!(resolve("env::_DUESYNC_SECRET_TEST").unwrap(), "my-secret-value");
        unsafe {
            std::env::remove_var("_DUESYNC_SECRET_TEST");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_DUESYNC_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(err.contains("not set"));
    }

    #[test]
    fn env_prefix_empty_var_errors() {
        unsafe {
            std::env::set_var("_DUESYNC_EMPTY_SECRET", "");
        }
        assert!(resolve("env::_DUESYNC_EMPTY_SECRET").unwrap_err().contains("empty"));
        unsafe {
            std::env::remove_var("_DUESYNC_EMPTY_SECRET");
        }
    }

    #[test]
    fn pass_prefix_unknown_entry_errors() {
        assert!(resolve("pass::nonexistent/entry/that/should/not/exist/12345").is_err());
    }

    #[test]
    fn redaction() {
        assert!(is_reference("env::X"));
        assert!(is_reference("pass::google/secret"));
        assert!(!is_reference("GOCSPX-abc"));
        assert_eq!(redact("GOCSPX-abc"), "<redacted>");
        assert_eq!(redact("pass::google/secret"), "pass::google/secret");
    }
}
