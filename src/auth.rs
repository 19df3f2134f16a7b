//! Collecting credentials for native mode.

use std::path::Path;
use std::sync::Arc;

use russh::keys::{decode_secret_key, PrivateKey};

use crate::config::Config;
use crate::error::LlshError;
use crate::task::AuthMethod;

/// Prompts for whatever the flags ask for. External mode uses the ssh
/// binary's own authentication, so nothing is collected there.
pub fn auth_methods(config: &Config) -> Result<Vec<AuthMethod>, LlshError> {
    let mut methods = vec![];
    if config.use_ssh_command {
        return Ok(methods);
    }
    if config.password {
        let password = rpassword::prompt_password("Password: ").map_err(LlshError::Prompt)?;
        methods.push(AuthMethod::Password(password));
    }
    if let Some(path) = &config.private_key {
        let key = load_private_key(path)?;
        methods.push(AuthMethod::PrivateKey(Arc::new(key)));
    }
    Ok(methods)
}

/// Reads a private key file, asking for the passphrase if it is encrypted.
pub fn load_private_key(path: &Path) -> Result<PrivateKey, LlshError> {
    let content = std::fs::read_to_string(path).map_err(|source| LlshError::KeyFile {
        path: path.to_path_buf(),
        source,
    })?;
    decode_private_key(&content, || {
        rpassword::prompt_password(format!("Enter passphrase for key {:?}: ", path))
    })
}

/// Decodes key text. `passphrase` is only called for encrypted keys.
pub fn decode_private_key<F>(content: &str, passphrase: F) -> Result<PrivateKey, LlshError>
where
    F: FnOnce() -> std::io::Result<String>,
{
    match decode_secret_key(content, None) {
        Ok(key) => Ok(key),
        Err(russh::keys::Error::KeyIsEncrypted) => {
            log::debug!("private key is encrypted, asking for passphrase");
            let passphrase = passphrase().map_err(LlshError::Prompt)?;
            Ok(decode_secret_key(content, Some(passphrase.as_str()))?)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::test_keys::{ED25519_ENCRYPTED_KEY, ED25519_KEY, ED25519_PASSPHRASE};

    #[test]
    fn test_plain_key_does_not_prompt() {
        let key = decode_private_key(ED25519_KEY, || panic!("prompted for passphrase")).unwrap();
        assert_eq!(key.algorithm(), russh::keys::Algorithm::Ed25519);
    }

    #[test]
    fn test_encrypted_key_asks_for_passphrase_once() {
        let mut prompts = 0;
        let key = decode_private_key(ED25519_ENCRYPTED_KEY, || {
            prompts += 1;
            Ok(ED25519_PASSPHRASE.to_string())
        })
        .unwrap();
        assert_eq!(prompts, 1);
        assert_eq!(key.algorithm(), russh::keys::Algorithm::Ed25519);
    }

    #[test]
    fn test_encrypted_key_wrong_passphrase() {
        let result = decode_private_key(ED25519_ENCRYPTED_KEY, || Ok("wrong".to_string()));
        assert!(matches!(result, Err(LlshError::Key(_))));
    }

    #[test]
    fn test_encrypted_key_prompt_failure() {
        let result = decode_private_key(ED25519_ENCRYPTED_KEY, || {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no tty"))
        });
        assert!(matches!(result, Err(LlshError::Prompt(_))));
    }

    #[test]
    fn test_native_mode_loads_key_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(ED25519_KEY.as_bytes()).unwrap();
        let config = Config::try_parse_from([
            "llsh",
            "--hosts",
            "a",
            "-c",
            "ls",
            "--use-ssh-command",
            "false",
            "-k",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        let methods = auth_methods(&config).unwrap();
        assert!(matches!(methods.as_slice(), [AuthMethod::PrivateKey(_)]));
    }

    #[test]
    fn test_garbage_key_does_not_prompt() {
        let result = decode_private_key("not a key", || panic!("prompted for passphrase"));
        assert!(matches!(result, Err(LlshError::Key(_))));
    }

    #[test]
    fn test_missing_key_file() {
        let result = load_private_key(Path::new("/nonexistent/llsh/id_rsa"));
        assert!(matches!(result, Err(LlshError::KeyFile { .. })));
    }

    #[test]
    fn test_unreadable_key_content() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"-----BEGIN NONSENSE-----\n").unwrap();
        assert!(matches!(
            load_private_key(file.path()),
            Err(LlshError::Key(_))
        ));
    }

    #[test]
    fn test_external_mode_collects_nothing() {
        // With the ssh binary in charge, -k is ignored and the file is never read.
        let config = Config::try_parse_from([
            "llsh",
            "--hosts",
            "a",
            "-c",
            "ls",
            "-k",
            "/nonexistent/llsh/id_rsa",
        ])
        .unwrap();
        assert!(auth_methods(&config).unwrap().is_empty());
    }

    #[test]
    fn test_native_mode_reads_key_file() {
        let config = Config::try_parse_from([
            "llsh",
            "--hosts",
            "a",
            "-c",
            "ls",
            "--use-ssh-command",
            "false",
            "-k",
            "/nonexistent/llsh/id_rsa",
        ])
        .unwrap();
        assert!(matches!(
            auth_methods(&config),
            Err(LlshError::KeyFile { .. })
        ));
    }
}
