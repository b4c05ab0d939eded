//! Translation handlers: legacy file content in, cloud-config facet out.
//!
//! Each handler only fills the part of [`CloudConfig`] it is responsible for.
//! Matching is done with small line/token scanners rather than regexes.

use std::path::Path;

use crate::domain::{CloudConfig, HandlerError, Unit, User};
use crate::infrastructure::{run_script, script_path, NETWORK_SCRIPT};

/// The translation handlers, one per legacy file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Gentoo `conf.d/net` interface definitions.
    Network,
    /// `authorized_keys` for root.
    SshKeys,
    /// `/etc/shadow` root password hash.
    Shadow,
    /// Gentoo `conf.d/hostname`.
    Hostname,
}

impl Handler {
    /// Handler name for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::SshKeys => "ssh-keys",
            Self::Shadow => "shadow",
            Self::Hostname => "hostname",
        }
    }

    /// Translate file content into a cloud-config.
    ///
    /// # Errors
    /// Returns error if the content cannot be translated.
    pub fn translate(
        self,
        content: &str,
        scripts_dir: &Path,
    ) -> Result<CloudConfig, HandlerError> {
        match self {
            Self::Network => translate_network(content, scripts_dir),
            Self::SshKeys => Ok(translate_ssh_keys(content)),
            Self::Shadow => translate_shadow(content),
            Self::Hostname => Ok(translate_hostname(content)),
        }
    }
}

impl std::fmt::Display for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Generate one networkd unit per distinct interface mentioned in `content`.
///
/// The whole file is fed to the translation script for every interface; the
/// script picks out the part that concerns its argument.
fn translate_network(content: &str, scripts_dir: &Path) -> Result<CloudConfig, HandlerError> {
    let script = script_path(scripts_dir, NETWORK_SCRIPT);
    let mut config = CloudConfig::default();

    for interface in interface_names(content) {
        tracing::debug!(interface, script = %script.display(), "Translating interface");
        let unit = run_script(&script, interface, content.as_bytes())?;
        config.coreos.units.push(Unit::network(interface, unit));
    }

    Ok(config)
}

/// Distinct `eth<digits>` tokens in first-seen order.
///
/// Tokens are not word-anchored: `veth0` yields `eth0`.
fn interface_names(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut names: Vec<&str> = Vec::new();
    let mut pos = 0;

    while let Some(offset) = content[pos..].find("eth") {
        let start = pos + offset;
        let digits_start = start + 3;
        let digits = bytes[digits_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();

        if digits == 0 {
            pos = digits_start;
            continue;
        }

        let end = digits_start + digits;
        let name = &content[start..end];
        if !names.contains(&name) {
            names.push(name);
        }
        pos = end;
    }

    names
}

/// Collect `ssh-...` keys and authorize each for root.
fn translate_ssh_keys(content: &str) -> CloudConfig {
    let mut config = CloudConfig::default();
    for key in ssh_keys(content) {
        config.authorize_key(key);
    }
    config
}

/// Keys in file order. A key runs from the first `ssh-` on its line to the
/// end of that line and must have at least one character after the prefix.
/// The final line counts even without a trailing newline.
fn ssh_keys(content: &str) -> Vec<&str> {
    content
        .split_inclusive('\n')
        .filter_map(|line| {
            let line = line.strip_suffix('\n').unwrap_or(line);
            let start = line.find("ssh-")?;
            let key = &line[start..];
            (key.len() > "ssh-".len()).then_some(key)
        })
        .collect()
}

/// Extract root's password hash and apply it to both `root` and `core`.
fn translate_shadow(content: &str) -> Result<CloudConfig, HandlerError> {
    let hash = root_password_hash(content).ok_or(HandlerError::MissingPasswordHash)?;

    let users = ["root", "core"]
        .into_iter()
        .map(|name| User {
            password_hash: Some(hash.to_owned()),
            ..User::named(name)
        })
        .collect();

    Ok(CloudConfig {
        users,
        ..Default::default()
    })
}

/// Hash from the first newline-terminated `root:<hash>:<rest>` line.
fn root_password_hash(content: &str) -> Option<&str> {
    content
        .split_inclusive('\n')
        .filter_map(|line| line.strip_suffix('\n'))
        .find_map(|line| {
            let (hash, rest) = line.strip_prefix("root:")?.split_once(':')?;
            (!hash.is_empty() && !rest.is_empty()).then_some(hash)
        })
}

/// Set the hostname from a `HOSTNAME="..."` line, if present.
fn translate_hostname(content: &str) -> CloudConfig {
    CloudConfig {
        hostname: hostname_value(content).map(str::to_owned),
        ..Default::default()
    }
}

/// Value between `HOSTNAME="` and the last `"` on the same line.
fn hostname_value(content: &str) -> Option<&str> {
    const KEY: &str = "HOSTNAME=\"";

    content.lines().find_map(|line| {
        let start = line.find(KEY)? + KEY.len();
        let rest = &line[start..];
        let value = &rest[..rest.rfind('"')?];
        (!value.is_empty()).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_names_dedup_first_seen() {
        let content = "config_eth0=\"dhcp\"\nroutes_eth0=\"default via 10.0.0.1\"\nconfig_eth1=\"10.0.0.2/24\"\n";
        assert_eq!(interface_names(content), vec!["eth0", "eth1"]);
    }

    #[test]
    fn test_interface_names_need_digits() {
        assert_eq!(interface_names("ethernet eth eth12x veth3"), vec!["eth12", "eth3"]);
        assert!(interface_names("").is_empty());
    }

    #[test]
    fn test_network_without_interfaces_is_empty() {
        let config = Handler::Network
            .translate("# nothing here\n", Path::new("/nonexistent"))
            .unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_network_missing_script_fails() {
        let result =
            Handler::Network.translate("config_eth0=\"dhcp\"\n", Path::new("/nonexistent"));
        assert!(matches!(result, Err(HandlerError::ScriptSpawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_network_units_per_interface() {
        use crate::infrastructure::script::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            NETWORK_SCRIPT,
            r#"printf '[Match]\nName=%s\n' "$1"; wc -l | tr -d ' '"#,
        );
        let content = "config_eth0=\"dhcp\"\nconfig_eth0_alias=\"x\"\nconfig_eth1=\"dhcp\"\n";

        let config = Handler::Network.translate(content, dir.path()).unwrap();

        let units = &config.coreos.units;
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].name, "50-eth0.network");
        assert_eq!(units[0].content, "[Match]\nName=eth0\n3\n");
        assert_eq!(units[1].name, "50-eth1.network");
        assert_eq!(units[1].content, "[Match]\nName=eth1\n3\n");
        assert!(config.users.is_empty());
        assert!(config.hostname.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_network_script_failure_discards_units() {
        use crate::infrastructure::script::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            NETWORK_SCRIPT,
            r#"[ "$1" = "eth1" ] && exit 1; echo ok"#,
        );

        let result = Handler::Network.translate("eth0 eth1\n", dir.path());
        assert!(matches!(result, Err(HandlerError::ScriptFailed { .. })));
    }

    #[test]
    fn test_ssh_keys_final_line_without_newline() {
        let config = Handler::SshKeys
            .translate("ssh-rsa AAA...\nssh-ed25519 BBB", Path::new("."))
            .unwrap();

        let expected = vec!["ssh-rsa AAA...".to_string(), "ssh-ed25519 BBB".to_string()];
        assert_eq!(config.ssh_authorized_keys, expected);
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].name, "root");
        assert_eq!(config.users[0].ssh_authorized_keys, expected);
        assert!(config.users[0].password_hash.is_none());
    }

    #[test]
    fn test_ssh_keys_skip_noise() {
        let content = "# keys\n\nssh-\nssh-rsa AAA user@host\nnot a key\n";
        assert_eq!(ssh_keys(content), vec!["ssh-rsa AAA user@host"]);
    }

    #[test]
    fn test_ssh_keys_empty_input() {
        let config = Handler::SshKeys.translate("", Path::new(".")).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_shadow_sets_root_and_core() {
        let config = Handler::Shadow
            .translate("root:$1$abc$def:15839:0:::::\n", Path::new("."))
            .unwrap();

        let names: Vec<_> = config.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["root", "core"]);
        for user in &config.users {
            assert_eq!(user.password_hash.as_deref(), Some("$1$abc$def"));
            assert!(user.ssh_authorized_keys.is_empty());
        }
        assert!(config.ssh_authorized_keys.is_empty());
    }

    #[test]
    fn test_shadow_finds_root_after_other_entries() {
        let content = "bin:*:15839:0:::::\nroot:$6$salt$hash:15839:0:::::\n";
        assert_eq!(root_password_hash(content), Some("$6$salt$hash"));
    }

    #[test]
    fn test_shadow_without_root_is_error() {
        let result = Handler::Shadow.translate("core:$1$x$y:15839:0:::::\n", Path::new("."));
        assert!(matches!(result, Err(HandlerError::MissingPasswordHash)));
    }

    #[test]
    fn test_shadow_requires_complete_line() {
        assert_eq!(root_password_hash("root:$1$abc$def:15839"), None);
        assert_eq!(root_password_hash("root::15839:0\n"), None);
        assert_eq!(root_password_hash("root:$1$abc$def:\n"), None);
        assert_eq!(root_password_hash("xroot:$1$abc$def:1\n"), None);
    }

    #[test]
    fn test_hostname_found() {
        let config = Handler::Hostname
            .translate("# set by installer\nHOSTNAME=\"my-host\"\n", Path::new("."))
            .unwrap();
        assert_eq!(config.hostname.as_deref(), Some("my-host"));
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_hostname_absent_is_empty_document() {
        let config = Handler::Hostname
            .translate("hostname=my-host\n", Path::new("."))
            .unwrap();
        assert!(config.hostname.is_none());
        assert!(config.is_empty());
    }

    #[test]
    fn test_hostname_value_edges() {
        assert_eq!(hostname_value("HOSTNAME=\"\"\n"), None);
        assert_eq!(hostname_value("HOSTNAME=\"a\" # \"b\""), Some("a\" # \"b"));
    }
}
