//! OS family classification
//!
//! Providers report operating systems as free text (`"Ubuntu 20.04"`,
//! `"Microsoft Windows Server 2019"`, ...). Classification is
//! first-match-wins: Linux distros first (with a RouterOS-on-Linux override
//! driven by the description field), then Windows, RouterOS, VMware, Cisco,
//! else `Other`.

use regex::Regex;
use std::sync::OnceLock;

pub const OS_LINUX: &str = "Linux";
pub const OS_ROUTEROS: &str = "RouterOS";
pub const OS_WINDOWS: &str = "Windows";
pub const OS_VMWARE: &str = "VMware";
pub const OS_CISCO: &str = "Cisco";
pub const OS_OTHER: &str = "Other";

// Patterns are anchored: "Linux" may appear anywhere, distro names must
// lead the string.
fn linux_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)(?:.*Linux|Ubuntu|Debian|CentOS|RedHat|Alpine|Gentoo|ROCK)")
            .expect("static regex")
    })
}

fn routeros_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i).*RouterOS").expect("static regex"))
}

fn windows_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i).*Windows").expect("static regex"))
}

fn vmware_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i).*VMware").expect("static regex"))
}

fn cisco_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i).*Cisco").expect("static regex"))
}

/// Classify an OS label into a family name.
///
/// A Linux match combined with a RouterOS description classifies as
/// RouterOS (RouterOS appliances report a Linux kernel).
pub fn os_family(os: &str, description: Option<&str>) -> &'static str {
    if linux_re().is_match(os) {
        if description.is_some_and(|d| routeros_re().is_match(d)) {
            return OS_ROUTEROS;
        }
        OS_LINUX
    } else if windows_re().is_match(os) {
        OS_WINDOWS
    } else if routeros_re().is_match(os) {
        OS_ROUTEROS
    } else if vmware_re().is_match(os) {
        OS_VMWARE
    } else if cisco_re().is_match(os) {
        OS_CISCO
    } else {
        OS_OTHER
    }
}

/// Rewrite the OS label under the RouterOS-on-Linux override, otherwise
/// pass it through unchanged.
pub fn os_label(os: &str, description: Option<&str>) -> String {
    if linux_re().is_match(os) && description.is_some_and(|d| routeros_re().is_match(d)) {
        return "RouterOS/Linux".to_string();
    }
    os.to_string()
}
