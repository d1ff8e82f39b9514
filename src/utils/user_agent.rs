/*!
Builds the default [`ProductTokens`] carried on outbound `SERVER` and `USER-AGENT` headers, using
the running OS's name/version and this crate's own package name/version.
*/

use crate::types::{ProductTokens, SpecVersion};
use std::sync::Once;

const UA_NAME: &str = env!("CARGO_PKG_NAME");
const UA_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds the `ProductTokens` this process advertises, given the negotiated `upnp_version`. The
/// OS name/version is probed once per process and cached.
pub fn default_product_tokens(upnp_version: SpecVersion) -> ProductTokens {
    static mut OS_NAME: String = String::new();
    static mut OS_VERSION: String = String::new();
    static CAPTURE: Once = Once::new();

    CAPTURE.call_once(|| unsafe {
        OS_NAME = os::system_name();
        OS_VERSION = os::system_version();
    });

    let (os_name, os_version) = unsafe { (OS_NAME.clone(), OS_VERSION.clone()) };
    ProductTokens::new(os_name, os_version, upnp_version, UA_NAME, UA_VERSION)
}

#[cfg(target_os = "macos")]
mod os {
    use std::process::Command;

    pub fn system_name() -> String {
        run("sw_vers", "-productName").unwrap_or_else(|| "Darwin".to_string())
    }

    pub fn system_version() -> String {
        run("sw_vers", "-productVersion").unwrap_or_else(|| "0.0".to_string())
    }

    fn run(cmd: &str, arg: &str) -> Option<String> {
        let output = Command::new(cmd).arg(arg).output().ok()?;
        let text = String::from_utf8(output.stdout).ok()?;
        Some(text.trim().to_string())
    }
}

#[cfg(all(not(target_os = "macos"), target_family = "unix"))]
mod os {
    use std::process::Command;

    pub fn system_name() -> String {
        run("uname", "-o").unwrap_or_else(|| "Unix".to_string())
    }

    pub fn system_version() -> String {
        run("uname", "-r").unwrap_or_else(|| "0.0".to_string())
    }

    fn run(cmd: &str, arg: &str) -> Option<String> {
        let output = Command::new(cmd).arg(arg).output().ok()?;
        let text = String::from_utf8(output.stdout).ok()?;
        Some(text.trim().to_string())
    }
}

#[cfg(not(target_family = "unix"))]
mod os {
    pub fn system_name() -> String {
        std::env::consts::OS.to_string()
    }

    pub fn system_version() -> String {
        "0.0".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tokens_carrying_the_requested_upnp_version() {
        let tokens = default_product_tokens(SpecVersion::V11);
        assert_eq!(tokens.upnp_version(), SpecVersion::V11);
        assert_eq!(tokens.product_name(), UA_NAME);
    }
}
