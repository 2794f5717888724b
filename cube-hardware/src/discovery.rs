//! Serial device discovery
//!
//! Lists the device paths a USB-attached board may appear under. Discovery
//! never fails: a missing registry key or device directory simply yields
//! nothing.

use glob::MatchOptions;
use tracing::debug;

/// Registry key mapping serial device objects to COM port names
pub const SERIALCOMM_KEY: &str = r"HARDWARE\DEVICEMAP\SERIALCOMM";

/// Device node patterns on Linux and other non-macOS POSIX systems
pub const LINUX_PATTERNS: [&str; 2] = ["/dev/ttyACM*", "/dev/ttyUSB*"];

/// Device node patterns on macOS
pub const MACOS_PATTERNS: [&str; 2] = ["/dev/tty.usbmodem*", "/dev/tty.usbserial*"];

/// Source of candidate serial device paths
pub trait PortLister: Send + Sync {
    /// Candidate paths, in a stable order; empty when nothing is found
    fn list_ports(&self) -> Vec<String>;
}

/// Lists the values of `HKLM\HARDWARE\DEVICEMAP\SERIALCOMM`
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistryLister;

#[cfg(windows)]
impl PortLister for WindowsRegistryLister {
    fn list_ports(&self) -> Vec<String> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let key = match hklm.open_subkey(SERIALCOMM_KEY) {
            Ok(key) => key,
            Err(e) => {
                debug!("Serial port registry key unavailable: {}", e);
                return Vec::new();
            }
        };

        key.enum_values()
            .map_while(|entry| entry.ok())
            .map(|(_, value)| value.to_string())
            .collect()
    }
}

#[cfg(not(windows))]
impl PortLister for WindowsRegistryLister {
    fn list_ports(&self) -> Vec<String> {
        debug!("Serial port registry is only available on Windows");
        Vec::new()
    }
}

/// Matches device nodes against shell-style glob patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixGlobLister {
    patterns: Vec<String>,
}

impl PosixGlobLister {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn linux() -> Self {
        Self::new(LINUX_PATTERNS)
    }

    pub fn macos() -> Self {
        Self::new(MACOS_PATTERNS)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl PortLister for PosixGlobLister {
    fn list_ports(&self) -> Vec<String> {
        self.patterns
            .iter()
            .flat_map(|pattern| expand_pattern(pattern))
            .collect()
    }
}

/// Expand one pattern into sorted matching paths
fn expand_pattern(pattern: &str) -> Vec<String> {
    // Like the shell, a leading wildcard does not match dotfiles
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let paths = match glob::glob_with(pattern, options) {
        Ok(paths) => paths,
        Err(e) => {
            debug!("Invalid device pattern {}: {}", pattern, e);
            return Vec::new();
        }
    };

    let mut matches: Vec<String> = paths
        .filter_map(Result::ok)
        .filter_map(|path| path.into_os_string().into_string().ok())
        .collect();
    matches.sort();
    matches
}

/// Lister for the platform this binary was built for
pub fn platform_lister() -> Box<dyn PortLister> {
    if cfg!(windows) {
        Box::new(WindowsRegistryLister)
    } else if cfg!(target_os = "macos") {
        Box::new(PosixGlobLister::macos())
    } else {
        Box::new(PosixGlobLister::linux())
    }
}

/// Candidate device paths on this host
pub fn discover() -> Vec<String> {
    let ports = platform_lister().list_ports();
    debug!("Discovered {} candidate port(s): {:?}", ports.len(), ports);
    ports
}
