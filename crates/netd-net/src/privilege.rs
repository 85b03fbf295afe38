//! Raw socket privilege detection, used to populate [`crate::ProbeCapabilities`].

/// Whether the current process can open raw ICMP sockets (root or
/// `CAP_NET_RAW` on Linux). Probes that need this degrade to "unavailable"
/// rather than erroring when it returns `false`.
pub fn has_raw_socket_capability() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::Uid::effective().is_root()
    }

    #[cfg(not(unix))]
    {
        false
    }
}
