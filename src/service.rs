/// Label used for any port without a well-known service.
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Map a port to a coarse, human-readable service label.
pub fn classify(port: u16) -> &'static str {
    match port {
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        80 => "HTTP",
        110 => "POP3",
        143 => "IMAP",
        443 => "HTTPS",
        3306 => "MySQL",
        3389 => "RDP",
        _ => UNKNOWN_SERVICE,
    }
}
