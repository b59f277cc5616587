//! Parsing of the line and bus names used on the command line.

/// BCM number of a GPIO line named `GPIO<n>`, `BCM<n>` or just `<n>`.
pub fn parse_line(name: &str) -> Option<u8> {
    let number = name
        .strip_prefix("GPIO")
        .or_else(|| name.strip_prefix("BCM"))
        .unwrap_or(name);

    number.parse().ok()
}

/// Bus and slave select of an SPI bus named `SPI<bus>.<slave>`.
pub fn parse_bus(name: &str) -> Option<(u8, u8)> {
    let (bus, slave) = name.strip_prefix("SPI")?.split_once('.')?;

    Some((bus.parse().ok()?, slave.parse().ok()?))
}
