//! IP addresses, hostnames and socket addresses.
//!
//! Three write modes, all readable regardless of the configured one:
//!
//! | Mode | IPv4 | IPv6 |
//! |---|---|---|
//! | `String` | `192.168.0.1` | `2001:db8:35fa::ab38:ffff` |
//! | `StringFill` | `192.168.000.001` | `2001:0db8:35fa:0000:0000:0000:ab38:ffff` |
//! | `Number` | `u32` value | `1 << 128 \| u128` value |
//!
//! Socket addresses append the port: `ip:port`, `[ipv6]:port`, or as a number
//! `port << 32 | ipv4` and `port << 136 | 1 << 128 | ipv6`. The bit at 128
//! tells the two families apart on read.
//!
//! A string that is neither IPv4 nor IPv6 but is a well-formed hostname is kept
//! as [`InetAddress::Host`]; no name resolution takes place.

use super::unexpected;
use crate::{Element, Error, InetAddressMode, Primitive, Result, TypeProcessor};
use num_bigint::{BigInt, Sign};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// An IP address or an unresolved hostname.
///
/// # Examples
///
/// ```rust
/// use std::net::Ipv6Addr;
/// use treebind::InetAddress;
///
/// let ip = InetAddress::from(Ipv6Addr::LOCALHOST);
/// assert_eq!(ip.to_string(), "::1");
///
/// let host = InetAddress::host("example.com");
/// assert!(host.ip().is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InetAddress {
    Ip(IpAddr),
    Host(String),
}

impl InetAddress {
    #[must_use]
    pub fn host(name: impl Into<String>) -> Self {
        InetAddress::Host(name.into())
    }

    #[must_use]
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            InetAddress::Ip(ip) => Some(*ip),
            InetAddress::Host(_) => None,
        }
    }
}

impl From<IpAddr> for InetAddress {
    fn from(value: IpAddr) -> Self {
        InetAddress::Ip(value)
    }
}

impl From<Ipv4Addr> for InetAddress {
    fn from(value: Ipv4Addr) -> Self {
        InetAddress::Ip(IpAddr::V4(value))
    }
}

impl From<Ipv6Addr> for InetAddress {
    fn from(value: Ipv6Addr) -> Self {
        InetAddress::Ip(IpAddr::V6(value))
    }
}

impl fmt::Display for InetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InetAddress::Ip(ip) => f.write_str(&format_ip(ip, false)),
            InetAddress::Host(name) => f.write_str(name),
        }
    }
}

/// An [`InetAddress`] with a port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InetSocketAddress {
    pub address: InetAddress,
    pub port: u16,
}

impl InetSocketAddress {
    #[must_use]
    pub fn new(address: impl Into<InetAddress>, port: u16) -> Self {
        InetSocketAddress {
            address: address.into(),
            port,
        }
    }
}

impl From<SocketAddr> for InetSocketAddress {
    fn from(value: SocketAddr) -> Self {
        InetSocketAddress::new(value.ip(), value.port())
    }
}

impl fmt::Display for InetSocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_socket(&self.address, self.port, false))
    }
}

fn format_ip(ip: &IpAddr, fill: bool) -> String {
    match ip {
        IpAddr::V4(v4) => v4
            .octets()
            .iter()
            .map(|o| if fill { format!("{:03}", o) } else { o.to_string() })
            .collect::<Vec<_>>()
            .join("."),
        IpAddr::V6(v6) => format_v6(v6, fill),
    }
}

/// Colon-hex; unless filled, the longest run of zero groups (earliest on ties) becomes `::`.
fn format_v6(addr: &Ipv6Addr, fill: bool) -> String {
    let groups = addr.segments();
    let hex = |gs: &[u16]| {
        gs.iter()
            .map(|g| if fill { format!("{:04x}", g) } else { format!("{:x}", g) })
            .collect::<Vec<_>>()
            .join(":")
    };
    if fill {
        return hex(&groups);
    }

    let mut best: Option<(usize, usize)> = None;
    let mut run_start = 0;
    let mut run_len = 0;
    for (i, group) in groups.iter().enumerate() {
        if *group == 0 {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            if best.map_or(true, |(_, len)| run_len > len) {
                best = Some((run_start, run_len));
            }
        } else {
            run_len = 0;
        }
    }

    match best {
        None => hex(&groups),
        Some((start, len)) => format!("{}::{}", hex(&groups[..start]), hex(&groups[start + len..])),
    }
}

fn format_socket(address: &InetAddress, port: u16, fill: bool) -> String {
    match address {
        InetAddress::Ip(ip @ IpAddr::V6(_)) => format!("[{}]:{}", format_ip(ip, fill), port),
        InetAddress::Ip(ip) => format!("{}:{}", format_ip(ip, fill), port),
        InetAddress::Host(name) => format!("{}:{}", name, port),
    }
}

/// Dotted decimal with up to three digits per octet, leading zeros allowed.
fn parse_v4(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    match parts.next() {
        None => Some(Ipv4Addr::from(octets)),
        Some(_) => None,
    }
}

/// Dotted text made only of digits is an address attempt, never a hostname.
fn is_hostname(text: &str) -> bool {
    let numeric = text.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    !numeric
        && !text.is_empty()
        && text.len() <= 253
        && text.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}

fn parse_address(text: &str, type_name: &str) -> Result<InetAddress> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(trimmed);

    if let Some(v4) = parse_v4(inner) {
        return Ok(InetAddress::from(v4));
    }
    if let Ok(v6) = inner.parse::<Ipv6Addr>() {
        return Ok(InetAddress::from(v6));
    }
    if is_hostname(inner) {
        return Ok(InetAddress::Host(inner.to_string()));
    }
    Err(Error::conversion(
        type_name,
        "IPv4, IPv6 or hostname",
        format!("{:?}", text),
    ))
}

fn parse_socket(text: &str, type_name: &str) -> Result<InetSocketAddress> {
    let bad = || Error::conversion(type_name, "address:port", format!("{:?}", text));
    let (host, port) = text.trim().rsplit_once(':').ok_or_else(bad)?;
    let port = port.parse::<u16>().map_err(|_| bad())?;
    Ok(InetSocketAddress {
        address: parse_address(host, type_name)?,
        port,
    })
}

fn pow2(bits: u32) -> BigInt {
    BigInt::from(1u8) << bits
}

fn ip_number(ip: &IpAddr) -> BigInt {
    match ip {
        IpAddr::V4(v4) => BigInt::from(u32::from(*v4)),
        IpAddr::V6(v6) => pow2(128) + BigInt::from(u128::from(*v6)),
    }
}

fn socket_number(ip: &IpAddr, port: u16) -> BigInt {
    match ip {
        IpAddr::V4(_) => BigInt::from(port) * pow2(32) + ip_number(ip),
        IpAddr::V6(_) => BigInt::from(port) * pow2(136) + ip_number(ip),
    }
}

/// Splits a numeric address into the low 128 bits and the 24 bits above them.
fn split_number(p: &Primitive, type_name: &str) -> Result<(u128, u32)> {
    let n = p.to_big_integer()?;
    let bad = || Error::conversion(type_name, "non-negative numeric address", p.describe());
    if n.sign() == Sign::Minus {
        return Err(bad());
    }
    let modulus = pow2(128);
    let low = u128::try_from(&n % &modulus).map_err(|_| bad())?;
    let high = u32::try_from(&(&n / &modulus) % pow2(24)).map_err(|_| bad())?;
    Ok((low, high))
}

fn address_from_number(p: &Primitive, type_name: &str) -> Result<IpAddr> {
    let (low, high) = split_number(p, type_name)?;
    Ok(if high & 0xFF == 0 {
        IpAddr::V4(Ipv4Addr::from(low as u32))
    } else {
        IpAddr::V6(Ipv6Addr::from(low))
    })
}

fn socket_from_number(p: &Primitive, type_name: &str) -> Result<InetSocketAddress> {
    let (low, high) = split_number(p, type_name)?;
    Ok(if high & 0xFF == 0 {
        let port = ((low >> 32) & 0xFFFF) as u16;
        InetSocketAddress::new(Ipv4Addr::from(low as u32), port)
    } else {
        let port = ((high >> 8) & 0xFFFF) as u16;
        InetSocketAddress::new(Ipv6Addr::from(low), port)
    })
}

/// Converts IP addresses, hostnames and socket addresses.
#[derive(Clone, Copy, Debug, Default)]
pub struct InetProcessor {
    mode: InetAddressMode,
}

impl InetProcessor {
    #[must_use]
    pub fn new(mode: InetAddressMode) -> Self {
        InetProcessor { mode }
    }

    fn write_address(&self, address: &InetAddress, type_name: &str) -> Result<Element> {
        match (address, self.mode) {
            (InetAddress::Ip(ip), InetAddressMode::String) => Ok(Element::from(format_ip(ip, false))),
            (InetAddress::Ip(ip), InetAddressMode::StringFill) => Ok(Element::from(format_ip(ip, true))),
            (InetAddress::Ip(ip), InetAddressMode::Number) => Ok(Element::from(ip_number(ip))),
            (InetAddress::Host(name), InetAddressMode::Number) => Err(Error::conversion(
                type_name,
                "IP address",
                format!("hostname {:?}", name),
            )),
            (InetAddress::Host(name), _) => Ok(Element::from(name.as_str())),
        }
    }

    fn read_address(&self, element: &Element, type_name: &str) -> Result<Option<InetAddress>> {
        match element {
            Element::Primitive(Primitive::Null) => Ok(None),
            Element::Primitive(Primitive::String(text)) => parse_address(text, type_name).map(Some),
            Element::Primitive(p) if p.is_integral() => {
                address_from_number(p, type_name).map(|ip| Some(InetAddress::Ip(ip)))
            }
            other => Err(unexpected(type_name, "address string or number", other)),
        }
    }

    fn write_socket(&self, socket: &InetSocketAddress, type_name: &str) -> Result<Element> {
        match (&socket.address, self.mode) {
            (address, InetAddressMode::String) => Ok(Element::from(format_socket(address, socket.port, false))),
            (address, InetAddressMode::StringFill) => Ok(Element::from(format_socket(address, socket.port, true))),
            (InetAddress::Ip(ip), InetAddressMode::Number) => Ok(Element::from(socket_number(ip, socket.port))),
            (InetAddress::Host(name), InetAddressMode::Number) => Err(Error::conversion(
                type_name,
                "IP socket address",
                format!("hostname {:?}", name),
            )),
        }
    }

    fn read_socket(&self, element: &Element, type_name: &str) -> Result<Option<InetSocketAddress>> {
        match element {
            Element::Primitive(Primitive::Null) => Ok(None),
            Element::Primitive(Primitive::String(text)) => parse_socket(text, type_name).map(Some),
            Element::Primitive(p) if p.is_integral() => socket_from_number(p, type_name).map(Some),
            other => Err(unexpected(type_name, "socket address string or number", other)),
        }
    }

    fn read_ip(&self, element: &Element, type_name: &str) -> Result<Option<IpAddr>> {
        match self.read_address(element, type_name)? {
            None => Ok(None),
            Some(InetAddress::Ip(ip)) => Ok(Some(ip)),
            Some(InetAddress::Host(name)) => Err(Error::conversion(
                type_name,
                "IP address",
                format!("hostname {:?}", name),
            )),
        }
    }
}

impl TypeProcessor<InetAddress> for InetProcessor {
    fn to_element(&self, value: Option<&InetAddress>) -> Result<Element> {
        match value {
            None => Ok(Element::null()),
            Some(address) => self.write_address(address, "InetAddress"),
        }
    }

    fn to_object(&self, element: &Element) -> Result<Option<InetAddress>> {
        self.read_address(element, "InetAddress")
    }
}

impl TypeProcessor<IpAddr> for InetProcessor {
    fn to_element(&self, value: Option<&IpAddr>) -> Result<Element> {
        match value {
            None => Ok(Element::null()),
            Some(ip) => self.write_address(&InetAddress::Ip(*ip), "IpAddr"),
        }
    }

    fn to_object(&self, element: &Element) -> Result<Option<IpAddr>> {
        self.read_ip(element, "IpAddr")
    }
}

impl TypeProcessor<Ipv4Addr> for InetProcessor {
    fn to_element(&self, value: Option<&Ipv4Addr>) -> Result<Element> {
        match value {
            None => Ok(Element::null()),
            Some(ip) => self.write_address(&InetAddress::from(*ip), "Ipv4Addr"),
        }
    }

    fn to_object(&self, element: &Element) -> Result<Option<Ipv4Addr>> {
        match self.read_ip(element, "Ipv4Addr")? {
            None => Ok(None),
            Some(IpAddr::V4(v4)) => Ok(Some(v4)),
            Some(IpAddr::V6(v6)) => Err(Error::conversion("Ipv4Addr", "IPv4 address", v6.to_string())),
        }
    }
}

impl TypeProcessor<Ipv6Addr> for InetProcessor {
    fn to_element(&self, value: Option<&Ipv6Addr>) -> Result<Element> {
        match value {
            None => Ok(Element::null()),
            Some(ip) => self.write_address(&InetAddress::from(*ip), "Ipv6Addr"),
        }
    }

    fn to_object(&self, element: &Element) -> Result<Option<Ipv6Addr>> {
        match self.read_ip(element, "Ipv6Addr")? {
            None => Ok(None),
            Some(IpAddr::V6(v6)) => Ok(Some(v6)),
            Some(IpAddr::V4(v4)) => Err(Error::conversion("Ipv6Addr", "IPv6 address", v4.to_string())),
        }
    }
}

impl TypeProcessor<InetSocketAddress> for InetProcessor {
    fn to_element(&self, value: Option<&InetSocketAddress>) -> Result<Element> {
        match value {
            None => Ok(Element::null()),
            Some(socket) => self.write_socket(socket, "InetSocketAddress"),
        }
    }

    fn to_object(&self, element: &Element) -> Result<Option<InetSocketAddress>> {
        self.read_socket(element, "InetSocketAddress")
    }
}

impl TypeProcessor<SocketAddr> for InetProcessor {
    fn to_element(&self, value: Option<&SocketAddr>) -> Result<Element> {
        match value {
            None => Ok(Element::null()),
            Some(socket) => self.write_socket(&InetSocketAddress::from(*socket), "SocketAddr"),
        }
    }

    fn to_object(&self, element: &Element) -> Result<Option<SocketAddr>> {
        match self.read_socket(element, "SocketAddr")? {
            None => Ok(None),
            Some(InetSocketAddress {
                address: InetAddress::Ip(ip),
                port,
            }) => Ok(Some(SocketAddr::new(ip, port))),
            Some(InetSocketAddress {
                address: InetAddress::Host(name),
                ..
            }) => Err(Error::conversion(
                "SocketAddr",
                "IP socket address",
                format!("hostname {:?}", name),
            )),
        }
    }
}
