//! wire codec: request parsing, reply formatting, MDTM timestamps and
//! PASV/PORT address tuples.

use std::net::Ipv4Addr;

/// Bound on the argument string, matching the session's `command_args`
/// field (`LFN + 8`).
pub const ARG_MAX: usize = 255 + 8;

/// A parsed control-channel command: an uppercase verb of at most four
/// letters, and its (possibly empty) argument string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub verb: String,
    pub args: String,
}

/// Failure of [`parse_command`]: the argument would overflow [`ARG_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("command argument too long")]
pub struct ArgTooLong;

/// Parses one control-channel netbuf into a verb + argument pair.
///
/// The verb is the longest leading run of ASCII-alphabetic bytes, capped at
/// four characters and uppercased. If the byte immediately following that
/// run is a space, everything up to the first CR/LF (after skipping any
/// further leading spaces) becomes the argument; otherwise the argument is
/// empty.
pub fn parse_command(buf: &[u8]) -> Result<ParsedCommand, ArgTooLong> {
    let alpha_len = buf.iter().take_while(|b| b.is_ascii_alphabetic()).count();
    let verb: String = buf[..alpha_len.min(4)]
        .iter()
        .map(|b| b.to_ascii_uppercase() as char)
        .collect();

    let args = if buf.get(alpha_len) == Some(&b' ') {
        let mut rest = &buf[alpha_len + 1..];
        while rest.first() == Some(&b' ') {
            rest = &rest[1..];
        }
        let end = rest
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(rest.len());
        String::from_utf8_lossy(&rest[..end]).into_owned()
    } else {
        String::new()
    };

    if args.len() > ARG_MAX {
        return Err(ArgTooLong);
    }

    Ok(ParsedCommand { verb, args })
}

/// Formats a single-line reply, CRLF-terminated, as every non-FEAT reply is.
pub fn format_reply(code: u16, message: &str) -> String {
    format!("{code} {message}\r\n")
}

/// Formats a multi-line reply in RFC 959 `CODE-…\r\n…CODE <last>\r\n` shape
/// (used only by FEAT).
pub fn format_multiline_reply(code: u16, lines: &[&str], last: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{code}-{}\r\n", lines.first().copied().unwrap_or("")));
    for line in lines.iter().skip(1) {
        out.push_str(&format!(" {line}\r\n"));
    }
    out.push_str(&format!("{code} {last}\r\n"));
    out
}

/// A FAT-style packed modification timestamp, as used by MDTM and the
/// filesystem collaborator's `FileInfo`/`utime` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatTimestamp {
    pub date: u16,
    pub time: u16,
}

impl FatTimestamp {
    pub fn pack(year: u32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        let date = (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16;
        let time = ((hour as u16) << 11) | ((minute as u16) << 5) | (second as u16 >> 1);
        Self { date, time }
    }

    pub fn year(&self) -> u32 {
        1980 + (self.date >> 9) as u32
    }
    pub fn month(&self) -> u32 {
        ((self.date >> 5) & 0xF) as u32
    }
    pub fn day(&self) -> u32 {
        (self.date & 0x1F) as u32
    }
    pub fn hour(&self) -> u32 {
        (self.time >> 11) as u32
    }
    pub fn minute(&self) -> u32 {
        ((self.time >> 5) & 0x3F) as u32
    }
    pub fn second(&self) -> u32 {
        (self.time as u32 & 0x1F) * 2
    }

    /// Formats as the 14-digit `YYYYMMDDHHMMSS` string MDTM expects, with no
    /// trailing space.
    pub fn format(&self) -> String {
        format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

/// Parses an MDTM argument. On success, returns the timestamp and the
/// filename that followed it. On any deviation from the exact
/// `14-digits SPACE filename` shape, returns `None` and the caller should
/// treat the whole argument as a bare filename.
pub fn parse_mdtm(arg: &str) -> Option<(FatTimestamp, &str)> {
    if arg.len() < 15 {
        return None;
    }
    let (digits, rest) = arg.split_at(14);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let rest = rest.strip_prefix(' ')?;

    let year: u32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    let hour: u32 = digits[8..10].parse().ok()?;
    let minute: u32 = digits[10..12].parse().ok()?;
    let second: u32 = digits[12..14].parse().ok()?;
    if year < 1980 {
        return None;
    }

    Some((FatTimestamp::pack(year, month, day, hour, minute, second), rest))
}

/// Formats the `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2).` reply.
pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    let p1 = (port >> 8) as u8;
    let p2 = (port & 0xFF) as u8;
    format_reply(
        227,
        &format!("Entering Passive Mode ({h1},{h2},{h3},{h4},{p1},{p2})."),
    )
}

/// Parses a `PORT`-style `h1,h2,h3,h4,p1,p2` argument into an address and
/// port.
pub fn parse_port_tuple(args: &str) -> Option<(Ipv4Addr, u16)> {
    let parts: Vec<&str> = args.trim().split(',').collect();
    if parts.len() != 6 {
        return None;
    }
    let mut n = [0u16; 6];
    for (i, p) in parts.iter().enumerate() {
        n[i] = p.trim().parse().ok()?;
    }
    if n[..4].iter().any(|&v| v > 255) || n[4] > 255 || n[5] > 255 {
        return None;
    }
    let ip = Ipv4Addr::new(n[0] as u8, n[1] as u8, n[2] as u8, n[3] as u8);
    let port = n[4] * 256 + n[5];
    Some((ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verb_and_arg() {
        let p = parse_command(b"USER bob\r\n").unwrap();
        assert_eq!(p.verb, "USER");
        assert_eq!(p.args, "bob");
    }

    #[test]
    fn parses_verb_with_no_arg() {
        let p = parse_command(b"PWD\r\n").unwrap();
        assert_eq!(p.verb, "PWD");
        assert_eq!(p.args, "");
    }

    #[test]
    fn uppercases_verb() {
        let p = parse_command(b"user bob\r\n").unwrap();
        assert_eq!(p.verb, "USER");
    }

    #[test]
    fn caps_verb_at_four_letters() {
        let p = parse_command(b"RETR file\r\n").unwrap();
        assert_eq!(p.verb, "RETR");
    }

    #[test]
    fn skips_leading_spaces_in_arg() {
        let p = parse_command(b"CWD   /a/b\r\n").unwrap();
        assert_eq!(p.args, "/a/b");
    }

    #[test]
    fn rejects_oversize_argument() {
        let mut line = b"STOR ".to_vec();
        line.extend(std::iter::repeat(b'x').take(ARG_MAX + 1));
        line.extend(b"\r\n");
        assert!(parse_command(&line).is_err());
    }

    #[test]
    fn mdtm_round_trips() {
        let ts = FatTimestamp::pack(2024, 1, 15, 10, 30, 0);
        let formatted = ts.format();
        assert_eq!(formatted, "20240115103000");
        let (parsed, name) = parse_mdtm(&format!("{formatted} x")).unwrap();
        assert_eq!(parsed, ts);
        assert_eq!(name, "x");
    }

    #[test]
    fn mdtm_parse_rejects_malformed_input() {
        assert!(parse_mdtm("short x").is_none());
        assert!(parse_mdtm("2024011510300x x").is_none());
        assert!(parse_mdtm("20240115103000nospace").is_none());
    }

    #[test]
    fn pasv_reply_and_port_parse_round_trip() {
        let ip = Ipv4Addr::new(192, 168, 1, 42);
        let port: u16 = 55612;
        let reply = format_pasv_reply(ip, port);
        assert!(reply.starts_with("227 "));
        assert!(reply.contains("192,168,1,42"));

        let p1 = port >> 8;
        let p2 = port & 0xFF;
        let args = format!("192,168,1,42,{p1},{p2}");
        let (parsed_ip, parsed_port) = parse_port_tuple(&args).unwrap();
        assert_eq!(parsed_ip, ip);
        assert_eq!(parsed_port, port);
    }

    #[test]
    fn port_tuple_rejects_malformed_input() {
        assert!(parse_port_tuple("1,2,3,4,5").is_none());
        assert!(parse_port_tuple("1,2,3,4,5,300").is_none());
    }
}
