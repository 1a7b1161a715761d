//! Network-address canonicalization used by the `network-aware` strategy.
//!
//! Strings that do not parse as a recognized address are returned trimmed
//! but otherwise unchanged, so they still compare by literal equality
//! (spec §4.1: "Strings that do not parse as an address are compared
//! literally").

/// Canonicalize a single address-like string.
pub fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();

    let (addr_part, suffix) = match trimmed.split_once('/') {
        Some((a, s)) => (a, Some(s)),
        None => (trimmed, None),
    };

    if let Some(canon) = canonicalize_ipv4(addr_part) {
        return apply_cidr(canon, suffix, 32);
    }
    if let Some(canon) = canonicalize_ipv6(addr_part) {
        return apply_cidr(canon, suffix, 128);
    }

    trimmed.to_string()
}

fn apply_cidr(addr: String, suffix: Option<&str>, full_prefix: u32) -> String {
    match suffix {
        None => addr,
        Some(s) => match s.parse::<u32>() {
            // A /32 (or /128) suffix names exactly one address — the same
            // set the bare address already names — so it is redundant and
            // stripped. Any other prefix length is retained because it
            // changes which addresses are matched.
            Ok(n) if n == full_prefix => addr,
            Ok(n) => format!("{addr}/{n}"),
            Err(_) => format!("{addr}/{s}"),
        },
    }
}

/// Parse a dotted-decimal IPv4 address, tolerating leading zeros in each
/// octet (which Rust's standard `Ipv4Addr` parser rejects), and return it
/// re-formatted with leading zeros stripped.
fn canonicalize_ipv4(s: &str) -> Option<String> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return None;
    }
    let mut octets = [0u8; 4];
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u32 = part.parse().ok()?;
        if n > 255 {
            return None;
        }
        octets[i] = n as u8;
    }
    Some(format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]))
}

/// Parse a colon-notation IPv6 address, lowercase hex groups, strip leading
/// zeros per group, and collapse the longest run of zero groups to `::`.
fn canonicalize_ipv6(s: &str) -> Option<String> {
    if s.matches("::").count() > 1 {
        return None;
    }

    let groups: Vec<u16> = if let Some((head, tail)) = s.split_once("::") {
        let head_groups = parse_groups(head)?;
        let tail_groups = parse_groups(tail)?;
        let missing = 8usize.checked_sub(head_groups.len() + tail_groups.len())?;
        let mut all = head_groups;
        all.extend(std::iter::repeat(0u16).take(missing));
        all.extend(tail_groups);
        all
    } else {
        let all = parse_groups(s)?;
        if all.len() != 8 {
            return None;
        }
        all
    };

    if groups.len() != 8 {
        return None;
    }

    // Find the longest run of zero groups (length >= 2), leftmost on ties.
    let mut best_start = None;
    let mut best_len = 0usize;
    let mut i = 0;
    while i < groups.len() {
        if groups[i] == 0 {
            let start = i;
            while i < groups.len() && groups[i] == 0 {
                i += 1;
            }
            let len = i - start;
            if len > best_len {
                best_len = len;
                best_start = Some(start);
            }
        } else {
            i += 1;
        }
    }

    let mut out = String::new();
    if best_len >= 2 {
        let start = best_start.unwrap();
        let end = start + best_len;
        for (idx, g) in groups[..start].iter().enumerate() {
            if idx > 0 {
                out.push(':');
            }
            out.push_str(&format!("{g:x}"));
        }
        out.push_str("::");
        for (idx, g) in groups[end..].iter().enumerate() {
            if idx > 0 {
                out.push(':');
            }
            out.push_str(&format!("{g:x}"));
        }
    } else {
        for (idx, g) in groups.iter().enumerate() {
            if idx > 0 {
                out.push(':');
            }
            out.push_str(&format!("{g:x}"));
        }
    }
    Some(out)
}

fn parse_groups(s: &str) -> Option<Vec<u16>> {
    if s.is_empty() {
        return Some(Vec::new());
    }
    s.split(':')
        .map(|g| {
            if g.is_empty() || g.len() > 4 || !g.bytes().all(|b| b.is_ascii_hexdigit()) {
                None
            } else {
                u16::from_str_radix(g, 16).ok()
            }
        })
        .collect()
}
