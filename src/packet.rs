//! ICMP echo packet construction and reply parsing.
//!
//! Echo requests are fixed-size buffers: an 8-byte header followed by payload
//! padding to [`PACKET_SIZE`]. Replies are classified by their type byte; for
//! time-exceeded and destination-unreachable messages the identifier and
//! sequence are recovered from the embedded original datagram.

/// Total size of an outgoing echo request, header included.
pub const PACKET_SIZE: usize = 64;

/// Size of the ICMP(v6) header in front of the payload.
pub const HEADER_SIZE: usize = 8;

/// ICMPv4 message types the prober recognizes.
#[repr(u8)]
#[derive(int_enum::IntEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IcmpV4Type {
    EchoReply = 0,
    DestinationUnreachable = 3,
    EchoRequest = 8,
    TimeExceeded = 11,
}

/// ICMPv6 message types the prober recognizes.
#[repr(u8)]
#[derive(int_enum::IntEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IcmpV6Type {
    DestinationUnreachable = 1,
    TimeExceeded = 3,
    EchoRequest = 128,
    EchoReply = 129,
}

/// Family-neutral classification of an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    EchoReply,
    TimeExceeded,
    Unreachable,
}

/// An inbound ICMP message reduced to what probe matching needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IcmpMessage {
    pub kind: ReplyKind,
    pub ident: u16,
    pub sequence: u16,
}

/// RFC 1071 Internet checksum over `buffer`.
///
/// The buffer is summed as big-endian 16-bit words into a 32-bit accumulator;
/// an odd trailing byte is added zero-extended. The high half is folded into
/// the low half twice before complementing, since the first fold can itself
/// carry.
pub fn checksum(buffer: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = buffer.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u32::from(*last);
    }
    sum = (sum & 0xFFFF) + (sum >> 16);
    sum = (sum & 0xFFFF) + (sum >> 16);
    !(sum as u16)
}

/// Builds a checksummed echo request.
///
/// The payload is zero-filled unless a non-empty `pattern` is given, in which
/// case the pattern repeats across the payload. The checksum covers the whole
/// buffer and lands in bytes 2..4. For ICMPv6 the checksum is computed the
/// same way, over the message only; the kernel recomputes it with the
/// pseudo-header when the packet leaves an `IPPROTO_ICMPV6` socket.
pub fn build_echo_request(v6: bool, ident: u16, sequence: u16, pattern: &[u8]) -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = if v6 {
        IcmpV6Type::EchoRequest as u8
    } else {
        IcmpV4Type::EchoRequest as u8
    };
    packet[1] = 0; // code
    packet[4..6].copy_from_slice(&ident.to_be_bytes());
    packet[6..8].copy_from_slice(&sequence.to_be_bytes());
    if !pattern.is_empty() {
        for (i, byte) in packet[HEADER_SIZE..].iter_mut().enumerate() {
            *byte = pattern[i % pattern.len()];
        }
    }
    let sum = checksum(&packet);
    packet[2..4].copy_from_slice(&sum.to_be_bytes());
    packet
}

/// Splits a raw IPv4 datagram into the sender's remaining TTL and the ICMP
/// message behind the IP header. Raw v4 sockets deliver the IP header; v6
/// sockets do not.
pub fn strip_ipv4_header(datagram: &[u8]) -> Option<(u8, &[u8])> {
    let header_len = (usize::from(*datagram.first()?) & 0x0F) * 4;
    if header_len < 20 || datagram.len() < header_len {
        return None;
    }
    Some((datagram[8], &datagram[header_len..]))
}

/// Parses an ICMPv4 message. Returns `None` for truncated buffers, unknown
/// types, and our own echo requests looped back by the interface.
pub fn parse_icmp_v4(message: &[u8]) -> Option<IcmpMessage> {
    let kind = match IcmpV4Type::try_from(*message.first()?).ok()? {
        IcmpV4Type::EchoReply => ReplyKind::EchoReply,
        IcmpV4Type::TimeExceeded => ReplyKind::TimeExceeded,
        IcmpV4Type::DestinationUnreachable => ReplyKind::Unreachable,
        IcmpV4Type::EchoRequest => return None,
    };
    let echo = match kind {
        ReplyKind::EchoReply => message,
        // The error message embeds the original datagram: IP header first,
        // then the first bytes of our echo request.
        _ => {
            let embedded = message.get(HEADER_SIZE..)?;
            let inner_len = (usize::from(*embedded.first()?) & 0x0F) * 4;
            embedded.get(inner_len..)?
        }
    };
    Some(IcmpMessage {
        kind,
        ident: read_be16(echo, 4)?,
        sequence: read_be16(echo, 6)?,
    })
}

/// Parses an ICMPv6 message. The embedded original datagram in error messages
/// starts with the fixed 40-byte IPv6 header.
pub fn parse_icmp_v6(message: &[u8]) -> Option<IcmpMessage> {
    let kind = match IcmpV6Type::try_from(*message.first()?).ok()? {
        IcmpV6Type::EchoReply => ReplyKind::EchoReply,
        IcmpV6Type::TimeExceeded => ReplyKind::TimeExceeded,
        IcmpV6Type::DestinationUnreachable => ReplyKind::Unreachable,
        IcmpV6Type::EchoRequest => return None,
    };
    let echo = match kind {
        ReplyKind::EchoReply => message,
        _ => message.get(HEADER_SIZE..)?.get(40..)?,
    };
    Some(IcmpMessage {
        kind,
        ident: read_be16(echo, 4)?,
        sequence: read_be16(echo, 6)?,
    })
}

fn read_be16(buffer: &[u8], offset: usize) -> Option<u16> {
    let bytes = buffer.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_zeros_is_all_ones() {
        assert_eq!(checksum(&[0u8; PACKET_SIZE]), 0xFFFF);
    }

    #[test]
    fn checksum_self_verifies() {
        let packet = build_echo_request(false, 0x1234, 7, &[]);
        assert_eq!(checksum(&packet), 0);

        let packet = build_echo_request(true, 0xBEEF, 42, &[0xAA, 0x55]);
        assert_eq!(checksum(&packet), 0);
    }

    #[test]
    fn checksum_handles_odd_length() {
        // Words 0x0102 then the trailing 0x03 zero-extended: !0x0105.
        assert_eq!(checksum(&[0x01, 0x02, 0x03]), 0xFEFA);
        // Folding: 0xFFFF + 0xFFFF = 0x1FFFE -> fold -> 0xFFFF -> complement 0.
        assert_eq!(checksum(&[0xFF, 0xFF, 0xFF, 0xFF]), 0);
    }

    #[test]
    fn echo_request_layout() {
        let packet = build_echo_request(false, 0xABCD, 0x0102, &[]);
        assert_eq!(packet.len(), PACKET_SIZE);
        assert_eq!(packet[0], 8);
        assert_eq!(packet[1], 0);
        assert_eq!(u16::from_be_bytes([packet[4], packet[5]]), 0xABCD);
        assert_eq!(u16::from_be_bytes([packet[6], packet[7]]), 0x0102);
        assert!(packet[HEADER_SIZE..].iter().all(|&b| b == 0));

        let packet = build_echo_request(true, 1, 2, &[]);
        assert_eq!(packet[0], 128);
    }

    #[test]
    fn pattern_fill_repeats_without_resizing() {
        let packet = build_echo_request(false, 1, 2, &[0xDE, 0xAD]);
        assert_eq!(packet.len(), PACKET_SIZE);
        for (i, byte) in packet[HEADER_SIZE..].iter().enumerate() {
            assert_eq!(*byte, if i % 2 == 0 { 0xDE } else { 0xAD });
        }
    }

    #[test]
    fn parse_echo_reply() {
        let mut reply = build_echo_request(false, 0x4242, 9, &[]);
        reply[0] = IcmpV4Type::EchoReply as u8;
        let message = parse_icmp_v4(&reply).unwrap();
        assert_eq!(message.kind, ReplyKind::EchoReply);
        assert_eq!(message.ident, 0x4242);
        assert_eq!(message.sequence, 9);
    }

    #[test]
    fn parse_time_exceeded_recovers_embedded_probe() {
        // Time-exceeded: 8 bytes of ICMP header, then the original IPv4
        // header (20 bytes, IHL 5), then the head of the original echo.
        let original = build_echo_request(false, 0x7777, 21, &[]);
        let mut message = vec![IcmpV4Type::TimeExceeded as u8, 0, 0, 0, 0, 0, 0, 0];
        let mut inner_ip = [0u8; 20];
        inner_ip[0] = 0x45;
        message.extend_from_slice(&inner_ip);
        message.extend_from_slice(&original[..HEADER_SIZE]);

        let parsed = parse_icmp_v4(&message).unwrap();
        assert_eq!(parsed.kind, ReplyKind::TimeExceeded);
        assert_eq!(parsed.ident, 0x7777);
        assert_eq!(parsed.sequence, 21);
    }

    #[test]
    fn parse_v6_time_exceeded_recovers_embedded_probe() {
        let original = build_echo_request(true, 0x5151, 4, &[]);
        let mut message = vec![IcmpV6Type::TimeExceeded as u8, 0, 0, 0, 0, 0, 0, 0];
        message.extend_from_slice(&[0u8; 40]); // original IPv6 header
        message.extend_from_slice(&original[..HEADER_SIZE]);

        let parsed = parse_icmp_v6(&message).unwrap();
        assert_eq!(parsed.kind, ReplyKind::TimeExceeded);
        assert_eq!(parsed.ident, 0x5151);
        assert_eq!(parsed.sequence, 4);
    }

    #[test]
    fn junk_does_not_parse() {
        assert!(parse_icmp_v4(&[]).is_none());
        assert!(parse_icmp_v4(&[99, 0, 0, 0]).is_none());
        // An echo request is our own packet reflected back, not a reply.
        let request = build_echo_request(false, 1, 1, &[]);
        assert!(parse_icmp_v4(&request).is_none());
        // Truncated time-exceeded without a complete embedded echo header.
        let short = [IcmpV4Type::TimeExceeded as u8, 0, 0, 0, 0, 0, 0, 0, 0x45];
        assert!(parse_icmp_v4(&short).is_none());
    }

    #[test]
    fn strip_ipv4_header_reads_ttl_and_body() {
        let mut datagram = vec![0u8; 28];
        datagram[0] = 0x45;
        datagram[8] = 57; // remaining TTL
        datagram[20] = IcmpV4Type::EchoReply as u8;
        let (ttl, icmp) = strip_ipv4_header(&datagram).unwrap();
        assert_eq!(ttl, 57);
        assert_eq!(icmp.len(), 8);
        assert_eq!(icmp[0], 0);

        assert!(strip_ipv4_header(&[]).is_none());
        assert!(strip_ipv4_header(&[0x4F, 0, 0]).is_none());
    }
}
