use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, info, warn};

use crate::error_handling::types::ParseWarning;
use crate::server_list::types::ServerRecord;

/// Number of columns in the VPN Gate CSV export.
///
/// `#HostName,IP,Score,Ping,Speed,CountryLong,CountryShort,NumVpnSessions,
/// Uptime,TotalUsers,TotalTraffic,LogType,Operator,Message,
/// OpenVPN_ConfigData_Base64`
const EXPECTED_FIELDS: usize = 15;

/// Parses the raw list document into server records.
///
/// Line oriented: `*`-prefixed banner lines, the `#` column header and
/// blank lines are skipped silently. Each remaining line yields either a
/// `ServerRecord` or a `ParseWarning`; a bad line never aborts the batch.
/// Output order matches input line order, duplicates included —
/// de-duplication is a ranking concern.
pub fn parse(raw: &[u8]) -> (Vec<ServerRecord>, Vec<ParseWarning>) {
    let text = String::from_utf8_lossy(raw);
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('*') || line.starts_with('#') {
            continue;
        }
        match parse_line(line, idx + 1) {
            Ok(record) => records.push(record),
            Err(w) => {
                debug!("Dropping line {}: {}", idx + 1, w);
                warnings.push(w);
            }
        }
    }

    if warnings.is_empty() {
        info!("Parsed {} server records", records.len());
    } else {
        warn!(
            "Parsed {} server records, dropped {} malformed lines",
            records.len(),
            warnings.len()
        );
    }
    (records, warnings)
}

/// Parses a single data line.
///
/// Numeric columns degrade to 0 on coercion failure instead of dropping
/// the record. The record is only dropped when either endpoint column
/// (hostname or IP) is empty, or its config blob fails base64 decoding.
fn parse_line(line: &str, line_no: usize) -> Result<ServerRecord, ParseWarning> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < EXPECTED_FIELDS {
        return Err(ParseWarning::ShortLine {
            line: line_no,
            fields: fields.len(),
        });
    }

    let host_name = fields[0].trim().to_string();
    let ip = fields[1].trim().to_string();
    if host_name.is_empty() || ip.is_empty() {
        return Err(ParseWarning::MissingEndpoint { line: line_no });
    }

    // The blob is always the last column. Unescaped commas in the
    // operator message shift the middle columns, so the message spans
    // everything between the fixed prefix and the blob.
    let blob_field = fields[fields.len() - 1].trim();
    let message = fields[13..fields.len() - 1].join(",");

    let openvpn_config = BASE64.decode(blob_field).map_err(|_| {
        ParseWarning::BadConfigBlob {
            line: line_no,
            host: host_name.clone(),
        }
    })?;

    Ok(ServerRecord {
        host_name,
        ip,
        score: coerce_int(fields[2]),
        ping: coerce_int(fields[3]),
        speed: coerce_int(fields[4]),
        country_long: fields[5].trim().to_string(),
        country_short: fields[6].trim().to_string(),
        num_vpn_sessions: coerce_int(fields[7]),
        uptime: coerce_int(fields[8]),
        total_users: coerce_int(fields[9]),
        total_traffic: coerce_int(fields[10]),
        log_policy: fields[11].trim().to_string(),
        operator: fields[12].trim().to_string(),
        message,
        openvpn_config,
    })
}

/// Coerces a numeric column, degrading to 0 on failure (upstream emits
/// `-` for unknown ping, for instance).
fn coerce_int(field: &str) -> i64 {
    field.trim().parse::<i64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    const HEADER: &str = "#HostName,IP,Score,Ping,Speed,CountryLong,CountryShort,NumVpnSessions,Uptime,TotalUsers,TotalTraffic,LogType,Operator,Message,OpenVPN_ConfigData_Base64";

    fn blob() -> String {
        BASE64.encode(b"client\ndev tun\nremote 1.2.3.4 1194 udp\n")
    }

    fn data_line(host: &str, ip: &str, score: i64) -> String {
        format!(
            "{},{},{},12,10000000,Japan,JP,4,3600000,100,123456,2weeks,Owner,msg,{}",
            host,
            ip,
            score,
            blob()
        )
    }

    #[test]
    fn empty_document_yields_nothing() {
        let (records, warnings) = parse(b"");
        assert!(records.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn banner_and_header_lines_are_skipped() {
        let doc = format!("*vpn_servers\n{}\n{}\n*\n", HEADER, data_line("a", "1.1.1.1", 10));
        let (records, warnings) = parse(doc.as_bytes());
        assert_eq!(records.len(), 1);
        assert!(warnings.is_empty());
        assert_eq!(records[0].host_name, "a");
        assert_eq!(records[0].score, 10);
    }

    #[test]
    fn trailing_blank_lines_and_crlf_are_tolerated() {
        let doc = format!("{}\r\n{}\r\n\r\n\r\n", HEADER, data_line("a", "1.1.1.1", 10));
        let (records, warnings) = parse(doc.as_bytes());
        assert_eq!(records.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn short_line_is_dropped_with_warning() {
        let doc = format!("{}\na,1.1.1.1,10\n", HEADER);
        let (records, warnings) = parse(doc.as_bytes());
        assert!(records.is_empty());
        assert_eq!(
            warnings,
            vec![ParseWarning::ShortLine { line: 2, fields: 3 }]
        );
    }

    #[test]
    fn bad_base64_drops_only_that_record() {
        let bad = "badhost,2.2.2.2,5,12,1,Japan,JP,4,1,1,1,2weeks,Owner,msg,!!!not-base64!!!";
        let doc = format!("{}\n{}\n{}\n", data_line("good", "1.1.1.1", 10), bad, data_line("also", "3.3.3.3", 7));
        let (records, warnings) = parse(doc.as_bytes());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].host_name, "good");
        assert_eq!(records[1].host_name, "also");
        assert_eq!(
            warnings,
            vec![ParseWarning::BadConfigBlob {
                line: 2,
                host: "badhost".to_string()
            }]
        );
    }

    #[test]
    fn malformed_numeric_field_degrades_to_zero() {
        let line = format!(
            "host,1.1.1.1,notanumber,-,10000000,Japan,JP,4,3600000,100,123456,2weeks,Owner,msg,{}",
            blob()
        );
        let (records, warnings) = parse(line.as_bytes());
        assert!(warnings.is_empty());
        assert_eq!(records[0].score, 0);
        assert_eq!(records[0].ping, 0);
        assert_eq!(records[0].speed, 10_000_000);
    }

    #[test]
    fn record_with_no_endpoint_is_dropped() {
        let line = format!(
            ",,10,12,1,Japan,JP,4,1,1,1,2weeks,Owner,msg,{}",
            blob()
        );
        let (records, warnings) = parse(line.as_bytes());
        assert!(records.is_empty());
        assert_eq!(warnings, vec![ParseWarning::MissingEndpoint { line: 1 }]);
    }

    #[test]
    fn record_with_empty_ip_is_dropped() {
        let line = format!(
            "host-only,,10,12,1,Japan,JP,4,1,1,1,2weeks,Owner,msg,{}",
            blob()
        );
        let (records, warnings) = parse(line.as_bytes());
        assert!(records.is_empty());
        assert_eq!(warnings, vec![ParseWarning::MissingEndpoint { line: 1 }]);
    }

    #[test]
    fn record_with_empty_host_name_is_dropped() {
        let line = format!(
            ",1.1.1.1,10,12,1,Japan,JP,4,1,1,1,2weeks,Owner,msg,{}",
            blob()
        );
        let (records, warnings) = parse(line.as_bytes());
        assert!(records.is_empty());
        assert_eq!(warnings, vec![ParseWarning::MissingEndpoint { line: 1 }]);
    }

    #[test]
    fn duplicate_hosts_are_kept_in_input_order() {
        let doc = format!(
            "{}\n{}\n{}\n",
            data_line("dup", "1.1.1.1", 1),
            data_line("other", "2.2.2.2", 2),
            data_line("dup", "3.3.3.3", 3)
        );
        let (records, _) = parse(doc.as_bytes());
        let hosts: Vec<_> = records.iter().map(|r| r.host_name.as_str()).collect();
        assert_eq!(hosts, vec!["dup", "other", "dup"]);
    }

    #[test]
    fn commas_in_message_do_not_shift_the_blob() {
        let line = format!(
            "host,1.1.1.1,10,12,1,Japan,JP,4,1,1,1,2weeks,Owner,hello, world,{}",
            blob()
        );
        let (records, warnings) = parse(line.as_bytes());
        assert!(warnings.is_empty());
        assert_eq!(records[0].message, "hello, world");
        assert_eq!(
            records[0].openvpn_config,
            b"client\ndev tun\nremote 1.2.3.4 1194 udp\n".to_vec()
        );
    }

    #[test]
    fn decode_is_deterministic() {
        let doc = data_line("host", "1.1.1.1", 10);
        let (first, _) = parse(doc.as_bytes());
        let (second, _) = parse(doc.as_bytes());
        assert_eq!(first, second);
    }
}
