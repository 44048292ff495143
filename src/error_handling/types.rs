use std::fmt;

/// Failure while downloading the published server list.
///
/// The fetch layer performs exactly one request and does not retry;
/// callers decide whether a failed run is worth repeating.
#[derive(Debug)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The remote endpoint refused the connection.
    ConnectionRefused,
    /// The server answered with a non-success HTTP status.
    HttpStatus(u16),
    /// TLS handshake or certificate validation failed.
    TlsFailure(String),
    /// Any other transport-level failure (DNS, malformed URL, ...).
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "List download timed out"),
            TransportError::ConnectionRefused => write!(f, "Connection refused by list server"),
            TransportError::HttpStatus(code) => write!(f, "List server returned HTTP {}", code),
            TransportError::TlsFailure(e) => write!(f, "TLS failure: {}", e),
            TransportError::Other(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout;
        }
        if let Some(status) = err.status() {
            return TransportError::HttpStatus(status.as_u16());
        }
        if err.is_connect() {
            let text = err.to_string();
            if text.contains("refused") {
                return TransportError::ConnectionRefused;
            }
            if text.contains("tls") || text.contains("certificate") {
                return TransportError::TlsFailure(text);
            }
            return TransportError::Other(text);
        }
        TransportError::Other(err.to_string())
    }
}

/// Per-line parse problem. Warnings never abort the batch; the affected
/// record is dropped and parsing continues with the next line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// Data line had fewer columns than the export defines.
    ShortLine { line: usize, fields: usize },
    /// Record carried no usable hostname or IP.
    MissingEndpoint { line: usize },
    /// The embedded OpenVPN config column was not valid base64.
    BadConfigBlob { line: usize, host: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::ShortLine { line, fields } => {
                write!(f, "Line {}: expected 15 fields, found {}", line, fields)
            }
            ParseWarning::MissingEndpoint { line } => {
                write!(f, "Line {}: record has no hostname or IP", line)
            }
            ParseWarning::BadConfigBlob { line, host } => {
                write!(f, "Line {}: undecodable OpenVPN config for {}", line, host)
            }
        }
    }
}

impl std::error::Error for ParseWarning {}

/// Ranking-level failure.
#[derive(Debug, PartialEq)]
pub enum RankingError {
    /// Filtering left no candidate to try. Surfaced before any connection
    /// attempt is made.
    EmptyCandidateSet,
}

impl fmt::Display for RankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingError::EmptyCandidateSet => {
                write!(f, "No candidate servers left after filtering")
            }
        }
    }
}

impl std::error::Error for RankingError {}

/// Per-candidate connection machinery failure. These are absorbed by the
/// supervisor's failover loop and never surface as run-level errors on
/// their own.
#[derive(Debug)]
pub enum ConnectError {
    /// Could not materialize the candidate's config to a temp file.
    ConfigWrite(std::io::Error),
    /// The external VPN binary could not be spawned.
    SpawnFailed(String),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::ConfigWrite(e) => write!(f, "Failed to write config file: {}", e),
            ConnectError::SpawnFailed(e) => write!(f, "Failed to spawn VPN process: {}", e),
        }
    }
}

impl std::error::Error for ConnectError {}

impl From<std::io::Error> for ConnectError {
    fn from(err: std::io::Error) -> Self {
        ConnectError::ConfigWrite(err)
    }
}
