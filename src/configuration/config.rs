use clap::Parser;
use std::collections::HashSet;
use std::time::Duration;

use crate::connection::types::SupervisorConfig;
use crate::ranking::types::{RankPolicy, SortDirection, SortKey};
use crate::server_list::fetcher::DEFAULT_LIST_URL;

/// Runtime configuration, parsed from the command line (with env
/// fallbacks where noted).
///
/// The ranking and supervision layers take their own small policy structs
/// rather than this whole object; the accessor methods below derive them.
#[derive(Parser, Debug, Clone)]
#[command(name = "vpngate-client", version)]
#[command(about = "Discovers VPN Gate relay servers and connects through the best candidate")]
pub struct Config {
    /// Server list source URL.
    ///
    /// # Command Line
    /// `--url <URL>`, or the `VPNGATE_LIST_URL` environment variable.
    #[arg(long, env = "VPNGATE_LIST_URL", default_value = DEFAULT_LIST_URL)]
    pub url: String,

    /// Field candidates are ranked by.
    ///
    /// # Command Line
    /// `--sort-key <score|speed|ping|uptime>`
    #[arg(long, value_enum, default_value = "score")]
    pub sort_key: SortKey,

    /// Sort direction. When omitted, each key uses its natural direction
    /// (ascending for ping, descending otherwise).
    ///
    /// # Command Line
    /// `--direction <ascending|descending>`
    #[arg(long, value_enum)]
    pub direction: Option<SortDirection>,

    /// Restrict candidates to these ISO country codes. Repeatable.
    ///
    /// # Command Line
    /// `--country JP --country KR`
    #[arg(long = "country")]
    pub countries: Vec<String>,

    /// Drop relays the volunteer network has scored 0.
    ///
    /// # Command Line
    /// `--exclude-zero-score` (boolean flag)
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub exclude_zero_score: bool,

    /// Timeout for the list download, in seconds.
    ///
    /// # Command Line
    /// `--fetch-timeout-secs <SECONDS>`
    #[arg(long, default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// How long each candidate gets to establish the tunnel, in seconds.
    ///
    /// # Command Line
    /// `--connect-timeout-secs <SECONDS>`
    #[arg(long, default_value_t = 15)]
    pub connect_timeout_secs: u64,

    /// Wait between the graceful termination signal and the forced kill,
    /// in seconds.
    ///
    /// # Command Line
    /// `--kill-grace-secs <SECONDS>`
    #[arg(long, default_value_t = 5)]
    pub kill_grace_secs: u64,

    /// Cap on how many ranked candidates to try before giving up.
    /// Unset tries every ranked candidate.
    ///
    /// # Command Line
    /// `--max-candidates <COUNT>`
    #[arg(long)]
    pub max_candidates: Option<usize>,

    /// OpenVPN executable to launch for each attempt.
    ///
    /// # Command Line
    /// `--openvpn-bin <PATH>`, or the `OPENVPN_BIN` environment variable.
    #[arg(long, env = "OPENVPN_BIN", default_value = "openvpn")]
    pub openvpn_bin: String,
}

impl Config {
    /// Parses configuration from the process command line.
    pub fn from_args() -> Self {
        Config::parse()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Ranking policy derived from the CLI selection. Country codes are
    /// normalized to upper case here so the ranker compares them
    /// case-insensitively.
    pub fn rank_policy(&self) -> RankPolicy {
        let country_filter = if self.countries.is_empty() {
            None
        } else {
            Some(
                self.countries
                    .iter()
                    .map(|c| c.to_ascii_uppercase())
                    .collect::<HashSet<_>>(),
            )
        };
        RankPolicy {
            sort_key: self.sort_key,
            direction: self.direction,
            country_filter,
            exclude_zero_score: self.exclude_zero_score,
        }
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            kill_grace_period: Duration::from_secs(self.kill_grace_secs),
            max_candidates: self.max_candidates,
        }
    }

    #[cfg(test)]
    fn from_args_under_test(argv: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(argv)
    }
}
