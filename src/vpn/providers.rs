//! Built-in provider adapters, one per backend schema named in the external
//! interfaces. Each normalises a heterogeneous JSON shape into
//! [`VpnProviderResult`] and never panics on an unexpected payload — a
//! missing or mistyped field degrades to `None`/`false`, never an error.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::model::VpnProviderResult;

use super::VpnProvider;

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn get_str(value: &Value, path: &[&str]) -> Option<String> {
    let mut cur = value;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str().map(str::to_string)
}

fn get_bool(value: &Value, path: &[&str]) -> bool {
    let mut cur = value;
    for key in path {
        match cur.get(key) {
            Some(v) => cur = v,
            None => return false,
        }
    }
    cur.as_bool().unwrap_or(false)
}

fn get_f64(value: &Value, path: &[&str]) -> Option<f64> {
    let mut cur = value;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_f64()
}

fn get_i64(value: &Value, path: &[&str]) -> Option<i64> {
    let mut cur = value;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_i64()
}

/// `{privacy:{vpn, proxy, tor, hosting}, org, asn, city, region, country}`.
/// Modelled on an ipinfo.io-shaped privacy-detection response.
pub struct IpInfoProvider {
    token: Option<String>,
    client: Client,
    base_url: String,
}

impl IpInfoProvider {
    const DEFAULT_BASE_URL: &'static str = "https://ipinfo.io";

    pub fn new(token: Option<String>, timeout: Duration) -> Self {
        Self {
            token,
            client: http_client(timeout),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the adapter at a different host, e.g. a `wiremock` server in
    /// tests. Production callers always get [`Self::DEFAULT_BASE_URL`].
    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl VpnProvider for IpInfoProvider {
    fn name(&self) -> &str {
        "ipinfo"
    }

    fn enabled(&self) -> bool {
        self.token.is_some()
    }

    async fn call(&self, ip: IpAddr) -> VpnProviderResult {
        let Some(token) = &self.token else {
            return VpnProviderResult::errored(self.name(), "no credential configured");
        };

        let url = format!("{}/{ip}/json?token={token}", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                return VpnProviderResult::errored(self.name(), format!("http {}", resp.status()))
            }
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        VpnProviderResult {
            provider: self.name().to_string(),
            is_vpn: get_bool(&body, &["privacy", "vpn"]),
            is_proxy: get_bool(&body, &["privacy", "proxy"]),
            is_tor: get_bool(&body, &["privacy", "tor"]),
            is_hosting: get_bool(&body, &["privacy", "hosting"]),
            is_relay: get_bool(&body, &["privacy", "relay"]),
            fraud_score: None,
            organization: get_str(&body, &["org"]),
            asn: get_str(&body, &["asn"]),
            isp: None,
            city: get_str(&body, &["city"]),
            region: get_str(&body, &["region"]),
            country: get_str(&body, &["country"]),
            error: None,
            extra: Default::default(),
        }
    }
}

/// `{security:{vpn, proxy, tor, relay}, risk:{score}, network, location}`.
/// Modelled on a vpnapi.io-shaped security response.
pub struct VpnApiProvider {
    key: Option<String>,
    client: Client,
}

impl VpnApiProvider {
    pub fn new(key: Option<String>, timeout: Duration) -> Self {
        Self {
            key,
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl VpnProvider for VpnApiProvider {
    fn name(&self) -> &str {
        "vpnapi"
    }

    fn enabled(&self) -> bool {
        self.key.is_some()
    }

    async fn call(&self, ip: IpAddr) -> VpnProviderResult {
        let Some(key) = &self.key else {
            return VpnProviderResult::errored(self.name(), "no credential configured");
        };

        let url = format!("https://vpnapi.io/api/{ip}?key={key}");
        let response = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                return VpnProviderResult::errored(self.name(), format!("http {}", resp.status()))
            }
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        VpnProviderResult {
            provider: self.name().to_string(),
            is_vpn: get_bool(&body, &["security", "vpn"]),
            is_proxy: get_bool(&body, &["security", "proxy"]),
            is_tor: get_bool(&body, &["security", "tor"]),
            is_hosting: false,
            is_relay: get_bool(&body, &["security", "relay"]),
            fraud_score: get_f64(&body, &["risk", "score"]),
            organization: get_str(&body, &["network"]),
            asn: None,
            isp: None,
            city: get_str(&body, &["location", "city"]),
            region: get_str(&body, &["location", "region"]),
            country: get_str(&body, &["location", "country"]),
            error: None,
            extra: Default::default(),
        }
    }
}

/// `{vpn, proxy, tor, is_crawler, fraud_score, ISP, organization, ASN,
/// country_code, city, recent_abuse}`. Modelled on an
/// ipqualityscore-shaped fraud-detection response.
pub struct IpQualityScoreProvider {
    key: Option<String>,
    client: Client,
}

impl IpQualityScoreProvider {
    pub fn new(key: Option<String>, timeout: Duration) -> Self {
        Self {
            key,
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl VpnProvider for IpQualityScoreProvider {
    fn name(&self) -> &str {
        "ipqualityscore"
    }

    fn enabled(&self) -> bool {
        self.key.is_some()
    }

    async fn call(&self, ip: IpAddr) -> VpnProviderResult {
        let Some(key) = &self.key else {
            return VpnProviderResult::errored(self.name(), "no credential configured");
        };

        let url = format!("https://ipqualityscore.com/api/json/ip/{key}/{ip}");
        let response = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                return VpnProviderResult::errored(self.name(), format!("http {}", resp.status()))
            }
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        VpnProviderResult {
            provider: self.name().to_string(),
            is_vpn: get_bool(&body, &["vpn"]),
            is_proxy: get_bool(&body, &["proxy"]),
            is_tor: get_bool(&body, &["tor"]),
            is_hosting: get_bool(&body, &["recent_abuse"]),
            is_relay: false,
            fraud_score: get_f64(&body, &["fraud_score"]),
            organization: get_str(&body, &["organization"]),
            asn: get_i64(&body, &["ASN"]).map(|v| v.to_string()),
            isp: get_str(&body, &["ISP"]),
            city: get_str(&body, &["city"]),
            region: None,
            country: get_str(&body, &["country_code"]),
            error: None,
            extra: Default::default(),
        }
    }
}

/// `{block ∈ {0,1,2}, isp, asn, hostname, countryCode, countryName}`.
/// Modelled on an iphub.info-shaped proxy-block response; `block >= 1` is
/// treated as VPN/proxy.
pub struct IpHubProvider {
    key: Option<String>,
    client: Client,
}

impl IpHubProvider {
    pub fn new(key: Option<String>, timeout: Duration) -> Self {
        Self {
            key,
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl VpnProvider for IpHubProvider {
    fn name(&self) -> &str {
        "iphub"
    }

    fn enabled(&self) -> bool {
        self.key.is_some()
    }

    async fn call(&self, ip: IpAddr) -> VpnProviderResult {
        let Some(key) = &self.key else {
            return VpnProviderResult::errored(self.name(), "no credential configured");
        };

        let url = format!("https://v2.api.iphub.info/ip/{ip}");
        let response = match self.client.get(&url).header("X-Key", key).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                return VpnProviderResult::errored(self.name(), format!("http {}", resp.status()))
            }
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        let block = get_i64(&body, &["block"]).unwrap_or(0);

        VpnProviderResult {
            provider: self.name().to_string(),
            is_vpn: block >= 1,
            is_proxy: block >= 1,
            is_tor: false,
            is_hosting: block == 2,
            is_relay: false,
            fraud_score: None,
            organization: get_str(&body, &["hostname"]),
            asn: get_i64(&body, &["asn"]).map(|v| v.to_string()),
            isp: get_str(&body, &["isp"]),
            city: None,
            region: None,
            country: get_str(&body, &["countryName"]),
            error: None,
            extra: Default::default(),
        }
    }
}

/// Keyword-matching fallback that needs no credential; always enabled so the
/// aggregator always has at least one provider to run.
///
/// `{org, asn, city, region, country_name, country_code}`, with the VPN
/// verdict derived by matching the organisation/ASN string against a fixed
/// keyword set.
pub struct FallbackKeywordProvider {
    client: Client,
}

const VPN_KEYWORDS: &[&str] = &[
    "vpn",
    "proxy",
    "hosting",
    "datacenter",
    "data center",
    "cloud",
    "server",
];

impl FallbackKeywordProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
        }
    }

    fn classify(organization: Option<&str>, asn: Option<&str>) -> bool {
        let haystack = format!(
            "{} {}",
            organization.unwrap_or_default(),
            asn.unwrap_or_default()
        )
        .to_lowercase();
        VPN_KEYWORDS.iter().any(|kw| haystack.contains(kw))
    }
}

#[async_trait]
impl VpnProvider for FallbackKeywordProvider {
    fn name(&self) -> &str {
        "fallback-keyword"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn call(&self, ip: IpAddr) -> VpnProviderResult {
        let url = format!("https://ipapi.co/{ip}/json/");
        let response = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                return VpnProviderResult::errored(self.name(), format!("http {}", resp.status()))
            }
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(err) => return VpnProviderResult::errored(self.name(), err.to_string()),
        };

        let organization = get_str(&body, &["org"]);
        let asn = get_str(&body, &["asn"]);
        let is_vpn = Self::classify(organization.as_deref(), asn.as_deref());

        VpnProviderResult {
            provider: self.name().to_string(),
            is_vpn,
            is_proxy: is_vpn,
            is_tor: false,
            is_hosting: is_vpn,
            is_relay: false,
            fraud_score: None,
            organization,
            asn,
            isp: None,
            city: get_str(&body, &["city"]),
            region: get_str(&body, &["region"]),
            country: get_str(&body, &["country_name"]).or_else(|| get_str(&body, &["country_code"])),
            error: None,
            extra: Default::default(),
        }
    }
}
